// mtr command line assembly

use std::net::IpAddr;

use super::{DEFAULT_PACKET_LEN, ProbeOptions};
use crate::error::{MtrError, MtrResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    fn flag(self) -> &'static str {
        match self {
            AddressFamily::V4 => "-4",
            AddressFamily::V6 => "-6",
        }
    }
}

/// A validated mtr invocation for one target
#[derive(Debug, Clone)]
pub struct Invocation {
    target: String,
    family: AddressFamily,
    options: ProbeOptions,
}

impl Invocation {
    /// Validate the target and capture the options.
    ///
    /// The target must be an IP literal; hostnames are rejected here, before
    /// any process is started.
    pub fn new(target: &str, options: &ProbeOptions) -> MtrResult<Self> {
        let family = match target.parse::<IpAddr>() {
            Ok(IpAddr::V4(_)) => AddressFamily::V4,
            Ok(IpAddr::V6(_)) => AddressFamily::V6,
            Err(_) => return Err(MtrError::InvalidTarget(target.to_string())),
        };

        Ok(Invocation {
            target: target.to_string(),
            family,
            options: options.clone(),
        })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Arguments for mtr, target last
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.family.flag().to_string()];

        if !self.options.resolve_dns {
            args.push("--no-dns".to_string());
        }

        args.push("--raw".to_string());

        // A cycle count of zero means "not set"
        if let Some(cycles) = self.options.report_cycles.filter(|c| *c > 0) {
            args.push("--report-cycles".to_string());
            args.push(cycles.to_string());
        }

        // Same for a zero packet size, which falls back to the default
        let packet_len = match self.options.packet_len {
            0 => DEFAULT_PACKET_LEN,
            len => len,
        };
        args.push("--psize".to_string());
        args.push(packet_len.to_string());

        args.push(self.target.clone());
        args
    }
}
