// Probe module - mtr invocation, raw output parsing and event delivery

pub mod invocation;
pub mod mtr;
pub mod parser;
pub mod runner;

use serde::{Deserialize, Serialize};

pub use invocation::{AddressFamily, Invocation};
pub use mtr::{Mtr, TraceEvent, TraceStream};
pub use parser::parse_raw_output;
pub use runner::{ProcessOutput, ProcessRunner, TokioProcessRunner};

/// Default probe payload size in bytes
pub const DEFAULT_PACKET_LEN: u32 = 60;

/// One hop along the path to the target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HopRecord {
    /// Hop number (1-based)
    pub number: u32,
    /// Address that answered this hop, if any reply was received
    pub ip: Option<String>,
    /// Reverse DNS name, only present when DNS resolution was requested
    pub hostname: Option<String>,
    /// Round-trip times in milliseconds, in report order
    pub rtts: Vec<f64>,
}

impl HopRecord {
    /// Empty record for a hop position with no reply
    pub fn empty(number: u32) -> Self {
        HopRecord {
            number,
            ip: None,
            hostname: None,
            rtts: Vec::new(),
        }
    }

    pub fn responded(&self) -> bool {
        self.ip.is_some() || !self.rtts.is_empty()
    }

    pub fn stats(&self) -> HopStats {
        HopStats::from_samples(&self.rtts)
    }
}

/// Latency summary for a single hop
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HopStats {
    pub samples: usize,
    pub best_ms: Option<f64>,
    pub worst_ms: Option<f64>,
    pub avg_ms: Option<f64>,
}

impl HopStats {
    fn from_samples(rtts: &[f64]) -> Self {
        if rtts.is_empty() {
            return HopStats {
                samples: 0,
                best_ms: None,
                worst_ms: None,
                avg_ms: None,
            };
        }

        let sum: f64 = rtts.iter().sum();
        HopStats {
            samples: rtts.len(),
            best_ms: rtts.iter().copied().reduce(f64::min),
            worst_ms: rtts.iter().copied().reduce(f64::max),
            avg_ms: Some(sum / rtts.len() as f64),
        }
    }
}

/// Options controlling how mtr is invoked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOptions {
    /// Probe payload size in bytes
    #[serde(default = "default_packet_len")]
    pub packet_len: u32,

    /// Ask mtr to resolve hop addresses to hostnames
    #[serde(default)]
    pub resolve_dns: bool,

    /// Number of measurement cycles before mtr exits
    #[serde(default)]
    pub report_cycles: Option<u32>,
}

fn default_packet_len() -> u32 {
    DEFAULT_PACKET_LEN
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            packet_len: default_packet_len(),
            resolve_dns: false,
            report_cycles: None,
        }
    }
}
