use futures::StreamExt;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use mtr_trace::config::Config;
use mtr_trace::{HopRecord, Mtr, MtrError, TokioProcessRunner, TraceEvent};

#[derive(Serialize)]
struct TraceReport<'a> {
    target: &'a str,
    timestamp: String,
    hops: Vec<HopRecord>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // Logs go to stderr so JSON on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.to_string().to_lowercase()))
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("Configuration: {:?}", config);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Trace to {} failed: {}", config.target, e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> Result<(), MtrError> {
    let runner = TokioProcessRunner::new().with_timeout(config.timeout);
    let mtr = Mtr::new(&config.target, config.probe.clone())?
        .with_program(config.mtr_path.clone())
        .with_runner(Arc::new(runner));

    if config.json {
        let report = TraceReport {
            target: mtr.target(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            hops: mtr.run().await?,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{:>3}  {:<40} {:>5} {:>9} {:>9} {:>9}",
        "HOP", "HOST", "SENT", "BEST", "AVG", "WORST"
    );

    let mut events = mtr.traceroute();
    while let Some(event) = events.next().await {
        match event {
            TraceEvent::Hop(hop) => println!("{}", format_hop(&hop)),
            TraceEvent::End => break,
            TraceEvent::Error(e) => return Err(e),
        }
    }

    Ok(())
}

fn format_hop(hop: &HopRecord) -> String {
    let host = match (&hop.hostname, &hop.ip) {
        (Some(name), Some(ip)) => format!("{} ({})", name, ip),
        (None, Some(ip)) => ip.clone(),
        (Some(name), None) => name.clone(),
        (None, None) => "???".to_string(),
    };

    let stats = hop.stats();
    let ms = |value: Option<f64>| {
        value
            .map(|v| format!("{:.3}", v))
            .unwrap_or_else(|| "-".to_string())
    };

    format!(
        "{:>3}  {:<40} {:>5} {:>9} {:>9} {:>9}",
        hop.number,
        host,
        stats.samples,
        ms(stats.best_ms),
        ms(stats.avg_ms),
        ms(stats.worst_ms)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hop() {
        let hop = HopRecord {
            number: 14,
            ip: Some("8.8.8.8".to_string()),
            hostname: Some("dns.google".to_string()),
            rtts: vec![52.775],
        };
        let line = format_hop(&hop);
        assert!(line.starts_with(" 14  dns.google (8.8.8.8)"));
        assert!(line.ends_with("52.775"));

        let line = format_hop(&HopRecord::empty(3));
        assert!(line.contains("???"));
        assert!(line.ends_with("-"));
    }
}
