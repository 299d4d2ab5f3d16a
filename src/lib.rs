// mtr-trace - per-hop latency reports from the mtr network probe

pub mod config;
pub mod error;
pub mod probe;

pub use error::{MtrError, MtrResult};
pub use probe::{
    HopRecord, HopStats, Invocation, Mtr, ProbeOptions, ProcessOutput, ProcessRunner,
    TokioProcessRunner, TraceEvent, TraceStream, parse_raw_output,
};
