// mtr wrapper - runs one trace and delivers hops as an event stream

use futures::Stream;
use futures::stream::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use super::{HopRecord, Invocation, ProbeOptions, ProcessRunner, TokioProcessRunner, parse_raw_output};
use crate::error::{MtrError, MtrResult};

const DEFAULT_PROGRAM: &str = "mtr";
const EVENT_BUFFER: usize = 64;

/// Events produced by a single trace
#[derive(Debug)]
pub enum TraceEvent {
    /// One hop, delivered in ascending hop order
    Hop(HopRecord),
    /// All hops have been delivered
    End,
    /// The trace failed; no hops are delivered
    Error(MtrError),
}

/// Stream of events for one trace, finished after `End` or `Error`.
///
/// Dropping the stream aborts the trace and kills the running mtr process.
pub struct TraceStream {
    inner: ReceiverStream<TraceEvent>,
    task: JoinHandle<()>,
}

impl Drop for TraceStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Stream for TraceStream {
    type Item = TraceEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// Traceroute to a single target using the `mtr` binary
#[derive(Clone)]
pub struct Mtr {
    invocation: Invocation,
    program: String,
    runner: Arc<dyn ProcessRunner>,
}

impl Mtr {
    /// Create a wrapper for `target`, which must be an IPv4 or IPv6 literal
    pub fn new(target: &str, options: ProbeOptions) -> MtrResult<Self> {
        let invocation = Invocation::new(target, &options)?;

        Ok(Mtr {
            invocation,
            program: DEFAULT_PROGRAM.to_string(),
            runner: Arc::new(TokioProcessRunner::new()),
        })
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Path or name of the mtr executable
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn target(&self) -> &str {
        self.invocation.target()
    }

    /// Start the trace in a background task.
    ///
    /// Must be called from within a tokio runtime. Each call starts a new,
    /// independent mtr process.
    pub fn traceroute(&self) -> TraceStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mtr = self.clone();

        let task = tokio::spawn(async move {
            mtr.emit(tx).await;
        });

        TraceStream {
            inner: ReceiverStream::new(rx),
            task,
        }
    }

    /// Run the trace and collect every hop
    pub async fn run(&self) -> MtrResult<Vec<HopRecord>> {
        let mut events = self.traceroute();
        let mut hops = Vec::new();

        while let Some(event) = events.next().await {
            match event {
                TraceEvent::Hop(hop) => hops.push(hop),
                TraceEvent::End => return Ok(hops),
                TraceEvent::Error(e) => return Err(e),
            }
        }

        Err(MtrError::CommandExecution(format!(
            "trace to {} stopped before completion",
            self.target()
        )))
    }

    async fn emit(self, tx: mpsc::Sender<TraceEvent>) {
        match self.execute().await {
            Ok(hops) => {
                for hop in hops {
                    // Receiver dropped, nobody is listening any more
                    if tx.send(TraceEvent::Hop(hop)).await.is_err() {
                        return;
                    }
                }
                let _ = tx.send(TraceEvent::End).await;
            }
            Err(e) => {
                let _ = tx.send(TraceEvent::Error(e)).await;
            }
        }
    }

    async fn execute(&self) -> MtrResult<Vec<HopRecord>> {
        let args = self.invocation.args();
        tracing::info!("Executing {} to {}", self.program, self.target());
        tracing::debug!("{} arguments: {:?}", self.program, args);

        let output = self.runner.run(&self.program, &args).await?;

        if !output.success() {
            tracing::warn!(
                "{} to {} exited with status {:?}",
                self.program,
                self.target(),
                output.exit_code
            );
            return Err(MtrError::ProbeFailed {
                stderr: output.stderr,
            });
        }

        tracing::debug!("{} output: {} bytes", self.program, output.stdout.len());

        Ok(parse_raw_output(&output.stdout, self.target()))
    }
}
