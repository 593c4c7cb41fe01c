//! Progress sink: triage a progress stream into output lines, an error
//! callback, and a progress-bar channel.
//!
//! Routing by kind:
//! - errors are always written, then handed to the error callback if set;
//! - messages are written only when message logging is on;
//! - updates and estimates are written when message logging is on, and are
//!   always forwarded to the bar channel if one is attached;
//! - anything else is written in its generic rendered form. Nothing is dropped.

use std::io::{self, Write};

use opentelemetry::KeyValue;
use tracing::{Level, debug, error, info, trace, warn};

use crate::progress::{Progress, ProgressKind, ProgressReceiver, WorkError};
use crate::telemetry::metrics;

/// Where a sink writes its lines.
pub trait ProgressOutput: Send {
    fn write_line(&mut self, level: Level, line: &str);
}

/// Emits each line as a `tracing` event under the `racket::progress` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOutput;

impl ProgressOutput for TracingOutput {
    fn write_line(&mut self, level: Level, line: &str) {
        if level == Level::ERROR {
            error!(target: "racket::progress", "{line}");
        } else if level == Level::WARN {
            warn!(target: "racket::progress", "{line}");
        } else if level == Level::INFO {
            info!(target: "racket::progress", "{line}");
        } else if level == Level::DEBUG {
            debug!(target: "racket::progress", "{line}");
        } else {
            trace!(target: "racket::progress", "{line}");
        }
    }
}

/// Writes newline-terminated lines to any `io::Write`, ignoring the level.
#[derive(Debug)]
pub struct WriterOutput<W> {
    writer: W,
}

impl<W: io::Write + Send> WriterOutput<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: io::Write + Send> ProgressOutput for WriterOutput<W> {
    fn write_line(&mut self, _level: Level, line: &str) {
        if let Err(e) = writeln!(self.writer, "{line}") {
            warn!(error = %e, "failed to write progress line");
        }
    }
}

/// Callback for error envelopes. It may panic or exit the process; that is
/// the caller's call.
pub type ErrorCallback = Box<dyn FnMut(WorkError) + Send>;

/// Consumes a progress stream until its channel is closed.
pub struct ProgressSink<O> {
    output: O,
    log_messages: bool,
    on_error: Option<ErrorCallback>,
    bars: Option<async_channel::Sender<Progress>>,
}

impl<O: ProgressOutput> ProgressSink<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            log_messages: false,
            on_error: None,
            bars: None,
        }
    }

    /// Write messages, updates, and estimates (errors are always written).
    pub fn log_messages(mut self, enabled: bool) -> Self {
        self.log_messages = enabled;
        self
    }

    /// Called once per error envelope, after the error line is written.
    pub fn on_error(mut self, callback: impl FnMut(WorkError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(callback));
        self
    }

    /// Forward updates and estimates, unchanged, to `bars`.
    ///
    /// Forwarding awaits room in `bars`: the caller must keep draining it or
    /// the sink stalls.
    pub fn forward_bars(mut self, bars: async_channel::Sender<Progress>) -> Self {
        self.bars = Some(bars);
        self
    }

    /// Run until `progress` is closed, then hand the output back.
    pub async fn run(mut self, progress: ProgressReceiver) -> O {
        let routed = metrics::progress_routed();
        while let Ok(p) = progress.recv().await {
            routed.add(1, &[KeyValue::new("kind", p.kind.name())]);
            self.route(p).await;
        }
        debug!("progress channel closed, sink exiting");
        self.output
    }

    async fn route(&mut self, p: Progress) {
        match p.kind {
            ProgressKind::ERROR => {
                let err = p
                    .as_error()
                    .unwrap_or_else(|| WorkError::new(p.data.to_string()));
                self.output
                    .write_line(Level::ERROR, &format!("[PROGRESS] ERROR: {err}"));
                if let Some(callback) = self.on_error.as_mut() {
                    callback(err);
                }
            }
            ProgressKind::MESSAGE => {
                if self.log_messages {
                    self.output
                        .write_line(Level::INFO, &format!("[PROGRESS] {}", p.data));
                }
            }
            ProgressKind::UPDATE | ProgressKind::ESTIMATE => {
                if self.log_messages {
                    self.output
                        .write_line(Level::INFO, &format!("[PROGRESS] {}: {}", p.kind, p.data));
                }
                if let Some(bars) = &self.bars {
                    if bars.send(p).await.is_err() {
                        debug!("bar channel closed, dropping envelope");
                    }
                }
            }
            _ => {
                self.output
                    .write_line(Level::WARN, &format!("[PROGRESS] ??: {p}"));
            }
        }
    }
}
