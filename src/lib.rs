//! # racket
//!
//! A small coordinator for Jobs, Work, and Progress.
//!
//! A [`Job`](job::Job) hands [`Work`](work::Work) to a bounded number of
//! concurrent workers, each of which may report [`Progress`](progress::Progress)
//! over a typed channel. The caller signals when no more work is coming and
//! then waits on the job's completion signal. A [`ProgressSink`](sink::ProgressSink)
//! can triage the progress stream into logs, an error callback, and a
//! progress-bar channel.

pub mod config;
pub mod error;
pub mod job;
pub mod progress;
pub mod sink;
pub mod telemetry;
pub mod work;

pub use job::{
    Completion, Drain, Job, Supervise, WorkIntake, WorkSender, Worker, WorkerId, work_channel,
};
pub use progress::{Progress, ProgressData, ProgressKind, ProgressSender, WorkError};
pub use sink::{ProgressOutput, ProgressSink, TracingOutput, WriterOutput};
pub use work::Work;
