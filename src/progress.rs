//! Progress: the typed envelopes workers send back while doing Work.
//!
//! Every envelope is a [`ProgressKind`] tag plus a [`ProgressData`] payload.
//! The tag is a small open integer rather than a closed enum so that
//! caller-defined kinds still travel (and render) without failing; only the
//! five well-known kinds have names.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Receiving end of a job's progress stream.
pub type ProgressReceiver = async_channel::Receiver<Progress>;

/// The tag of a [`Progress`] envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressKind(pub u16);

impl ProgressKind {
    /// Payload is a [`WorkError`].
    pub const ERROR: Self = Self(0);
    /// Payload is a signed delta of completed units (progress-bar math).
    pub const UPDATE: Self = Self(1);
    /// Payload is a signed [re]estimate of the total units of work.
    pub const ESTIMATE: Self = Self(2);
    /// Payload is free text.
    pub const MESSAGE: Self = Self(3);
    /// Payload belongs to the caller's own consumer and is never interpreted here.
    pub const OTHER: Self = Self(4);

    /// Well-known name of this kind, or `""` for anything unrecognized.
    pub fn name(self) -> &'static str {
        match self {
            Self::ERROR => "ProgressError",
            Self::UPDATE => "ProgressUpdate",
            Self::ESTIMATE => "ProgressEstimate",
            Self::MESSAGE => "ProgressMessage",
            Self::OTHER => "ProgressOther",
            _ => "",
        }
    }

    pub fn is_known(self) -> bool {
        self <= Self::OTHER
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error reported by a worker.
///
/// Carries only its rendered message so it can be cloned, compared, and sent
/// across tasks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("{message}")]
pub struct WorkError {
    message: String,
}

impl WorkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Capture an error and its source chain as `outer: inner: ...`.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for WorkError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for WorkError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Payload of a [`Progress`] envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressData {
    Error(WorkError),
    Count(i64),
    Text(String),
    Value(serde_json::Value),
}

impl fmt::Display for ProgressData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

/// A progress report: a kind and its payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub kind: ProgressKind,
    pub data: ProgressData,
}

impl Progress {
    pub fn new(kind: ProgressKind, data: ProgressData) -> Self {
        Self { kind, data }
    }

    /// An error envelope. See also [`perror!`](crate::perror).
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::ERROR, ProgressData::Error(WorkError::new(message)))
    }

    /// A message envelope. See also [`pmessage!`](crate::pmessage).
    pub fn message(text: impl Into<String>) -> Self {
        Self::new(ProgressKind::MESSAGE, ProgressData::Text(text.into()))
    }

    /// `delta` more (or, when negative, fewer) units done.
    pub fn update(delta: i64) -> Self {
        Self::new(ProgressKind::UPDATE, ProgressData::Count(delta))
    }

    /// A fresh estimate of the total units of work.
    pub fn estimate(total: i64) -> Self {
        Self::new(ProgressKind::ESTIMATE, ProgressData::Count(total))
    }

    /// Opaque payload for the caller's own consumer.
    pub fn other(value: impl Into<serde_json::Value>) -> Self {
        Self::new(ProgressKind::OTHER, ProgressData::Value(value.into()))
    }

    /// The structured error, only if this is an error envelope.
    pub fn as_error(&self) -> Option<WorkError> {
        if self.kind != ProgressKind::ERROR {
            return None;
        }
        Some(match &self.data {
            ProgressData::Error(e) => e.clone(),
            other => WorkError::new(other.to_string()),
        })
    }

    /// `"<kind name>: <payload>"`. Unknown kinds render with an empty name.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.data)
    }
}

impl From<WorkError> for Progress {
    fn from(err: WorkError) -> Self {
        Self::new(ProgressKind::ERROR, ProgressData::Error(err))
    }
}

/// Build an error [`Progress`] from a format string.
#[macro_export]
macro_rules! perror {
    ($($arg:tt)*) => {
        $crate::progress::Progress::error(format!($($arg)*))
    };
}

/// Build a message [`Progress`] from a format string.
#[macro_export]
macro_rules! pmessage {
    ($($arg:tt)*) => {
        $crate::progress::Progress::message(format!($($arg)*))
    };
}

/// Write-only handle a worker uses to report progress.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: async_channel::Sender<Progress>,
}

impl ProgressSender {
    pub fn new(tx: async_channel::Sender<Progress>) -> Self {
        Self { tx }
    }

    /// Send an envelope, waiting for room in the channel.
    ///
    /// Returns `false` if the consumer has closed the channel; the envelope is
    /// dropped in that case.
    pub async fn send(&self, progress: Progress) -> bool {
        match self.tx.send(progress).await {
            Ok(()) => true,
            Err(async_channel::SendError(dropped)) => {
                debug!(kind = %dropped.kind, "progress channel closed, dropping envelope");
                false
            }
        }
    }

    pub async fn message(&self, text: impl Into<String>) -> bool {
        self.send(Progress::message(text)).await
    }

    pub async fn error(&self, message: impl Into<String>) -> bool {
        self.send(Progress::error(message)).await
    }

    pub async fn update(&self, delta: i64) -> bool {
        self.send(Progress::update(delta)).await
    }

    pub async fn estimate(&self, total: i64) -> bool {
        self.send(Progress::estimate(total)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl From<async_channel::Sender<Progress>> for ProgressSender {
    fn from(tx: async_channel::Sender<Progress>) -> Self {
        Self::new(tx)
    }
}
