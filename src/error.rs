//! Error types for racket.
//!
//! The supervisor lifecycle itself reports no errors; worker failures travel
//! as [`Progress`](crate::progress::Progress) envelopes. These variants cover
//! configuration, telemetry setup, and submitting into a dead intake.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("work intake is closed")]
    IntakeClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
