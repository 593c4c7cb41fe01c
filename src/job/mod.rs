//! Jobs: bounded pools of workers fed from a shared intake.
//!
//! A [`Job`] wraps caller-supplied [`Worker`] logic. [`Job::supervise`] starts
//! an admission loop that keeps up to `max_workers` workers alive; each worker
//! takes one [`Work`](crate::work::Work) from the intake, runs it, and leaves.
//! The caller submits through a [`WorkSender`], calls [`Drain::drain`] when
//! there is no more work, and waits on [`Job::is_done`].

pub mod intake;
pub mod supervisor;
pub mod worker;

pub use intake::{WorkIntake, WorkSender, work_channel};
pub use supervisor::{Completion, Drain, Job, Supervise};
pub use worker::{Worker, WorkerId};
