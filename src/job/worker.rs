//! Worker invocations and the slot each one holds.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OwnedSemaphorePermit;

use crate::progress::ProgressSender;
use crate::work::Work;

/// Identifies one worker invocation: its admission sequence number, from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u64);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How to accomplish one unit of Work.
///
/// Each invocation gets a unique id, its own [`Work`], and a handle for
/// progress reports. Failures should be reported as error envelopes; a panic
/// unwinds the worker's task and is not caught by the job.
///
/// Any `Fn(WorkerId, Work, ProgressSender) -> impl Future<Output = ()>` closure
/// is a `Worker`.
pub trait Worker: Send + Sync + 'static {
    fn run(
        &self,
        id: WorkerId,
        work: Work,
        progress: ProgressSender,
    ) -> impl Future<Output = ()> + Send;
}

impl<F, Fut> Worker for F
where
    F: Fn(WorkerId, Work, ProgressSender) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send,
{
    fn run(
        &self,
        id: WorkerId,
        work: Work,
        progress: ProgressSender,
    ) -> impl Future<Output = ()> + Send {
        self(id, work, progress)
    }
}

/// An admitted worker's hold on the job: one live-count unit plus one
/// admission permit.
///
/// Dropping it (normal exit or unwind) decrements the live count first, then
/// returns the permit.
pub(crate) struct SlotGuard {
    live: Arc<AtomicUsize>,
    _permit: OwnedSemaphorePermit,
}

impl SlotGuard {
    /// Take a live-count unit for `permit`.
    pub(crate) fn admit(live: Arc<AtomicUsize>, permit: OwnedSemaphorePermit) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            live,
            _permit: permit,
        }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Semaphore;

    #[tokio::test]
    async fn slot_guard_tracks_live_count_and_permit() {
        let live = Arc::new(AtomicUsize::new(0));
        let slots = Arc::new(Semaphore::new(1));

        let permit = Arc::clone(&slots).acquire_owned().await.unwrap();
        let guard = SlotGuard::admit(Arc::clone(&live), permit);
        assert_eq!(live.load(Ordering::SeqCst), 1);
        assert_eq!(slots.available_permits(), 0);

        drop(guard);
        assert_eq!(live.load(Ordering::SeqCst), 0);
        assert_eq!(slots.available_permits(), 1);
    }

    #[test]
    fn worker_id_displays_as_number() {
        assert_eq!(WorkerId(7).to_string(), "7");
    }
}
