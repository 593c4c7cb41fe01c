//! The supervisor: admission loop, worker dispatch, and completion detection.
//!
//! Lifecycle of one supervision:
//! - **Admitting**: the admission loop races "a slot is free" against
//!   "drain requested" and spawns a worker per free slot.
//! - **Draining**: [`Drain::drain`] was called. The admission loop exits for
//!   good; workers already admitted still finish. An idle worker that sees the
//!   drain before any work leaves without doing anything.
//! - **Quiescent**: the live-worker count has read zero for `settle_polls`
//!   polls in a row. The completion signal fires once.
//!
//! Completion is a debounce, not a barrier: it tolerates up to
//! `poll_interval * settle_polls` of extra latency after the last worker exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, watch};
use tracing::{Instrument, debug, info, warn};

use super::intake::WorkIntake;
use super::worker::{SlotGuard, Worker, WorkerId};
use crate::config::SupervisorConfig;
use crate::progress::{ProgressReceiver, ProgressSender};
use crate::telemetry::metrics;
use crate::telemetry::worker::{record_dispatch, start_worker_span};

/// The coordinator contract: start a bounded pool over an intake, and report
/// when it is done. [`Job`] is the stock implementation.
pub trait Supervise {
    /// Start supervising up to `max_workers` workers pulling from `intake`.
    fn supervise(&mut self, max_workers: usize, intake: WorkIntake) -> (ProgressReceiver, Drain);

    /// Completion signal of the current supervision.
    fn is_done(&self) -> Completion;
}

/// A repetitive task: one kind of [`Worker`] applied to many units of work.
pub struct Job<W> {
    worker: Arc<W>,
    config: SupervisorConfig,
    live: Arc<AtomicUsize>,
    slots: Option<Arc<Semaphore>>,
    completed: Arc<watch::Sender<bool>>,
}

/// State shared by the admission loop and every worker of one supervision.
struct Shared<W> {
    worker: Arc<W>,
    intake: WorkIntake,
    progress: ProgressSender,
    drain_tx: Arc<watch::Sender<bool>>,
    drain_rx: watch::Receiver<bool>,
    live: Arc<AtomicUsize>,
}

impl<W: Worker> Job<W> {
    pub fn new(worker: W) -> Self {
        Self::with_config(worker, SupervisorConfig::default())
    }

    pub fn with_config(worker: W, config: SupervisorConfig) -> Self {
        let (completed, _) = watch::channel(false);
        Self {
            worker: Arc::new(worker),
            config,
            live: Arc::new(AtomicUsize::new(0)),
            slots: None,
            completed: Arc::new(completed),
        }
    }

    /// Start supervising: keep up to `max_workers` workers pulling from
    /// `intake`.
    ///
    /// Returns the progress stream, which the caller must keep draining, and
    /// the handle used to say there is no more work. The stream closes by
    /// itself once every worker is gone; the caller may also close it early.
    ///
    /// A `max_workers` of zero is treated as one.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn supervise(
        &mut self,
        max_workers: usize,
        intake: WorkIntake,
    ) -> (ProgressReceiver, Drain) {
        let max_workers = if max_workers == 0 {
            warn!("max_workers is zero, using one worker");
            1
        } else {
            max_workers
        };

        let (progress_tx, progress_rx) =
            async_channel::bounded(self.config.progress_capacity.max(1));
        let (drain_tx, drain_rx) = watch::channel(false);
        let drain_tx = Arc::new(drain_tx);
        let slots = Arc::new(Semaphore::new(max_workers));

        // A previous supervision's waiter still holds the old sender and may
        // fire it later; give this one its own signal.
        if self.slots.is_some() {
            let (completed, _) = watch::channel(false);
            self.completed = Arc::new(completed);
        }
        self.live = Arc::new(AtomicUsize::new(0));
        self.slots = Some(Arc::clone(&slots));

        let shared = Arc::new(Shared {
            worker: Arc::clone(&self.worker),
            intake,
            progress: ProgressSender::new(progress_tx),
            drain_tx: Arc::clone(&drain_tx),
            drain_rx: drain_rx.clone(),
            live: Arc::clone(&self.live),
        });

        tokio::spawn(admit(shared, slots, max_workers));
        tokio::spawn(await_quiescence(
            drain_rx,
            Arc::clone(&self.live),
            Arc::clone(&self.completed),
            self.config.poll_interval,
            self.config.settle_polls.max(1),
        ));

        (progress_rx, Drain { tx: drain_tx })
    }

    /// The completion signal of the current supervision.
    ///
    /// A handle taken before the first `supervise` follows that first
    /// supervision; one taken during an earlier supervision keeps following
    /// that one. On a job never supervised it never fires.
    pub fn is_done(&self) -> Completion {
        Completion {
            rx: self.completed.subscribe(),
        }
    }

    /// Workers admitted and not yet returned.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Admission slots not currently held by a worker.
    pub fn available_slots(&self) -> usize {
        self.slots.as_ref().map_or(0, |s| s.available_permits())
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }
}

impl<W: Worker> Supervise for Job<W> {
    fn supervise(&mut self, max_workers: usize, intake: WorkIntake) -> (ProgressReceiver, Drain) {
        Job::supervise(self, max_workers, intake)
    }

    fn is_done(&self) -> Completion {
        Job::is_done(self)
    }
}

/// Tells a supervision that no more work is coming.
#[derive(Debug, Clone)]
pub struct Drain {
    tx: Arc<watch::Sender<bool>>,
}

impl Drain {
    /// Stop admitting workers. Idempotent.
    pub fn drain(&self) {
        if !self.tx.send_replace(true) {
            info!("drain requested");
        }
    }

    pub fn is_draining(&self) -> bool {
        *self.tx.borrow()
    }
}

impl From<watch::Sender<bool>> for Drain {
    fn from(tx: watch::Sender<bool>) -> Self {
        Self { tx: Arc::new(tx) }
    }
}

/// One-shot completion signal; clones observe the same firing.
#[derive(Debug, Clone)]
pub struct Completion {
    rx: watch::Receiver<bool>,
}

impl Completion {
    /// Wait until the job is done.
    ///
    /// Returns `false` if the job went away without ever completing.
    pub async fn wait(&mut self) -> bool {
        self.rx.wait_for(|done| *done).await.is_ok()
    }

    pub fn is_complete(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Completes when the watched flag turns `true`.
impl From<watch::Receiver<bool>> for Completion {
    fn from(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }
}

/// Resolves once draining is requested; `false` if every drain handle is gone.
async fn drain_requested(rx: &mut watch::Receiver<bool>) -> bool {
    rx.wait_for(|draining| *draining).await.is_ok()
}

async fn admit<W: Worker>(shared: Arc<Shared<W>>, slots: Arc<Semaphore>, max_workers: usize) {
    let admitted = metrics::workers_admitted();
    let mut drain = shared.drain_rx.clone();
    let mut seq = 0u64;

    info!(max_workers, "admission loop started");
    loop {
        let permit = tokio::select! {
            biased;
            _ = drain_requested(&mut drain) => break,
            permit = Arc::clone(&slots).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        seq += 1;
        let slot = SlotGuard::admit(Arc::clone(&shared.live), permit);
        admitted.add(1, &[]);
        tokio::spawn(run_worker(Arc::clone(&shared), WorkerId(seq), slot));
    }
    info!(admitted = seq, "admission loop exited");
}

async fn run_worker<W: Worker>(shared: Arc<Shared<W>>, id: WorkerId, _slot: SlotGuard) {
    let span = start_worker_span(id);
    let worker_span = span.clone();

    async move {
        debug!("worker admitted");
        let mut drain = shared.drain_rx.clone();

        // Work already offered wins over a concurrent drain.
        let work = tokio::select! {
            biased;
            work = shared.intake.recv() => work,
            _ = drain_requested(&mut drain) => {
                record_dispatch(&worker_span, false);
                debug!("drain requested before work arrived");
                return;
            }
        };

        let Some(work) = work else {
            record_dispatch(&worker_span, false);
            if !shared.drain_tx.send_replace(true) {
                info!("work intake closed, draining");
            }
            return;
        };

        record_dispatch(&worker_span, true);
        metrics::work_dispatched().add(1, &[]);

        let started = Instant::now();
        shared
            .worker
            .run(id, work, shared.progress.clone())
            .await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

        metrics::work_duration_ms().record(duration_ms, &[]);
        debug!(duration_ms, "worker finished");
    }
    .instrument(span)
    .await
}

async fn await_quiescence(
    mut drain: watch::Receiver<bool>,
    live: Arc<AtomicUsize>,
    completed: Arc<watch::Sender<bool>>,
    poll_interval: Duration,
    settle_polls: u32,
) {
    // Not draining means not done, however idle the pool looks.
    if !drain_requested(&mut drain).await {
        return;
    }

    let mut streak = 0;
    loop {
        if live.load(Ordering::SeqCst) > 0 {
            streak = 0;
        } else {
            streak += 1;
        }
        if streak >= settle_polls {
            break;
        }
        tokio::time::sleep(poll_interval).await;
    }

    info!("job complete");
    completed.send_replace(true);
}
