//! Work intake with hand-off semantics.
//!
//! [`WorkSender::send`] returns only once a worker has taken the item, so
//! after the last `send` completes every submitted item is already in a
//! worker's hands and draining cannot strand one in a buffer. When the last
//! [`WorkIntake`] goes away, any item still waiting in the buffer is released
//! and its `send` fails with [`Error::IntakeClosed`].

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use crate::error::{Error, Result};
use crate::work::Work;

type Handoff = (Work, oneshot::Sender<()>);

/// Create a connected sender/intake pair.
pub fn work_channel() -> (WorkSender, WorkIntake) {
    let (tx, rx) = async_channel::bounded(1);
    (
        WorkSender { tx },
        WorkIntake {
            inner: Arc::new(IntakeInner { rx }),
        },
    )
}

/// Caller side of the intake. Cloneable; the intake closes when every clone
/// is dropped or [`close`](Self::close) is called.
#[derive(Debug, Clone)]
pub struct WorkSender {
    tx: async_channel::Sender<Handoff>,
}

impl WorkSender {
    /// Submit one unit of work, waiting until a worker takes it.
    ///
    /// # Errors
    ///
    /// [`Error::IntakeClosed`] if the intake is closed or dropped before a
    /// worker picks the item up.
    pub async fn send(&self, work: Work) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send((work, ack_tx))
            .await
            .map_err(|_| Error::IntakeClosed)?;
        ack_rx.await.map_err(|_| Error::IntakeClosed)
    }

    /// Close the intake. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Worker side of the intake. Many workers may race on clones of it.
#[derive(Debug, Clone)]
pub struct WorkIntake {
    inner: Arc<IntakeInner>,
}

#[derive(Debug)]
struct IntakeInner {
    rx: async_channel::Receiver<Handoff>,
}

impl Drop for IntakeInner {
    fn drop(&mut self) {
        // Senders keep the channel alive, and with it any buffered item and
        // its ack. Dropping the acks is what unblocks their `send`.
        self.rx.close();
        let mut released = 0usize;
        while self.rx.try_recv().is_ok() {
            released += 1;
        }
        if released > 0 {
            debug!(released, "intake dropped with work still buffered");
        }
    }
}

impl WorkIntake {
    /// Take the next item, acknowledging it to the sender.
    ///
    /// `None` once the intake is closed and empty.
    pub async fn recv(&self) -> Option<Work> {
        let (work, ack) = self.inner.rx.recv().await.ok()?;
        // The sender may have given up waiting; the work is ours either way.
        let _ = ack.send(());
        Some(work)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.rx.is_closed()
    }
}
