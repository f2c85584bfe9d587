use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};

use tracing::debug;

use crate::store::{StoreChangeEvent, StoreListener};

/// Messages marshalled from store threads to the thread owning the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewMessage {
    /// The store changed; refresh once this message is processed.
    RefreshScheduled { generation: u64 },
}

/// Called after a message is queued so the host can wake its event loop.
pub type Wakeup = Arc<dyn Fn() + Send + Sync>;

/// Store listener that turns change notifications into at most one
/// pending [`ViewMessage::RefreshScheduled`].
pub(crate) struct RefreshRelay {
    tx: mpsc::Sender<ViewMessage>,
    pending: AtomicBool,
    disposed: AtomicBool,
    coalesced: AtomicUsize,
    wakeup: Mutex<Option<Wakeup>>,
}

impl RefreshRelay {
    pub(crate) fn new() -> (Arc<Self>, mpsc::Receiver<ViewMessage>) {
        let (tx, rx) = mpsc::channel();
        let relay = Arc::new(Self {
            tx,
            pending: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            coalesced: AtomicUsize::new(0),
            wakeup: Mutex::new(None),
        });
        (relay, rx)
    }

    pub(crate) fn set_wakeup(&self, wakeup: Option<Wakeup>) {
        *self.wakeup.lock().unwrap_or_else(|e| e.into_inner()) = wakeup;
    }

    /// Clear the pending flag; called when the scheduled message is taken off the queue.
    pub(crate) fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub(crate) fn coalesced(&self) -> usize {
        self.coalesced.load(Ordering::Relaxed)
    }

    pub(crate) fn dispose(&self) {
        self.disposed.store(true, Ordering::Release);
    }
}

impl StoreListener for RefreshRelay {
    fn store_changed(&self, event: &StoreChangeEvent) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        if self.pending.swap(true, Ordering::AcqRel) {
            self.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(generation = event.generation, "refresh already pending, notification coalesced");
            return;
        }
        let message = ViewMessage::RefreshScheduled {
            generation: event.generation,
        };
        if self.tx.send(message).is_err() {
            // View side is gone; nothing will ever clear the flag again.
            return;
        }
        debug!(generation = event.generation, change = ?event.change, "refresh scheduled");
        let wakeup = self.wakeup.lock().unwrap_or_else(|e| e.into_inner()).clone();
        if let Some(wakeup) = wakeup {
            wakeup();
        }
    }
}
