//! Cancellation token for cooperative cancellation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// An observer notified when cancellation is requested.
pub type CancelObserver = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Inner {
    reason: Option<String>,
    observers: Vec<CancelObserver>,
}

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent: only the first reason is kept. Running
/// leaves observe the token between suspension points; leaves mid-poll
/// check it before each sleep, bounding teardown latency to one interval.
/// Observers registered through [`CancellationToken::on_cancel`] fire once,
/// on the first cancellation request.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    inner: RwLock<Inner>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation with a reason.
    ///
    /// Idempotent: the first reason wins, and observers fire exactly once.
    /// A panicking observer is logged and suppressed.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        let observers = {
            let mut inner = self.inner.write();
            inner.reason = Some(reason.into());
            std::mem::take(&mut inner.observers)
        };
        for observer in &observers {
            notify(observer);
        }
    }

    /// Registers an observer invoked on the first cancellation request.
    ///
    /// If the token is already cancelled the observer runs immediately.
    /// The engine uses this to surface the cancellation request the moment
    /// it lands, before in-flight leaves have wound down.
    pub fn on_cancel<F>(&self, observer: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let observer: CancelObserver = Box::new(observer);
        if self.is_cancelled() {
            notify(&observer);
            return;
        }

        let mut inner = self.inner.write();
        // Cancellation may have landed since the check above; the reason is
        // written under this same lock, so re-testing here closes the race.
        if self.is_cancelled() {
            drop(inner);
            notify(&observer);
        } else {
            inner.observers.push(observer);
        }
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.inner.read().reason.clone()
    }
}

fn notify(observer: &CancelObserver) {
    if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer())).is_err() {
        warn!("cancellation observer panicked");
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish()
    }
}
