// ── Subscription handles ──
//
// A subscription is a receiver of pushes plus a handle that detaches it
// from the store. Unsubscribing is synchronous: once `unsubscribe()`
// returns, the store will not enqueue further pushes for it.

use std::fmt;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::query::Snapshot;

/// One delivery from the store: a full snapshot or a transport error.
pub type Push = Result<Snapshot, Error>;

type Detach = Box<dyn FnOnce() + Send>;

/// Detaches a subscription from its store. Idempotent; also runs on drop.
pub struct SubscriptionHandle {
    detach: Option<Detach>,
}

impl SubscriptionHandle {
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing to detach.
    pub fn noop() -> Self {
        Self { detach: None }
    }

    pub fn unsubscribe(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }

    pub fn is_active(&self) -> bool {
        self.detach.is_some()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A live subscription: pushes arrive on the receiver in store order.
#[derive(Debug)]
pub struct Subscription {
    pushes: mpsc::UnboundedReceiver<Push>,
    handle: SubscriptionHandle,
}

impl Subscription {
    pub fn new(pushes: mpsc::UnboundedReceiver<Push>, handle: SubscriptionHandle) -> Self {
        Self { pushes, handle }
    }

    /// Wait for the next push. `None` once the store side is gone.
    pub async fn recv(&mut self) -> Option<Push> {
        self.pushes.recv().await
    }

    /// Take the next push without waiting.
    pub fn try_recv(&mut self) -> Option<Push> {
        self.pushes.try_recv().ok()
    }

    pub fn unsubscribe(&mut self) {
        self.handle.unsubscribe();
        self.pushes.close();
    }

    /// Split into the receiver and the detach handle.
    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<Push>, SubscriptionHandle) {
        (self.pushes, self.handle)
    }
}
