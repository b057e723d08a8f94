//! Push-based access to the hierarchical real-time data store.
//!
//! Devices publish their state under `devices/{id}`; this crate models the
//! store side of that contract and nothing more:
//!
//! - **[`RealtimeStore`]**: the seam consumers program against.
//!   [`subscribe()`](RealtimeStore::subscribe) returns a [`Subscription`]
//!   that delivers a full [`Snapshot`] (never a diff) on every change at or
//!   below the subscribed path, starting with the current value.
//!
//! - **[`Query`]**: a path plus the optional ordering/limit modifiers used
//!   by the alert feed (`orderByChild` + `limitToLast`).
//!
//! - **[`SubscriptionHandle`]**: idempotent unsubscribe. Dropping the
//!   handle unsubscribes as well.
//!
//! - **[`MemoryRealtimeStore`]**: an in-process store with the same
//!   delivery guarantees (ordered per path, push-based). Used by tests and
//!   by the `firetap replay` command.

pub mod error;
pub mod memory;
pub mod query;
pub mod subscription;

pub use error::Error;
pub use memory::MemoryRealtimeStore;
pub use query::{DevicePaths, Query, Snapshot};
pub use subscription::{Push, Subscription, SubscriptionHandle};

/// A real-time data store that pushes full snapshots to subscribers.
///
/// Implementations must deliver pushes for a single subscription in the
/// order the store observed them. No ordering is promised across
/// subscriptions.
pub trait RealtimeStore: Send + Sync {
    /// Open a subscription. The first push carries the current value.
    fn subscribe(&self, query: Query) -> Subscription;
}
