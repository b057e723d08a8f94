// ── Reactive state streams ──
//
// Subscription types for consuming DeviceStore changes.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A subscription to one slice of device state.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via [`changed()`](Self::changed) or by converting to a
/// `Stream`.
pub struct StateStream<T: Clone + Send + Sync + 'static> {
    current: T,
    receiver: watch::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> StateStream<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<T>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The value captured at creation or at the last `changed()`.
    pub fn current(&self) -> &T {
        &self.current
    }

    /// The latest value (may have changed since creation).
    pub fn latest(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new value.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        let value = self.receiver.borrow_and_update().clone();
        self.current = value.clone();
        Some(value)
    }

    /// Wait until `predicate` holds for the value, checking the latest
    /// value first. Returns `None` if the store is dropped first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        let value = self.receiver.wait_for(|v| predicate(v)).await.ok()?.clone();
        self.current = value.clone();
        Some(value)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    /// The first item is the current value.
    pub fn into_stream(self) -> StateWatchStream<T> {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StateWatchStream<T: Clone + Send + Sync + 'static> {
    inner: WatchStream<T>,
}

impl<T: Clone + Send + Sync + Unpin + 'static> Stream for StateWatchStream<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn changed_tracks_sender() {
        let (tx, rx) = watch::channel(1_u32);
        let mut stream = StateStream::new(rx);
        assert_eq!(*stream.current(), 1);

        tx.send_replace(2);
        assert_eq!(stream.changed().await, Some(2));
        assert_eq!(*stream.current(), 2);

        drop(tx);
        assert_eq!(stream.changed().await, None);
    }

    #[tokio::test]
    async fn wait_for_sees_current_value() {
        let (tx, rx) = watch::channel(5_u32);
        let mut stream = StateStream::new(rx);
        assert_eq!(stream.wait_for(|v| *v == 5).await, Some(5));

        let waiter = tokio::spawn(async move { stream.wait_for(|v| *v > 10).await });
        tx.send_replace(7);
        tx.send_replace(11);
        assert_eq!(waiter.await.unwrap(), Some(11));
    }

    #[tokio::test]
    async fn into_stream_yields_current_then_updates() {
        let (tx, rx) = watch::channel("idle".to_owned());
        let mut stream = StateStream::new(rx).into_stream();
        assert_eq!(stream.next().await.as_deref(), Some("idle"));

        tx.send_replace("alert".to_owned());
        assert_eq!(stream.next().await.as_deref(), Some("alert"));

        drop(tx);
        assert_eq!(stream.next().await, None);
    }
}
