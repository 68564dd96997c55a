// ── Reactive state streams ──
//
// Subscription type for consuming state snapshots from the StateStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::StateSnapshot;

/// A subscription to the global state snapshot.
///
/// Holds the snapshot captured at creation time plus a receiver for
/// later ones. Every yielded snapshot is a distinct `Arc`, ready to be
/// handed to [`ReactiveRow::update`](crate::reactive::ReactiveRow::update).
pub struct StateStream {
    current: Arc<StateSnapshot>,
    receiver: watch::Receiver<Arc<StateSnapshot>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<StateSnapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation or by the last [`changed`](Self::changed).
    pub fn current(&self) -> &Arc<StateSnapshot> {
        &self.current
    }

    /// Latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<StateSnapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Arc<StateSnapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StateWatchStream {
    inner: WatchStream<Arc<StateSnapshot>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<StateSnapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
