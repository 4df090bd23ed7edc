// ── Reactive snapshot stream ──
//
// Subscription handle for consumers that follow polls as they land.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Snapshot;

/// A subscription to the controller's snapshot.
///
/// Provides point-in-time access plus change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`.
pub struct SnapshotStream {
    current: Arc<Snapshot>,
    receiver: watch::Receiver<Arc<Snapshot>>,
}

impl SnapshotStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<Snapshot>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Arc<Snapshot> {
        &self.current
    }

    /// The latest published snapshot.
    pub fn latest(&self) -> Arc<Snapshot> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next poll result.
    /// Returns `None` once the controller has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Snapshot>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream`. The first item is the current snapshot.
    pub fn into_stream(self) -> SnapshotWatchStream {
        SnapshotWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotWatchStream {
    inner: WatchStream<Arc<Snapshot>>,
}

impl Stream for SnapshotWatchStream {
    type Item = Arc<Snapshot>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn changed_yields_each_published_snapshot() {
        let (tx, rx) = watch::channel(Arc::new(Snapshot::default()));
        let mut stream = SnapshotStream::new(rx);
        assert!(!stream.current().available);

        let next = Snapshot {
            available: true,
            poll_count: 1,
            ..Snapshot::default()
        };
        tx.send(Arc::new(next)).expect("send");

        let snap = stream.changed().await.expect("snapshot");
        assert_eq!(snap.poll_count, 1);
        assert_eq!(stream.current().poll_count, 1);

        drop(tx);
        assert!(stream.changed().await.is_none());
    }

    #[tokio::test]
    async fn stream_starts_with_current_value() {
        let (_tx, rx) = watch::channel(Arc::new(Snapshot {
            poll_count: 7,
            ..Snapshot::default()
        }));
        let mut stream = SnapshotStream::new(rx).into_stream();
        let first = stream.next().await.expect("first");
        assert_eq!(first.poll_count, 7);
    }
}
