//! Shared cell for a decoded audio buffer that resolves exactly once.

use bridge_traits::graph::PcmBuffer;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// A set-once cell holding the decoded audio for one asset.
///
/// The slot starts empty and is resolved exactly once, by whichever
/// completion path gets there first; later resolutions are ignored. Waiters
/// blocked in [`wait`](BufferSlot::wait) are woken by the first resolution
/// only. Clones share the same cell, so one decode can feed any number of
/// generators.
#[derive(Clone)]
pub struct BufferSlot {
    cell: Arc<watch::Sender<Option<Arc<PcmBuffer>>>>,
}

impl BufferSlot {
    /// Create an unresolved slot.
    pub fn empty() -> Self {
        let (cell, _) = watch::channel(None);
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Create a slot that already holds a buffer.
    pub fn resolved(buffer: Arc<PcmBuffer>) -> Self {
        let (cell, _) = watch::channel(Some(buffer));
        Self {
            cell: Arc::new(cell),
        }
    }

    /// Resolve the slot with a buffer. Returns `true` if this call won the
    /// resolution, `false` if the slot was already resolved (the existing
    /// buffer is kept and no waiters are notified).
    pub fn resolve(&self, buffer: Arc<PcmBuffer>) -> bool {
        self.cell.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(buffer);
            true
        })
    }

    /// The resolved buffer, or `None` while decoding is still in flight.
    pub fn get(&self) -> Option<Arc<PcmBuffer>> {
        self.cell.borrow().clone()
    }

    /// Returns `true` once the slot holds a buffer.
    pub fn is_resolved(&self) -> bool {
        self.cell.borrow().is_some()
    }

    /// Wait until the slot is resolved and return the buffer. Returns
    /// immediately if it already is.
    pub async fn wait(&self) -> Arc<PcmBuffer> {
        let mut rx = self.cell.subscribe();
        loop {
            if let Some(buffer) = rx.borrow_and_update().clone() {
                return buffer;
            }
            if rx.changed().await.is_err() {
                // Every clone of the slot was dropped while we waited, so no
                // resolution can ever arrive.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for BufferSlot {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BufferSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferSlot")
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    fn buffer_of(value: f32) -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer::new(vec![value; 4], 44_100, 1))
    }

    #[test]
    fn starts_empty() {
        let slot = BufferSlot::empty();
        assert!(!slot.is_resolved());
        assert!(slot.get().is_none());
    }

    #[test]
    fn first_resolution_wins() {
        let slot = BufferSlot::empty();
        assert!(slot.resolve(buffer_of(0.1)));
        assert!(!slot.resolve(buffer_of(0.9)));

        let held = slot.get().unwrap();
        assert_eq!(held.samples[0], 0.1);
    }

    #[test]
    fn clones_share_the_cell() {
        let slot = BufferSlot::empty();
        let other = slot.clone();
        slot.resolve(buffer_of(0.5));
        assert!(other.is_resolved());
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_resolved() {
        let slot = BufferSlot::resolved(buffer_of(0.2));
        let buffer = timeout(Duration::from_secs(1), slot.wait()).await.unwrap();
        assert_eq!(buffer.samples[0], 0.2);
    }

    #[tokio::test]
    async fn wait_wakes_on_resolution() {
        let slot = BufferSlot::empty();
        let waiter = slot.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });

        tokio::task::yield_now().await;
        slot.resolve(buffer_of(0.3));

        let buffer = timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(buffer.samples[0], 0.3);
    }
}
