//! Mock source for testing.
//!
//! Allows queueing input batches and forcing failures, and records what
//! the session showed the source at each poll.

use super::{ProgressSource, SourceError};
use async_trait::async_trait;
use peersync_core::PeerRegistry;
use peersync_types::SyncInput;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock source for testing.
///
/// Clones share state, so a test can keep one clone and hand the other
/// to a session.
#[derive(Debug, Default)]
pub struct MockSource {
    inner: Arc<Mutex<MockSourceInner>>,
}

#[derive(Debug, Default)]
struct MockSourceInner {
    batches: VecDeque<Vec<SyncInput>>,
    fail_next_poll: Option<String>,
    polls: u64,
    seen_counts: Vec<usize>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch to be returned by a future `poll()`.
    ///
    /// Each poll pops one batch; polls with nothing queued return no input.
    pub fn queue_batch(&self, batch: Vec<SyncInput>) {
        self.lock().batches.push_back(batch);
    }

    /// Cause the next poll() to fail with the given error.
    pub fn fail_next_poll(&self, error: &str) {
        self.lock().fail_next_poll = Some(error.to_string());
    }

    /// Number of times the source was polled.
    pub fn poll_count(&self) -> u64 {
        self.lock().polls
    }

    /// Registry size observed at each poll, in order.
    pub fn seen_counts(&self) -> Vec<usize> {
        self.lock().seen_counts.clone()
    }

    /// Batches still waiting to be polled.
    pub fn pending_batches(&self) -> usize {
        self.lock().batches.len()
    }

    fn lock(&self) -> MutexGuard<'_, MockSourceInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clone for MockSource {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl ProgressSource for MockSource {
    async fn poll(&mut self, registry: &PeerRegistry) -> Result<Vec<SyncInput>, SourceError> {
        let mut inner = self.lock();
        inner.polls += 1;
        inner.seen_counts.push(registry.count());

        // Check for forced failure
        if let Some(error) = inner.fail_next_poll.take() {
            return Err(SourceError::Failed(error));
        }

        Ok(inner.batches.pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peersync_types::PeerId;

    fn appeared(id: &str) -> SyncInput {
        SyncInput::PeerAppeared {
            id: PeerId::from(id),
            name: None,
        }
    }

    #[tokio::test]
    async fn returns_batches_in_order_then_nothing() {
        let mut source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);
        source.queue_batch(vec![appeared("b"), appeared("c")]);

        let registry = PeerRegistry::new();
        assert_eq!(source.poll(&registry).await.unwrap().len(), 1);
        assert_eq!(source.poll(&registry).await.unwrap().len(), 2);
        assert!(source.poll(&registry).await.unwrap().is_empty());
        assert_eq!(source.poll_count(), 3);
    }

    #[tokio::test]
    async fn forced_failure_applies_once() {
        let mut source = MockSource::new();
        source.queue_batch(vec![appeared("a")]);
        source.fail_next_poll("radio off");

        let registry = PeerRegistry::new();
        let err = source.poll(&registry).await.unwrap_err();
        assert_eq!(err.to_string(), "source failed: radio off");

        // The queued batch survives the failed poll.
        assert_eq!(source.poll(&registry).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let observer = MockSource::new();
        let mut driven = observer.clone();
        observer.queue_batch(vec![appeared("a")]);

        driven.poll(&PeerRegistry::new()).await.unwrap();

        assert_eq!(observer.poll_count(), 1);
        assert_eq!(observer.pending_batches(), 0);
        assert_eq!(observer.seen_counts(), vec![0]);
    }
}
