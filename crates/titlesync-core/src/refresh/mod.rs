//! Timeout-bounded title refresh.
//!
//! One call to [`RefreshCoordinator::refresh_title`] races the remote fetch
//! against a deadline. Whichever finishes first wins and the other is dropped:
//! a late fetch is cancelled, an early fetch cancels the timer. The store is
//! only written after a fetch succeeds inside the deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::RefreshError;
use crate::source::TitleSource;
use crate::store::TitleStore;
use crate::types::{RefreshOutcome, Title};

/// Default deadline for one fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Refreshes the cached title from the remote source.
///
/// Holds only shared references to its collaborators, so concurrent calls are
/// independent. Write ordering between concurrent calls is left to the store.
#[derive(Clone)]
pub struct RefreshCoordinator {
    store: Arc<dyn TitleStore>,
    source: Arc<dyn TitleSource>,
    fetch_timeout: Duration,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<dyn TitleStore>, source: Arc<dyn TitleSource>) -> Self {
        Self::with_timeout(store, source, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(
        store: Arc<dyn TitleStore>,
        source: Arc<dyn TitleSource>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            store,
            source,
            fetch_timeout,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Observe the cached title (pass-through of the store's stream).
    pub fn title(&self) -> watch::Receiver<Title> {
        self.store.subscribe()
    }

    /// Fetch a new title under the deadline and write it to the store.
    ///
    /// Failures are returned, never retried. On any failure the store is left
    /// untouched. On success the write has completed before this returns.
    pub async fn refresh_title(&self) -> RefreshOutcome {
        let timeout_ms = u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX);
        info!(event = "core.refresh.fetch_started", timeout_ms = timeout_ms);

        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch_next_title())
            .await
        {
            Ok(Ok(title)) => title,
            Ok(Err(e)) => {
                warn!(
                    event = "core.refresh.fetch_failed",
                    error = %e,
                );
                return Err(RefreshError::Fetch(e));
            }
            Err(_elapsed) => {
                // The fetch future was dropped when the deadline won.
                warn!(event = "core.refresh.fetch_timed_out", timeout_ms = timeout_ms);
                return Err(RefreshError::Timeout { timeout_ms });
            }
        };

        let title = Title::new(fetched);
        if let Err(e) = self.store.write(title.clone()).await {
            warn!(
                event = "core.refresh.store_write_failed",
                error = %e,
            );
            return Err(RefreshError::Store(e));
        }

        info!(event = "core.refresh.completed", title = %title);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{FetchError, StoreError};
    use crate::store::MemoryTitleStore;
    use crate::testing::{CompletableTitleSource, FailingTitleStore, FixedTitleSource};

    fn coordinator(
        store: &Arc<MemoryTitleStore>,
        source: Arc<dyn TitleSource>,
    ) -> RefreshCoordinator {
        RefreshCoordinator::new(store.clone(), source)
    }

    #[tokio::test]
    async fn test_success_writes_title() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let subject = coordinator(&store, Arc::new(FixedTitleSource::new("OK")));
        let mut title = subject.title();

        subject.refresh_title().await.unwrap();

        assert!(title.has_changed().unwrap());
        assert_eq!(title.borrow_and_update().as_str(), "OK");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_leaves_store_untouched() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let source = Arc::new(CompletableTitleSource::new());
        let subject = coordinator(&store, source.clone());

        let started = tokio::time::Instant::now();
        let err = subject.refresh_title().await.unwrap_err();

        assert_eq!(err, RefreshError::Timeout { timeout_ms: 5000 });
        assert!(started.elapsed() >= Duration::from_millis(5000));
        assert_eq!(store.current().as_str(), "initial");
        assert_eq!(store.write_count(), 0);
        // The losing fetch was cancelled
        assert_eq!(source.call_count(), 1);
        assert_eq!(source.pending_requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_just_inside_deadline_succeeds() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let source = Arc::new(CompletableTitleSource::new());
        let subject = coordinator(&store, source.clone());

        let refresh = tokio::spawn({
            let subject = subject.clone();
            async move { subject.refresh_title().await }
        });

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(source.pending_requests(), 1);
        source.send_completion_to_all_current_requests("late but fine");

        refresh.await.unwrap().unwrap();
        assert_eq!(store.current().as_str(), "late but fine");
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_store_untouched() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let error = FetchError::Unavailable {
            message: "503".to_string(),
        };
        let subject = coordinator(&store, Arc::new(FixedTitleSource::failing(error.clone())));

        let err = subject.refresh_title().await.unwrap_err();

        assert_eq!(err, RefreshError::Fetch(error));
        assert_eq!(store.current().as_str(), "initial");
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_title_is_written_as_fetched() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let subject = coordinator(&store, Arc::new(FixedTitleSource::new("")));

        subject.refresh_title().await.unwrap();

        assert_eq!(store.current().as_str(), "");
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_store_error_is_surfaced() {
        let store = Arc::new(FailingTitleStore::new("initial"));
        let subject = RefreshCoordinator::new(store.clone(), Arc::new(FixedTitleSource::new("OK")));

        let err = subject.refresh_title().await.unwrap_err();

        assert!(matches!(
            err,
            RefreshError::Store(StoreError::WriteFailed { .. })
        ));
        assert_eq!(store.current().as_str(), "initial");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_refreshes_are_independent() {
        let store = Arc::new(MemoryTitleStore::new("initial"));
        let source = Arc::new(CompletableTitleSource::new());
        let subject = RefreshCoordinator::with_timeout(
            store.clone(),
            source.clone(),
            Duration::from_millis(100),
        );

        let first = tokio::spawn({
            let subject = subject.clone();
            async move { subject.refresh_title().await }
        });
        let second = tokio::spawn({
            let subject = subject.clone();
            async move { subject.refresh_title().await }
        });

        while source.pending_requests() < 2 {
            tokio::task::yield_now().await;
        }
        source.send_completion_to_all_current_requests("shared");

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(store.write_count(), 2);
        assert_eq!(store.current().as_str(), "shared");
    }
}
