//! Test doubles for the store and source collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{oneshot, watch};

use crate::errors::{FetchError, StoreError};
use crate::source::TitleSource;
use crate::store::{MemoryTitleStore, TitleStore};
use crate::types::Title;

/// Source that answers every fetch immediately with a configurable result.
pub struct FixedTitleSource {
    result: Mutex<Result<String, FetchError>>,
    calls: AtomicUsize,
}

impl FixedTitleSource {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            result: Mutex::new(Ok(title.into())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: FetchError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Change what subsequent fetches return.
    pub fn set_result(&self, result: Result<String, FetchError>) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = result;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleSource for FixedTitleSource {
    async fn fetch_next_title(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Source whose fetches stay pending until the test completes or fails them.
///
/// A fetch that is never completed models a remote that never answers.
#[derive(Default)]
pub struct CompletableTitleSource {
    waiters: Mutex<Vec<oneshot::Sender<Result<String, FetchError>>>>,
    calls: AtomicUsize,
}

impl CompletableTitleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete every fetch currently waiting with `title`.
    pub fn send_completion_to_all_current_requests(&self, title: impl Into<String>) {
        self.resolve_all(Ok(title.into()));
    }

    /// Fail every fetch currently waiting with `error`.
    pub fn send_error_to_current_requests(&self, error: FetchError) {
        self.resolve_all(Err(error));
    }

    /// Fetches still waiting for an answer. Cancelled fetches are dropped here.
    pub fn pending_requests(&self) -> usize {
        let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
        waiters.retain(|tx| !tx.is_closed());
        waiters.len()
    }

    /// Senders currently held, including any not yet pruned.
    fn held_senders(&self) -> usize {
        self.waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn resolve_all(&self, result: Result<String, FetchError>) {
        let waiters: Vec<_> = self
            .waiters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for tx in waiters {
            // Receiver gone means the fetch was cancelled
            let _ = tx.send(result.clone());
        }
    }
}

#[async_trait]
impl TitleSource for CompletableTitleSource {
    async fn fetch_next_title(&self) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = self.waiters.lock().unwrap_or_else(PoisonError::into_inner);
            // Forget fetches that were cancelled while waiting
            waiters.retain(|tx| !tx.is_closed());
            waiters.push(tx);
        }
        rx.await.unwrap_or_else(|_| {
            Err(FetchError::Unavailable {
                message: "request dropped by source".to_string(),
            })
        })
    }
}

/// Store that keeps its title but rejects every write.
pub struct FailingTitleStore {
    inner: MemoryTitleStore,
}

impl FailingTitleStore {
    pub fn new(initial: impl Into<Title>) -> Self {
        Self {
            inner: MemoryTitleStore::new(initial),
        }
    }
}

#[async_trait]
impl TitleStore for FailingTitleStore {
    fn subscribe(&self) -> watch::Receiver<Title> {
        self.inner.subscribe()
    }

    async fn write(&self, _title: Title) -> Result<(), StoreError> {
        Err(StoreError::WriteFailed {
            message: "disk full".to_string(),
        })
    }
}
