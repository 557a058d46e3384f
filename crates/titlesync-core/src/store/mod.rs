//! Cache store holding the single title.
//!
//! The store owns the title. Readers subscribe to a `watch` channel, so a new
//! subscriber sees the latest written value immediately instead of a stale
//! default.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::errors::StoreError;
use crate::types::Title;

/// Persistent home of the cached title.
///
/// Implementations must serialize concurrent writes (last write wins) and
/// must never expose an absent value.
#[async_trait]
pub trait TitleStore: Send + Sync {
    /// Observe the title. The receiver's current value is the latest write.
    fn subscribe(&self) -> watch::Receiver<Title>;

    /// Snapshot of the latest title.
    fn current(&self) -> Title {
        self.subscribe().borrow().clone()
    }

    /// Replace the title.
    async fn write(&self, title: Title) -> Result<(), StoreError>;
}

/// In-process [`TitleStore`] backed by a `watch` channel.
pub struct MemoryTitleStore {
    tx: watch::Sender<Title>,
    writes: AtomicU64,
}

impl MemoryTitleStore {
    pub fn new(initial: impl Into<Title>) -> Self {
        let (tx, _) = watch::channel(initial.into());
        Self {
            tx,
            writes: AtomicU64::new(0),
        }
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TitleStore for MemoryTitleStore {
    fn subscribe(&self) -> watch::Receiver<Title> {
        self.tx.subscribe()
    }

    fn current(&self) -> Title {
        self.tx.borrow().clone()
    }

    async fn write(&self, title: Title) -> Result<(), StoreError> {
        debug!(event = "core.store.write", title = %title);
        // send_replace stores the value even with no live receivers
        self.tx.send_replace(title);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
