//! Remote source of fresh titles.

use async_trait::async_trait;

use crate::errors::FetchError;

/// Fetches the next title from wherever titles come from.
///
/// The caller cancels an in-flight fetch by dropping its future. A dropped
/// fetch must leave no partial side effects behind.
#[async_trait]
pub trait TitleSource: Send + Sync {
    async fn fetch_next_title(&self) -> Result<String, FetchError>;
}
