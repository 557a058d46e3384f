//! Simulated remote title source used by the CLI.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use titlesync_core::{FetchError, TitleSource};
use tracing::debug;

const TITLES: &[&str] = &[
    "Hello, coroutines",
    "Structured concurrency",
    "Cancellation is cooperative",
    "Timeouts are errors too",
    "Last write wins",
];

/// Answers each fetch after `latency`, cycling through canned titles.
///
/// A fetch dropped mid-sleep consumes nothing: the request counter only
/// advances once the latency has elapsed.
pub struct SimulatedSource {
    latency: Duration,
    fail_every: Option<u64>,
    always_fail: bool,
    requests: AtomicU64,
}

impl SimulatedSource {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            fail_every: None,
            always_fail: false,
            requests: AtomicU64::new(0),
        }
    }

    /// Fail every `n`th completed fetch.
    pub fn with_fail_every(mut self, n: Option<u64>) -> Self {
        self.fail_every = n.filter(|n| *n > 0);
        self
    }

    pub fn with_always_fail(mut self, always_fail: bool) -> Self {
        self.always_fail = always_fail;
        self
    }
}

#[async_trait]
impl TitleSource for SimulatedSource {
    async fn fetch_next_title(&self) -> Result<String, FetchError> {
        tokio::time::sleep(self.latency).await;

        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(event = "cli.source.fetch_answered", request = request);

        let fail = self.always_fail || self.fail_every.is_some_and(|n| request % n == 0);
        if fail {
            return Err(FetchError::Unavailable {
                message: format!("simulated outage on request {request}"),
            });
        }

        let index = usize::try_from((request - 1) % TITLES.len() as u64).unwrap_or(0);
        Ok(TITLES[index].to_string())
    }
}
