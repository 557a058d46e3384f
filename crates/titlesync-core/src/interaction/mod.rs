//! Tap counter and background refresh loop.
//!
//! The controller owns two tasks:
//! - a background loop that refreshes the title immediately and then every
//!   `refresh_interval`, surviving individual failures
//! - a ticker, started by [`InteractionController::on_interaction_start`],
//!   that bumps the tap count every `tick_interval`
//!
//! Stopping the ticker and applying a tick both happen under the same lock,
//! so once `on_interaction_stop` returns no further increment can land.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RefreshConfig;
use crate::refresh::RefreshCoordinator;
use crate::types::{InteractionState, RefreshOutcome, RefreshStatus, Title};

/// Timing knobs for [`InteractionController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub tick_interval: Duration,
    pub refresh_interval: Duration,
    pub tick_limit: Option<u64>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1_000),
            refresh_interval: Duration::from_secs(30 * 60),
            tick_limit: None,
        }
    }
}

impl From<&RefreshConfig> for ControllerConfig {
    fn from(config: &RefreshConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            refresh_interval: config.refresh_interval(),
            tick_limit: config.tick_limit,
        }
    }
}

/// Mediates between the UI layer and the [`RefreshCoordinator`].
///
/// Must be created inside a tokio runtime. Dropping the controller cancels
/// both of its tasks.
pub struct InteractionController {
    coordinator: RefreshCoordinator,
    config: ControllerConfig,
    state: Arc<watch::Sender<InteractionState>>,
    status: Arc<watch::Sender<RefreshStatus>>,
    /// Token of the running ticker, if any. Also the lock ticks are applied under.
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    shutdown: CancellationToken,
}

impl InteractionController {
    /// Create the controller and start its background refresh loop.
    pub fn start(coordinator: RefreshCoordinator, config: ControllerConfig) -> Self {
        let (state, _) = watch::channel(InteractionState::default());
        let (status, _) = watch::channel(RefreshStatus::default());
        let controller = Self {
            coordinator,
            config,
            state: Arc::new(state),
            status: Arc::new(status),
            ticker: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        };

        tokio::spawn(run_refresh_loop(
            controller.coordinator.clone(),
            controller.status.clone(),
            config.refresh_interval,
            controller.shutdown.clone(),
        ));

        info!(
            event = "core.controller.started",
            refresh_interval_secs = config.refresh_interval.as_secs(),
        );
        controller
    }

    /// Start the tap counter. No-op while one is already running.
    ///
    /// Returns true if a new ticker was started.
    pub fn on_interaction_start(&self) -> bool {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        if ticker.is_some() {
            debug!(event = "core.controller.tick_start_ignored");
            return false;
        }

        let token = self.shutdown.child_token();
        self.state.send_replace(InteractionState {
            count: 0,
            is_running: true,
        });
        *ticker = Some(token.clone());

        tokio::spawn(run_ticker(
            self.state.clone(),
            self.ticker.clone(),
            token,
            self.config.tick_interval,
            self.config.tick_limit,
        ));

        info!(event = "core.controller.tick_started");
        true
    }

    /// Stop the tap counter. No increment happens after this returns.
    ///
    /// Returns true if a running ticker was stopped.
    pub fn on_interaction_stop(&self) -> bool {
        let mut ticker = self.ticker.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(token) = ticker.take() else {
            return false;
        };
        token.cancel();
        self.state.send_modify(|state| state.is_running = false);

        info!(
            event = "core.controller.tick_stopped",
            count = self.state.borrow().count,
        );
        true
    }

    /// User-triggered refresh. The outcome is returned unchanged.
    pub async fn refresh_now(&self) -> RefreshOutcome {
        tracked_refresh(&self.coordinator, &self.status).await
    }

    /// Clear the last refresh error once it has been shown.
    pub fn dismiss_error(&self) {
        self.status.send_modify(|status| status.last_error = None);
    }

    pub fn title(&self) -> watch::Receiver<Title> {
        self.coordinator.title()
    }

    pub fn state(&self) -> watch::Receiver<InteractionState> {
        self.state.subscribe()
    }

    pub fn refresh_status(&self) -> watch::Receiver<RefreshStatus> {
        self.status.subscribe()
    }

    /// Cancel the ticker and the background refresh loop.
    pub fn shutdown(&self) {
        self.on_interaction_stop();
        self.shutdown.cancel();
        debug!(event = "core.controller.shutdown");
    }
}

impl Drop for InteractionController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Counts one refresh in `in_flight` until dropped, including when the
/// refresh future is cancelled mid-flight.
struct InFlight<'a> {
    status: &'a watch::Sender<RefreshStatus>,
}

impl<'a> InFlight<'a> {
    fn enter(status: &'a watch::Sender<RefreshStatus>) -> Self {
        status.send_modify(|status| status.in_flight += 1);
        Self { status }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.status
            .send_modify(|status| status.in_flight = status.in_flight.saturating_sub(1));
    }
}

/// Run one refresh and record it in `status`.
async fn tracked_refresh(
    coordinator: &RefreshCoordinator,
    status: &watch::Sender<RefreshStatus>,
) -> RefreshOutcome {
    let in_flight = InFlight::enter(status);
    let outcome = coordinator.refresh_title().await;
    drop(in_flight);

    status.send_modify(|status| {
        match &outcome {
            Ok(()) => {
                status.completed += 1;
                status.last_success_at = Some(Utc::now());
            }
            Err(e) => {
                status.failed += 1;
                status.last_error = Some(e.clone());
            }
        }
    });
    outcome
}

async fn run_refresh_loop(
    coordinator: RefreshCoordinator,
    status: Arc<watch::Sender<RefreshStatus>>,
    period: Duration,
    shutdown: CancellationToken,
) {
    // First tick completes immediately
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        // Teardown drops an in-flight refresh, which cancels its fetch.
        let outcome = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            outcome = tracked_refresh(&coordinator, &status) => outcome,
        };

        if let Err(e) = outcome {
            warn!(
                event = "core.controller.background_refresh_failed",
                error = %e,
                error_code = e.error_code(),
                "Keeping cached title; next attempt at the next interval",
            );
        }
    }

    debug!(event = "core.controller.refresh_loop_stopped");
}

async fn run_ticker(
    state: Arc<watch::Sender<InteractionState>>,
    ticker: Arc<Mutex<Option<CancellationToken>>>,
    token: CancellationToken,
    period: Duration,
    limit: Option<u64>,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {}
        }

        let mut slot = ticker.lock().unwrap_or_else(PoisonError::into_inner);
        // Stop may have won the lock between the tick and here.
        if token.is_cancelled() {
            break;
        }

        state.send_modify(|state| state.count += 1);

        if limit.is_some_and(|limit| state.borrow().count >= limit) {
            token.cancel();
            *slot = None;
            state.send_modify(|state| state.is_running = false);
            info!(event = "core.controller.tick_completed", count = state.borrow().count);
            break;
        }
    }
}
