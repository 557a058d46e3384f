use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::RefreshError;

/// Result of one refresh attempt. `Ok(())` means the fetched title was written.
pub type RefreshOutcome = Result<(), RefreshError>;

/// The single cached title.
///
/// There is no empty/absent state: a store always holds some `Title`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Title(String);

impl Title {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Title {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Title {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Tap counter state observed by the UI layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub count: u64,
    pub is_running: bool,
}

impl InteractionState {
    /// Text shown for the counter, e.g. `"3 taps"`.
    pub fn display_text(&self) -> String {
        format!("{} taps", self.count)
    }
}

/// Progress and last result of refreshes issued through the controller.
///
/// `in_flight > 0` drives the spinner; `last_error` is the message to show
/// until [`dismiss_error`](crate::interaction::InteractionController::dismiss_error)
/// is called.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStatus {
    pub in_flight: usize,
    pub last_error: Option<RefreshError>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub completed: u64,
    pub failed: u64,
}

impl RefreshStatus {
    pub fn is_refreshing(&self) -> bool {
        self.in_flight > 0
    }
}
