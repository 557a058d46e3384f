//! # titlesync-core
//!
//! Keeps one cached title fresh from a remote source that may be slow or fail.
//!
//! - [`RefreshCoordinator`] runs a single fetch under a deadline and writes the
//!   result to the [`TitleStore`] only on success.
//! - [`InteractionController`] runs the periodic background refresh and the tap
//!   counter the UI observes.

pub mod config;
pub mod errors;
pub mod interaction;
pub mod logging;
pub mod refresh;
pub mod source;
pub mod store;
pub mod testing;
pub mod types;

pub use config::{RefreshConfig, load_config, load_config_file};
pub use errors::{ConfigError, FetchError, RefreshError, StoreError};
pub use interaction::{ControllerConfig, InteractionController};
pub use logging::init_logging;
pub use refresh::RefreshCoordinator;
pub use source::TitleSource;
pub use store::{MemoryTitleStore, TitleStore};
pub use types::{InteractionState, RefreshOutcome, RefreshStatus, Title};
