/// Failure reported by a [`TitleSource`](crate::source::TitleSource) before the deadline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("remote source unavailable: {message}")]
    Unavailable { message: String },

    #[error("remote source returned an invalid title: {message}")]
    InvalidResponse { message: String },
}

/// Failure reported by a [`TitleStore`](crate::store::TitleStore) write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write title: {message}")]
    WriteFailed { message: String },

    #[error("title store is closed")]
    Closed,
}

/// Why a single refresh attempt failed.
///
/// Every variant leaves the cached title untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Unable to refresh title: timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Unable to refresh title: {0}")]
    Fetch(#[from] FetchError),

    #[error("Unable to refresh title: {0}")]
    Store(#[from] StoreError),
}

impl RefreshError {
    /// Stable error code for logs and JSON output.
    pub fn error_code(&self) -> &'static str {
        match self {
            RefreshError::Timeout { .. } => "refresh_timeout",
            RefreshError::Fetch(FetchError::Unavailable { .. }) => "fetch_unavailable",
            RefreshError::Fetch(FetchError::InvalidResponse { .. }) => "fetch_invalid_response",
            RefreshError::Store(StoreError::WriteFailed { .. }) => "store_write_failed",
            RefreshError::Store(StoreError::Closed) => "store_closed",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RefreshError::Timeout { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("IO error reading config: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_error_display() {
        let err = RefreshError::Timeout { timeout_ms: 5000 };
        assert_eq!(
            err.to_string(),
            "Unable to refresh title: timed out after 5000 ms"
        );

        let err: RefreshError = FetchError::Unavailable {
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Unable to refresh title: remote source unavailable: connection refused"
        );
    }

    #[test]
    fn test_error_codes() {
        let cases: Vec<(RefreshError, &str)> = vec![
            (RefreshError::Timeout { timeout_ms: 1 }, "refresh_timeout"),
            (
                FetchError::Unavailable {
                    message: "x".to_string(),
                }
                .into(),
                "fetch_unavailable",
            ),
            (
                FetchError::InvalidResponse {
                    message: "x".to_string(),
                }
                .into(),
                "fetch_invalid_response",
            ),
            (
                StoreError::WriteFailed {
                    message: "x".to_string(),
                }
                .into(),
                "store_write_failed",
            ),
            (StoreError::Closed.into(), "store_closed"),
        ];

        for (err, expected_code) in cases {
            assert_eq!(err.error_code(), expected_code);
        }
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        assert!(RefreshError::Timeout { timeout_ms: 5000 }.is_timeout());
        assert!(
            !RefreshError::Fetch(FetchError::Unavailable {
                message: "x".to_string()
            })
            .is_timeout()
        );
        assert!(!RefreshError::Store(StoreError::Closed).is_timeout());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ConfigError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }
}
