//! Error types for steward.

use thiserror::Error;

/// Errors produced by the offline store, the sync runner and the CLI.
#[derive(Debug, Error)]
pub enum StewardError {
    /// The local database could not be opened or a statement failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A queue name that is not one of inventory, sales or receipts.
    #[error("Unknown queue: {0}")]
    InvalidQueue(String),

    /// A reference-list item that cannot be keyed.
    #[error("Invalid cache item: {0}")]
    InvalidItem(String),

    /// A lookup by id found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rejected the session token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The API request failed or returned an error status.
    #[error("Remote request failed: {0}")]
    Remote(String),

    /// Configuration or argument error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parse or serialization error.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StewardError {
    /// Wrap a `SQLite` failure with context.
    pub(crate) fn storage(context: &str, err: &rusqlite::Error) -> Self {
        Self::StorageUnavailable(format!("{context}: {err}"))
    }

    /// Whether the API rejected the session token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for StewardError {
    fn from(err: reqwest::Error) -> Self {
        Self::Remote(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_message() {
        let err = StewardError::storage("Failed to enqueue", &rusqlite::Error::InvalidQuery);
        assert!(matches!(err, StewardError::StorageUnavailable(_)));
        assert!(err.to_string().starts_with("Storage unavailable: Failed to enqueue"));
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err: StewardError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, StewardError::Parse(_)));
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(StewardError::Unauthorized("expired".to_string()).is_unauthorized());
        assert!(!StewardError::Remote("timeout".to_string()).is_unauthorized());
    }
}
