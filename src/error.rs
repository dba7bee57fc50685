//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache tiers.
///
/// Only write paths report errors. Reads surface misses as `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is empty or otherwise unusable
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Disk tier could not be initialized
    #[error("Disk cache unavailable: {0}")]
    DiskUnavailable(String),

    /// Filesystem failure while writing an entry
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be converted to or from bytes
    #[error("Codec error: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Codec(err.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

// == Key Validation ==
/// Rejects empty keys.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("a").is_ok());
        assert!(matches!(validate_key(""), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::Io(_)));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CacheError = json_err.into();
        assert!(matches!(err, CacheError::Codec(_)));
    }
}
