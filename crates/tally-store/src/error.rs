//! # Store Error Types
//!
//! Error types for the storage and credential adapters.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  io::Error / serde_json::Error / argon2 error                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds path and line context                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  CoreError::Store (crossing a port) ← Only the message survives        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError STORAGE_ERROR (terminal)                                     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use tally_core::CoreError;
use thiserror::Error;

/// Storage adapter errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing a data file failed.
    ///
    /// ## When This Occurs
    /// - Data directory can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be encoded or decoded.
    ///
    /// `line` is set for `sales.jsonl`, where each line is one sale.
    #[error("Malformed data in {}{}: {source}", .path.display(), line_suffix(.line))]
    Serialization {
        path: PathBuf,
        line: Option<usize>,
        #[source]
        source: serde_json::Error,
    },

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|n| format!(" line {n}")).unwrap_or_default()
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Port callers only see a message.
impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::Store(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converts_to_core_store_error() {
        let err = StoreError::Hash("bad salt".to_string());
        let core: CoreError = err.into();
        match core {
            CoreError::Store(msg) => assert_eq!(msg, "Password hashing failed: bad salt"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_serialization_message_includes_line() {
        let source = serde_json::from_str::<u32>("x").unwrap_err();
        let err = StoreError::Serialization {
            path: PathBuf::from("sales.jsonl"),
            line: Some(3),
            source,
        };
        assert!(err.to_string().starts_with("Malformed data in sales.jsonl line 3:"));
    }
}
