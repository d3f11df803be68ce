//! Error types surfaced by the registry and its persistence gateway.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ValueKind;

/// Result type alias for savekit operations.
pub type Result<T> = std::result::Result<T, SaveError>;

#[derive(Error, Debug)]
pub enum SaveError {
    /// A mandatory lookup found nothing under the key.
    #[error("key '{key}' not found in {scope} data")]
    NotFound { key: String, scope: String },

    #[error("failed to write {}: {source}", path.display())]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The data file exists but does not decode as a persistent data aggregate.
    #[error("corrupt data file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode persistent data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cannot resolve base directory: {0}")]
    BaseDir(String),

    #[error("unknown value kind `{0}`")]
    UnknownKind(String),

    #[error("invalid {kind} literal `{text}`")]
    InvalidLiteral { kind: ValueKind, text: String },
}

impl SaveError {
    /// Returns true for the missing-key case of a mandatory get.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SaveError::NotFound { .. })
    }

    /// Returns true if the failure happened while writing the data file.
    pub fn is_storage_write(&self) -> bool {
        matches!(self, SaveError::StorageWrite { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_key_and_scope() {
        let err = SaveError::NotFound {
            key: "volume".to_string(),
            scope: "global".to_string(),
        };
        assert_eq!(err.to_string(), "key 'volume' not found in global data");
        assert!(err.is_not_found());
        assert!(!err.is_storage_write());
    }
}
