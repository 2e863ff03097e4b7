//! Key-management error taxonomy.

use thiserror::Error;

/// Errors reported by key-management operations.
///
/// Validation failures are not errors: validation reports `false`.
#[derive(Debug, Error)]
pub enum KeyMgmtError {
    #[error("provider is not running")]
    NotRunning,

    #[error("key initialization failed: {0}")]
    Init(String),

    #[error("key import failed: {0}")]
    Import(String),

    #[error("key export failed: {0}")]
    Export(String),

    #[error("key generation failed: {0}")]
    Generation(String),

    #[error("group name mismatch: expected {expected}, got {actual}")]
    ParameterMismatch { expected: String, actual: String },

    #[error("reference count lock unavailable")]
    Lock,

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("invalid parameter {name}: {reason}")]
    Param { name: String, reason: String },

    #[error("callback failed: {0}")]
    Callback(String),
}

impl KeyMgmtError {
    pub(crate) fn import(msg: impl std::fmt::Display) -> Self {
        Self::Import(msg.to_string())
    }

    pub(crate) fn export(msg: impl std::fmt::Display) -> Self {
        Self::Export(msg.to_string())
    }

    pub(crate) fn generation(msg: impl std::fmt::Display) -> Self {
        Self::Generation(msg.to_string())
    }

    pub(crate) fn param(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::Param {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<KeyMgmtError> for ecx_common::Error {
    fn from(err: KeyMgmtError) -> Self {
        match err {
            KeyMgmtError::NotRunning | KeyMgmtError::Lock => ecx_common::Error::internal(err),
            KeyMgmtError::Param { .. } => ecx_common::Error::config(err),
            other => ecx_common::Error::crypto(other),
        }
    }
}
