//! Error types for the privilege boundary auditor.
//!
//! Fatal conditions are split into three tiers so callers can tell bad input
//! (configuration), a broken instruction stream (decode) and a security-relevant
//! anomaly (integrity) apart. Policy violations are not errors; they are
//! reported as [`crate::audit::finding::Finding`]s.

use thiserror::Error;

/// Main error type for audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Missing section, odd-length section, stripped symbol table or unusable config
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Instruction stream cannot be decoded
    #[error("Decode error in {section} at {address:#x}: {message}")]
    Decode {
        section: String,
        address: u64,
        message: String,
    },

    /// Privileged entry at an address that is not a function boundary
    #[error("Integrity error in {section} at {address:#x} (target {target:#x}): {message}")]
    Integrity {
        section: String,
        address: u64,
        target: u64,
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        AuditError::Configuration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AuditError::Configuration(_) | AuditError::Io(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, AuditError::Decode { .. })
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, AuditError::Integrity { .. })
    }
}

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;
