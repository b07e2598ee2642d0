//! Error taxonomy shared by every component.
//!
//! Mirrors the classes called out in the design: transient/retryable
//! errors are the caller's backoff concern, precondition failures trigger
//! a declared escalation path, permanent errors surface and stop dispatch,
//! and cancellation propagates unchanged.

use thiserror::Error;

/// The error class a `CoreError` belongs to, used by callers that need to
/// branch on taxonomy rather than match the full enum (e.g. the Plan
/// Runner deciding whether to retry a phase or fail it outright).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    PreconditionFailed,
    PermanentOperational,
    Cancelled,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("transient error: {0}")]
    Transient(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permanent operational error: {0}")]
    PermanentOperational(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::Transient(_) | CoreError::Io(_) => ErrorClass::Transient,
            CoreError::PreconditionFailed(_) => ErrorClass::PreconditionFailed,
            CoreError::NotFound(_) => ErrorClass::PermanentOperational,
            CoreError::PermanentOperational(_) | CoreError::Serde(_) => {
                ErrorClass::PermanentOperational
            }
            CoreError::Cancelled => ErrorClass::Cancelled,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.class(), ErrorClass::Transient)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
