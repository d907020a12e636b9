use crate::consent::backend::BackendOperation;
use thiserror::Error;

/// Every failure the consent core can record.
///
/// None of these are fatal: the state machine stores the most recent one as
/// its `last_error` and stops progressing, it never panics or unwinds.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConsentError {
    // Identity Errors
    #[error("Cookie broker exhausted after {attempts} connect attempts")]
    BrokerExhausted { attempts: u32 },
    #[error("Page event bus has no listeners")]
    PageBusUnavailable,

    // Backend Errors
    #[error("Backend call {operation} failed: {message}")]
    BackendFailed {
        operation: BackendOperation,
        message: String,
    },

    // Data Errors
    #[error("Malformed consent section '{section}': missing {field}")]
    MalformedSection {
        section: String,
        field: &'static str,
    },
    #[error("Invalid cookie line")]
    InvalidCookie,
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("Failed to read {path}: {message}")]
    ConfigIo { path: String, message: String },

    // Flow Errors
    #[error("No consent dialog is awaiting a decision")]
    NotAwaitingDecision,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl ConsentError {
    pub fn backend_failed(operation: BackendOperation, message: impl Into<String>) -> Self {
        ConsentError::BackendFailed {
            operation,
            message: message.into(),
        }
    }

    pub fn malformed_section(section: impl Into<String>, field: &'static str) -> Self {
        ConsentError::MalformedSection {
            section: section.into(),
            field,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        ConsentError::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error came from one of the backend operations.
    pub fn is_backend(&self) -> bool {
        matches!(self, ConsentError::BackendFailed { .. })
    }

    /// The backend operation this error belongs to, if any.
    pub fn operation(&self) -> Option<BackendOperation> {
        match self {
            ConsentError::BackendFailed { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            ConsentError::BrokerExhausted { .. } => -101,
            ConsentError::PageBusUnavailable => -103,

            ConsentError::BackendFailed { .. } => -200,

            ConsentError::MalformedSection { .. } => -300,
            ConsentError::InvalidCookie => -301,
            ConsentError::InvalidUrl => -302,
            ConsentError::InvalidConfig { .. } => -303,
            ConsentError::ConfigIo { .. } => -304,

            ConsentError::NotAwaitingDecision => -400,
            ConsentError::Unknown(code) => *code,
        }
    }
}

/// Only payload-free codes map back to their variant; the rest carry data
/// that a bare code cannot restore and come back as `Unknown`.
impl From<i32> for ConsentError {
    fn from(code: i32) -> Self {
        match code {
            -103 => ConsentError::PageBusUnavailable,
            -301 => ConsentError::InvalidCookie,
            -302 => ConsentError::InvalidUrl,
            -400 => ConsentError::NotAwaitingDecision,
            _ => ConsentError::Unknown(code),
        }
    }
}
