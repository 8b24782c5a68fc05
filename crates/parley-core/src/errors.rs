//! Error types for Parley
//!
//! `CodecError` covers the file-transfer wire elements, `SessionError` the
//! account/session seam, and `ParleyError` unifies them for callers that do
//! not care which layer failed.

use crate::types::{Jid, SessionId};

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Decode/encode failures for file-transfer wire elements
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Malformed XML: {reason}")]
    Xml { reason: String },
    #[error("Empty document")]
    EmptyDocument,
    #[error("Unexpected element: expected <{expected}>, got <{found}>")]
    UnexpectedElement { expected: String, found: String },
    #[error("Element <{element}> is in namespace {found:?}, expected {expected}")]
    WrongNamespace {
        element: String,
        expected: String,
        found: Option<String>,
    },
    #[error("Element <{element}> is missing required attribute '{attribute}'")]
    MissingAttribute { element: String, attribute: String },
    #[error("Attribute '{attribute}' has invalid value '{value}'")]
    InvalidAttribute { attribute: String, value: String },
    #[error("Malformed range: {reason}")]
    MalformedRange { reason: String },
    #[error("Unknown in-band bytestream session '{sid}'")]
    UnknownSession { sid: String },
    #[error("In-band bytestream session '{sid}' is already open")]
    DuplicateSession { sid: String },
    #[error("Data block of {size} bytes exceeds block size {block_size} for session '{sid}'")]
    BlockSizeExceeded {
        sid: String,
        size: usize,
        block_size: u16,
    },
    #[error("{peer} already has {limit} in-band bytestreams open")]
    TooManyStreams { peer: Jid, limit: usize },
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl CodecError {
    /// Wrap any XML reader/writer failure
    pub fn xml<E: core::fmt::Display>(err: E) -> Self {
        CodecError::Xml {
            reason: err.to_string(),
        }
    }

    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        CodecError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        }
    }

    pub fn invalid_attribute(attribute: &str, value: &str) -> Self {
        CodecError::InvalidAttribute {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    pub fn malformed_range<T: Into<String>>(reason: T) -> Self {
        CodecError::MalformedRange {
            reason: reason.into(),
        }
    }

    pub fn unknown_session(sid: &str) -> Self {
        CodecError::UnknownSession {
            sid: sid.to_string(),
        }
    }
}

/// Failures at the account/session seam
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {session_id} is already attached to account {account}")]
    AlreadyAttached {
        session_id: SessionId,
        account: String,
    },
    #[error("Account not found: {account}")]
    AccountNotFound { account: String },
}

// ----------------------------------------------------------------------------
// Unified Error
// ----------------------------------------------------------------------------

/// Core error type for Parley
#[derive(Debug, thiserror::Error)]
pub enum ParleyError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The event queue or UI executor was closed
    #[error("Channel error: {message}")]
    Channel { message: String },

    #[error("Configuration error: {reason}")]
    Configuration { reason: String },
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl ParleyError {
    /// Create a channel error with a message
    pub fn channel_error<T: Into<String>>(message: T) -> Self {
        ParleyError::Channel {
            message: message.into(),
        }
    }

    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        ParleyError::Configuration {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type ParleyResult<T> = core::result::Result<T, ParleyError>;
pub type CodecResult<T> = core::result::Result<T, CodecError>;
