//! Error types for status reconciliation
//!
//! Errors are structured with fields to aid debugging. Validation errors name
//! the offending condition, field and value; remote errors carry the status,
//! reason and body returned by the API server.

use std::fmt;

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Category of a condition validation failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A condition entry was not a JSON object
    NotAnObject,
    /// A condition carried a key outside the recognized field set
    UnknownField,
    /// `type` or `status` was absent or empty
    MissingRequiredField,
    /// `status` was not one of `True`, `False`, `Unknown`
    InvalidEnumValue,
    /// `reason` or a timestamp did not match its grammar
    InvalidFormat,
    /// Two conditions in the same list share a `type`
    DuplicateType,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "NotAnObject"),
            Self::UnknownField => write!(f, "UnknownField"),
            Self::MissingRequiredField => write!(f, "MissingRequiredField"),
            Self::InvalidEnumValue => write!(f, "InvalidEnumValue"),
            Self::InvalidFormat => write!(f, "InvalidFormat"),
            Self::DuplicateType => write!(f, "DuplicateType"),
        }
    }
}

/// A single condition failed validation
#[derive(Clone, Debug, Error, PartialEq)]
#[error("conditions[{index}]: {kind}: {message}")]
pub struct ValidationError {
    /// Failure category
    pub kind: ValidationErrorKind,
    /// Position of the offending condition in the input list
    pub index: usize,
    /// The field that failed, if the failure concerns one field
    pub field: Option<String>,
    /// Human-readable description, including the rejected value
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for the condition at `index`
    pub fn new(kind: ValidationErrorKind, index: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            index,
            field: None,
            message: message.into(),
        }
    }

    /// Create a validation error naming the offending field
    pub fn for_field(
        kind: ValidationErrorKind,
        index: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            index,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Main error type for status operations
#[derive(Debug, Error)]
pub enum Error {
    /// A supplied condition failed validation
    #[error("the specified conditions failed to validate: {0}")]
    Validation(#[from] ValidationError),

    /// Conditions were given both standalone and under `status.conditions`
    #[error("conditions cannot be specified in both the 'status' and 'conditions' parameters")]
    ConflictingInputs,

    /// The resource kind or the named object does not exist
    #[error("not found: {api_version}.{kind} {name}: {message}")]
    RemoteNotFound {
        /// API version that was searched
        api_version: String,
        /// Kind that was searched
        kind: String,
        /// Object name, or `unknown` when the kind itself is missing
        name: String,
        /// Description of what was missing
        message: String,
    },

    /// The resource kind has no status subresource
    #[error("resource {api_version}.{kind} does not support the status subresource")]
    SubresourceUnsupported {
        /// API version of the resolved resource
        api_version: String,
        /// Kind of the resolved resource
        kind: String,
    },

    /// A request to the API server failed
    #[error("{operation} failed: {status} {reason}: {body}")]
    RemoteRequestFailed {
        /// Which operation failed (fetch, patch, replace, discovery)
        operation: String,
        /// HTTP status code, or 0 when no response was received
        status: u16,
        /// Reason reported by the API server
        reason: String,
        /// Response body or transport error message
        body: String,
    },

    /// Client construction failed
    #[error("client error [{context}]: {message}")]
    Client {
        /// Where the failure occurred (kubeconfig, infer, connect)
        context: String,
        /// Description of what failed
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a not-found error for a missing object
    pub fn not_found(
        api_version: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::RemoteNotFound {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a not-found error for a kind that discovery could not resolve
    pub fn kind_not_found(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        let api_version = api_version.into();
        let kind = kind.into();
        let message = format!(
            "failed to find exact match for {}.{} by [kind, name, singularName]",
            api_version, kind
        );
        Self::RemoteNotFound {
            api_version,
            kind,
            name: UNKNOWN_CONTEXT.to_string(),
            message,
        }
    }

    /// Create a subresource-unsupported error
    pub fn subresource_unsupported(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::SubresourceUnsupported {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }

    /// Create a remote request error from the API server's response
    pub fn remote(
        operation: impl Into<String>,
        status: u16,
        reason: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::RemoteRequestFailed {
            operation: operation.into(),
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Create a client construction error with context
    pub fn client(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Client {
            context: context.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Validation kind if this is a validation failure
    pub fn validation_kind(&self) -> Option<ValidationErrorKind> {
        match self {
            Error::Validation(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Whether the failure was detected before any remote call
    ///
    /// Input errors are terminal for an invocation; remote errors are passed
    /// through and retry policy belongs to the caller.
    pub fn is_input_error(&self) -> bool {
        match self {
            Error::Validation(_) | Error::ConflictingInputs => true,
            Error::RemoteNotFound { .. }
            | Error::SubresourceUnsupported { .. }
            | Error::RemoteRequestFailed { .. }
            | Error::Client { .. }
            | Error::Serialization { .. } => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization(e.to_string())
    }
}
