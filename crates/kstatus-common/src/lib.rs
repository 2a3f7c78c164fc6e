//! Status reconciliation engine: condition validation, merge and change detection
//!
//! Data flows one way: raw input is validated ([`condition`]), merged into the
//! observed conditions ([`merge`]), compared against the observed status
//! ([`contains`]) and turned into a [`Decision`] ([`decision`]).

#![deny(missing_docs)]

pub mod condition;
pub mod contains;
pub mod decision;
pub mod error;
pub mod merge;

pub use condition::{validate_conditions, Condition, ConditionStatus};
pub use contains::{contains, status_contains, ListPolicy};
pub use decision::{Decision, DesiredState, StatusOptions, StatusUpdate};
pub use error::{Error, ValidationError, ValidationErrorKind};
pub use merge::{merge_conditions, merge_status};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// A status object: field name to arbitrary JSON value
pub type StatusDocument = serde_json::Map<String, serde_json::Value>;

/// Key of the status object on a resource
pub const STATUS_FIELD: &str = "status";

/// Key of the conditions list inside a status object
pub const CONDITIONS_FIELD: &str = "conditions";
