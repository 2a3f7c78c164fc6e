//! Structural containment used for change detection
//!
//! `contains(observed, desired)` answers "is the desired value already
//! present in what the server reports?". Objects are compared key by key and
//! extra observed keys are ignored; lists are compared under a [`ListPolicy`].

use serde_json::{Map, Value};

use crate::{StatusDocument, CONDITIONS_FIELD};

/// How a desired list is compared against an observed list
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListPolicy {
    /// Every desired element appears somewhere in the observed list
    #[default]
    Subset,
    /// The observed list equals the desired list exactly
    Exact,
}

impl ListPolicy {
    /// Policy for a top-level status field
    ///
    /// `conditions` is always compared as a subset since the merged form is
    /// computed separately; other lists switch to exact matching when
    /// `replace_lists` is set.
    pub fn for_field(field: &str, replace_lists: bool) -> Self {
        if replace_lists && field != CONDITIONS_FIELD {
            Self::Exact
        } else {
            Self::Subset
        }
    }
}

/// Whether `desired` is contained in `observed`
///
/// `policy` applies to a list at this level only; lists nested inside
/// objects are always compared as subsets.
pub fn contains(observed: &Value, desired: &Value, policy: ListPolicy) -> bool {
    match (observed, desired) {
        (Value::Object(observed), Value::Object(desired)) => object_contains(observed, desired),
        (Value::Array(observed), Value::Array(desired)) => match policy {
            ListPolicy::Subset => desired.iter().all(|item| observed.contains(item)),
            ListPolicy::Exact => observed == desired,
        },
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        (observed, desired) => observed == desired,
    }
}

fn object_contains(observed: &Map<String, Value>, desired: &Map<String, Value>) -> bool {
    desired.iter().all(|(key, desired)| match observed.get(key) {
        Some(observed) => contains(observed, desired, ListPolicy::Subset),
        // An unset field already satisfies a desired null
        None => desired.is_null(),
    })
}

/// Whether the desired status document is contained in the observed one
///
/// Applies [`ListPolicy::for_field`] to each top-level field.
pub fn status_contains(
    observed: &StatusDocument,
    desired: &StatusDocument,
    replace_lists: bool,
) -> bool {
    desired.iter().all(|(key, desired)| match observed.get(key) {
        Some(observed) => contains(observed, desired, ListPolicy::for_field(key, replace_lists)),
        None => desired.is_null(),
    })
}
