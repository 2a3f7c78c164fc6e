//! Condition list merging with transition detection
//!
//! Conditions are merged by `type`. An existing entry is only replaced when
//! it differs from the submitted one in some field other than
//! `lastTransitionTime`, so a client that resubmits the same logical state
//! does not reset the stored timestamp.
//!
//! Merging works on raw JSON objects rather than [`crate::Condition`]:
//! conditions already stored on a resource are server data and may carry
//! fields (e.g. `observedGeneration`) that caller input is not allowed to.

use serde_json::Value;

use crate::condition::{FIELD_LAST_TRANSITION_TIME, FIELD_TYPE};
use crate::{StatusDocument, CONDITIONS_FIELD};

/// Merge `new` conditions into `old`
///
/// - Either list empty: the result is `new`.
/// - Otherwise `old` order is kept; a matching entry is replaced in place
///   only if it transitioned, and unmatched types are appended in the order
///   they appear in `new`.
pub fn merge_conditions(old: &[Value], new: &[Value]) -> Vec<Value> {
    if old.is_empty() || new.is_empty() {
        return new.to_vec();
    }

    let mut merged = old.to_vec();
    for condition in new {
        match condition_index(&merged, condition_type(condition)) {
            Some(idx) => {
                if has_transitioned(&merged[idx], condition) {
                    merged[idx] = condition.clone();
                }
            }
            None => merged.push(condition.clone()),
        }
    }
    merged
}

/// Whether `new` differs from `old` in any field other than `lastTransitionTime`
///
/// Fields are compared over the keys of both conditions; a field present on
/// only one side counts as a difference.
pub fn has_transitioned(old: &Value, new: &Value) -> bool {
    match (old.as_object(), new.as_object()) {
        (Some(old), Some(new)) => old
            .keys()
            .chain(new.keys())
            .filter(|key| key.as_str() != FIELD_LAST_TRANSITION_TIME)
            .any(|key| old.get(key) != new.get(key)),
        _ => old != new,
    }
}

/// Position of the first condition whose `type` equals `type_`
pub fn condition_index(conditions: &[Value], type_: Option<&Value>) -> Option<usize> {
    conditions
        .iter()
        .position(|c| condition_type(c) == type_)
}

fn condition_type(condition: &Value) -> Option<&Value> {
    condition.get(FIELD_TYPE)
}

/// Conditions stored under `status.conditions`, or an empty slice
pub fn status_conditions(status: &StatusDocument) -> &[Value] {
    status
        .get(CONDITIONS_FIELD)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Overlay `desired` onto `observed`, merging the conditions lists
///
/// Top-level fields of `desired` replace those of `observed`. When `desired`
/// carries a conditions list, the result's conditions are the merge of the
/// observed and desired lists; otherwise the observed conditions are left as
/// they are (or, for a desired `null`, cleared by the overlay).
pub fn merge_status(observed: &StatusDocument, desired: &StatusDocument) -> StatusDocument {
    let mut merged = observed.clone();
    for (key, value) in desired {
        merged.insert(key.clone(), value.clone());
    }

    if let Some(Value::Array(desired_conditions)) = desired.get(CONDITIONS_FIELD) {
        let conditions = merge_conditions(status_conditions(observed), desired_conditions);
        merged.insert(CONDITIONS_FIELD.to_string(), Value::Array(conditions));
    }

    merged
}
