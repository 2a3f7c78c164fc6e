//! Patch decision engine
//!
//! Raw caller input ([`DesiredState`]) is validated once into a
//! [`StatusUpdate`]. The update is then decided against the instance fetched
//! from the cluster:
//!
//! ```text
//! DesiredState --StatusUpdate::new--> StatusUpdate --decide(instance)--> Decision
//!                                          |
//!                       replace=true ------+------ replace=false
//!                    full equality check       strip lastTransitionTime,
//!                    NoChange | Replace        containment check,
//!                                              NoChange | Patch(merged)
//! ```
//!
//! Deciding is pure; fetching the instance and acting on the decision belong
//! to the resource client.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::condition::{validate_conditions, Condition, FIELD_LAST_TRANSITION_TIME};
use crate::contains::status_contains;
use crate::merge::merge_status;
use crate::{Error, Result, StatusDocument, CONDITIONS_FIELD, STATUS_FIELD};

/// Caller-supplied desired state before validation
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DesiredState {
    /// Fields to set on the status object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusDocument>,

    /// Conditions to set on `status.conditions`, validated against the
    /// condition grammar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<Value>>,
}

/// How the desired state is applied
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusOptions {
    /// Overwrite the whole status object instead of merging into it
    #[serde(default)]
    pub replace: bool,

    /// Compare plain top-level lists by exact equality when merging
    #[serde(default)]
    pub replace_lists: bool,
}

/// Outcome of deciding a [`StatusUpdate`] against an instance
#[derive(Clone, Debug, PartialEq)]
pub enum Decision {
    /// The instance already reflects the desired state; carries the
    /// unmodified instance
    NoChange(Value),
    /// Send the merged status document as a merge-patch
    Patch(StatusDocument),
    /// Overwrite the status with this document
    Replace(StatusDocument),
}

impl Decision {
    /// Whether acting on this decision changes the resource
    pub fn is_change(&self) -> bool {
        !matches!(self, Decision::NoChange(_))
    }

    /// Short name of the action, for logs and output
    pub fn action(&self) -> &'static str {
        match self {
            Decision::NoChange(_) => "none",
            Decision::Patch(_) => "patch",
            Decision::Replace(_) => "replace",
        }
    }

    /// The status document to send, if any
    pub fn status(&self) -> Option<&StatusDocument> {
        match self {
            Decision::NoChange(_) => None,
            Decision::Patch(status) | Decision::Replace(status) => Some(status),
        }
    }
}

/// A validated desired state, ready to be decided against instances
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    status: StatusDocument,
    conditions: Vec<Condition>,
    options: StatusOptions,
}

impl StatusUpdate {
    /// Validate the desired state
    ///
    /// Fails with [`Error::ConflictingInputs`] when conditions are supplied
    /// both standalone and under `status.conditions`, before looking at the
    /// condition contents, and with [`Error::Validation`] when a condition
    /// breaks the grammar.
    pub fn new(desired: DesiredState, options: StatusOptions) -> Result<Self> {
        let mut status = desired.status.unwrap_or_default();
        let raw_conditions = desired.conditions.unwrap_or_default();

        let nested = status
            .get(CONDITIONS_FIELD)
            .is_some_and(|v| !v.is_null());
        if !raw_conditions.is_empty() && nested {
            return Err(Error::ConflictingInputs);
        }

        let conditions = validate_conditions(&raw_conditions)?;
        if !conditions.is_empty() {
            status.insert(
                CONDITIONS_FIELD.to_string(),
                Value::Array(conditions.iter().map(Condition::to_value).collect()),
            );
        }

        Ok(Self {
            status,
            conditions,
            options,
        })
    }

    /// The desired status document, with validated conditions in place
    pub fn status(&self) -> &StatusDocument {
        &self.status
    }

    /// The validated standalone conditions
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// The options this update was built with
    pub fn options(&self) -> StatusOptions {
        self.options
    }

    /// Decide what to do with `instance`
    ///
    /// A missing or non-object `status` on the instance is treated as empty.
    pub fn decide(&self, instance: Value) -> Decision {
        let observed = observed_status(&instance);

        if self.options.replace {
            if self.status == observed {
                debug!(path = "replace", "status already matches");
                return Decision::NoChange(instance);
            }
            debug!(path = "replace", "status differs, replacing");
            return Decision::Replace(self.status.clone());
        }

        let comparable = strip_last_transition_time(&observed);
        if status_contains(&comparable, &self.status, self.options.replace_lists) {
            debug!(
                path = "merge",
                replace_lists = self.options.replace_lists,
                "desired status already contained"
            );
            return Decision::NoChange(instance);
        }

        // A merge that leaves the stored status as it is would be a no-op write
        let merged = merge_status(&observed, &self.status);
        if merged == observed {
            debug!(path = "merge", "merge leaves status unchanged");
            return Decision::NoChange(instance);
        }

        debug!(
            path = "merge",
            replace_lists = self.options.replace_lists,
            "desired status not contained, patching"
        );
        Decision::Patch(merged)
    }
}

/// The instance's status object, or an empty document
pub fn observed_status(instance: &Value) -> StatusDocument {
    instance
        .get(STATUS_FIELD)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// Copy of `status` with `lastTransitionTime` removed from every condition
///
/// The server may stamp this field on its own; the copy is only for
/// comparison and must never be sent back.
pub fn strip_last_transition_time(status: &StatusDocument) -> StatusDocument {
    let mut stripped = status.clone();
    if let Some(Value::Array(conditions)) = stripped.get_mut(CONDITIONS_FIELD) {
        for condition in conditions.iter_mut() {
            if let Value::Object(fields) = condition {
                fields.remove(FIELD_LAST_TRANSITION_TIME);
            }
        }
    }
    stripped
}

/// `instance` with its status replaced by `status`
pub fn instance_with_status(mut instance: Value, status: StatusDocument) -> Value {
    if let Value::Object(fields) = &mut instance {
        fields.insert(STATUS_FIELD.to_string(), Value::Object(status));
    }
    instance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationErrorKind;
    use serde_json::json;

    fn doc(v: Value) -> StatusDocument {
        v.as_object().cloned().unwrap_or_default()
    }

    fn desired_status(v: Value) -> DesiredState {
        DesiredState {
            status: Some(doc(v)),
            conditions: None,
        }
    }

    fn desired_conditions(v: Value) -> DesiredState {
        DesiredState {
            status: None,
            conditions: v.as_array().cloned(),
        }
    }

    fn instance(status: Value) -> Value {
        json!({
            "apiVersion": "apps.example.com/v1alpha1",
            "kind": "TestCR",
            "metadata": {"name": "my-test", "namespace": "testing"},
            "status": status,
        })
    }

    fn merge_opts() -> StatusOptions {
        StatusOptions::default()
    }

    fn replace_opts() -> StatusOptions {
        StatusOptions {
            replace: true,
            replace_lists: false,
        }
    }

    mod validation {
        use super::*;

        /// Story: conditions cannot be given in two places at once
        #[test]
        fn story_conflicting_inputs_rejected_before_contents() {
            let desired = DesiredState {
                status: Some(doc(json!({"conditions": [{"type": "A", "status": "True"}]}))),
                // Invalid on its own, but the conflict must be reported first
                conditions: Some(vec![json!({"type": "B", "status": "Maybe"})]),
            };
            let err = StatusUpdate::new(desired, merge_opts()).unwrap_err();
            assert!(matches!(err, Error::ConflictingInputs));
        }

        #[test]
        fn test_null_nested_conditions_do_not_conflict() {
            let desired = DesiredState {
                status: Some(doc(json!({"conditions": null}))),
                conditions: Some(vec![json!({"type": "B", "status": "True"})]),
            };
            let update = StatusUpdate::new(desired, merge_opts()).unwrap();
            assert_eq!(
                update.status()["conditions"],
                json!([{"type": "B", "status": "True"}])
            );
        }

        #[test]
        fn test_invalid_condition_fails_validation() {
            let err = StatusUpdate::new(
                desired_conditions(json!([{"type": "X", "status": "Maybe"}])),
                merge_opts(),
            )
            .unwrap_err();
            assert_eq!(
                err.validation_kind(),
                Some(ValidationErrorKind::InvalidEnumValue)
            );
        }

        #[test]
        fn test_conditions_are_normalized_into_status() {
            let update = StatusUpdate::new(
                DesiredState {
                    status: Some(doc(json!({"hello": "world"}))),
                    conditions: Some(vec![json!({
                        "type": "Running",
                        "status": true,
                        "message": null,
                    })]),
                },
                merge_opts(),
            )
            .unwrap();

            assert_eq!(
                Value::Object(update.status().clone()),
                json!({
                    "hello": "world",
                    "conditions": [{"type": "Running", "status": "True"}],
                })
            );
            assert_eq!(update.conditions().len(), 1);
        }

        #[test]
        fn test_nested_conditions_pass_through_unvalidated() {
            let update = StatusUpdate::new(
                desired_status(json!({"conditions": [{"type": "A", "status": "maybe"}]})),
                merge_opts(),
            )
            .unwrap();
            assert!(update.conditions().is_empty());
            assert_eq!(
                update.status()["conditions"],
                json!([{"type": "A", "status": "maybe"}])
            );
        }
    }

    mod merge_path {
        use super::*;

        /// Story: resubmitting identical conditions is a no-op and keeps the
        /// server-stamped transition time
        #[test]
        fn story_identical_conditions_are_no_change() {
            let current = instance(json!({"conditions": [{
                "type": "Running",
                "status": "True",
                "reason": "Started",
                "lastTransitionTime": "2024-01-15T10:30:00Z",
            }]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([
                    {"type": "Running", "status": "True", "reason": "Started"},
                ])),
                merge_opts(),
            )
            .unwrap();

            assert_eq!(update.decide(current.clone()), Decision::NoChange(current));
        }

        /// Story: a status flip is patched with the new condition in place
        #[test]
        fn story_transition_produces_patch() {
            let current = instance(json!({"conditions": [
                {"type": "Running", "status": "True"},
                {"type": "Synced", "status": "True"},
            ]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([{"type": "Running", "status": "False"}])),
                merge_opts(),
            )
            .unwrap();

            let decision = update.decide(current);
            assert!(decision.is_change());
            assert_eq!(decision.action(), "patch");
            match decision {
                Decision::Patch(status) => assert_eq!(
                    status["conditions"],
                    json!([
                        {"type": "Running", "status": "False"},
                        {"type": "Synced", "status": "True"},
                    ])
                ),
                other => panic!("expected patch, got {:?}", other),
            }
        }

        #[test]
        fn test_replace_lists_toggles_plain_list_comparison() {
            let current = instance(json!({"tags": ["a", "b", "c"]}));
            let desired = json!({"tags": ["a", "b"]});

            let lenient = StatusUpdate::new(desired_status(desired.clone()), merge_opts()).unwrap();
            assert!(!lenient.decide(current.clone()).is_change());

            let strict = StatusUpdate::new(
                desired_status(desired),
                StatusOptions {
                    replace: false,
                    replace_lists: true,
                },
            )
            .unwrap();
            match strict.decide(current) {
                Decision::Patch(status) => assert_eq!(status["tags"], json!(["a", "b"])),
                other => panic!("expected patch, got {:?}", other),
            }
        }

        #[test]
        fn test_missing_status_treated_as_empty() {
            let current = json!({"metadata": {"name": "x"}});
            let update =
                StatusUpdate::new(desired_status(json!({"hello": "world"})), merge_opts()).unwrap();
            match update.decide(current) {
                Decision::Patch(status) => {
                    assert_eq!(Value::Object(status), json!({"hello": "world"}))
                }
                other => panic!("expected patch, got {:?}", other),
            }
        }

        #[test]
        fn test_empty_desired_is_no_change() {
            let current = instance(json!({"phase": "Ready"}));
            let update = StatusUpdate::new(DesiredState::default(), merge_opts()).unwrap();
            assert!(!update.decide(current).is_change());
        }

        #[test]
        fn test_patch_overlays_onto_observed() {
            let current = instance(json!({"phase": "Pending", "replicas": 1}));
            let update =
                StatusUpdate::new(desired_status(json!({"phase": "Ready"})), merge_opts()).unwrap();
            match update.decide(current) {
                Decision::Patch(status) => assert_eq!(
                    Value::Object(status),
                    json!({"phase": "Ready", "replicas": 1})
                ),
                other => panic!("expected patch, got {:?}", other),
            }
        }

        #[test]
        fn test_applying_patch_result_converges() {
            let current = instance(json!({"conditions": [
                {"type": "A", "status": "True", "lastTransitionTime": "2024-01-15T10:30:00Z"},
            ]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([
                    {"type": "A", "status": "False", "reason": "Broken"},
                    {"type": "B", "status": "True"},
                ])),
                merge_opts(),
            )
            .unwrap();

            let patched = match update.decide(current.clone()) {
                Decision::Patch(status) => instance_with_status(current, status),
                other => panic!("expected patch, got {:?}", other),
            };
            assert_eq!(update.decide(patched.clone()), Decision::NoChange(patched));
        }
    }

    mod convergence {
        use super::*;

        fn decide_twice(current: Value, update: &StatusUpdate) -> (Decision, Decision) {
            let first = update.decide(current.clone());
            let next = match &first {
                Decision::Patch(status) => instance_with_status(current, status.clone()),
                _ => current,
            };
            (first, update.decide(next))
        }

        /// Story: dropping a message from a condition patches once, then settles
        #[test]
        fn story_dropped_field_converges() {
            let current = instance(json!({"conditions": [{
                "type": "Running",
                "status": "True",
                "reason": "Started",
                "message": "old text",
                "lastTransitionTime": "2024-01-15T10:30:00Z",
            }]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([
                    {"type": "Running", "status": "True", "reason": "Started"},
                ])),
                merge_opts(),
            )
            .unwrap();

            let (first, second) = decide_twice(current, &update);
            match first {
                Decision::Patch(status) => assert_eq!(
                    status["conditions"],
                    json!([{"type": "Running", "status": "True", "reason": "Started"}])
                ),
                other => panic!("expected patch, got {:?}", other),
            }
            assert!(!second.is_change());
        }

        /// Story: a caller-supplied transition time alone never causes a write
        #[test]
        fn story_supplied_transition_time_is_no_change() {
            let current = instance(json!({"conditions": [{
                "type": "Running",
                "status": "True",
                "lastTransitionTime": "2024-01-15T10:30:00Z",
            }]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([{
                    "type": "Running",
                    "status": "True",
                    "lastTransitionTime": "2024-02-01T08:00:00Z",
                }])),
                merge_opts(),
            )
            .unwrap();

            assert_eq!(update.decide(current.clone()), Decision::NoChange(current));
        }

        #[test]
        fn test_server_added_condition_field_converges() {
            let current = instance(json!({"conditions": [
                {"type": "Ready", "status": "True", "observedGeneration": 3},
            ]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([{"type": "Ready", "status": "True"}])),
                merge_opts(),
            )
            .unwrap();

            let (first, second) = decide_twice(current, &update);
            assert_eq!(first.action(), "patch");
            assert!(!second.is_change());
        }
    }

    mod replace_path {
        use super::*;

        #[test]
        fn test_equal_status_is_no_change() {
            let current = instance(json!({"hello": "world"}));
            let update =
                StatusUpdate::new(desired_status(json!({"hello": "world"})), replace_opts())
                    .unwrap();
            assert_eq!(update.decide(current.clone()), Decision::NoChange(current));
        }

        /// Story: replace drops fields the caller no longer sets
        #[test]
        fn story_replace_overwrites_whole_status() {
            let current = instance(json!({
                "hello": "world",
                "stale": true,
                "conditions": [{"type": "A", "status": "True"}],
            }));
            let update = StatusUpdate::new(
                DesiredState {
                    status: Some(doc(json!({"hello": "world"}))),
                    conditions: Some(vec![json!({"type": "B", "status": "False"})]),
                },
                replace_opts(),
            )
            .unwrap();

            let decision = update.decide(current);
            assert_eq!(decision.action(), "replace");
            assert_eq!(
                decision.status().cloned().map(Value::Object),
                Some(json!({
                    "hello": "world",
                    "conditions": [{"type": "B", "status": "False"}],
                }))
            );
        }

        #[test]
        fn test_replace_compares_transition_time() {
            let current = instance(json!({"conditions": [
                {"type": "A", "status": "True", "lastTransitionTime": "2024-01-15T10:30:00Z"},
            ]}));
            let update = StatusUpdate::new(
                desired_conditions(json!([{"type": "A", "status": "True"}])),
                replace_opts(),
            )
            .unwrap();
            assert!(update.decide(current).is_change());
        }
    }

    #[test]
    fn test_strip_last_transition_time_leaves_input_untouched() {
        let status = doc(json!({"conditions": [
            {"type": "A", "status": "True", "lastTransitionTime": "t"},
        ]}));
        let stripped = strip_last_transition_time(&status);
        assert_eq!(stripped["conditions"], json!([{"type": "A", "status": "True"}]));
        assert_eq!(status["conditions"][0]["lastTransitionTime"], "t");
    }

    #[test]
    fn test_instance_with_status() {
        let updated = instance_with_status(instance(json!({})), doc(json!({"a": 1})));
        assert_eq!(updated["status"], json!({"a": 1}));
        assert_eq!(updated["metadata"]["name"], "my-test");
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let opts: StatusOptions = serde_json::from_value(json!({"replaceLists": true})).unwrap();
        assert!(opts.replace_lists);
        assert!(!opts.replace);
    }
}
