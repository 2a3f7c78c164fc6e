//! Condition model and validation
//!
//! Conditions follow the Kubernetes API conventions: a `type` that is unique
//! within the list, a tri-state `status`, and optional `reason`, `message` and
//! timestamps. Caller-supplied conditions are untyped JSON; [`validate_conditions`]
//! checks them against the fixed field grammar and produces typed [`Condition`]s.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ValidationError, ValidationErrorKind};

/// Key of the condition identity field
pub const FIELD_TYPE: &str = "type";
/// Key of the condition status field
pub const FIELD_STATUS: &str = "status";
/// Key of the machine-readable reason
pub const FIELD_REASON: &str = "reason";
/// Key of the human-readable message
pub const FIELD_MESSAGE: &str = "message";
/// Key of the last heartbeat timestamp
pub const FIELD_LAST_HEARTBEAT_TIME: &str = "lastHeartbeatTime";
/// Key of the last transition timestamp
pub const FIELD_LAST_TRANSITION_TIME: &str = "lastTransitionTime";

/// Every field a condition may carry
pub const CONDITION_FIELDS: [&str; 6] = [
    FIELD_TYPE,
    FIELD_STATUS,
    FIELD_REASON,
    FIELD_MESSAGE,
    FIELD_LAST_HEARTBEAT_TIME,
    FIELD_LAST_TRANSITION_TIME,
];

const REQUIRED_FIELDS: [&str; 2] = [FIELD_TYPE, FIELD_STATUS];
const TIMESTAMP_FIELDS: [&str; 2] = [FIELD_LAST_HEARTBEAT_TIME, FIELD_LAST_TRANSITION_TIME];

static CAMEL_CASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Z]*[a-z]*)+$").expect("camel case pattern is valid")
});

static RFC3339_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d\d-\d\d[T ]\d\d:\d\d(:\d\d)?(\.\d+)?(([+-]\d\d:\d\d)|Z)$")
        .expect("rfc3339 pattern is valid")
});

/// Condition status following Kubernetes conventions
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConditionStatus {
    /// Condition is true
    True,
    /// Condition is false
    False,
    /// Condition status is unknown
    #[default]
    Unknown,
}

impl ConditionStatus {
    /// Wire representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "True",
            Self::False => "False",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "True" => Ok(Self::True),
            "False" => Ok(Self::False),
            "Unknown" => Ok(Self::Unknown),
            other => Err(format!(
                "must be one of [\"True\", \"False\", \"Unknown\"], not {}",
                other
            )),
        }
    }
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

/// Kubernetes-style condition for status reporting
///
/// Optional fields that are `None` are omitted on serialization, so a
/// condition never carries explicit nulls into a status document.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (e.g., Running, Available)
    #[serde(rename = "type")]
    pub type_: String,

    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,

    /// Machine-readable reason, a single CamelCase word
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition was probed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat_time: Option<String>,

    /// Last time the condition transitioned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    /// Create a condition with only the required fields set
    pub fn new(type_: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: None,
            message: None,
            last_heartbeat_time: None,
            last_transition_time: None,
        }
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the last transition time
    pub fn with_last_transition_time(mut self, time: impl Into<String>) -> Self {
        self.last_transition_time = Some(time.into());
        self
    }

    /// Convert into the JSON object placed under `status.conditions`
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        obj.insert(FIELD_TYPE.to_string(), Value::String(self.type_.clone()));
        obj.insert(
            FIELD_STATUS.to_string(),
            Value::String(self.status.as_str().to_string()),
        );
        let optional = [
            (FIELD_REASON, &self.reason),
            (FIELD_MESSAGE, &self.message),
            (FIELD_LAST_HEARTBEAT_TIME, &self.last_heartbeat_time),
            (FIELD_LAST_TRANSITION_TIME, &self.last_transition_time),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                obj.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        Value::Object(obj)
    }
}

/// Validate and normalize a list of raw condition records
///
/// Normalization drops explicit nulls and coerces a boolean `status` to
/// `"True"`/`"False"`. Nothing else is coerced: `"true"` is rejected.
pub fn validate_conditions(raw: &[Value]) -> Result<Vec<Condition>, ValidationError> {
    let mut seen = HashSet::new();
    let mut conditions = Vec::with_capacity(raw.len());

    for (index, value) in raw.iter().enumerate() {
        let condition = validate_condition(index, value)?;
        if !seen.insert(condition.type_.clone()) {
            return Err(ValidationError::for_field(
                ValidationErrorKind::DuplicateType,
                index,
                FIELD_TYPE,
                format!("condition type {} appears more than once", condition.type_),
            ));
        }
        conditions.push(condition);
    }

    Ok(conditions)
}

fn validate_condition(index: usize, value: &Value) -> Result<Condition, ValidationError> {
    let obj = value.as_object().ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::NotAnObject,
            index,
            "`conditions` must be a list of objects",
        )
    })?;

    let mut fields: Map<String, Value> = obj
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    if let Some(Value::Bool(b)) = fields.get(FIELD_STATUS) {
        let coerced = ConditionStatus::from(*b).as_str().to_string();
        fields.insert(FIELD_STATUS.to_string(), Value::String(coerced));
    }

    if let Some(key) = fields.keys().find(|k| !CONDITION_FIELDS.contains(&k.as_str())) {
        return Err(ValidationError::for_field(
            ValidationErrorKind::UnknownField,
            index,
            key.clone(),
            format!(
                "{} is not a valid field for a condition, accepted fields are {:?}",
                key, CONDITION_FIELDS
            ),
        ));
    }

    for key in REQUIRED_FIELDS {
        let present = match fields.get(key) {
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
            None => false,
        };
        if !present {
            return Err(ValidationError::for_field(
                ValidationErrorKind::MissingRequiredField,
                index,
                key,
                format!("condition `{}` must be set", key),
            ));
        }
    }

    let type_ = string_field(&fields, index, FIELD_TYPE)?.unwrap_or_default();

    let status = match fields.get(FIELD_STATUS) {
        Some(Value::String(s)) => s.parse::<ConditionStatus>().map_err(|msg| {
            ValidationError::for_field(
                ValidationErrorKind::InvalidEnumValue,
                index,
                FIELD_STATUS,
                format!("condition 'status' {}", msg),
            )
        })?,
        other => {
            return Err(ValidationError::for_field(
                ValidationErrorKind::InvalidEnumValue,
                index,
                FIELD_STATUS,
                format!(
                    "condition 'status' must be one of [\"True\", \"False\", \"Unknown\"], not {}",
                    other.map(Value::to_string).unwrap_or_default()
                ),
            ))
        }
    };

    let reason = string_field(&fields, index, FIELD_REASON)?;
    if let Some(r) = reason.as_deref() {
        if !r.is_empty() && !CAMEL_CASE.is_match(r) {
            return Err(ValidationError::for_field(
                ValidationErrorKind::InvalidFormat,
                index,
                FIELD_REASON,
                format!("condition 'reason' must be a single, CamelCase word, not {}", r),
            ));
        }
    }

    for key in TIMESTAMP_FIELDS {
        if let Some(ts) = string_field(&fields, index, key)? {
            if !ts.is_empty() && !RFC3339_DATETIME.is_match(&ts) {
                return Err(ValidationError::for_field(
                    ValidationErrorKind::InvalidFormat,
                    index,
                    key,
                    format!("'{}' must be an RFC3339 compliant datetime string, not {}", key, ts),
                ));
            }
        }
    }

    Ok(Condition {
        type_,
        status,
        reason,
        message: string_field(&fields, index, FIELD_MESSAGE)?,
        last_heartbeat_time: string_field(&fields, index, FIELD_LAST_HEARTBEAT_TIME)?,
        last_transition_time: string_field(&fields, index, FIELD_LAST_TRANSITION_TIME)?,
    })
}

fn string_field(
    fields: &Map<String, Value>,
    index: usize,
    key: &str,
) -> Result<Option<String>, ValidationError> {
    match fields.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ValidationError::for_field(
            ValidationErrorKind::InvalidFormat,
            index,
            key,
            format!("condition '{}' must be a string, not {}", key, other),
        )),
    }
}
