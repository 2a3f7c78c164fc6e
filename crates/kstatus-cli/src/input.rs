//! Structured input parsing
//!
//! Flags that take documents accept inline YAML or JSON, or `@path` to read
//! the document from a file. YAML is a superset of JSON, so one parser
//! covers both.

use std::path::PathBuf;

use serde_json::Value;

use kstatus_common::StatusDocument;

use crate::{Error, Result};

/// Parse `raw` (inline or `@path`) into a JSON value
pub fn read_value(what: &str, raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => {
            let path = PathBuf::from(path);
            std::fs::read_to_string(&path).map_err(|source| Error::Io { path, source })?
        }
        None => raw.to_string(),
    };
    serde_yaml::from_str(&text).map_err(|e| Error::invalid_input(what, e.to_string()))
}

/// Parse a status document; `null` is an empty document
pub fn read_status(raw: &str) -> Result<StatusDocument> {
    match read_value("status", raw)? {
        Value::Object(doc) => Ok(doc),
        Value::Null => Ok(StatusDocument::new()),
        other => Err(Error::invalid_input(
            "status",
            format!("expected an object, got {}", other),
        )),
    }
}

/// Parse a list of raw condition records
pub fn read_conditions(raw: &str) -> Result<Vec<Value>> {
    match read_value("conditions", raw)? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(Error::invalid_input(
            "conditions",
            format!("expected a list, got {}", other),
        )),
    }
}
