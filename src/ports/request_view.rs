use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A query or path parameter: a single value or a repeated one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParameterValue {
    /// JSON form used when the value is assigned verbatim
    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::Single(value) => Value::String(value.clone()),
            ParameterValue::Multiple(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(value: &str) -> Self {
        ParameterValue::Single(value.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(value: String) -> Self {
        ParameterValue::Single(value)
    }
}

impl From<Vec<String>> for ParameterValue {
    fn from(values: Vec<String>) -> Self {
        ParameterValue::Multiple(values)
    }
}

/// RawRequestView defines the port (interface) through which the engine reads an
/// already materialized request. Implementations are read-only snapshots.
pub trait RawRequestView: Send + Sync {
    /// Header value, multiple occurrences joined with `", "`
    fn header(&self, key: &str) -> Option<String>;

    /// Query or path parameter
    fn parameter(&self, key: &str) -> Option<ParameterValue>;

    /// Route variable captured by the router
    fn var(&self, key: &str) -> Option<String>;

    /// Decoded JSON body, `None` when the request carries none
    fn json_payload(&self) -> Option<&Value>;

    /// Decoded form body, `None` when the request carries none
    fn form_data(&self) -> Option<&HashMap<String, String>>;
}

/// A view with nothing in it, used when hydrating outside an HTTP request
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRequest;

impl RawRequestView for EmptyRequest {
    fn header(&self, _key: &str) -> Option<String> {
        None
    }

    fn parameter(&self, _key: &str) -> Option<ParameterValue> {
        None
    }

    fn var(&self, _key: &str) -> Option<String> {
        None
    }

    fn json_payload(&self) -> Option<&Value> {
        None
    }

    fn form_data(&self) -> Option<&HashMap<String, String>> {
        None
    }
}
