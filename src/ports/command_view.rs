use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value of a parsed command-line flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// `--name=value` or `--name value`
    Text(String),
    /// `--name`, `-n` or `--no-name`
    Switch(bool),
}

impl FlagValue {
    pub fn to_json(&self) -> Value {
        match self {
            FlagValue::Text(text) => Value::String(text.clone()),
            FlagValue::Switch(on) => Value::Bool(*on),
        }
    }
}

/// CommandView defines the port for the matched command of a command-line
/// invocation. Its flags and words feed the reserved `flags` / `words` fields.
pub trait CommandView: Send + Sync {
    fn flags(&self) -> &BTreeMap<String, FlagValue>;

    fn words(&self) -> &[String];
}
