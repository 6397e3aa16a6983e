use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::{ParameterValue, RawRequestView};

/// Request snapshot held entirely in memory.
///
/// Used by tests and by the `hydrate --fixture` command, whose fixture files
/// deserialize straight into this type. Header names are case-insensitive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryRequest {
    headers: HashMap<String, String>,
    parameters: HashMap<String, ParameterValue>,
    vars: HashMap<String, String>,
    json: Option<Value>,
    form: Option<HashMap<String, String>>,
}

impl InMemoryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowercase header names read from a fixture
    pub fn normalized(mut self) -> Self {
        self.headers = self
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        self
    }

    /// Add a header. Repeating a name appends with `", "`.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        self.headers
            .entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, payload: Value) -> Self {
        self.json = Some(payload);
        self
    }

    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

impl RawRequestView for InMemoryRequest {
    fn header(&self, key: &str) -> Option<String> {
        self.headers.get(&key.to_ascii_lowercase()).cloned()
    }

    fn parameter(&self, key: &str) -> Option<ParameterValue> {
        self.parameters.get(key).cloned()
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn json_payload(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    fn form_data(&self) -> Option<&HashMap<String, String>> {
        self.form.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn headers_are_case_insensitive_and_joined() {
        let request = InMemoryRequest::new()
            .header("Accept", "text/html")
            .header("accept", "application/json");

        assert_eq!(
            RawRequestView::header(&request, "ACCEPT").as_deref(),
            Some("text/html, application/json")
        );
        assert!(RawRequestView::header(&request, "x-missing").is_none());
    }

    #[test]
    fn fixture_deserializes() {
        let fixture = json!({
            "headers": { "X-Token": "abc" },
            "parameters": { "tag": ["a", "b"], "page": "2" },
            "vars": { "id": "7" },
            "json": { "name": "Ada" }
        });

        let request: InMemoryRequest = serde_json::from_value(fixture).unwrap();
        let request = request.normalized();

        assert_eq!(RawRequestView::header(&request, "x-token").as_deref(), Some("abc"));
        assert_eq!(
            RawRequestView::parameter(&request, "tag"),
            Some(ParameterValue::Multiple(vec!["a".into(), "b".into()]))
        );
        assert_eq!(RawRequestView::parameter(&request, "page"), Some(ParameterValue::Single("2".into())));
        assert_eq!(RawRequestView::var(&request, "id").as_deref(), Some("7"));
        assert_eq!(request.json_payload(), Some(&json!({ "name": "Ada" })));
        assert!(request.form_data().is_none());
    }
}
