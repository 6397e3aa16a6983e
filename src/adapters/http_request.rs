//! [`RawRequestView`] over a buffered `http` request.
use std::collections::HashMap;

use axum::body::Body;
use bytes::Bytes;
use http::{HeaderMap, Request, header, request::Parts};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use thiserror::Error;
use url::form_urlencoded;

use crate::ports::{ParameterValue, RawRequestView};

#[derive(Debug, Error)]
pub enum HttpViewError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(String),
}

/// Decoded body, chosen by `Content-Type`
#[derive(Debug, Clone, Default)]
enum DecodedBody {
    Json(Value),
    Form(HashMap<String, String>),
    #[default]
    None,
}

/// Read-only snapshot of an HTTP request: headers, query string, route
/// variables and a body decoded once up front.
#[derive(Debug, Clone)]
pub struct HttpRequestView {
    headers: HeaderMap,
    query: HashMap<String, ParameterValue>,
    vars: HashMap<String, String>,
    body: DecodedBody,
}

impl HttpRequestView {
    /// Build from request parts and an already buffered body
    pub fn from_parts(parts: &Parts, body: &Bytes, vars: HashMap<String, String>) -> Self {
        let query = parts.uri.query().map(parse_query).unwrap_or_default();

        Self {
            headers: parts.headers.clone(),
            query,
            vars,
            body: decode_body(&parts.headers, body),
        }
    }

    /// Buffer the body of `request`, refusing anything above `limit` bytes
    pub async fn from_request(
        request: Request<Body>,
        vars: HashMap<String, String>,
        limit: usize,
    ) -> Result<Self, HttpViewError> {
        let (parts, body) = request.into_parts();

        let bytes = Limited::new(body, limit)
            .collect()
            .await
            .map_err(|e| {
                if e.downcast_ref::<LengthLimitError>().is_some() {
                    HttpViewError::BodyTooLarge { limit }
                } else {
                    HttpViewError::Body(e.to_string())
                }
            })?
            .to_bytes();

        Ok(Self::from_parts(&parts, &bytes, vars))
    }
}

impl RawRequestView for HttpRequestView {
    fn header(&self, key: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(key)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Query string first, then route variables
    fn parameter(&self, key: &str) -> Option<ParameterValue> {
        self.query
            .get(key)
            .cloned()
            .or_else(|| self.vars.get(key).cloned().map(ParameterValue::Single))
    }

    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn json_payload(&self) -> Option<&Value> {
        match &self.body {
            DecodedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    fn form_data(&self) -> Option<&HashMap<String, String>> {
        match &self.body {
            DecodedBody::Form(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Repeated keys and `key[]` keys collect into lists
fn parse_query(query: &str) -> HashMap<String, ParameterValue> {
    let mut params: HashMap<String, ParameterValue> = HashMap::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        let (key, forced_list) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_string(), true),
            None => (key.into_owned(), false),
        };

        let entry = match params.remove(&key) {
            None if forced_list => ParameterValue::Multiple(vec![value]),
            None => ParameterValue::Single(value),
            Some(ParameterValue::Single(first)) => ParameterValue::Multiple(vec![first, value]),
            Some(ParameterValue::Multiple(mut values)) => {
                values.push(value);
                ParameterValue::Multiple(values)
            }
        };
        params.insert(key, entry);
    }

    params
}

fn decode_body(headers: &HeaderMap, body: &Bytes) -> DecodedBody {
    if body.is_empty() {
        return DecodedBody::None;
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "application/json" || content_type.ends_with("+json") {
        return match serde_json::from_slice(body) {
            Ok(value) => DecodedBody::Json(value),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring request body that is not valid JSON");
                DecodedBody::None
            }
        };
    }

    if content_type == "application/x-www-form-urlencoded" {
        return DecodedBody::Form(form_urlencoded::parse(body).into_owned().collect());
    }

    tracing::debug!(content_type, "request body has no decoder");
    DecodedBody::None
}
