//! Binding failures raised by the hydration engine.
//!
//! Every variant is terminal for the hydration that produced it: the
//! orchestrator stops at the first offending field and no partially populated
//! DTO escapes. Translating an error into a protocol response (an HTTP status,
//! a CLI exit code) is the caller's job; [`BindingError::status_code`] and
//! [`BindingError::error_code`] exist to make that translation uniform.
use serde_json::{Value, json};
use thiserror::Error;

use crate::core::source::SourceKind;

/// Result alias used throughout the engine
pub type BindingResult<T> = Result<T, BindingError>;

/// Error raised while declaring or hydrating a DTO
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BindingError {
    /// Malformed declaration: unknown source prefix, a type the source cannot
    /// carry, a dangling DTO reference or a cyclic DTO graph.
    #[error("binding spec error for '{field}': {message}")]
    BindingSpec { field: String, message: String },

    /// A json or formdata field was requested but the request carries no such body
    #[error("unable to parse property: {field} because {source_kind} body is empty")]
    MissingBody {
        field: String,
        source_kind: SourceKind,
    },

    /// A json value's runtime shape disagrees with the declared type
    #[error("error reading key: {key} for property: {field}. found {found} while expecting {expected}")]
    TypeMismatch {
        field: String,
        key: String,
        found: String,
        expected: String,
    },

    /// A date field did not parse under its declared format
    #[error("unable to parse property: {field} because format \"{format}\" does not match \"{value}\"")]
    DateFormat {
        field: String,
        format: String,
        value: String,
    },

    /// Hydration was requested for a DTO name the registry does not know
    #[error("unknown dto type: {0}")]
    UnknownDto(String),
}

impl BindingError {
    pub fn binding_spec(field: impl Into<String>, message: impl Into<String>) -> Self {
        BindingError::BindingSpec {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn type_mismatch(
        field: impl Into<String>,
        key: impl Into<String>,
        found: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        BindingError::TypeMismatch {
            field: field.into(),
            key: key.into(),
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Qualify the failing field with the path of the nested DTO it sits in,
    /// so `id` inside the second `items` element reads `items.1.id`
    pub(crate) fn within(self, parent: &str) -> Self {
        let qualify = |field: String| format!("{parent}.{field}");
        match self {
            BindingError::BindingSpec { field, message } => BindingError::BindingSpec {
                field: qualify(field),
                message,
            },
            BindingError::MissingBody { field, source_kind } => BindingError::MissingBody {
                field: qualify(field),
                source_kind,
            },
            BindingError::TypeMismatch {
                field,
                key,
                found,
                expected,
            } => BindingError::TypeMismatch {
                field: qualify(field),
                key,
                found,
                expected,
            },
            BindingError::DateFormat {
                field,
                format,
                value,
            } => BindingError::DateFormat {
                field: qualify(field),
                format,
                value,
            },
            other @ BindingError::UnknownDto(_) => other,
        }
    }

    /// True for errors caused by the incoming request rather than by the declarations
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BindingError::MissingBody { .. }
                | BindingError::TypeMismatch { .. }
                | BindingError::DateFormat { .. }
        )
    }

    /// HTTP status code the error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            BindingError::MissingBody { .. } => 400,
            BindingError::TypeMismatch { .. } => 422,
            BindingError::DateFormat { .. } => 422,
            BindingError::BindingSpec { .. } => 500,
            BindingError::UnknownDto(_) => 500,
        }
    }

    /// Stable machine-readable code
    pub fn error_code(&self) -> &'static str {
        match self {
            BindingError::BindingSpec { .. } => "BINDING_SPEC_ERROR",
            BindingError::MissingBody { .. } => "MISSING_BODY",
            BindingError::TypeMismatch { .. } => "TYPE_MISMATCH",
            BindingError::DateFormat { .. } => "DATE_FORMAT_ERROR",
            BindingError::UnknownDto(_) => "UNKNOWN_DTO",
        }
    }

    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            BindingError::BindingSpec { .. } => "binding_spec",
            BindingError::MissingBody { .. } => "missing_body",
            BindingError::TypeMismatch { .. } => "type_mismatch",
            BindingError::DateFormat { .. } => "date_format",
            BindingError::UnknownDto(_) => "unknown_dto",
        }
    }

    /// JSON body suitable for an error response
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "code": self.error_code(),
            "message": self.to_string(),
        });

        match self {
            BindingError::MissingBody { field, .. }
            | BindingError::TypeMismatch { field, .. }
            | BindingError::DateFormat { field, .. }
            | BindingError::BindingSpec { field, .. } => {
                body["field"] = json!(field);
            }
            BindingError::UnknownDto(_) => {}
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_prefixes_the_field_path() {
        let err = BindingError::type_mismatch("id", "id", "string", "int")
            .within("items.1")
            .within("order");
        assert_eq!(err.to_json()["field"], json!("order.items.1.id"));

        let err = BindingError::UnknownDto("Line".to_string()).within("items.0");
        assert_eq!(err, BindingError::UnknownDto("Line".to_string()));
    }

    #[test]
    fn client_errors_map_to_4xx() {
        let err = BindingError::MissingBody {
            field: "name".to_string(),
            source_kind: SourceKind::Json,
        };
        assert!(err.is_client_error());
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            "unable to parse property: name because json body is empty"
        );

        let err = BindingError::type_mismatch("age", "person.age", "string", "int");
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn spec_errors_map_to_5xx() {
        let err = BindingError::binding_spec("id", "key: id does not contain type");
        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.kind(), "binding_spec");
    }

    #[test]
    fn json_body_names_the_field() {
        let err = BindingError::DateFormat {
            field: "born".to_string(),
            format: "Y-m-d".to_string(),
            value: "not-a-date".to_string(),
        };
        let body = err.to_json();
        assert_eq!(body["error"], json!(true));
        assert_eq!(body["code"], json!("DATE_FORMAT_ERROR"));
        assert_eq!(body["field"], json!("born"));
    }
}
