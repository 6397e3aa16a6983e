use std::{
    collections::{HashMap, HashSet},
    net::SocketAddr,
};

use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::models::{DtoConfig, FieldType, HydratorConfig, RouteConfig};

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("invalid identifier regex")
});

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Route conflict detected: {message}")]
    RouteConflict { message: String },

    #[error("Invalid dto declaration: {message}")]
    InvalidDto { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Schema file validator
pub struct HydratorConfigValidator;

impl HydratorConfigValidator {
    /// Validate the entire configuration, collecting every problem found
    pub fn validate(config: &HydratorConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }

        if config.hydration.max_body_bytes == 0 {
            errors.push(ValidationError::InvalidField {
                field: "hydration.max_body_bytes".to_string(),
                message: "Body limit must be greater than zero".to_string(),
            });
        }

        if config.dtos.is_empty() {
            errors.push(ValidationError::MissingField {
                field: "dtos".to_string(),
            });
        }

        for dto in &config.dtos {
            errors.extend(Self::validate_dto(dto));
        }

        // Structural field problems would only be reported again, less precisely
        if errors.is_empty()
            && let Err(e) = config.build_registry()
        {
            errors.push(ValidationError::InvalidDto {
                message: e.to_string(),
            });
        }

        let declared: HashSet<&str> = config.dtos.iter().map(|dto| dto.name.as_str()).collect();
        for route in &config.routes {
            errors.extend(Self::validate_route(route, &declared));
        }

        errors.extend(Self::check_route_conflicts(&config.routes));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Per-field checks the schema builder cannot phrase in file terms
    fn validate_dto(dto: &DtoConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !IDENTIFIER.is_match(&dto.name) {
            errors.push(ValidationError::InvalidField {
                field: format!("dto '{}' name", dto.name),
                message: "Dto names must be identifiers".to_string(),
            });
        }

        for field in &dto.fields {
            let context = format!("dto '{}' field '{}'", dto.name, field.name);

            if field.field_type == FieldType::Dto && field.dto.is_none() {
                errors.push(ValidationError::MissingField {
                    field: format!("{context} dto"),
                });
            }

            if field.field_type != FieldType::Dto && field.dto.is_some() {
                errors.push(ValidationError::InvalidField {
                    field: context.clone(),
                    message: "'dto' is only allowed on fields of type dto".to_string(),
                });
            }

            if field.field_type == FieldType::Date && field.format.is_none() {
                errors.push(ValidationError::MissingField {
                    field: format!("{context} format"),
                });
            }
        }

        errors
    }

    fn validate_route(route: &RouteConfig, declared: &HashSet<&str>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let path = &route.path;

        if !path.starts_with('/') {
            errors.push(ValidationError::InvalidField {
                field: format!("route path: {path}"),
                message: "Route paths must start with '/'".to_string(),
            });
        }

        if route.methods.is_empty() {
            errors.push(ValidationError::MissingField {
                field: format!("route '{path}' methods"),
            });
        }

        for method in &route.methods {
            if Method::from_bytes(method.to_uppercase().as_bytes()).is_err() {
                errors.push(ValidationError::InvalidField {
                    field: format!("route '{path}' method"),
                    message: format!("Invalid HTTP method: '{method}'"),
                });
            }
        }

        if !declared.contains(route.dto.as_str()) {
            errors.push(ValidationError::InvalidField {
                field: format!("route '{path}' dto"),
                message: format!("Unknown dto: '{}'", route.dto),
            });
        }

        errors
    }

    /// Reject routes the router would refuse: the same method on two
    /// overlapping patterns
    fn check_route_conflicts(routes: &[RouteConfig]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut routers: HashMap<String, matchit::Router<()>> = HashMap::new();

        for route in routes.iter().filter(|route| route.path.starts_with('/')) {
            for method in &route.methods {
                let router = routers.entry(method.to_uppercase()).or_default();
                if let Err(e) = router.insert(route.path.clone(), ()) {
                    errors.push(ValidationError::RouteConflict {
                        message: format!("{method} {}: {e}", route.path),
                    });
                }
            }
        }

        errors
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::FieldConfig;

    fn field(name: &str, source: &str, field_type: FieldType) -> FieldConfig {
        FieldConfig {
            name: name.to_string(),
            source: Some(source.to_string()),
            field_type,
            nullable: false,
            element: None,
            dto: None,
            format: None,
        }
    }

    fn minimal_valid_config() -> HydratorConfig {
        HydratorConfig {
            dtos: vec![DtoConfig {
                name: "CreateUser".to_string(),
                fields: vec![
                    field("id", "var:id", FieldType::String),
                    field("name", "json:name", FieldType::String),
                ],
            }],
            routes: vec![RouteConfig {
                path: "/users/{id}".to_string(),
                methods: vec!["PUT".to_string()],
                dto: "CreateUser".to_string(),
            }],
            ..HydratorConfig::default()
        }
    }

    fn message(config: &HydratorConfig) -> String {
        match HydratorConfigValidator::validate(config) {
            Err(ValidationError::ValidationFailed { message }) => message,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_minimal_config() {
        assert!(HydratorConfigValidator::validate(&minimal_valid_config()).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let mut config = minimal_valid_config();
        config.listen_addr = "localhost".to_string();

        assert!(message(&config).contains("Invalid listen address"));
    }

    #[test]
    fn validate_rejects_unknown_route_dto() {
        let mut config = minimal_valid_config();
        config.routes[0].dto = "DeleteUser".to_string();

        assert!(message(&config).contains("Unknown dto: 'DeleteUser'"));
    }

    #[test]
    fn validate_rejects_invalid_method() {
        let mut config = minimal_valid_config();
        config.routes[0].methods = vec!["GE T".to_string()];

        assert!(message(&config).contains("Invalid HTTP method"));
    }

    #[test]
    fn validate_reports_binding_errors() {
        let mut config = minimal_valid_config();
        config.dtos[0]
            .fields
            .push(field("token", "cookie:token", FieldType::String));

        assert!(message(&config).contains("does not contain type"));
    }

    #[test]
    fn validate_rejects_conflicting_routes() {
        let mut config = minimal_valid_config();
        config.routes.push(RouteConfig {
            path: "/users/{user}".to_string(),
            methods: vec!["PUT".to_string()],
            dto: "CreateUser".to_string(),
        });

        assert!(message(&config).contains("Route conflict"));
    }

    #[test]
    fn validate_collects_every_error() {
        let mut config = minimal_valid_config();
        config.listen_addr = "nowhere".to_string();
        config.routes[0].path = "users".to_string();
        config.routes[0].dto = "Missing".to_string();

        assert!(message(&config).starts_with("Found 3 validation errors"));
    }

    #[test]
    fn validate_requires_date_format() {
        let mut config = minimal_valid_config();
        config.dtos[0]
            .fields
            .push(field("born", "json:born", FieldType::Date));

        assert!(message(&config).contains("format"));
    }
}
