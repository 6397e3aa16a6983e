//! Configuration data structures for the hydrator.
//!
//! These types map directly to YAML (also JSON / TOML) schema files. They are
//! serde-friendly and carry defaults so that minimal files stay concise. A
//! file declares the DTOs, the routes that hydrate them, and the ambient
//! server settings.
use serde::{Deserialize, Serialize};

use crate::core::{
    BaseKind, BindingResult, CoercionMode, DtoSchema, SchemaRegistry, TypeDescriptor,
};

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_methods() -> Vec<String> {
    vec!["POST".to_string()]
}

/// Root of a schema file
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HydratorConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub hydration: HydrationConfig,
    #[serde(default)]
    pub dtos: Vec<DtoConfig>,
    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

impl Default for HydratorConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            logging: LoggingConfig::default(),
            hydration: HydrationConfig::default(),
            dtos: Vec::new(),
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
    /// Attach span context to JSON log lines
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            include_spans: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HydrationConfig {
    /// Reject malformed numbers and booleans instead of defaulting them
    pub strict_numbers: bool,
    /// Largest request body the server will buffer
    pub max_body_bytes: usize,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            strict_numbers: false,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl HydrationConfig {
    pub fn coercion_mode(&self) -> CoercionMode {
        if self.strict_numbers {
            CoercionMode::Strict
        } else {
            CoercionMode::Lenient
        }
    }
}

/// One DTO and its fields, in declaration order
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DtoConfig {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// One declared field
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FieldConfig {
    pub name: String,
    /// Tagged source such as `json:user.id`. Omitted only for the reserved
    /// `flags` / `words` command fields.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    /// Element DTO for `array` fields
    #[serde(default)]
    pub element: Option<String>,
    /// Target DTO for `dto` fields
    #[serde(default)]
    pub dto: Option<String>,
    /// Date format for `date` fields
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Int,
    Float,
    Bool,
    Array,
    Object,
    Mixed,
    Date,
    Dto,
}

impl FieldConfig {
    /// Translate the file representation into a type descriptor. Misplaced
    /// `element` / `format` keys are kept so the schema builder rejects them.
    pub fn descriptor(&self) -> TypeDescriptor {
        let base = match self.field_type {
            FieldType::String => BaseKind::String,
            FieldType::Int => BaseKind::Int,
            FieldType::Float => BaseKind::Float,
            FieldType::Bool => BaseKind::Bool,
            FieldType::Array => BaseKind::Array,
            FieldType::Object => BaseKind::Object,
            FieldType::Mixed => BaseKind::Mixed,
            FieldType::Date => BaseKind::Date,
            FieldType::Dto => BaseKind::Dto(self.dto.clone().unwrap_or_default()),
        };

        TypeDescriptor {
            base,
            nullable: self.nullable,
            element: self.element.clone(),
            date_format: self.format.clone(),
        }
    }
}

impl DtoConfig {
    pub fn to_schema(&self) -> BindingResult<DtoSchema> {
        self.fields
            .iter()
            .fold(DtoSchema::builder(&self.name), |builder, field| {
                match &field.source {
                    Some(source) => builder.field(&field.name, source, field.descriptor()),
                    None => builder.command_field(&field.name, field.descriptor()),
                }
            })
            .build()
    }
}

/// Binds an HTTP path pattern to the DTO it hydrates
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RouteConfig {
    /// `matchit` pattern, e.g. `/users/{id}`
    pub path: String,
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
    pub dto: String,
}

impl HydratorConfig {
    /// Build the schema registry for every declared DTO
    pub fn build_registry(&self) -> BindingResult<SchemaRegistry> {
        let mut builder = SchemaRegistry::builder();
        for dto in &self.dtos {
            builder = builder.register(dto.to_schema()?);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, source: Option<&str>, field_type: FieldType) -> FieldConfig {
        FieldConfig {
            name: name.to_string(),
            source: source.map(str::to_string),
            field_type,
            nullable: false,
            element: None,
            dto: None,
            format: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = HydratorConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.hydration.coercion_mode(), CoercionMode::Lenient);
        assert_eq!(config.hydration.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_descriptor_translation() {
        let mut items = field("items", Some("json:items"), FieldType::Array);
        items.element = Some("Item".to_string());
        assert_eq!(items.descriptor(), TypeDescriptor::array_of("Item"));

        let mut born = field("born", Some("formdata:born"), FieldType::Date);
        born.format = Some("Y-m-d".to_string());
        born.nullable = true;
        let descriptor = born.descriptor();
        assert_eq!(descriptor.base, BaseKind::Date);
        assert!(descriptor.nullable);
        assert_eq!(descriptor.date_format.as_deref(), Some("Y-m-d"));
    }

    #[test]
    fn test_date_without_format_is_rejected() {
        let dto = DtoConfig {
            name: "Person".to_string(),
            fields: vec![field("born", Some("json:born"), FieldType::Date)],
        };
        assert!(dto.to_schema().is_err());
    }

    #[test]
    fn test_build_registry() {
        let config = HydratorConfig {
            dtos: vec![
                DtoConfig {
                    name: "Cli".to_string(),
                    fields: vec![
                        field("flags", None, FieldType::Object),
                        field("words", None, FieldType::Array),
                    ],
                },
                DtoConfig {
                    name: "User".to_string(),
                    fields: vec![field("id", Some("var:id"), FieldType::String)],
                },
            ],
            ..HydratorConfig::default()
        };

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.names(), vec!["Cli", "User"]);
    }

    #[test]
    fn test_unknown_nested_dto_is_rejected() {
        let mut address = field("address", Some("json:address"), FieldType::Dto);
        address.dto = Some("Address".to_string());
        let config = HydratorConfig {
            dtos: vec![DtoConfig {
                name: "User".to_string(),
                fields: vec![address],
            }],
            ..HydratorConfig::default()
        };

        assert!(config.build_registry().is_err());
    }
}
