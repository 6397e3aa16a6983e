//! DTO registration.
//!
//! A [`DtoSchema`] is the statically built replacement for runtime
//! reflection: an ordered list of fields, each carrying its parsed binding
//! and its type descriptor. Schemas are collected into a [`SchemaRegistry`],
//! which doubles as the factory table nested bindings use to look up element
//! types by name. Every check that can be made without a request is made
//! here, once, so that hydration only ever fails on request data.
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use serde::de::DeserializeOwned;

use crate::core::{
    date::DateFormat,
    descriptor::{BaseKind, TypeDescriptor},
    error::{BindingError, BindingResult},
    source::{FLAGS_FIELD, FieldSpec, SourceKind},
};

/// One declared field with its binding and resolved metadata
#[derive(Debug, Clone)]
pub struct BoundField {
    pub spec: FieldSpec,
    pub descriptor: TypeDescriptor,
    pub(crate) date_format: Option<DateFormat>,
}

impl BoundField {
    pub fn name(&self) -> &str {
        &self.spec.field_name
    }

    pub fn date_format(&self) -> Option<&DateFormat> {
        self.date_format.as_ref()
    }
}

/// Ordered field declarations of one DTO type
#[derive(Debug, Clone)]
pub struct DtoSchema {
    name: String,
    fields: Vec<BoundField>,
}

impl DtoSchema {
    pub fn builder(name: impl Into<String>) -> DtoSchemaBuilder {
        DtoSchemaBuilder {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[BoundField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&BoundField> {
        self.fields.iter().find(|field| field.name() == name)
    }
}

enum Binding {
    Tagged(String),
    Command,
}

/// Builder collecting field declarations before validating them together
pub struct DtoSchemaBuilder {
    name: String,
    entries: Vec<(String, Binding, TypeDescriptor)>,
}

impl DtoSchemaBuilder {
    /// Declare a field bound through a tagged declaration (`json:id`, ...)
    pub fn field(
        mut self,
        name: impl Into<String>,
        declaration: impl Into<String>,
        descriptor: TypeDescriptor,
    ) -> Self {
        self.entries
            .push((name.into(), Binding::Tagged(declaration.into()), descriptor));
        self
    }

    /// Declare one of the reserved `flags` / `words` command fields
    pub fn command_field(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        self.entries.push((name.into(), Binding::Command, descriptor));
        self
    }

    /// Parse and validate every declaration
    pub fn build(self) -> BindingResult<DtoSchema> {
        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(self.entries.len());

        for (field_name, binding, descriptor) in self.entries {
            let attribute = |err| qualify(&self.name, err);

            if !seen.insert(field_name.clone()) {
                return Err(BindingError::binding_spec(
                    format!("{}.{field_name}", self.name),
                    "field is declared more than once",
                ));
            }

            let spec = match binding {
                Binding::Tagged(declaration) => FieldSpec::parse(&field_name, &declaration),
                Binding::Command => FieldSpec::command(&field_name),
            }
            .map_err(attribute)?;

            check_source_restriction(&spec, &descriptor).map_err(attribute)?;
            let date_format = descriptor.resolve(&field_name).map_err(attribute)?;

            fields.push(BoundField {
                spec,
                descriptor,
                date_format,
            });
        }

        Ok(DtoSchema {
            name: self.name,
            fields,
        })
    }
}

fn qualify(dto: &str, err: BindingError) -> BindingError {
    match err {
        BindingError::BindingSpec { field, message } => BindingError::BindingSpec {
            field: format!("{dto}.{field}"),
            message,
        },
        other => other,
    }
}

/// Reject types a source kind cannot deliver
fn check_source_restriction(spec: &FieldSpec, descriptor: &TypeDescriptor) -> BindingResult<()> {
    let base = &descriptor.base;
    let plain_array = *base == BaseKind::Array && descriptor.element.is_none();

    let allowed = match spec.source_kind {
        SourceKind::Header | SourceKind::Parameter => {
            matches!(base, BaseKind::String | BaseKind::Mixed) || plain_array
        }
        SourceKind::Var => matches!(base, BaseKind::String | BaseKind::Mixed),
        SourceKind::FormData => base.is_scalar() || matches!(base, BaseKind::Date | BaseKind::Mixed),
        SourceKind::Json => true,
        SourceKind::Command if spec.field_name == FLAGS_FIELD => {
            matches!(base, BaseKind::Object | BaseKind::Mixed)
        }
        SourceKind::Command => matches!(base, BaseKind::Mixed) || plain_array,
    };

    if allowed {
        return Ok(());
    }

    let expected = match spec.source_kind {
        SourceKind::Header | SourceKind::Parameter => "string, ?string, array or ?array",
        SourceKind::Var => "string or ?string",
        SourceKind::FormData => "string, int, float, bool or date",
        SourceKind::Command if spec.field_name == FLAGS_FIELD => "object",
        SourceKind::Command => "array",
        SourceKind::Json => "any type",
    };

    Err(BindingError::binding_spec(
        &spec.field_name,
        format!(
            "property: {} bound to {} must be of type {expected}, found {}",
            spec.field_name,
            spec.source_kind,
            descriptor.describe()
        ),
    ))
}

/// A DTO whose schema is declared alongside its Rust type
pub trait Dto: DeserializeOwned {
    /// Registered name of the DTO
    const NAME: &'static str;

    fn schema() -> BindingResult<DtoSchema>;
}

/// Read-only table of every registered DTO, keyed by name
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<DtoSchema>>,
}

impl SchemaRegistry {
    pub fn builder() -> SchemaRegistryBuilder {
        SchemaRegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DtoSchema>> {
        self.schemas.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[derive(Default)]
pub struct SchemaRegistryBuilder {
    schemas: Vec<DtoSchema>,
}

impl SchemaRegistryBuilder {
    pub fn register(mut self, schema: DtoSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn register_dto<T: Dto>(self) -> BindingResult<Self> {
        Ok(self.register(T::schema()?))
    }

    /// Check names, references and acyclicity, then freeze the table
    pub fn build(self) -> BindingResult<SchemaRegistry> {
        let mut schemas = HashMap::with_capacity(self.schemas.len());

        for schema in self.schemas {
            let name = schema.name.clone();
            if schemas.insert(name.clone(), Arc::new(schema)).is_some() {
                return Err(BindingError::binding_spec(
                    name,
                    "dto type is registered more than once",
                ));
            }
        }

        for schema in schemas.values() {
            for field in &schema.fields {
                if let Some(target) = field.descriptor.referenced_dto()
                    && !schemas.contains_key(target)
                {
                    return Err(BindingError::binding_spec(
                        format!("{}.{}", schema.name, field.name()),
                        format!("unable to determine type of nested dto: {target}"),
                    ));
                }
            }
        }

        let registry = SchemaRegistry { schemas };
        registry.check_acyclic()?;
        Ok(registry)
    }
}

impl SchemaRegistry {
    fn check_acyclic(&self) -> BindingResult<()> {
        let mut done = HashSet::new();

        for name in self.names() {
            let mut path = Vec::new();
            self.visit(name, &mut path, &mut done)?;
        }

        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> BindingResult<()> {
        if done.contains(name) {
            return Ok(());
        }

        if let Some(start) = path.iter().position(|entry| *entry == name) {
            let mut cycle = path[start..].to_vec();
            cycle.push(name);
            return Err(BindingError::binding_spec(
                name,
                format!("cyclic dto declaration: {}", cycle.join(" -> ")),
            ));
        }

        let Some(schema) = self.schemas.get(name) else {
            return Ok(());
        };

        path.push(name);
        for field in &schema.fields {
            if let Some(target) = field.descriptor.referenced_dto() {
                self.visit(target, path, done)?;
            }
        }
        path.pop();
        done.insert(name);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DtoSchema {
        DtoSchema::builder("Item")
            .field("id", "json:id", TypeDescriptor::int())
            .build()
            .unwrap()
    }

    #[test]
    fn keeps_declaration_order() {
        let schema = DtoSchema::builder("Order")
            .field("request_id", "header:X-Request-Id", TypeDescriptor::string())
            .field("page", "parameter:page", TypeDescriptor::string().nullable())
            .field("id", "var:id", TypeDescriptor::string())
            .field("items", "json:items", TypeDescriptor::array_of("Item"))
            .build()
            .unwrap();

        let names: Vec<&str> = schema.fields().iter().map(BoundField::name).collect();
        assert_eq!(names, vec!["request_id", "page", "id", "items"]);
    }

    #[test]
    fn rejects_types_a_source_cannot_carry() {
        let err = DtoSchema::builder("Query")
            .field("limit", "header:X-Limit", TypeDescriptor::int())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::BindingSpec {
                field: "Query.limit".to_string(),
                message: "property: limit bound to header must be of type string, ?string, array or ?array, found int".to_string(),
            }
        );

        assert!(
            DtoSchema::builder("Route")
                .field("ids", "var:ids", TypeDescriptor::array())
                .build()
                .is_err()
        );
        assert!(
            DtoSchema::builder("Form")
                .field("items", "formdata:items", TypeDescriptor::array())
                .build()
                .is_err()
        );
        assert!(
            DtoSchema::builder("Cli")
                .command_field("words", TypeDescriptor::string())
                .build()
                .is_err()
        );
    }

    #[test]
    fn rejects_unknown_prefix_with_qualified_field() {
        let err = DtoSchema::builder("Login")
            .field("token", "cookie:token", TypeDescriptor::string())
            .build()
            .unwrap_err();
        match err {
            BindingError::BindingSpec { field, message } => {
                assert_eq!(field, "Login.token");
                assert_eq!(message, "key: cookie:token does not contain type");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_duplicate_fields() {
        let err = DtoSchema::builder("Dup")
            .field("id", "json:id", TypeDescriptor::int())
            .field("id", "var:id", TypeDescriptor::string())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn registry_resolves_references() {
        let order = DtoSchema::builder("Order")
            .field("items", "json:items", TypeDescriptor::array_of("Item"))
            .build()
            .unwrap();

        let registry = SchemaRegistry::builder()
            .register(order.clone())
            .register(item())
            .build()
            .unwrap();
        assert_eq!(registry.names(), vec!["Item", "Order"]);

        let err = SchemaRegistry::builder().register(order).build().unwrap_err();
        assert!(err.to_string().contains("nested dto: Item"));
    }

    #[test]
    fn registry_rejects_cycles() {
        let a = DtoSchema::builder("A")
            .field("b", "json:b", TypeDescriptor::dto("B").nullable())
            .build()
            .unwrap();
        let b = DtoSchema::builder("B")
            .field("a", "json:a", TypeDescriptor::array_of("A"))
            .build()
            .unwrap();

        let err = SchemaRegistry::builder()
            .register(a)
            .register(b)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("cyclic dto declaration: A -> B -> A"));
    }

    #[test]
    fn registry_rejects_duplicate_names() {
        let err = SchemaRegistry::builder()
            .register(item())
            .register(item())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("registered more than once"));
    }
}
