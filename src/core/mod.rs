pub mod coercion;
pub mod date;
pub mod descriptor;
pub mod error;
pub mod hydrator;
pub mod json_path;
mod nested;
pub mod schema;
pub mod source;
pub mod value;

pub use coercion::{CoercionError, CoercionMode};
pub use date::DateFormat;
pub use descriptor::{BaseKind, TypeDescriptor};
pub use error::{BindingError, BindingResult};
pub use hydrator::Hydrator;
pub use schema::{BoundField, Dto, DtoSchema, DtoSchemaBuilder, SchemaRegistry, SchemaRegistryBuilder};
pub use source::{FieldSpec, SourceKind};
pub use value::{HydratedDto, HydratedValue};
