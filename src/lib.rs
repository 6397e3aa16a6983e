//! Hydrator - declarative request hydration into typed DTOs.
//!
//! A DTO declares, per field, where its value comes from (`header:`,
//! `parameter:`, `var:`, `json:` or `formdata:`) and what type it must have.
//! The engine reads an already materialized request through the
//! [`ports::RawRequestView`] trait, applies per-source null and coercion
//! rules, recursively builds nested DTOs from JSON fragments and returns a
//! fully populated [`core::HydratedDto`] or the first [`core::BindingError`].
//!
//! # Quick Example
//! ```
//! use std::sync::Arc;
//!
//! use hydrator::{
//!     adapters::InMemoryRequest,
//!     core::{DtoSchema, Hydrator, SchemaRegistry, TypeDescriptor},
//! };
//! use serde_json::json;
//!
//! # fn main() -> Result<(), hydrator::core::BindingError> {
//! let registry = SchemaRegistry::builder()
//!     .register(
//!         DtoSchema::builder("CreateUser")
//!             .field("id", "var:id", TypeDescriptor::string())
//!             .field("name", "json:user.name", TypeDescriptor::string())
//!             .field("age", "json:user.age", TypeDescriptor::int().nullable())
//!             .build()?,
//!     )
//!     .build()?;
//!
//! let request = InMemoryRequest::new()
//!     .var("id", "7")
//!     .json(json!({ "user": { "name": "Ada" } }));
//!
//! let user = Hydrator::new(Arc::new(registry)).hydrate("CreateUser", &request)?;
//! assert_eq!(user.to_json(), json!({ "id": "7", "name": "Ada", "age": null }));
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! **Ports** (traits) are kept apart from **adapters** (implementations) while
//! the engine itself lives in `core`, which knows nothing about HTTP. The
//! `config` module turns schema files into a [`core::SchemaRegistry`] and the
//! binary serves configured routes through [`adapters::HydrationHandler`].
//!
//! # Error Handling
//! The engine returns [`core::BindingError`], a `thiserror` enum that maps to
//! an HTTP status and a JSON body. Loading and serving return `eyre::Result<T>`
//! with context attached through `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

pub use crate::{
    adapters::{HttpRequestView, HydrationHandler, InMemoryRequest, ParsedCommand},
    core::{BindingError, Dto, DtoSchema, HydratedDto, HydratedValue, Hydrator, SchemaRegistry, TypeDescriptor},
    ports::{CommandView, RawRequestView},
};
