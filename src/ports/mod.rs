pub mod command_view;
pub mod request_view;
pub mod schema_provider;

pub use command_view::{CommandView, FlagValue};
pub use request_view::{EmptyRequest, ParameterValue, RawRequestView};
pub use schema_provider::SchemaProvider;
