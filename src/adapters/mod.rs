pub mod command_line;
pub mod http_handler;
pub mod http_request;
pub mod in_memory;
pub mod schema_file;

/// Re-export commonly used types from adapters
pub use command_line::ParsedCommand;
pub use http_handler::{HydrationHandler, HydrationState, RouteTable};
pub use http_request::{HttpRequestView, HttpViewError};
pub use in_memory::InMemoryRequest;
pub use schema_file::FileSchemaProvider;
