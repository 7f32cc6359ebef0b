//! Tool catalog: discovery caching and model-format translation

mod catalog;
mod schema;

pub use catalog::ToolCatalog;
pub use schema::validate_arguments;
