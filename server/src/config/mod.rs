//! Server configuration loading

mod loader;

pub use loader::{ConfigLoader, RawConfig, ServerSettings};
