//! SDK configuration supplied by the host at construction.
mod builder;
mod loader;
mod types;

pub use builder::SdkConfigBuilder;
pub use loader::load_from_file;
pub use types::{
    ConfigError,
    SdkConfig,
    SdkMode,
    ValidationError,
};
