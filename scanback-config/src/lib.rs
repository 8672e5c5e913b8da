//! Configuration library for scanback.
//!
//! Loads the server configuration once at startup from a JSON or TOML file,
//! applies environment overrides and reports validation warnings. The
//! resulting [`Config`] is immutable and shared by every component.

pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader};
pub use models::{
    AuthConfig, Config, ConfigMetadata, ScannerConfig, ServerConfig, TlsConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
