//! YAML configuration for the Traeger integration
//!
//! Loads `traeger.yaml` with `!include`, `!secret` and `!env_var` support and
//! deserializes the `traeger:` section into [`IntegrationConfig`].
//!
//! ```ignore
//! let config = traeger_config::IntegrationConfig::load("/config")?;
//! if let Some(steps) = config.program("brisket") { /* ... */ }
//! ```

mod error;
mod integration;
mod loader;
mod secrets;

pub use error::{ConfigError, ConfigResult};
pub use integration::{DispatchConfig, IntegrationConfig, ReplayConfig, CONFIG_FILE};
pub use loader::{load_yaml, YamlLoader};
pub use secrets::{Secrets, SECRETS_FILE};

pub use serde_yaml::Value;
