//! Integration options from the `traeger:` section

use crate::error::{ConfigError, ConfigResult};
use crate::loader::load_yaml;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use traeger_core::CookStep;

/// Default configuration file inside the config directory
pub const CONFIG_FILE: &str = "traeger.yaml";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    /// Default tracing filter, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dispatch: DispatchConfig,

    #[serde(default)]
    pub replay: ReplayConfig,

    /// Named cook programs, loadable with `traeger.set_custom_cook`
    #[serde(default)]
    pub programs: BTreeMap<String, Vec<CookStep>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Send commands to the grill; when false they are only logged
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Delay between replayed snapshots
    #[serde(default)]
    pub interval_ms: u64,

    /// Program to load before the first snapshot
    #[serde(default)]
    pub program: Option<String>,

    /// Step to select once the program is loaded
    #[serde(default)]
    pub start_step: Option<u32>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dispatch: DispatchConfig::default(),
            replay: ReplayConfig::default(),
            programs: BTreeMap::new(),
        }
    }
}

impl IntegrationConfig {
    /// Load `traeger.yaml` from a config directory
    pub fn load(config_dir: impl AsRef<Path>) -> ConfigResult<Self> {
        let yaml = load_yaml(config_dir.as_ref(), CONFIG_FILE)?;
        Self::from_yaml(&yaml)
    }

    /// Parse from an already loaded document; a missing section means defaults
    pub fn from_yaml(yaml: &Value) -> ConfigResult<Self> {
        let section = match yaml {
            Value::Null => return Ok(Self::default()),
            Value::Mapping(mapping) => mapping
                .get(&Value::String("traeger".to_string()))
                .cloned()
                .unwrap_or(Value::Null),
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "root".to_string(),
                    reason: "configuration must be a mapping".to_string(),
                })
            }
        };
        if section.is_null() {
            return Ok(Self::default());
        }

        let config: Self =
            serde_yaml::from_value(section).map_err(|source| ConfigError::Deserialize { source })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        let level = self.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "log_level".to_string(),
                reason: format!("expected one of {}", LOG_LEVELS.join(", ")),
            });
        }

        if let Some(name) = &self.replay.program {
            if !self.programs.contains_key(name) {
                return Err(ConfigError::InvalidValue {
                    key: "replay.program".to_string(),
                    reason: format!("no program named '{}'", name),
                });
            }
        }
        Ok(())
    }

    pub fn program(&self, name: &str) -> Option<&[CookStep]> {
        self.programs.get(name).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = IntegrationConfig::from_yaml(&Value::Null).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.dispatch.enabled);
        assert_eq!(config.replay.interval_ms, 0);
        assert!(config.programs.is_empty());

        let yaml: Value = serde_yaml::from_str("other: 1\n").unwrap();
        assert!(IntegrationConfig::from_yaml(&yaml).unwrap().dispatch.enabled);
    }

    #[test]
    fn test_parse_section() {
        let yaml: Value = serde_yaml::from_str(
            r#"
traeger:
  log_level: debug
  dispatch:
    enabled: false
  replay:
    interval_ms: 500
    program: brisket
    start_step: 1
  programs:
    brisket:
      - set_temp: 225
        smoke: true
      - probe_act_temp_adv: 165
      - time_set: 3600
        use_timer: true
      - shutdown: 1
"#,
        )
        .unwrap();

        let config = IntegrationConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(!config.dispatch.enabled);
        assert_eq!(config.replay.interval_ms, 500);
        assert_eq!(config.replay.start_step, Some(1));

        let brisket = config.program("brisket").unwrap();
        assert_eq!(brisket.len(), 4);
        assert_eq!(brisket[0].smoke, Some(true));
        assert_eq!(brisket[2].use_timer, Some(true));
        assert!(brisket[3].is_shutdown());
        assert!(config.program("ribs").is_none());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let yaml: Value = serde_yaml::from_str("traeger:\n  log_level: loud\n").unwrap();
        let err = IntegrationConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "log_level"));
    }

    #[test]
    fn test_rejects_unknown_replay_program() {
        let yaml: Value =
            serde_yaml::from_str("traeger:\n  replay:\n    program: ribs\n").unwrap();
        assert!(IntegrationConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_bad_shape() {
        let yaml: Value = serde_yaml::from_str("traeger:\n  dispatch: yes please\n").unwrap();
        assert!(matches!(
            IntegrationConfig::from_yaml(&yaml),
            Err(ConfigError::Deserialize { .. })
        ));
    }

    #[test]
    fn test_load_with_secret_and_include() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("secrets.yaml"), "level: warn\n").unwrap();
        fs::write(dir.path().join("ribs.yaml"), "- set_temp: 275\n").unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "traeger:\n  log_level: !secret level\n  programs:\n    ribs: !include ribs.yaml\n",
        )
        .unwrap();

        let config = IntegrationConfig::load(dir.path()).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.program("ribs").unwrap()[0].set_temp, Some(275.0));
    }
}
