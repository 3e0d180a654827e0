use crate::session::RoleLookupPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "taskdeck/app/config";
pub const ENV_PREFIX: &str = "TASKDECK";

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub tasks_collection: String,
    pub users_collection: String,
    /// File backing the device-local key-value cache.
    pub cache_path: PathBuf,
    pub log_filter: String,
    pub role_lookup: RoleLookupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_collection: "tasks".to_string(),
            users_collection: "users".to_string(),
            cache_path: PathBuf::from("taskdeck-cache.json"),
            log_filter: "taskdeck_app=info".to_string(),
            role_lookup: RoleLookupConfig::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RoleLookupConfig {
    pub attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for RoleLookupConfig {
    fn default() -> Self {
        Self {
            attempts: 1,
            retry_delay_ms: 500,
        }
    }
}

impl From<RoleLookupConfig> for RoleLookupPolicy {
    fn from(config: RoleLookupConfig) -> Self {
        Self {
            attempts: config.attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Config {
    /// Loads `path` (any extension the config crate knows, optional), then
    /// `TASKDECK_*` environment overrides. Nested keys use `__`, e.g.
    /// `TASKDECK_ROLE_LOOKUP__ATTEMPTS=3`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::load_with(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: impl AsRef<Path>, environment: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn role_lookup_policy(&self) -> RoleLookupPolicy {
        self.role_lookup.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::with_prefix(ENV_PREFIX).source(Some(source))
    }

    fn missing_file() -> PathBuf {
        std::env::temp_dir().join(format!("taskdeck-missing-{}.toml", uuid::Uuid::new_v4()))
    }

    mod deser_tests {
        use super::*;

        #[test]
        fn test_config_deserialize_from_toml() {
            // Arrange
            let toml_str = r#"
                tasks_collection = "team-tasks"
                users_collection = "members"
                cache_path = "/tmp/cache.json"
                log_filter = "debug"

                [role_lookup]
                attempts = 3
                retry_delay_ms = 250
            "#;

            // Act
            let config: Config = toml::from_str(toml_str).unwrap();

            // Assert
            assert_eq!(config.tasks_collection, "team-tasks");
            assert_eq!(config.users_collection, "members");
            assert_eq!(config.cache_path, PathBuf::from("/tmp/cache.json"));
            assert_eq!(config.log_filter, "debug");
            assert_eq!(config.role_lookup.attempts, 3);
            assert_eq!(config.role_lookup.retry_delay_ms, 250);
        }

        #[test]
        fn test_config_deserialize_missing_fields_use_defaults() {
            // Arrange
            let toml_str = r#"
                tasks_collection = "team-tasks"
            "#;

            // Act
            let config: Config = toml::from_str(toml_str).unwrap();

            // Assert
            assert_eq!(config.tasks_collection, "team-tasks");
            assert_eq!(config.users_collection, "users");
            assert_eq!(config.role_lookup, RoleLookupConfig::default());
        }
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        // Arrange
        let shipped = include_str!("../config.toml");

        // Act
        let config: Config = toml::from_str(shipped).unwrap();

        // Assert
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        // Act
        let config = Config::load_with(missing_file(), env(&[])).unwrap();

        // Assert
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_environment_overrides_file() {
        // Arrange
        let path = std::env::temp_dir().join(format!("taskdeck-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "tasks_collection = \"from-file\"\nlog_filter = \"warn\"\n").unwrap();
        let env = env(&[
            ("TASKDECK_TASKS_COLLECTION", "from-env"),
            ("TASKDECK_ROLE_LOOKUP__ATTEMPTS", "4"),
        ]);

        // Act
        let config = Config::load_with(&path, env).unwrap();
        std::fs::remove_file(&path).unwrap();

        // Assert
        assert_eq!(config.tasks_collection, "from-env");
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.role_lookup.attempts, 4);
        assert_eq!(config.role_lookup.retry_delay_ms, 500);
    }

    #[test]
    fn test_role_lookup_policy_conversion() {
        // Arrange
        let config = Config {
            role_lookup: RoleLookupConfig {
                attempts: 2,
                retry_delay_ms: 50,
            },
            ..Config::default()
        };

        // Act
        let policy = config.role_lookup_policy();

        // Assert
        assert_eq!(policy.attempts, 2);
        assert_eq!(policy.retry_delay, Duration::from_millis(50));
    }
}
