//! Configuration loading and typed config structures for Warden.
//!
//! The canonical configuration lives in `warden-config.yaml` next to the
//! binary. Every section is optional; a missing file or a missing key
//! falls back to the defaults documented on each field.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Warden configuration.
///
/// Mirrors the structure of `warden-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WardenConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Locations of the persisted data and key files.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Tick rate and action queue sizing.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Freeze enforcement tuning.
    #[serde(default)]
    pub freeze: FreezeConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scripted players for the sandbox host.
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

impl WardenConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `WARDEN_PORT` overrides `server.port`
    /// - `WARDEN_DATA_FILE` overrides `storage.data_file`
    /// - `WARDEN_KEY_FILE` overrides `storage.key_file`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Like [`from_file`](Self::from_file), but a missing file yields the
    /// defaults (with environment overrides still applied).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override fields from the process environment when set.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Override fields from an arbitrary key lookup.
    ///
    /// A `WARDEN_PORT` value that is not a valid port is ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("WARDEN_PORT") {
            match val.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => {
                    tracing::warn!(value = %val, "Ignoring invalid WARDEN_PORT");
                }
            }
        }
        if let Some(val) = lookup("WARDEN_DATA_FILE") {
            self.storage.data_file = PathBuf::from(val);
        }
        if let Some(val) = lookup("WARDEN_KEY_FILE") {
            self.storage.key_file = PathBuf::from(val);
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Primary port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port tried once if the primary bind fails.
    #[serde(default = "default_fallback_port")]
    pub fallback_port: u16,

    /// Worker threads for request handling.
    #[serde(default = "default_http_workers")]
    pub http_workers: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fallback_port: default_fallback_port(),
            http_workers: default_http_workers(),
        }
    }
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Notes and session history.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,

    /// The API secret.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            key_file: default_key_file(),
        }
    }
}

/// Simulation loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Ticks per real-time second; also converts effect durations to ticks.
    #[serde(default = "default_ticks_per_second")]
    pub ticks_per_second: u32,

    /// Capacity of the bounded action queue.
    #[serde(default = "default_action_queue_capacity")]
    pub action_queue_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: default_ticks_per_second(),
            action_queue_capacity: default_action_queue_capacity(),
        }
    }
}

/// Freeze enforcement configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FreezeConfig {
    /// Squared distance beyond which a frozen player is teleported back.
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Sandbox host configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SandboxConfig {
    /// Names of scripted players that join at startup.
    #[serde(default)]
    pub bots: Vec<String>,
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde)
// ---------------------------------------------------------------------------

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    4444
}

const fn default_fallback_port() -> u16 {
    4445
}

const fn default_http_workers() -> usize {
    10
}

fn default_data_file() -> PathBuf {
    PathBuf::from("warden_data.json")
}

fn default_key_file() -> PathBuf {
    PathBuf::from("warden_api_key.txt")
}

const fn default_ticks_per_second() -> u32 {
    20
}

const fn default_action_queue_capacity() -> usize {
    1024
}

const fn default_epsilon() -> f64 {
    0.001
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WardenConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4444);
        assert_eq!(config.server.fallback_port, 4445);
        assert_eq!(config.server.http_workers, 10);
        assert_eq!(config.storage.data_file, PathBuf::from("warden_data.json"));
        assert_eq!(config.simulation.ticks_per_second, 20);
        assert_eq!(config.simulation.action_queue_capacity, 1024);
        assert!((config.freeze.epsilon - 0.001).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "info");
        assert!(config.sandbox.bots.is_empty());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
server:
  port: 8080
freeze:
  epsilon: 0.01
sandbox:
  bots: [Steve, Alex]
";
        let mut config: WardenConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_overrides(|_| None);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.fallback_port, 4445);
        assert!((config.freeze.epsilon - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.sandbox.bots, vec!["Steve", "Alex"]);
        assert_eq!(config.storage.key_file, PathBuf::from("warden_api_key.txt"));
    }

    #[test]
    fn parse_empty_yaml() {
        assert!(WardenConfig::parse("").is_ok());
    }

    #[test]
    fn parse_rejects_bad_yaml() {
        assert!(matches!(
            WardenConfig::parse("server: [unterminated"),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn overrides_replace_values() {
        let mut config = WardenConfig::default();
        config.apply_overrides(|key| match key {
            "WARDEN_PORT" => Some("9000".to_owned()),
            "WARDEN_DATA_FILE" => Some("/tmp/data.json".to_owned()),
            _ => None,
        });
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.data_file, PathBuf::from("/tmp/data.json"));
        assert_eq!(config.storage.key_file, PathBuf::from("warden_api_key.txt"));
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut config = WardenConfig::default();
        config.apply_overrides(|key| (key == "WARDEN_PORT").then(|| "not-a-port".to_owned()));
        assert_eq!(config.server.port, 4444);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = WardenConfig::load_or_default(&dir.path().join("absent.yaml"));
        assert!(config.is_ok());
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("warden-config.yaml");
        if path.exists() {
            let config = WardenConfig::from_file(&path);
            assert!(config.is_ok(), "Failed to load project config: {config:?}");
        }
    }
}
