/*!
 * Configuration management for zwaveflow.
 *
 * Settings are layered: built-in defaults, then an optional file, then
 * environment variables (`ZWAVEFLOW__MQTT__HOST=broker` and so on).
 */
use std::path::Path;
use std::sync::Arc;

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General configuration
    #[serde(default)]
    pub general: GeneralConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// MQTT broker and topic configuration
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Discovery engine configuration
    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Application environment (development, production, etc.)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (trace, debug, info, warn, error or a full directive)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to print the event target
    #[serde(default = "default_true")]
    pub show_target: bool,
}

/// MQTT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    /// Broker port
    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    /// Client id prefix; a random suffix is appended per connection
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Topic prefix used by the Z-Wave daemon, including the trailing slash
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,

    /// Keep-alive interval in seconds
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,

    /// Capacity of the client request channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Discovery engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Stop evaluating schemas after the first one that claims a value
    #[serde(default)]
    pub stop_at_first_match: bool,

    /// Re-run discovery over a node's values when the node changes
    #[serde(default = "default_true")]
    pub rediscover_on_node_changed: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            environment: default_environment(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            show_target: true,
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
            topic_prefix: default_topic_prefix(),
            keep_alive_secs: default_keep_alive(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            stop_at_first_match: false,
            rediscover_on_node_changed: true,
        }
    }
}

fn default_app_name() -> String {
    "zwaveflow".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "zwaveflow".to_string()
}

fn default_topic_prefix() -> String {
    "OpenZWave/".to_string()
}

fn default_keep_alive() -> u64 {
    30
}

fn default_channel_capacity() -> usize {
    100
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<String>,
    environment_prefix: Option<String>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        let mut config_builder = ConfigLib::builder().add_source(
            ConfigLib::try_from(&Config::default())
                .map_err(|e| Error::config(format!("Failed to create default config: {}", e)))?,
        );

        if let Some(config_file) = self.config_file {
            if Path::new(&config_file).exists() {
                debug!("Loading configuration from {}", config_file);
                config_builder = config_builder.add_source(File::with_name(&config_file));
            } else {
                debug!("Configuration file {} does not exist, using defaults", config_file);
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!("Loading configuration from environment variables with prefix {}", prefix);
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config: Config = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        if !config.mqtt.topic_prefix.ends_with('/') {
            return Err(Error::config(format!(
                "mqtt.topic_prefix must end with '/': {}",
                config.mqtt.topic_prefix
            )));
        }

        info!("Configuration loaded successfully");
        Ok(config)
    }
}

/// A thread-safe reference to a configuration
#[derive(Debug, Clone)]
pub struct SharedConfig(Arc<Config>);

impl SharedConfig {
    /// Create a new SharedConfig
    pub fn new(config: Config) -> Self {
        Self(Arc::new(config))
    }

    /// Get a reference to the config
    pub fn get(&self) -> &Config {
        &self.0
    }
}

impl From<Config> for SharedConfig {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}

impl AsRef<Config> for SharedConfig {
    fn as_ref(&self) -> &Config {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.app_name, "zwaveflow");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.topic_prefix, "OpenZWave/");
        assert!(!config.discovery.stop_at_first_match);
        assert!(config.discovery.rediscover_on_node_changed);
    }

    #[test]
    fn test_config_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.general.app_name, "zwaveflow");
        assert_eq!(config.mqtt.host, "localhost");
    }

    #[test]
    fn test_config_builder_with_file() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("config.toml");

        {
            let mut file = File::create(&file_path)?;
            file.write_all(
                br#"
                [mqtt]
                host = "broker.local"
                port = 1884

                [discovery]
                stop_at_first_match = true

                [logging]
                level = "debug"
            "#,
            )?;
        }

        let config = ConfigBuilder::new().with_config_file(file_path).build()?;

        assert_eq!(config.mqtt.host, "broker.local");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(config.mqtt.topic_prefix, "OpenZWave/");
        assert!(config.discovery.stop_at_first_match);
        assert!(config.discovery.rediscover_on_node_changed);
        assert_eq!(config.logging.level, "debug");

        Ok(())
    }

    #[test]
    fn test_config_builder_rejects_unterminated_prefix() -> Result<()> {
        let dir = tempdir()?;
        let file_path = dir.path().join("config.toml");
        std::fs::write(&file_path, "[mqtt]\ntopic_prefix = \"OpenZWave\"\n")?;

        let result = ConfigBuilder::new().with_config_file(file_path).build();
        assert!(matches!(result, Err(Error::Config(_))));

        Ok(())
    }

    #[test]
    fn test_config_builder_with_env() -> Result<()> {
        env::set_var("ZWAVEFLOWTEST__MQTT__HOST", "env-broker");
        env::set_var("ZWAVEFLOWTEST__LOGGING__LEVEL", "trace");

        let config = ConfigBuilder::new()
            .with_environment_prefix("zwaveflowtest")
            .build()?;

        assert_eq!(config.mqtt.host, "env-broker");
        assert_eq!(config.logging.level, "trace");

        env::remove_var("ZWAVEFLOWTEST__MQTT__HOST");
        env::remove_var("ZWAVEFLOWTEST__LOGGING__LEVEL");

        Ok(())
    }

    #[test]
    fn test_shared_config() {
        let shared = SharedConfig::new(Config::default());
        let shared2 = shared.clone();
        assert_eq!(shared2.get().mqtt.client_id, "zwaveflow");
        assert_eq!(shared.as_ref().general.environment, "development");
    }
}
