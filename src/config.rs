use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::poller::SchedulerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub modem: ModemConfig,
    pub roster: RosterConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModemConfig {
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    #[serde(
        default = "default_command_settle",
        deserialize_with = "deserialize_duration"
    )]
    pub command_settle: Duration,
    #[serde(
        default = "default_request_settle",
        deserialize_with = "deserialize_duration"
    )]
    pub request_settle: Duration,
    #[serde(
        default = "default_tick_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub tick_interval: Duration,
    /// Empty ticks before a device is skipped.
    #[serde(default = "default_poll_timeout_ticks")]
    pub poll_timeout_ticks: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollConfig {
    /// Gate value at startup.
    #[serde(default)]
    pub enabled: bool,
}

fn default_baud_rate() -> u32 {
    115_200
}

fn default_command_settle() -> Duration {
    Duration::from_secs(1)
}

fn default_request_settle() -> Duration {
    Duration::from_secs(3)
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_poll_timeout_ticks() -> u32 {
    12
}

fn default_bind() -> String {
    "0.0.0.0:9000".to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.modem.port.trim().is_empty() {
            return Err(ConfigError::Invalid("modem.port is empty".into()));
        }
        if self.modem.poll_timeout_ticks == 0 {
            return Err(ConfigError::Invalid(
                "modem.poll_timeout_ticks must be at least 1".into(),
            ));
        }
        if self.modem.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "modem.tick_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            request_settle: self.modem.request_settle,
            poll_timeout_ticks: self.modem.poll_timeout_ticks,
        }
    }
}
