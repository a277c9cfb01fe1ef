use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::server::DEFAULT_PORT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Optional settings file. Command line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// Data file locations; unset entries fall back to `~/.predict`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilesConfig {
    pub tle: Option<PathBuf>,
    pub qth: Option<PathBuf>,
    pub db: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_interval", deserialize_with = "duration")]
    pub interval: Duration,
    /// Serial device of an `AZ/EL` antenna rotator.
    pub antenna: Option<PathBuf>,
    #[serde(default)]
    pub antenna_once_per_second: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            antenna: None,
            antenna_once_per_second: false,
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        // an empty document is an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 1210);
        assert_eq!(config.tracker.interval, Duration::from_secs(1));
        assert!(config.files.tle.is_none());
    }

    #[test]
    fn full_file() {
        let config = Config::parse(
            r#"
files:
  tle: /var/lib/predict/amateur.tle
  qth: /etc/predict.qth
server:
  port: 1211
tracker:
  interval: 500ms
  antenna: /dev/ttyS0
  antenna_once_per_second: true
"#,
        )
        .unwrap();
        assert_eq!(
            config.files.tle.as_deref(),
            Some(Path::new("/var/lib/predict/amateur.tle"))
        );
        assert!(config.files.db.is_none());
        assert_eq!(config.server.port, 1211);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.tracker.interval, Duration::from_millis(500));
        assert!(config.tracker.antenna_once_per_second);
    }

    #[test]
    fn bad_interval() {
        let err = Config::parse("tracker:\n  interval: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
