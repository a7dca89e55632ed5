use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use logscope_types::{ChannelConfig, ChannelConfigSource, DriverKind};

/// Retention used for daily channels that do not configure `days`
pub const DEFAULT_DAILY_DAYS: u32 = 14;

/// Logging configuration of the inspected application
///
/// ```toml
/// default = "stack"
///
/// [channels.stack]
/// driver = "stack"
/// channels = ["single"]
///
/// [channels.single]
/// driver = "single"
/// path = "storage/logs/laravel.log"
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoggingConfig {
    /// Default channel
    #[serde(default)]
    pub default: Option<String>,

    /// Channel deprecation warnings are written to
    #[serde(default)]
    pub deprecations: Option<String>,

    /// Configured channels by name
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

impl LoggingConfig {
    /// Load a configuration file
    ///
    /// Relative channel paths are taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::parse(&content, base).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(
            path = %path.display(),
            channels = config.channels.len(),
            "loaded logging configuration"
        );
        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `base`
    pub fn parse(content: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        config.normalize(base);
        Ok(config)
    }

    fn normalize(&mut self, base: &Path) {
        for (name, channel) in &mut self.channels {
            channel.name = name.clone();
            if let Some(path) = &channel.path
                && path.is_relative()
            {
                channel.path = Some(base.join(path));
            }
            if channel.driver == Some(DriverKind::Daily) && channel.days.is_none() {
                channel.days = Some(DEFAULT_DAILY_DAYS);
            }
        }
    }

    /// Path of the emergency channel, if configured
    pub fn emergency_path(&self) -> Option<PathBuf> {
        self.channels
            .get(crate::resolver::EMERGENCY_CHANNEL)
            .and_then(|c| c.path.clone())
    }
}

impl ChannelConfigSource for LoggingConfig {
    fn channel(&self, name: &str) -> Option<&ChannelConfig> {
        self.channels.get(name)
    }

    fn default_channel(&self) -> Option<&str> {
        self.default.as_deref()
    }

    fn deprecations_channel(&self) -> Option<&str> {
        self.deprecations.as_deref()
    }
}
