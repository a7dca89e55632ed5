//! Shared types for logscope
//!
//! This crate contains data structures used across multiple logscope crates.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// Channel Configuration Types
// ============================================================================

/// Driver of a configured log channel
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum DriverKind {
    /// One file at `path`
    Single,
    /// Date-suffixed files derived from `path`, kept for `days`
    Daily,
    /// Fan-out to the channels listed in `channels`
    Stack,
    /// Fallback single file used when the logger itself fails
    Emergency,
    /// Any driver that does not write files we can read (slack, syslog, ...)
    Other(String),
}

impl DriverKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Single => "single",
            Self::Daily => "daily",
            Self::Stack => "stack",
            Self::Emergency => "emergency",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for DriverKind {
    fn from(name: String) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "single" => Self::Single,
            "daily" => Self::Daily,
            "stack" => Self::Stack,
            "emergency" => Self::Emergency,
            _ => Self::Other(name),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one named log channel
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChannelConfig {
    /// Channel name (the key it is configured under)
    #[serde(skip)]
    pub name: String,

    /// Configured driver, absent for the bare emergency channel
    #[serde(default)]
    pub driver: Option<DriverKind>,

    /// Log file path for single and daily channels
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Retention in days for daily channels
    #[serde(default)]
    pub days: Option<u32>,

    /// Sub-channels of a stack channel, in configured order
    #[serde(default)]
    pub channels: Vec<String>,

    /// Minimum level the channel writes
    #[serde(default)]
    pub level: Option<String>,

    /// Every other configured key, kept for display
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl ChannelConfig {
    pub fn new(name: impl Into<String>, driver: Option<DriverKind>) -> Self {
        Self {
            name: name.into(),
            driver,
            ..Default::default()
        }
    }

    pub fn single(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name, Some(DriverKind::Single)).with_path(path)
    }

    pub fn daily(name: impl Into<String>, path: impl Into<PathBuf>, days: u32) -> Self {
        let mut config = Self::new(name, Some(DriverKind::Daily)).with_path(path);
        config.days = Some(days);
        config
    }

    pub fn stack<I, S>(name: impl Into<String>, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::new(name, Some(DriverKind::Stack));
        config.channels = channels.into_iter().map(Into::into).collect();
        config
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Read-only lookup of channel configuration by name
pub trait ChannelConfigSource {
    /// Get a configured channel
    fn channel(&self, name: &str) -> Option<&ChannelConfig>;

    /// Name of the default channel
    fn default_channel(&self) -> Option<&str>;

    /// Name of the channel deprecation warnings are written to
    fn deprecations_channel(&self) -> Option<&str>;
}

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level, in descending order of severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
    /// Level name not produced by a PSR-3 logger
    Unknown,
}

impl LogLevel {
    /// All selectable levels, most severe first
    pub const ALL: [LogLevel; 8] = [
        Self::Emergency,
        Self::Alert,
        Self::Critical,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Debug,
    ];

    /// Parse a level read from a log file, mapping anything unrecognised to `Unknown`
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }

    /// Lowercase name as written in configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Alert => "alert",
            Self::Critical => "critical",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Level names accepted on the command line, most severe first
const LEVEL_NAMES: &str = "emergency, alert, critical, error, warning, notice, info, debug";

/// Error returned when a level name is not one of the eight PSR-3 levels
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid log level '{0}', try: {names}", names = LEVEL_NAMES)]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "emergency" => Ok(Self::Emergency),
            "alert" => Ok(Self::Alert),
            "critical" => Ok(Self::Critical),
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "notice" => Ok(Self::Notice),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Identifies the aggregator that produced a record
///
/// This is an index into the owning `MultiAggregator`, not a pointer: records
/// never keep their aggregator alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregatorId(pub usize);

/// Recovers the display label of the aggregator that produced a record
pub trait SourceLabels {
    fn label(&self, id: AggregatorId) -> Option<&str>;
}

/// A single structured log record
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// When the record was written
    pub timestamp: DateTime<FixedOffset>,

    /// Channel name written into the line (usually the environment)
    pub channel: String,

    /// Severity
    pub level: LogLevel,

    /// Level as written in the file, kept when it is not a known level
    pub level_name: Option<String>,

    /// Message text, may span several lines
    pub message: String,

    /// Context map, in written order
    pub context: Map<String, Value>,

    /// Extra map, in written order
    pub extra: Map<String, Value>,

    /// Aggregator that collected this record
    pub source: Option<AggregatorId>,
}

impl LogRecord {
    /// Create a new record with empty context and extra
    pub fn new(
        timestamp: DateTime<FixedOffset>,
        channel: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            channel: channel.into(),
            level,
            level_name: None,
            message: message.into(),
            context: Map::new(),
            extra: Map::new(),
            source: None,
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Keep the level text of a record whose level is not recognised
    pub fn with_level_name(mut self, name: impl Into<String>) -> Self {
        self.level_name = Some(name.into());
        self
    }

    /// Level text to display: the written name for unknown levels
    pub fn level_label(&self) -> &str {
        self.level_name.as_deref().unwrap_or(self.level.as_str())
    }

    /// The `exception` context entry, if it is a string
    pub fn exception(&self) -> Option<&str> {
        self.context.get("exception").and_then(Value::as_str)
    }
}

// ============================================================================
// Filter Types
// ============================================================================

/// Default number of records shown
pub const DEFAULT_COUNT: usize = 10;

/// Selection applied to an aggregated record stream
///
/// Applied in a fixed order: level, then search, then count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    /// Keep only the last `max_count` matching records
    pub max_count: Option<usize>,

    /// Keep only records of this level
    pub level: Option<LogLevel>,

    /// Keep only records whose message matches this pattern
    pub search: Option<String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self {
            max_count: Some(DEFAULT_COUNT),
            level: None,
            search: None,
        }
    }

    /// A filter that keeps everything
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parse_case_insensitive() {
        assert_eq!("ERROR".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!("Notice".parse::<LogLevel>(), Ok(LogLevel::Notice));
        assert!("fatal".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::parse_lossy("fatal"), LogLevel::Unknown);
    }

    #[test]
    fn test_level_error_lists_levels() {
        let err = "verbose".parse::<LogLevel>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'verbose'"));
        assert!(msg.ends_with("emergency, alert, critical, error, warning, notice, info, debug"));
    }

    #[test]
    fn test_level_label_keeps_unknown_names() {
        let ts = DateTime::parse_from_rfc3339("2024-01-15T10:30:00+00:00").unwrap();
        let known = LogRecord::new(ts, "testing", LogLevel::Error, "x");
        assert_eq!(known.level_label(), "error");

        let fatal =
            LogRecord::new(ts, "testing", LogLevel::Unknown, "x").with_level_name("FATAL");
        assert_eq!(fatal.level_label(), "FATAL");
    }

    #[test]
    fn test_default_filter_count() {
        assert_eq!(FilterSpec::new().max_count, Some(DEFAULT_COUNT));
        assert_eq!(FilterSpec::unlimited().max_count, None);
    }

    #[test]
    fn test_unknown_driver_deserializes() {
        let config: ChannelConfig = serde_json::from_str(
            r#"{"driver":"slack","url":"https://hooks.example","level":"critical"}"#,
        )
        .unwrap();
        assert_eq!(config.driver, Some(DriverKind::Other("slack".into())));
        assert_eq!(config.driver.unwrap().as_str(), "slack");
        assert_eq!(config.level.as_deref(), Some("critical"));
        assert!(config.settings.contains_key("url"));
    }
}
