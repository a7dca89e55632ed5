use chrono::{Days, Local, NaiveDate};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ResolveError;
use logscope_types::{ChannelConfig, ChannelConfigSource, DriverKind};

/// Name of the channel Laravel falls back to when logging itself fails
pub const EMERGENCY_CHANNEL: &str = "emergency";

/// Files written by one non-stack channel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafChannel {
    /// Channel name, used as the display label of its records
    pub name: String,

    /// Existing files, most recent first for daily channels
    pub files: Vec<PathBuf>,
}

/// Result of resolving a list of top-level channels
#[derive(Clone, Debug, Default)]
pub struct Resolution {
    /// Leaf channels in resolution order
    pub leaves: Vec<LeafChannel>,

    /// Top-level channels that resolved to no existing file
    pub empty_channels: Vec<String>,
}

impl Resolution {
    /// All resolved files, in order
    pub fn files(&self) -> Vec<PathBuf> {
        self.leaves
            .iter()
            .flat_map(|leaf| leaf.files.iter().cloned())
            .collect()
    }

    /// Check whether any file was found at all
    pub fn is_empty(&self) -> bool {
        self.leaves.iter().all(|leaf| leaf.files.is_empty())
    }

    /// Check whether a path is among the resolved files
    pub fn contains(&self, path: &Path) -> bool {
        self.leaves
            .iter()
            .any(|leaf| leaf.files.iter().any(|f| f == path))
    }
}

/// How a channel produces files, derived from its configuration
enum Driver<'c> {
    Single { path: &'c Path },
    Daily { path: &'c Path, days: u32 },
    Stack { channels: &'c [String] },
    /// Unconfigured, pathless or non-file channel
    Nothing,
}

impl<'c> Driver<'c> {
    fn from_config(name: &str, config: Option<&'c ChannelConfig>) -> Self {
        let Some(config) = config else {
            return Self::Nothing;
        };

        let kind = match &config.driver {
            Some(kind) => kind,
            None if name == EMERGENCY_CHANNEL => &DriverKind::Emergency,
            None => return Self::Nothing,
        };

        match kind {
            DriverKind::Single | DriverKind::Emergency => match &config.path {
                Some(path) => Self::Single { path },
                None => {
                    tracing::warn!(channel = name, "channel has no path configured");
                    Self::Nothing
                }
            },
            DriverKind::Daily => match &config.path {
                Some(path) => Self::Daily {
                    path,
                    days: config.days.unwrap_or(0),
                },
                None => {
                    tracing::warn!(channel = name, "daily channel has no path configured");
                    Self::Nothing
                }
            },
            DriverKind::Stack => Self::Stack {
                channels: &config.channels,
            },
            DriverKind::Other(_) => Self::Nothing,
        }
    }
}

/// Expands channel names into the log files that exist for them
pub struct ChannelResolver<'a> {
    config: &'a dyn ChannelConfigSource,
    today: NaiveDate,
}

impl<'a> ChannelResolver<'a> {
    /// Create a resolver that dates daily files relative to the local date
    pub fn new(config: &'a dyn ChannelConfigSource) -> Self {
        Self {
            config,
            today: Local::now().date_naive(),
        }
    }

    /// Use a fixed reference date for daily channels
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Fail unless the channel is configured
    pub fn validate(&self, name: &str) -> Result<(), ResolveError> {
        match self.config.channel(name) {
            Some(_) => Ok(()),
            None => Err(ResolveError::UnknownChannel(name.to_string())),
        }
    }

    /// Resolve top-level channels into leaf channels and their files
    ///
    /// Files are deduplicated within the expansion of each top-level name,
    /// not across names.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Resolution, ResolveError> {
        let mut resolution = Resolution::default();

        for name in names {
            let name = name.as_ref();
            let mut leaves = Vec::new();
            self.expand(name, &mut Vec::new(), &mut leaves)?;
            let leaves = dedup(leaves);

            if leaves.iter().all(|leaf| leaf.files.is_empty()) {
                tracing::info!(channel = name, "channel resolved to no existing log files");
                resolution.empty_channels.push(name.to_string());
            }
            resolution.leaves.extend(leaves);
        }

        Ok(resolution)
    }

    /// Resolve top-level channels into a flat, ordered file list
    pub fn resolve_files<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PathBuf>, ResolveError> {
        Ok(self.resolve(names)?.files())
    }

    /// Resolve a stack channel using an explicit sub-channel list instead of its configured one
    pub fn resolve_stack_with<S: AsRef<str>>(
        &self,
        name: &str,
        channels: &[S],
    ) -> Result<Vec<LeafChannel>, ResolveError> {
        let mut chain = vec![name.to_string()];
        let mut leaves = Vec::new();
        for channel in channels {
            self.expand(channel.as_ref(), &mut chain, &mut leaves)?;
        }
        Ok(dedup(leaves))
    }

    /// Depth-first expansion; `chain` holds the stack channels currently being expanded
    fn expand(
        &self,
        name: &str,
        chain: &mut Vec<String>,
        leaves: &mut Vec<LeafChannel>,
    ) -> Result<(), ResolveError> {
        match Driver::from_config(name, self.config.channel(name)) {
            Driver::Single { path } => {
                let files = if path.exists() {
                    vec![path.to_path_buf()]
                } else {
                    tracing::debug!(
                        channel = name,
                        path = %path.display(),
                        "log file does not exist"
                    );
                    Vec::new()
                };
                leaves.push(LeafChannel {
                    name: name.to_string(),
                    files,
                });
            }
            Driver::Daily { path, days } => {
                let files = daily_candidates(path, days, self.today)
                    .into_iter()
                    .filter(|candidate| candidate.exists())
                    .collect();
                leaves.push(LeafChannel {
                    name: name.to_string(),
                    files,
                });
            }
            Driver::Stack { channels } => {
                if chain.iter().any(|c| c == name) {
                    let mut cycle = chain.clone();
                    cycle.push(name.to_string());
                    return Err(ResolveError::Cycle {
                        channel: name.to_string(),
                        chain: cycle,
                    });
                }
                chain.push(name.to_string());
                for channel in channels {
                    self.expand(channel, chain, leaves)?;
                }
                chain.pop();
            }
            Driver::Nothing => {
                tracing::debug!(channel = name, "channel has no readable log files");
            }
        }

        Ok(())
    }
}

/// Candidate file names of a daily channel, newest first
///
/// `storage/logs/laravel.log` with `days = 2` on 2024-01-15 gives
/// `laravel-2024-01-15.log`, `laravel-2024-01-14.log`, `laravel-2024-01-13.log`.
pub fn daily_candidates(path: &Path, days: u32, today: NaiveDate) -> Vec<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (0..=days)
        .filter_map(|d| today.checked_sub_days(Days::new(u64::from(d))))
        .map(|date| path.with_file_name(format!("{stem}-{}{ext}", date.format("%Y-%m-%d"))))
        .collect()
}

/// Drop files already produced by an earlier leaf
fn dedup(leaves: Vec<LeafChannel>) -> Vec<LeafChannel> {
    let mut seen = HashSet::new();
    leaves
        .into_iter()
        .map(|mut leaf| {
            leaf.files.retain(|f| seen.insert(f.clone()));
            leaf
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    #[derive(Default)]
    struct TestConfig {
        channels: HashMap<String, ChannelConfig>,
    }

    impl TestConfig {
        fn with(mut self, mut channel: ChannelConfig, name: &str) -> Self {
            channel.name = name.to_string();
            self.channels.insert(name.to_string(), channel);
            self
        }
    }

    impl ChannelConfigSource for TestConfig {
        fn channel(&self, name: &str) -> Option<&ChannelConfig> {
            self.channels.get(name)
        }

        fn default_channel(&self) -> Option<&str> {
            None
        }

        fn deprecations_channel(&self) -> Option<&str> {
            None
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn test_single_only_when_present() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.log");
        fs::write(&present, "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::single("", &present), "a")
            .with(ChannelConfig::single("", dir.path().join("missing.log")), "b");
        let resolver = ChannelResolver::new(&config);

        assert_eq!(resolver.resolve_files(&["a"]).unwrap(), vec![present]);
        let resolution = resolver.resolve(&["b"]).unwrap();
        assert!(resolution.is_empty());
        assert_eq!(resolution.empty_channels, vec!["b".to_string()]);
    }

    #[test]
    fn test_daily_candidates_bound() {
        let candidates = daily_candidates(Path::new("/var/log/laravel.log"), 3, today());
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], PathBuf::from("/var/log/laravel-2024-01-15.log"));
        assert_eq!(candidates[3], PathBuf::from("/var/log/laravel-2024-01-12.log"));
    }

    #[test]
    fn test_daily_only_existing_in_recency_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("app-2024-01-15.log"), "").unwrap();
        fs::write(dir.path().join("app-2024-01-13.log"), "").unwrap();
        // outside the retention window
        fs::write(dir.path().join("app-2024-01-10.log"), "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::daily("", dir.path().join("app.log"), 2), "daily");
        let files = ChannelResolver::new(&config)
            .with_today(today())
            .resolve_files(&["daily"])
            .unwrap();

        assert_eq!(
            files,
            vec![dir.path().join("app-2024-01-15.log"), dir.path().join("app-2024-01-13.log")]
        );
    }

    #[test]
    fn test_daily_path_without_extension() {
        let candidates = daily_candidates(Path::new("/var/log/worker"), 1, today());
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/var/log/worker-2024-01-15"),
                PathBuf::from("/var/log/worker-2024-01-14"),
            ]
        );
    }

    #[test]
    fn test_daily_without_days_reads_only_today() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("worker-2024-01-15"), "").unwrap();
        fs::write(dir.path().join("worker-2024-01-14"), "").unwrap();

        let channel =
            ChannelConfig::new("", Some(DriverKind::Daily)).with_path(dir.path().join("worker"));
        let config = TestConfig::default().with(channel, "daily");
        let files = ChannelResolver::new(&config)
            .with_today(today())
            .resolve_files(&["daily"])
            .unwrap();

        assert_eq!(files, vec![dir.path().join("worker-2024-01-15")]);
    }

    #[test]
    fn test_nested_stack_flattens_in_order() {
        let dir = tempdir().unwrap();
        let b = dir.path().join("b.log");
        let c = dir.path().join("c.log");
        fs::write(&b, "").unwrap();
        fs::write(&c, "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::stack("", ["a", "b"]), "top")
            .with(ChannelConfig::stack("", ["c"]), "a")
            .with(ChannelConfig::single("", &b), "b")
            .with(ChannelConfig::single("", &c), "c")
            .with(ChannelConfig::stack("", ["c", "b"]), "flat");
        let resolver = ChannelResolver::new(&config);

        let nested = resolver.resolve_files(&["top"]).unwrap();
        assert_eq!(nested, vec![c.clone(), b.clone()]);
        assert_eq!(nested, resolver.resolve_files(&["flat"]).unwrap());

        let leaves = resolver.resolve(&["top"]).unwrap().leaves;
        let names: Vec<&str> = leaves.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn test_empty_stack_is_not_an_error() {
        let config = TestConfig::default()
            .with(ChannelConfig::stack("", Vec::<String>::new()), "stack");
        let resolution = ChannelResolver::new(&config).resolve(&["stack"]).unwrap();
        assert!(resolution.leaves.is_empty());
        assert_eq!(resolution.empty_channels, vec!["stack".to_string()]);
    }

    #[test]
    fn test_emergency_without_driver_acts_as_single() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("emergency.log");
        fs::write(&path, "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::new("", None).with_path(&path), "emergency")
            .with(ChannelConfig::new("", None).with_path(&path), "other");
        let resolver = ChannelResolver::new(&config);

        assert_eq!(resolver.resolve_files(&["emergency"]).unwrap(), vec![path]);
        assert!(resolver.resolve_files(&["other"]).unwrap().is_empty());
        assert!(resolver.resolve_files(&["unconfigured"]).unwrap().is_empty());
    }

    #[test]
    fn test_cycle_is_reported() {
        let config = TestConfig::default()
            .with(ChannelConfig::stack("", ["b"]), "a")
            .with(ChannelConfig::stack("", ["a"]), "b");

        let err = ChannelResolver::new(&config).resolve(&["a"]).unwrap_err();
        match err {
            ResolveError::Cycle { channel, chain } => {
                assert_eq!(channel, "a");
                assert_eq!(chain, vec!["a", "b", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_dedup_within_channel_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.log");
        fs::write(&path, "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::single("", &path), "one")
            .with(ChannelConfig::single("", &path), "two")
            .with(ChannelConfig::stack("", ["one", "two"]), "both");
        let resolver = ChannelResolver::new(&config);

        assert_eq!(resolver.resolve_files(&["both"]).unwrap(), vec![path.clone()]);
        assert_eq!(resolver.resolve_files(&["one", "two"]).unwrap(), vec![path.clone(), path]);
    }

    #[test]
    fn test_stack_override_and_validate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.log");
        fs::write(&path, "").unwrap();

        let config = TestConfig::default()
            .with(ChannelConfig::stack("", Vec::<String>::new()), "stack")
            .with(ChannelConfig::single("", &path), "x");
        let resolver = ChannelResolver::new(&config);

        let leaves = resolver.resolve_stack_with("stack", &["x"]).unwrap();
        assert_eq!(leaves[0].files, vec![path]);
        assert!(resolver.validate("x").is_ok());
        assert!(matches!(resolver.validate("nope"), Err(ResolveError::UnknownChannel(_))));
    }
}
