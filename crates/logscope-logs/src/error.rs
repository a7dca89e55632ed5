use std::path::PathBuf;

/// Errors found while expanding channel configuration
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("channel '{0}' is not configured")]
    UnknownChannel(String),

    #[error("stack channel '{channel}' is part of a cycle: {}", .chain.join(" -> "))]
    Cycle { channel: String, chain: Vec<String> },
}

/// Errors reading one log file
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("log file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading the logging configuration file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
