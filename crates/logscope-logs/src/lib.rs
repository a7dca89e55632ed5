//! Log processing for logscope
//!
//! This crate resolves logging channels into files, parses those files lazily
//! and merges their records into one filtered, time-ordered stream.

mod aggregator;
mod config;
mod error;
mod filter;
mod reader;
mod resolver;
mod source;

pub use aggregator::{Aggregator, MultiAggregator};
pub use config::{DEFAULT_DAILY_DAYS, LoggingConfig};
pub use error::{ConfigError, ReadError, ResolveError};
pub use filter::CompiledFilter;
pub use reader::{LogFileReader, MonologReader};
pub use resolver::{ChannelResolver, EMERGENCY_CHANNEL, LeafChannel, Resolution, daily_candidates};
pub use source::{RecordSource, modified};

// Re-export types used in our public API
pub use logscope_types::{
    AggregatorId, ChannelConfig, ChannelConfigSource, DriverKind, FilterSpec, LogLevel, LogRecord,
    SourceLabels,
};
