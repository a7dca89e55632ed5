//! `show`, `search` and `about`

mod about;
mod show;

use chrono::NaiveDate;
use std::process::ExitCode;
use std::sync::Arc;

use logscope_logs::{ChannelResolver, LogFileReader, LoggingConfig};

pub use about::about;
pub use show::{ShowOptions, show};

/// How a command ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Ran, possibly without finding anything
    Success,

    /// Rejected its input before doing any work
    Invalid,

    /// Found no log files at all
    Failure,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::Failure => ExitCode::from(1),
            Outcome::Invalid => ExitCode::from(2),
        }
    }
}

/// Everything a command needs besides its own arguments
pub struct Context {
    pub config: LoggingConfig,
    pub reader: Arc<dyn LogFileReader>,
    /// Reference date for daily channels, defaults to today
    pub today: Option<NaiveDate>,
}

impl Context {
    pub fn new(config: LoggingConfig, reader: Arc<dyn LogFileReader>) -> Self {
        Self {
            config,
            reader,
            today: None,
        }
    }

    pub fn resolver(&self) -> ChannelResolver<'_> {
        let resolver = ChannelResolver::new(&self.config);
        match self.today {
            Some(today) => resolver.with_today(today),
            None => resolver,
        }
    }
}
