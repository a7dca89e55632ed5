use anyhow::Result;
use std::io::Write;

use super::{Context, Outcome};
use crate::console::Console;
use logscope_logs::{
    ChannelConfigSource, EMERGENCY_CHANNEL, FilterSpec, LogLevel, MultiAggregator, Resolution,
};
use logscope_render::{FormatOptions, Formatter, Highlighter, Theme, separator, summary};
use logscope_types::DEFAULT_COUNT;

/// Options shared by `show` and `search`
#[derive(clap::Args, Clone, Debug, Default)]
pub struct ShowOptions {
    /// Number of entries to show, 0 for the default
    #[arg(short = 'c', long)]
    pub count: Option<usize>,

    /// Only show entries of this level
    #[arg(short = 'l', long)]
    pub level: Option<String>,

    /// Read this channel instead of the default and deprecations channels
    #[arg(long)]
    pub channel: Option<String>,

    /// Only print header and message
    #[arg(long)]
    pub short: bool,

    /// One line per entry, cut to the terminal width
    #[arg(short = 's', long)]
    pub singleline: bool,

    /// Print complete stack traces
    #[arg(long)]
    pub stacktrace: bool,
}

/// Print the most recent records of the selected channels
pub fn show<W: Write>(
    ctx: &Context,
    options: &ShowOptions,
    search: Option<&str>,
    console: &mut Console<W>,
) -> Result<Outcome> {
    if let Some(term) = search {
        console.line(&format!("Running search for {}", Theme::tag(Theme::HIGHLIGHT, term)))?;
    }

    let count = match options.count {
        Some(0) | None => DEFAULT_COUNT,
        Some(n) => n,
    };
    let mut filter = FilterSpec::new().with_max_count(count);

    if let Some(level) = &options.level {
        match level.parse::<LogLevel>() {
            Ok(level) => filter = filter.with_level(level),
            Err(e) => {
                console.error(&e.to_string())?;
                return Ok(Outcome::Invalid);
            }
        }
    }
    if let Some(term) = search {
        filter = filter.with_search(term);
    }

    let resolver = ctx.resolver();
    let mut channels: Vec<String> = match &options.channel {
        Some(channel) => {
            if let Err(e) = resolver.validate(channel) {
                console.error(&e.to_string())?;
                return Ok(Outcome::Invalid);
            }
            vec![channel.clone()]
        }
        None => [ctx.config.default_channel(), ctx.config.deprecations_channel()]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect(),
    };

    console.line(&format!(
        "Showing {} entries from log channel {}{}",
        Theme::dim(&count.to_string()),
        Theme::dim(&channels.join(", ")),
        filter
            .level
            .map(|level| format!(" at level {}", Theme::dim(level.as_str())))
            .unwrap_or_default(),
    ))?;

    let mut resolution = match resolver.resolve(&channels) {
        Ok(resolution) => resolution,
        Err(e) => {
            console.error(&e.to_string())?;
            return Ok(Outcome::Invalid);
        }
    };

    if resolution.is_empty() {
        console.warn("Found no configured logfiles besides emergency log!")?;
    }

    if options.channel.is_none() && needs_emergency(ctx, &resolution) {
        channels.push(EMERGENCY_CHANNEL.to_string());
        resolution = match resolver.resolve(&channels) {
            Ok(resolution) => resolution,
            Err(e) => {
                console.error(&e.to_string())?;
                return Ok(Outcome::Invalid);
            }
        };
        console.line("Including emergency channel.")?;
    }

    if resolution.is_empty() {
        console.error("No logfiles exist in filesystem!")?;
        return Ok(Outcome::Failure);
    }

    let aggregator = MultiAggregator::from_leaves(&resolution.leaves, ctx.reader.clone());
    let records = aggregator.records(&filter);
    tracing::debug!(
        files = aggregator.files().len(),
        matched = records.len(),
        "collected records"
    );

    if records.is_empty() {
        console.warn("No log entries found!")?;
        return Ok(Outcome::Success);
    }

    let mut formatter = Formatter::new(
        &aggregator,
        FormatOptions {
            short: options.short,
            stacktrace: options.stacktrace,
        },
    );
    if let Some(term) = search {
        formatter = formatter.with_highlighter(Highlighter::new(term));
    }

    let width = console.width();
    for record in &records {
        if options.singleline {
            console.line(&formatter.render_compact(record, width))?;
        } else {
            print_separator(console)?;
            console.line(&formatter.render_full(record))?;
        }
    }
    print_separator(console)?;

    if let Some(summary) = summary(&records) {
        console.new_line()?;
        console.line(&summary)?;
        console.new_line()?;
    }

    Ok(Outcome::Success)
}

/// The emergency channel is added unless its file is already covered
fn needs_emergency(ctx: &Context, resolution: &Resolution) -> bool {
    match ctx.config.emergency_path() {
        Some(path) => !resolution.contains(&path),
        None => false,
    }
}

fn print_separator<W: Write>(console: &mut Console<W>) -> Result<()> {
    let bar = separator(console.width());
    console.new_line()?;
    console.line(&bar)?;
    console.new_line()?;
    Ok(())
}
