mod commands;
mod console;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};

use commands::{Context, Outcome, ShowOptions};
use console::Console;
use logscope_logs::{LoggingConfig, MonologReader};

/// Width used when the terminal size cannot be determined
const FALLBACK_WIDTH: usize = 80;

/// Logscope - Inspect the log channels of an application from the terminal
#[derive(Parser, Debug)]
#[command(name = "logscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Logging configuration file
    #[arg(long, global = true, env = "LOGSCOPE_CONFIG", default_value = "logging.toml")]
    config: PathBuf,

    /// Output width in columns (defaults to the terminal width)
    #[arg(long, global = true)]
    width: Option<usize>,

    /// Print without colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the latest log entries
    Show(ShowOptions),

    /// Show the latest log entries matching a term
    Search {
        /// Case-insensitive pattern, matched literally when it is not a valid regex
        term: String,

        #[command(flatten)]
        options: ShowOptions,
    },

    /// Overview of the configured log channels
    About {
        /// Global log level of the application
        #[arg(long, env = "LOG_LEVEL")]
        log_level: Option<String>,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing for debugging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            Outcome::Failure.into()
        }
    }
}

fn run(args: Args) -> Result<Outcome> {
    let config = LoggingConfig::load(&args.config).with_context(|| {
        format!(
            "cannot load logging configuration from {}",
            args.config.display()
        )
    })?;
    let ctx = Context::new(config, Arc::new(MonologReader::new()));

    let stdout = std::io::stdout();
    let color = !args.no_color && stdout.is_terminal();
    let width = args.width.unwrap_or_else(terminal_width);
    let mut console = Console::new(stdout.lock(), color, width);

    match &args.command {
        Command::Show(options) => commands::show(&ctx, options, None, &mut console),
        Command::Search { term, options } => {
            commands::show(&ctx, options, Some(term), &mut console)
        }
        Command::About { log_level } => {
            commands::about(&ctx, log_level.as_deref(), &mut console)
        }
    }
}

fn terminal_width() -> usize {
    match crossterm::terminal::size() {
        Ok((cols, _)) if cols > 0 => usize::from(cols),
        _ => FALLBACK_WIDTH,
    }
}
