use serde_json::Value;

use crate::highlight::Highlighter;
use crate::theme::Theme;
use crate::truncate::truncate;
use logscope_types::{LogRecord, SourceLabels};

/// Timestamp layout used in headers and summaries
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker line between an exception message and its trace
const STACKTRACE_MARKER: &str = "\n[stacktrace]\n";

/// Number of trace lines kept when the trace is elided
const TRACE_PREVIEW_LINES: usize = 2;

/// Rendering switches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Only header and message
    pub short: bool,

    /// Print the whole stack trace instead of its first lines
    pub stacktrace: bool,
}

/// Renders records as marked-up text
pub struct Formatter<'a> {
    labels: &'a dyn SourceLabels,
    options: FormatOptions,
    highlighter: Option<Highlighter>,
}

impl<'a> Formatter<'a> {
    pub fn new(labels: &'a dyn SourceLabels, options: FormatOptions) -> Self {
        Self {
            labels,
            options,
            highlighter: None,
        }
    }

    /// Highlight search matches in messages
    pub fn with_highlighter(mut self, highlighter: Highlighter) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    /// `2024-01-15 10:30:00 testing.ERROR @single:` with markup
    pub fn header(&self, record: &LogRecord) -> String {
        let label = record
            .source
            .and_then(|id| self.labels.label(id))
            .unwrap_or("?");
        format!(
            "{} {}.{} {}:",
            record.timestamp.format(DATETIME_FORMAT),
            Theme::dim(&record.channel),
            Theme::level_name(record.level_label()),
            Theme::dim(&format!("@{label}")),
        )
    }

    fn message(&self, record: &LogRecord) -> String {
        match &self.highlighter {
            Some(h) => h.highlight(&record.message),
            None => record.message.clone(),
        }
    }

    /// Multi-line rendering with context, extra and exception
    pub fn render_full(&self, record: &LogRecord) -> String {
        let mut lines = vec![self.header(record), self.message(record)];

        if self.options.short {
            return lines.join("\n");
        }

        let fields = record
            .context
            .iter()
            .filter(|(key, _)| key.as_str() != "exception")
            .chain(record.extra.iter());
        for (key, value) in fields {
            lines.push(format!("{} {}", Theme::dim(&format!("{key}:")), flatten(value)));
        }

        if let Some(exception) = record.context.get("exception") {
            self.push_exception(&mut lines, &flatten(exception));
        }

        lines.join("\n")
    }

    fn push_exception(&self, lines: &mut Vec<String>, exception: &str) {
        let (message, trace) = exception
            .split_once(STACKTRACE_MARKER)
            .unwrap_or((exception, ""));

        lines.push(format!("{}: {}", Theme::dim("exception"), message));

        let trace: Vec<&str> = trace.lines().collect();
        if trace.is_empty() {
            return;
        }

        lines.push(String::new());
        lines.push(Theme::dim("[stacktrace]"));
        if !self.options.stacktrace && trace.len() > TRACE_PREVIEW_LINES {
            lines.extend(trace[..TRACE_PREVIEW_LINES].iter().map(|l| Theme::dim(l)));
            lines.push(Theme::dim("[...]"));
        } else {
            lines.extend(trace.iter().map(|l| Theme::dim(l)));
        }
    }

    /// Single line rendering cut to `width` visible columns
    pub fn render_compact(&self, record: &LogRecord, width: usize) -> String {
        let line = format!("{} {}", self.header(record), self.message(record));
        truncate(&line, width)
    }
}

/// Full-width separator bar
pub fn separator(width: usize) -> String {
    Theme::tag(Theme::SEPARATOR, &" ".repeat(width))
}

/// `Found N log entries from A until B`, or `None` without records
pub fn summary(records: &[LogRecord]) -> Option<String> {
    let first = records.first()?;
    let last = records.last()?;
    Some(format!(
        "Found {} log entries from {} until {}",
        records.len(),
        first.timestamp.format(DATETIME_FORMAT),
        last.timestamp.format(DATETIME_FORMAT),
    ))
}

/// Render a context value on one line
///
/// Arrays and objects are flattened into comma-joined text.
pub fn flatten(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}: {}", flatten(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}
