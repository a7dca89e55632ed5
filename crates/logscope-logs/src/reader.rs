use chrono::{DateTime, FixedOffset, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::ReadError;
use logscope_types::{LogLevel, LogRecord};

/// Turns one log file into structured records
pub trait LogFileReader: Send + Sync {
    /// Read and parse every record in the file, in file order
    fn read(&self, path: &Path) -> Result<Vec<LogRecord>, ReadError>;
}

/// Header of a Monolog line: `[2024-01-15 10:30:00] production.ERROR: message`
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\[(?P<datetime>\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?)\] (?P<channel>[^\s\]]+?)\.(?P<level>[A-Za-z]+): ?(?P<body>.*)$",
    )
    .expect("header pattern is valid")
});

/// Header fields and body of a record whose continuation lines are still being read
type Pending = (DateTime<FixedOffset>, String, String, String);

/// Reader for the Monolog `LineFormatter` layout used by Laravel
///
/// A record starts at a header line and runs until the next one, so stack
/// traces and multi-line messages stay with their record. The trailing
/// `{context} {extra}` JSON is split off the message when it parses; when it
/// does not, the whole body is kept as the message.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonologReader;

impl MonologReader {
    pub fn new() -> Self {
        Self
    }

    /// Parse the contents of a log file
    pub fn parse(&self, content: &str) -> Vec<LogRecord> {
        let mut records = Vec::new();
        let mut pending: Option<Pending> = None;

        for line in content.lines() {
            if let Some(caps) = HEADER.captures(line)
                && let Some(timestamp) = Self::parse_datetime(&caps["datetime"])
            {
                if let Some(done) = pending.take() {
                    records.push(Self::finish(done));
                }
                pending = Some((
                    timestamp,
                    caps["channel"].to_string(),
                    caps["level"].to_string(),
                    caps["body"].to_string(),
                ));
                continue;
            }

            match pending.as_mut() {
                Some((_, _, _, body)) => {
                    body.push('\n');
                    body.push_str(line);
                }
                None => tracing::trace!(line, "skipping line before first record header"),
            }
        }

        if let Some(done) = pending.take() {
            records.push(Self::finish(done));
        }

        records
    }

    fn finish((timestamp, channel, level_name, body): Pending) -> LogRecord {
        let (message, context, extra) = Self::split_body(&body);
        let level = LogLevel::parse_lossy(&level_name);
        let record = LogRecord::new(timestamp, channel, level, message)
            .with_context(context)
            .with_extra(extra);

        match level {
            LogLevel::Unknown => record.with_level_name(level_name),
            _ => record,
        }
    }

    /// Parse the bracketed header timestamp
    fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts);
        }
        const OFFSET_FORMATS: [&str; 3] = [
            "%Y-%m-%d %H:%M:%S%.f%:z",
            "%Y-%m-%dT%H:%M:%S%.f%z",
            "%Y-%m-%d %H:%M:%S%.f%z",
        ];
        for format in OFFSET_FORMATS {
            if let Ok(ts) = DateTime::parse_from_str(s, format) {
                return Some(ts);
            }
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc().fixed_offset())
    }

    /// Split `message {context} {extra}` into its parts
    fn split_body(body: &str) -> (String, Map<String, Value>, Map<String, Value>) {
        let trimmed = body.trim_end();

        for (idx, c) in trimmed.char_indices() {
            if c != '{' && c != '[' {
                continue;
            }
            if idx > 0 && !trimmed[..idx].ends_with(' ') {
                continue;
            }
            if let Some((context, extra)) = Self::parse_trailing_json(&trimmed[idx..]) {
                let message = trimmed[..idx].trim_end().to_string();
                return (message, context, extra);
            }
        }

        (trimmed.to_string(), Map::new(), Map::new())
    }

    /// Parse exactly two JSON values that make up the rest of the body
    fn parse_trailing_json(s: &str) -> Option<(Map<String, Value>, Map<String, Value>)> {
        let escaped = escape_raw_control_chars(s);
        let mut stream = serde_json::Deserializer::from_str(&escaped).into_iter::<Value>();

        let context = stream.next()?.ok()?;
        let extra = stream.next()?.ok()?;
        if !escaped[stream.byte_offset()..].trim().is_empty() {
            return None;
        }

        Some((into_map(context)?, into_map(extra)?))
    }
}

impl LogFileReader for MonologReader {
    fn read(&self, path: &Path) -> Result<Vec<LogRecord>, ReadError> {
        let bytes = std::fs::read(path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
            _ => ReadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        // stray binary in a message must not hide the rest of the file
        let records = self.parse(&String::from_utf8_lossy(&bytes));
        tracing::debug!(path = %path.display(), count = records.len(), "parsed log file");
        Ok(records)
    }
}

/// Convert a JSON context/extra value into an ordered map
///
/// PHP writes empty and sequential arrays as JSON lists; those become maps
/// keyed by index.
fn into_map(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        _ => None,
    }
}

/// Escape raw newlines and tabs that appear inside JSON strings
///
/// Monolog writes exception traces into the context with literal line
/// breaks, which strict JSON rejects.
fn escape_raw_control_chars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in s.chars() {
        if in_string {
            match c {
                _ if escaped => {
                    escaped = false;
                    out.push(c);
                }
                '\\' => {
                    escaped = true;
                    out.push(c);
                }
                '"' => {
                    in_string = false;
                    out.push(c);
                }
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
        }
    }

    out
}
