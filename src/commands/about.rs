use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use super::{Context, Outcome};
use crate::console::Console;
use logscope_logs::{ChannelConfig, ChannelConfigSource, EMERGENCY_CHANNEL, modified};
use logscope_render::{DATETIME_FORMAT, Theme, flatten};

/// Settings that are never printed
const SECRET_KEYS: [&str; 4] = ["handler_with", "password", "url", "username"];

fn null() -> String {
    Theme::tag(Theme::NULL, "-")
}

fn secret() -> String {
    Theme::dim("****")
}

/// Print an overview of the logging configuration and its channels
pub fn about<W: Write>(
    ctx: &Context,
    log_level: Option<&str>,
    console: &mut Console<W>,
) -> Result<Outcome> {
    let config = &ctx.config;
    let main = [
        ("Default Channel", config.default_channel()),
        ("Deprecations Channel", config.deprecations_channel()),
    ];

    let mut overview = vec![(
        "Global Log Level".to_string(),
        log_level.map(Theme::level_name).unwrap_or_else(null),
    )];
    // (section title, channel name, forced level)
    let mut sections: Vec<(String, &str, Option<&str>)> = Vec::new();

    if config.channel(EMERGENCY_CHANNEL).is_some() {
        sections.push((
            format!("{EMERGENCY_CHANNEL} (internal)"),
            EMERGENCY_CHANNEL,
            Some("emergency"),
        ));
    }

    for (key, name) in main {
        let Some(name) = name else {
            overview.push((key.to_string(), null()));
            continue;
        };
        sections.push((name.to_string(), name, None));

        let subchannels = config
            .channel(name)
            .map(|c| c.channels.as_slice())
            .unwrap_or_default();
        if subchannels.is_empty() {
            overview.push((key.to_string(), name.to_string()));
        } else {
            let value = format!("{name}: {}", subchannels.join(", "));
            overview.push((key.to_string(), value));
            sections.extend(
                subchannels
                    .iter()
                    .map(|sub| (sub.clone(), sub.as_str(), None)),
            );
        }
    }

    section(console, "Logging Configuration", &overview)?;

    let mut shown: Vec<&str> = Vec::new();
    for (title, name, level) in sections {
        if shown.contains(&name) {
            continue;
        }
        let rows = channel_rows(config.channel(name), level);
        section(console, &format!("Channel: {title}"), &rows)?;
        shown.push(name);
    }

    console.new_line()?;
    Ok(Outcome::Success)
}

fn section<W: Write>(
    console: &mut Console<W>,
    title: &str,
    rows: &[(String, String)],
) -> Result<()> {
    console.new_line()?;
    console.line(&format!("  {}", Theme::title(title)))?;
    for (key, value) in rows {
        console.two_column(key, value)?;
    }
    Ok(())
}

/// Driver, level and path first, then the remaining settings by key
fn channel_rows(config: Option<&ChannelConfig>, level: Option<&str>) -> Vec<(String, String)> {
    let Some(config) = config else {
        return vec![("driver".into(), null()), ("level".into(), null())];
    };

    let mut rows = vec![
        (
            "driver".to_string(),
            config
                .driver
                .as_ref()
                .map(|d| d.as_str().to_string())
                .unwrap_or_else(null),
        ),
        (
            "level".to_string(),
            level
                .or(config.level.as_deref())
                .map(Theme::level_name)
                .unwrap_or_else(null),
        ),
    ];
    if let Some(path) = &config.path {
        rows.push(("path".to_string(), describe_path(path)));
    }

    let mut rest: BTreeMap<&str, Value> = config
        .settings
        .iter()
        .map(|(key, value)| (key.as_str(), value.clone()))
        .collect();
    if !config.channels.is_empty() {
        rest.insert("channels", Value::from(config.channels.clone()));
    }
    if let Some(days) = config.days {
        rest.insert("days", Value::from(days));
    }

    rows.extend(
        rest.into_iter()
            .map(|(key, value)| (key.to_string(), describe_value(key, &value))),
    );
    rows
}

fn describe_path(path: &Path) -> String {
    match modified(path) {
        Some(time) => format!(
            "{} {}",
            Theme::dim(&format!("<{}>", time.format(DATETIME_FORMAT))),
            path.display()
        ),
        None => format!(
            "{} {}",
            Theme::dim("<file missing>"),
            Theme::tag(Theme::MISSING, &path.display().to_string())
        ),
    }
}

fn describe_value(key: &str, value: &Value) -> String {
    if SECRET_KEYS.contains(&key) {
        return secret();
    }
    match value {
        Value::Null => null(),
        Value::Bool(b) => Theme::dim(&b.to_string()),
        other => flatten(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{console, context, output, write_log};
    use logscope_logs::{LoggingConfig, MonologReader};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn run(ctx: &Context, log_level: Option<&str>) -> String {
        let mut console = console();
        assert_eq!(about(ctx, log_level, &mut console).unwrap(), Outcome::Success);
        output(console)
    }

    fn row<'a>(out: &'a str, key: &str) -> &'a str {
        out.lines()
            .find(|l| l.starts_with(&format!("  {key} ")))
            .unwrap_or_else(|| panic!("no row {key} in:\n{out}"))
    }

    #[test]
    fn test_lists_channels_in_order() {
        let dir = tempdir().unwrap();
        let out = run(&context(dir.path()), None);

        let titles: Vec<&str> = out
            .lines()
            .filter(|l| l.starts_with("  Channel: "))
            .collect();
        assert_eq!(
            titles,
            vec![
                "  Channel: emergency (internal)",
                "  Channel: stack",
                "  Channel: single",
                "  Channel: null",
            ]
        );
        assert!(row(&out, "Default Channel").ends_with(" stack: single"));
        assert!(row(&out, "Deprecations Channel").ends_with(" null"));
        assert!(row(&out, "Global Log Level").ends_with(" -"));
        assert!(!out.contains("Channel: slack"));
    }

    #[test]
    fn test_channel_details() {
        let dir = tempdir().unwrap();
        write_log(dir.path(), "laravel.log", &[]);
        let out = run(&context(dir.path()), Some("warning"));

        assert!(row(&out, "Global Log Level").ends_with(" WARNING"));

        let single = out.split("Channel: single").nth(1).unwrap();
        assert!(row(single, "driver").ends_with(" single"));
        assert!(row(single, "level").ends_with(" DEBUG"));
        let path = dir.path().join("laravel.log");
        let path_row = row(single, "path");
        assert!(path_row.ends_with(&format!("> {}", path.display())));
        assert!(!path_row.contains("<file missing>"));

        let emergency = out.split("Channel: emergency (internal)").nth(1).unwrap();
        assert!(row(emergency, "driver").ends_with(" -"));
        assert!(row(emergency, "level").ends_with(" EMERGENCY"));
        assert!(row(emergency, "path").contains("<file missing>"));

        let stack = out.split("Channel: stack").nth(1).unwrap();
        assert!(row(stack, "channels").ends_with(" single"));
        assert!(row(stack, "ignore_exceptions").ends_with(" false"));
    }

    #[test]
    fn test_secrets_are_masked() {
        let dir = tempdir().unwrap();
        let config = LoggingConfig::parse(
            r#"
default = "slack"

[channels.slack]
driver = "slack"
url = "https://hooks.example/T000"
username = "Laravel Log"
emoji = ":boom:"
"#,
            dir.path(),
        )
        .unwrap();
        let ctx = Context::new(config, Arc::new(MonologReader::new()));
        let out = run(&ctx, None);

        assert!(!out.contains("hooks.example"));
        assert!(!out.contains("Laravel Log"));
        assert!(row(&out, "url").ends_with(" ****"));
        assert!(row(&out, "username").ends_with(" ****"));
        assert!(row(&out, "emoji").ends_with(" :boom:"));
        assert!(row(&out, "driver").ends_with(" slack"));
        assert!(!out.contains("emergency (internal)"));
    }
}
