use logscope_types::LogLevel;

/// Markup styles used in rendered output
pub struct Theme;

impl Theme {
    // Text colors
    pub const DIM: &'static str = "fg=gray";
    pub const MISSING: &'static str = "fg=red";
    pub const NULL: &'static str = "fg=yellow";

    // Highlight and separator backgrounds
    pub const HIGHLIGHT: &'static str = "bg=yellow";
    pub const SEPARATOR: &'static str = "bg=gray";

    // Section titles
    pub const TITLE: &'static str = "fg=green;options=bold";

    /// Wrap text in a tag
    pub fn tag(attr: &str, text: &str) -> String {
        format!("<{attr}>{text}</>")
    }

    pub fn dim(text: &str) -> String {
        Self::tag(Self::DIM, text)
    }

    pub fn title(text: &str) -> String {
        Self::tag(Self::TITLE, text)
    }

    /// Color of a level, most severe first
    pub fn level_color(level: LogLevel) -> &'static str {
        match level {
            LogLevel::Emergency => "magenta",
            LogLevel::Alert | LogLevel::Critical => "bright-red",
            LogLevel::Error => "red",
            LogLevel::Warning | LogLevel::Notice => "yellow",
            LogLevel::Info => "blue",
            LogLevel::Debug => "gray",
            LogLevel::Unknown => "white",
        }
    }

    /// Uppercase level name in its level color, white for unknown levels
    pub fn level_name(name: &str) -> String {
        let color = Self::level_color(LogLevel::parse_lossy(name));
        format!("<fg={color}>{}</>", name.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_colors() {
        assert_eq!(Theme::level_name("emergency"), "<fg=magenta>EMERGENCY</>");
        assert_eq!(Theme::level_name("critical"), "<fg=bright-red>CRITICAL</>");
        assert_eq!(Theme::level_name("notice"), "<fg=yellow>NOTICE</>");
        assert_eq!(Theme::level_name("debug"), "<fg=gray>DEBUG</>");
        assert_eq!(Theme::level_name("verbose"), "<fg=white>VERBOSE</>");
    }
}
