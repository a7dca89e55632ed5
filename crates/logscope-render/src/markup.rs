//! The flat `<attr>text</>` markup grammar
//!
//! Spans do not nest: a tag opens at `<attr>` and closes at the next `</>`.
//! A `<` preceded by a backslash is literal text.

use crossterm::style::{Attribute, Color, ContentStyle};
use regex::Regex;
use std::sync::LazyLock;

static SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(?P<attr>[^/<>\s][^<>]*?)>(?P<content>.*?)</>")
        .expect("span pattern is valid")
});

/// A piece of marked-up text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any tag
    Plain(&'a str),

    /// Text wrapped in `<attr>…</>`
    Tagged { attr: &'a str, content: &'a str },
}

impl Segment<'_> {
    /// Text shown to the reader
    pub fn visible(&self) -> &str {
        match self {
            Self::Plain(text) => text,
            Self::Tagged { content, .. } => content,
        }
    }
}

/// Split marked-up text into alternating plain runs and tagged spans
pub fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while let Some(caps) = SPAN.captures_at(text, pos) {
        let Some(whole) = caps.get(0) else {
            break;
        };
        if text[..whole.start()].ends_with('\\') {
            // only the escaped `<` is literal, a later span may still open
            pos = whole.start() + 1;
            continue;
        }
        if whole.start() > plain_start {
            out.push(Segment::Plain(&text[plain_start..whole.start()]));
        }
        if let (Some(attr), Some(content)) = (caps.name("attr"), caps.name("content")) {
            out.push(Segment::Tagged {
                attr: attr.as_str(),
                content: content.as_str(),
            });
        }
        plain_start = whole.end();
        pos = whole.end();
    }

    if plain_start < text.len() {
        out.push(Segment::Plain(&text[plain_start..]));
    }

    out
}

/// Remove all tags, keeping their content
pub fn strip(text: &str) -> String {
    segments(text).iter().map(Segment::visible).collect()
}

/// Translate markup into ANSI escape sequences
///
/// Unknown attributes render their content unstyled.
pub fn to_ansi(text: &str) -> String {
    segments(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.to_string(),
            Segment::Tagged { attr, content } => match parse_style(attr) {
                Some(style) => style.apply(content).to_string(),
                None => content.to_string(),
            },
        })
        .collect()
}

/// Parse `fg=red;bg=gray;options=bold,underscore`
fn parse_style(attr: &str) -> Option<ContentStyle> {
    let mut style = ContentStyle::new();
    let mut known = false;

    for part in attr.split(';') {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        match key.trim() {
            "fg" => {
                style.foreground_color = color(value.trim());
                known |= style.foreground_color.is_some();
            }
            "bg" => {
                style.background_color = color(value.trim());
                known |= style.background_color.is_some();
            }
            "options" => {
                for option in value.split(',') {
                    let attribute = match option.trim() {
                        "bold" => Attribute::Bold,
                        "underscore" => Attribute::Underlined,
                        "blink" => Attribute::SlowBlink,
                        "reverse" => Attribute::Reverse,
                        "conceal" => Attribute::Hidden,
                        _ => continue,
                    };
                    style.attributes.set(attribute);
                    known = true;
                }
            }
            _ => {}
        }
    }

    known.then_some(style)
}

/// Map a markup color name onto the ANSI palette
fn color(name: &str) -> Option<Color> {
    let color = match name {
        "black" => Color::Black,
        "red" => Color::DarkRed,
        "green" => Color::DarkGreen,
        "yellow" => Color::DarkYellow,
        "blue" => Color::DarkBlue,
        "magenta" => Color::DarkMagenta,
        "cyan" => Color::DarkCyan,
        "white" => Color::Grey,
        "gray" | "grey" | "bright-black" => Color::DarkGrey,
        "bright-red" => Color::Red,
        "bright-green" => Color::Green,
        "bright-yellow" => Color::Yellow,
        "bright-blue" => Color::Blue,
        "bright-magenta" => Color::Magenta,
        "bright-cyan" => Color::Cyan,
        "bright-white" => Color::White,
        "default" => Color::Reset,
        _ => return None,
    };
    Some(color)
}
