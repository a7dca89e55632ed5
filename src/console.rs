use std::io::{self, Write};

use logscope_render::{Theme, markup, visible_width};

/// Line-oriented writer for marked-up text
///
/// Markup is translated to ANSI escapes when color is enabled and stripped
/// otherwise.
pub struct Console<W: Write> {
    out: W,
    color: bool,
    width: usize,
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool, width: usize) -> Self {
        Self { out, color, width }
    }

    /// Terminal width in columns
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn line(&mut self, text: &str) -> io::Result<()> {
        let rendered = if self.color {
            markup::to_ansi(text)
        } else {
            markup::strip(text)
        };
        writeln!(self.out, "{rendered}")
    }

    pub fn new_line(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    pub fn warn(&mut self, text: &str) -> io::Result<()> {
        self.line(&Theme::tag("fg=yellow", text))
    }

    pub fn error(&mut self, text: &str) -> io::Result<()> {
        self.line(&Theme::tag("fg=white;bg=red", text))
    }

    /// `key ........ value` spanning the console width
    pub fn two_column(&mut self, key: &str, value: &str) -> io::Result<()> {
        let used = visible_width(key) + visible_width(value) + 4;
        let dots = self.width.saturating_sub(used).max(1);
        self.line(&format!(
            "  {key} {} {value}",
            Theme::dim(&".".repeat(dots))
        ))
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
