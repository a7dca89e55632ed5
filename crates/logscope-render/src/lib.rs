//! Terminal rendering for logscope
//!
//! Records are rendered to a flat `<attr>text</>` markup, which is either
//! translated to ANSI escapes or stripped by the caller.

pub mod markup;

mod formatter;
mod highlight;
mod theme;
mod truncate;

pub use formatter::{DATETIME_FORMAT, FormatOptions, Formatter, flatten, separator, summary};
pub use highlight::Highlighter;
pub use theme::Theme;
pub use truncate::{truncate, visible_width};
