use regex::{Captures, Regex, RegexBuilder};

use crate::theme::Theme;

/// Marks search matches in a message with the highlight tag
///
/// Occurrences that are already highlighted are left alone, so highlighting
/// twice gives the same result as highlighting once. A backslash-escaped
/// highlight tag around a match (`\<bg=yellow>term</>`) is rewritten with the
/// backslash moved inside the tag, which keeps the escape visible without
/// breaking the markup.
#[derive(Clone, Debug)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    /// Build a highlighter for a search term
    ///
    /// The term is a case-insensitive pattern; a term that does not compile
    /// is matched literally.
    pub fn new(term: &str) -> Self {
        if term.is_empty() {
            return Self { pattern: None };
        }

        let pattern = Self::build(term).or_else(|e| {
            tracing::debug!(term, error = %e, "highlighting search term literally");
            Self::build(&regex::escape(term))
        });

        Self {
            pattern: pattern.ok(),
        }
    }

    fn build(term: &str) -> Result<Regex, regex::Error> {
        let tag = regex::escape(&format!("<{}>", Theme::HIGHLIGHT));
        let close = regex::escape("</>");
        RegexBuilder::new(&format!(
            r"(?P<escaped>\\{tag}(?P<inner>(?:{term})){close})|(?P<done>{tag}\\?(?:{term}){close})|(?P<tag><(?:fg|bg|options)=[^<>/]*>|{close})|(?P<raw>(?:{term}))"
        ))
        .case_insensitive(true)
        .build()
    }

    /// Wrap every match of the term in the highlight tag
    pub fn highlight(&self, message: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return message.to_string();
        };

        pattern
            .replace_all(message, |caps: &Captures| {
                if let Some(inner) = caps.name("inner") {
                    return format!("<{}>\\{}</>", Theme::HIGHLIGHT, inner.as_str());
                }
                if let Some(raw) = caps.name("raw") {
                    if raw.as_str().is_empty() {
                        return String::new();
                    }
                    return Theme::tag(Theme::HIGHLIGHT, raw.as_str());
                }
                // already highlighted, or a tag delimiter that must stay intact
                caps[0].to_string()
            })
            .into_owned()
    }
}
