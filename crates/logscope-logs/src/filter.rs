use regex::{Regex, RegexBuilder};

use logscope_types::{FilterSpec, LogLevel, LogRecord};

/// How a search term is matched against messages
#[derive(Clone, Debug)]
enum Matcher {
    /// Case-insensitive regular expression
    Pattern(Regex),

    /// Lowercased literal, used when the term is not a valid pattern
    Literal(String),
}

/// Compiled form of a `FilterSpec`
#[derive(Clone, Debug)]
pub struct CompiledFilter {
    /// Search matcher (if any)
    matcher: Option<Matcher>,

    /// Level to keep (if any)
    level: Option<LogLevel>,

    /// Number of trailing records to keep (if any)
    max_count: Option<usize>,
}

impl CompiledFilter {
    /// Compile a filter spec
    ///
    /// A search term that fails to compile as a regex is matched as a literal
    /// substring instead, so special characters never abort a run.
    pub fn new(spec: &FilterSpec) -> Self {
        let matcher = spec.search.as_deref().map(Self::compile_search);

        Self {
            matcher,
            level: spec.level,
            max_count: spec.max_count,
        }
    }

    fn compile_search(term: &str) -> Matcher {
        match RegexBuilder::new(term).case_insensitive(true).build() {
            Ok(re) => Matcher::Pattern(re),
            Err(e) => {
                tracing::debug!(
                    term,
                    error = %e,
                    "search term is not a valid pattern, matching literally"
                );
                Matcher::Literal(term.to_lowercase())
            }
        }
    }

    /// Check whether a record passes the level and search criteria
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(level) = self.level
            && record.level != level
        {
            return false;
        }

        match &self.matcher {
            Some(Matcher::Pattern(re)) => re.is_match(&record.message),
            Some(Matcher::Literal(term)) => record.message.to_lowercase().contains(term.as_str()),
            None => true,
        }
    }

    /// Apply level, then search, then count to an already sorted list
    pub fn apply(&self, records: &[LogRecord]) -> Vec<LogRecord> {
        let matched: Vec<&LogRecord> = records.iter().filter(|r| self.matches(r)).collect();
        let start = match self.max_count {
            Some(n) => matched.len().saturating_sub(n),
            None => 0,
        };
        matched[start..].iter().map(|r| (*r).clone()).collect()
    }

    /// Keep only the trailing `max_count` records
    pub fn limit(&self, records: &mut Vec<LogRecord>) {
        if let Some(n) = self.max_count
            && records.len() > n
        {
            records.drain(..records.len() - n);
        }
    }

    /// Check if the search term fell back to literal matching
    pub fn is_literal(&self) -> bool {
        matches!(self.matcher, Some(Matcher::Literal(_)))
    }
}
