//! Query parsing, matching and ranking.
//!
//! A raw query such as `report ext:csv size:>1MB` is split into free text
//! (`report`) and filters (`ext=csv`, `size=>1MB`). The free text is matched
//! either as a case-insensitive substring of the name or relative path, or,
//! when it contains `*` or `?`, as an anchored glob over the name alone.
//!
//! ## Query Syntax
//!
//! - `pattern` - entries whose name or relative path contains "pattern"
//! - `*.txt` / `report?.csv` - glob over the name (`*` any run, `?` one char)
//! - `ext:csv` / `extension:csv` - files with that extension
//! - `folder:` / `dir:` - directories only
//! - `file:` - files only
//! - `size:>1MB`, `size:<500KB`, `size:2048` - file size comparison
//!
//! Unknown filter names are accepted and ignored. A filter whose value cannot
//! be parsed matches nothing instead of failing the whole query.

use crate::backend::CancelSignal;
use crate::error::{Result, ScoutError};
use crate::types::Entry;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Hard cap on the number of results any single search returns.
pub const MAX_RESULTS: usize = 1000;

/// How many entries a scan visits between cancel checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// A raw query split into free text and named filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
    /// Non-filter tokens joined with single spaces
    pub free_text: String,

    /// Filter name (lowercased) to value; the last occurrence wins
    pub filters: BTreeMap<String, String>,
}

impl ParsedQuery {
    /// True when the query has neither free text nor filters
    pub fn is_empty(&self) -> bool {
        self.free_text.is_empty() && self.filters.is_empty()
    }
}

/// Split a raw query into free text and filters.
///
/// Tokens are separated by whitespace. A token containing `:` is a filter,
/// split on its first colon into `name:value`.
pub fn parse_query(raw: &str) -> ParsedQuery {
    let mut filters = BTreeMap::new();
    let mut text_parts = Vec::new();

    for token in raw.split_whitespace() {
        if let Some((name, value)) = token.split_once(':') {
            filters.insert(name.to_lowercase(), value.to_string());
        } else {
            text_parts.push(token);
        }
    }

    ParsedQuery {
        free_text: text_parts.join(" "),
        filters,
    }
}

/// Check an entry against free text alone.
///
/// Convenience wrapper that compiles the text on every call; hot paths should
/// compile a `SearchQuery` once instead.
pub fn matches_free_text(entry: &Entry, text: &str) -> bool {
    build_matcher(text).matches(entry)
}

/// Check an entry against a set of named filters.
pub fn apply_filters(entry: &Entry, filters: &BTreeMap<String, String>) -> bool {
    filters
        .iter()
        .map(|(name, value)| SearchFilter::from_pair(name, value))
        .all(|filter| filter.matches(entry))
}

/// A compiled query ready for matching.
///
/// Compiling validates filters and builds the glob regex once so a scan over
/// hundreds of thousands of entries does no per-entry parsing.
#[derive(Clone)]
pub struct SearchQuery {
    /// The free-text matcher
    matcher: Arc<dyn Matcher>,

    /// Filters every match must also satisfy
    filters: Vec<SearchFilter>,

    /// Original free text, kept for ranking
    free_text: String,
}

impl std::fmt::Debug for SearchQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchQuery")
            .field("free_text", &self.free_text)
            .field("filters", &self.filters)
            .finish()
    }
}

impl SearchQuery {
    /// Parse and compile a raw query string.
    pub fn parse(raw: &str) -> Self {
        Self::compile(&parse_query(raw))
    }

    /// Compile an already parsed query.
    pub fn compile(parsed: &ParsedQuery) -> Self {
        let filters = parsed
            .filters
            .iter()
            .map(|(name, value)| SearchFilter::from_pair(name, value))
            .collect();

        SearchQuery {
            matcher: build_matcher(&parsed.free_text),
            filters,
            free_text: parsed.free_text.clone(),
        }
    }

    /// The free text this query was built from
    pub fn free_text(&self) -> &str {
        &self.free_text
    }

    /// Check if an entry matches the free text and every filter.
    pub fn matches(&self, entry: &Entry) -> bool {
        self.matcher.matches(entry) && self.filters.iter().all(|f| f.matches(entry))
    }

    /// Check if this query would match everything
    pub fn matches_all(&self) -> bool {
        self.matcher.matches_all()
            && self
                .filters
                .iter()
                .all(|f| matches!(f, SearchFilter::Ignored(_)))
    }
}

/// Comparison operator of a size filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeComparison {
    Greater,
    Less,
    Equal,
}

/// Filters to narrow search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchFilter {
    /// Only files with this extension (case-insensitive, no dot)
    Extension(String),

    /// Only directories
    DirsOnly,

    /// Only files
    FilesOnly,

    /// Only files whose size compares to `bytes`
    Size { comparison: SizeComparison, bytes: u64 },

    /// A filter name we do not recognize; matches everything
    Ignored(String),

    /// A filter whose value could not be parsed; matches nothing
    Never,
}

impl SearchFilter {
    /// Build a filter from a `name:value` pair.
    ///
    /// Malformed values degrade to `SearchFilter::Never`.
    pub fn from_pair(name: &str, value: &str) -> Self {
        match Self::try_from_pair(name, value) {
            Ok(filter) => filter,
            Err(e) => {
                debug!(error = %e, "Malformed filter, matching nothing");
                SearchFilter::Never
            }
        }
    }

    /// Build a filter, reporting malformed values as errors.
    pub fn try_from_pair(name: &str, value: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "ext" | "extension" => Ok(SearchFilter::Extension(
                value.trim_start_matches('.').to_string(),
            )),
            "folder" | "dir" => Ok(SearchFilter::DirsOnly),
            "file" => Ok(SearchFilter::FilesOnly),
            "size" => parse_size_filter(value).map_err(|reason| ScoutError::MalformedFilter {
                name: name.to_string(),
                value: value.to_string(),
                reason,
            }),
            other => Ok(SearchFilter::Ignored(other.to_string())),
        }
    }

    /// Check if an entry passes this filter.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            SearchFilter::Extension(ext) => entry.has_extension(ext),
            SearchFilter::DirsOnly => entry.is_dir,
            SearchFilter::FilesOnly => !entry.is_dir,
            SearchFilter::Size { comparison, bytes } => {
                if entry.is_dir {
                    return false;
                }
                let size = entry.size.unwrap_or(0);
                match comparison {
                    SizeComparison::Greater => size > *bytes,
                    SizeComparison::Less => size < *bytes,
                    SizeComparison::Equal => size == *bytes,
                }
            }
            SearchFilter::Ignored(_) => true,
            SearchFilter::Never => false,
        }
    }
}

/// Parse `[<>=]?NUMBER(KB|MB|GB)?` into a size filter.
fn parse_size_filter(value: &str) -> std::result::Result<SearchFilter, String> {
    let (comparison, rest) = match value.chars().next() {
        Some('>') => (SizeComparison::Greater, &value[1..]),
        Some('<') => (SizeComparison::Less, &value[1..]),
        Some('=') => (SizeComparison::Equal, &value[1..]),
        _ => (SizeComparison::Equal, value),
    };

    let upper = rest.to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else {
        (upper.as_str(), 1)
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected a number, got {:?}", rest));
    }

    let bytes = digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
        .ok_or_else(|| "size out of range".to_string())?;

    Ok(SearchFilter::Size { comparison, bytes })
}

// === Scanning and Ranking ===

/// Scan entries for matches, stopping at `limit`, then rank what was found.
///
/// The cap is enforced while scanning so a query matching most of a huge
/// tree still returns quickly. Returns `ScoutError::Cancelled` if the signal
/// fires mid-scan.
pub fn search_entries<'a, I>(
    entries: I,
    query: &SearchQuery,
    limit: usize,
    cancel: &dyn CancelSignal,
) -> Result<Vec<Entry>>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let limit = limit.min(MAX_RESULTS);
    let mut results = Vec::new();

    for (visited, entry) in entries.into_iter().enumerate() {
        if visited % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            return Err(ScoutError::Cancelled);
        }
        if results.len() >= limit {
            break;
        }
        if query.matches(entry) {
            results.push(entry.clone());
        }
    }

    rank(&mut results, query.free_text());
    Ok(results)
}

/// Sort results for display.
///
/// Order: exact (case-insensitive) name match first, then shallower relative
/// depth, then directories before files, then name ascending. The normalized
/// path breaks remaining ties so the order is deterministic.
pub fn rank(results: &mut [Entry], free_text: &str) {
    let text_lower = free_text.to_lowercase();

    results.sort_by(|a, b| {
        let a_exact = a.name_lower == text_lower;
        let b_exact = b.name_lower == text_lower;

        b_exact
            .cmp(&a_exact)
            .then_with(|| a.depth().cmp(&b.depth()))
            .then_with(|| b.is_dir.cmp(&a.is_dir))
            .then_with(|| a.name_lower.cmp(&b.name_lower))
            .then_with(|| a.key().cmp(&b.key()))
    });
}

// === Matcher Implementations ===

/// Trait for free-text matching implementations.
trait Matcher: Send + Sync {
    fn matches(&self, entry: &Entry) -> bool;

    /// Returns true if this matcher matches everything
    fn matches_all(&self) -> bool {
        false
    }
}

fn build_matcher(text: &str) -> Arc<dyn Matcher> {
    if text.contains('*') || text.contains('?') {
        match WildcardMatcher::new(text) {
            Ok(matcher) => Arc::new(matcher),
            Err(e) => {
                debug!(error = %e, "Invalid wildcard, matching nothing");
                Arc::new(NeverMatcher)
            }
        }
    } else {
        Arc::new(SubstringMatcher::new(text))
    }
}

/// Case-insensitive substring over name or relative path.
struct SubstringMatcher {
    pattern_lower: String,
}

impl SubstringMatcher {
    fn new(pattern: &str) -> Self {
        SubstringMatcher {
            pattern_lower: pattern.to_lowercase(),
        }
    }
}

impl Matcher for SubstringMatcher {
    fn matches(&self, entry: &Entry) -> bool {
        if self.pattern_lower.is_empty() {
            return true;
        }
        entry.name_lower.contains(&self.pattern_lower)
            || entry.relative_lower.contains(&self.pattern_lower)
    }

    fn matches_all(&self) -> bool {
        self.pattern_lower.is_empty()
    }
}

/// Anchored, case-insensitive glob over the name.
///
/// Converts glob patterns to regex for matching.
struct WildcardMatcher {
    regex: Regex,
}

impl WildcardMatcher {
    fn new(pattern: &str) -> Result<Self> {
        let mut regex_pattern = String::with_capacity(pattern.len() * 2 + 8);
        regex_pattern.push_str("(?is)^");

        for c in pattern.chars() {
            match c {
                '*' => regex_pattern.push_str(".*"),
                '?' => regex_pattern.push('.'),
                _ => regex_pattern.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }

        regex_pattern.push('$');

        let regex = Regex::new(&regex_pattern).map_err(|e| ScoutError::MalformedFilter {
            name: "wildcard".to_string(),
            value: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(WildcardMatcher { regex })
    }
}

impl Matcher for WildcardMatcher {
    fn matches(&self, entry: &Entry) -> bool {
        self.regex.is_match(&entry.name)
    }
}

/// Stand-in for a pattern that failed to compile.
struct NeverMatcher;

impl Matcher for NeverMatcher {
    fn matches(&self, _entry: &Entry) -> bool {
        false
    }
}
