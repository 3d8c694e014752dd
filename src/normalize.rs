//! Text normalization of extracted listing rows.
//!
//! A row is first composed into a display string (`"<time> - <title>"`, plus
//! `" (<live>)"` when a live badge is present), then passed through an
//! ordered list of named [`Rule`]s. Each rule is a pure `String -> Option<String>`
//! step; `None` drops the entry.
//!
//! Two rule lists exist, selected by [`NormalizePolicy`]:
//!
//! | Policy | Rules |
//! |--------|-------|
//! | `collapse-duplicates` | trim, strip-site-chrome, strip-now-airing, collapse-duplicate-title, collapse-whitespace |
//! | `drop-reruns` | trim, drop-reruns-and-chrome, strip-site-chrome, strip-now-airing, collapse-whitespace |
//!
//! Matching is conservative: the bare "ACUM" marker is removed only as a
//! whole word, and duplicate titles are only collapsed when the repeat ends
//! on a word boundary.

use crate::extractor::RawEntry;
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// "See details" prompt rendered inside listing rows.
pub const SITE_CHROME: &str = "👉 Vezi detalii";

/// Tag marking a repeated broadcast.
pub const RERUN_TAG: &str = "(R)";

static SITE_CHROME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!("(?i){}", regex::escape(SITE_CHROME))).expect("valid regex"));
static NOW_AIRING_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\(ACUM\)").expect("valid regex"));
static NOW_AIRING_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bACUM\b").expect("valid regex"));
static MULTI_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// A single named normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Strip leading and trailing whitespace.
    Trim,
    /// Remove the "see details" prompt anywhere, case-insensitively.
    StripSiteChrome,
    /// Remove `(ACUM)` and the whole word `ACUM`, case-insensitively.
    StripNowAiring,
    /// `"<time> - <title> - <title>"` becomes `"<time> - <title>"`.
    CollapseDuplicateTitle,
    /// Drop entries tagged as reruns or carrying the "see details" prompt.
    DropRerunsAndChrome,
    /// Replace runs of two or more whitespace characters by one space, then trim.
    CollapseWhitespace,
}

impl Rule {
    pub fn name(&self) -> &'static str {
        match self {
            Rule::Trim => "trim",
            Rule::StripSiteChrome => "strip-site-chrome",
            Rule::StripNowAiring => "strip-now-airing",
            Rule::CollapseDuplicateTitle => "collapse-duplicate-title",
            Rule::DropRerunsAndChrome => "drop-reruns-and-chrome",
            Rule::CollapseWhitespace => "collapse-whitespace",
        }
    }

    pub fn apply(&self, text: String) -> Option<String> {
        match self {
            Rule::Trim => Some(text.trim().to_string()),
            Rule::StripSiteChrome => Some(SITE_CHROME_RE.replace_all(&text, "").into_owned()),
            Rule::StripNowAiring => {
                let text = NOW_AIRING_PAREN_RE.replace_all(&text, "");
                Some(NOW_AIRING_WORD_RE.replace_all(&text, "").into_owned())
            }
            Rule::CollapseDuplicateTitle => Some(collapse_duplicate_title(&text)),
            Rule::DropRerunsAndChrome => {
                if text.contains(RERUN_TAG) || text.contains(SITE_CHROME) {
                    None
                } else {
                    Some(text)
                }
            }
            Rule::CollapseWhitespace => {
                Some(MULTI_WS_RE.replace_all(&text, " ").trim().to_string())
            }
        }
    }
}

/// Which cleanup strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum NormalizePolicy {
    /// Strip noise in place and collapse duplicated titles.
    #[default]
    CollapseDuplicates,
    /// Drop reruns and rows carrying site prompts outright.
    DropReruns,
}

impl NormalizePolicy {
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            NormalizePolicy::CollapseDuplicates => &[
                Rule::Trim,
                Rule::StripSiteChrome,
                Rule::StripNowAiring,
                Rule::CollapseDuplicateTitle,
                Rule::CollapseWhitespace,
            ],
            NormalizePolicy::DropReruns => &[
                Rule::Trim,
                Rule::DropRerunsAndChrome,
                Rule::StripSiteChrome,
                Rule::StripNowAiring,
                Rule::CollapseWhitespace,
            ],
        }
    }
}

/// Turns [`RawEntry`] rows into display strings.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    rules: &'static [Rule],
}

impl Normalizer {
    pub fn new(policy: NormalizePolicy) -> Self {
        Self {
            rules: policy.rules(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        self.rules
    }

    /// Normalize one row. `None` means the row is dropped.
    pub fn normalize(&self, entry: &RawEntry) -> Option<String> {
        if entry.title.trim().is_empty() {
            return None;
        }
        self.apply_rules(compose(entry))
    }

    /// Normalize rows in order, skipping dropped ones.
    pub fn normalize_all(&self, entries: &[RawEntry]) -> Vec<String> {
        entries.iter().filter_map(|e| self.normalize(e)).collect()
    }

    /// Run the rule list over an already composed string.
    pub fn apply_rules(&self, mut text: String) -> Option<String> {
        for rule in self.rules {
            match rule.apply(text) {
                Some(next) => text = next,
                None => {
                    debug!(rule = rule.name(), "Entry dropped");
                    return None;
                }
            }
        }
        (!text.is_empty()).then_some(text)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizePolicy::default())
    }
}

/// `"<time> - <title>"`, with `" (<live>)"` appended for live rows.
pub fn compose(entry: &RawEntry) -> String {
    match &entry.live {
        Some(live) => format!("{} - {} ({})", entry.time, entry.title, live),
        None => format!("{} - {}", entry.time, entry.title),
    }
}

/// Anchored on the first `" - "`: while the remainder reads `<title> - <title>`
/// (case-insensitive, repeat ending on a word boundary), drop the repeat.
fn collapse_duplicate_title(text: &str) -> String {
    let mut current = text.to_string();
    while let Some(shorter) = collapse_once(&current) {
        current = shorter;
    }
    current
}

/// One collapse step, `None` when there is nothing to collapse.
fn collapse_once(text: &str) -> Option<String> {
    let anchor = text.find(" - ")?;
    let (head, rest) = text.split_at(anchor + 3);

    for (dash, _) in rest.match_indices('-') {
        let title = rest[..dash].trim_end();
        if title.is_empty() {
            continue;
        }
        let after = rest[dash + 1..].trim_start();
        if let Some(tail) = strip_prefix_ignore_case(after, title) {
            if ends_on_boundary(title, tail) {
                return Some(format!("{head}{title}{tail}"));
            }
        }
    }

    None
}

fn strip_prefix_ignore_case<'a>(haystack: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = haystack.char_indices();
    for p in prefix.chars() {
        let (_, h) = chars.next()?;
        if !h.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let consumed = chars.next().map_or(haystack.len(), |(i, _)| i);
    Some(&haystack[consumed..])
}

fn ends_on_boundary(matched: &str, tail: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    match (matched.chars().next_back(), tail.chars().next()) {
        (_, None) => true,
        (Some(last), Some(next)) => is_word(last) != is_word(next),
        (None, Some(_)) => false,
    }
}
