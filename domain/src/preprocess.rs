//! Prompt normalization, tokenization and strict URL extraction.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Candidate absolute URLs: an explicit scheme followed by `://`. Commas end a
/// URL since prompts use them to separate image references.
static URL_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b[a-z][a-z0-9+.\-]*://[^\s,<>"'`{}|\\^\[\]]+"#)
        .expect("static url pattern compiles")
});

/// Sentence punctuation that is never part of a trailing URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', ')', ']', '}', '>'];

/// Output of [`preprocess`]. `tokens` and `lowered` always have equal length.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Preprocessed {
    /// Normalized prompt: tokens rejoined with single spaces.
    pub prompt: String,
    pub tokens: Vec<String>,
    pub lowered: Vec<String>,
    /// Strict URLs from the raw input, in first-occurrence order.
    pub urls: Vec<String>,
}

impl Preprocessed {
    /// Lowered tokens joined with single spaces, the input of the banned filter.
    pub fn lowered_text(&self) -> String {
        self.lowered.join(" ")
    }
}

/// Normalize a raw prompt. Never fails; empty input yields empty collections.
pub fn preprocess(raw: &str) -> Preprocessed {
    // Some keyboards autocorrect `--` into an em-dash.
    let replaced = raw.replace('—', "--");
    let tokens: Vec<String> = replaced
        .trim_matches(' ')
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let lowered = tokens.iter().map(|t| t.to_lowercase()).collect();

    Preprocessed {
        prompt: tokens.join(" "),
        tokens,
        lowered,
        urls: extract_urls(raw),
    }
}

/// Extract strict absolute URLs (scheme and host required).
pub fn extract_urls(text: &str) -> Vec<String> {
    URL_CANDIDATE
        .find_iter(text)
        .filter_map(|m| {
            let candidate = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            let parsed = Url::parse(candidate).ok()?;
            match parsed.host_str() {
                Some(host) if !host.is_empty() => Some(candidate.to_string()),
                _ => None,
            }
        })
        .collect()
}
