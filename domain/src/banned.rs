//! Banned word and phrase filtering.

use std::sync::LazyLock;

use regex::Regex;

use crate::CheckError;

/// Runs of Unicode letters (general category `L`). Marks, letter numbers and
/// symbols such as circled letters end a word.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}+").expect("static word pattern compiles"));

/// Ordered set of banned terms. Terms containing a space are phrases and match
/// as substrings; all other terms match whole words only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BannedTermSet {
    terms: Vec<String>,
}

impl BannedTermSet {
    /// Build from raw terms. Terms are trimmed and lower-cased; blanks are dropped.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Check already lower-cased prompt text. Reports the first matching term
    /// in set order.
    pub fn check(&self, lowered_text: &str) -> Result<(), CheckError> {
        let words: Vec<&str> = WORD.find_iter(lowered_text).map(|m| m.as_str()).collect();

        let hit = self.terms.iter().find(|term| {
            if term.contains(' ') {
                lowered_text.contains(term.as_str())
            } else {
                words.iter().any(|w| *w == term.as_str())
            }
        });
        match hit {
            Some(term) => Err(CheckError::BannedPrompt(term.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> BannedTermSet {
        BannedTermSet::new(["cat", "  Very Bad Word ", ""])
    }

    #[test]
    fn construction_normalizes_terms() {
        let s = set();
        assert_eq!(s.len(), 2);
        assert_eq!(s.terms(), &["cat".to_string(), "very bad word".to_string()]);
    }

    #[test]
    fn single_words_respect_word_boundaries() {
        let s = set();
        assert!(s.check("catastrophe in the city").is_ok());
        assert_eq!(
            s.check("a black cat."),
            Err(CheckError::BannedPrompt("cat".into()))
        );
        // Digits and punctuation split words too.
        assert!(s.check("2cat,dog").is_err());
    }

    #[test]
    fn phrases_match_as_substrings() {
        let s = set();
        assert_eq!(
            s.check("this is a very bad wordsmith"),
            Err(CheckError::BannedPrompt("very bad word".into()))
        );
        assert!(s.check("very bad, word").is_ok());
    }

    #[test]
    fn first_term_in_order_is_reported() {
        let s = BannedTermSet::new(["dog", "cat"]);
        assert_eq!(
            s.check("cat and dog"),
            Err(CheckError::BannedPrompt("dog".into()))
        );
    }

    #[test]
    fn unicode_letters_form_words() {
        let s = BannedTermSet::new(["über"]);
        assert!(s.check("das über-auto").is_err());
        assert!(s.check("überall").is_ok());
    }

    #[test]
    fn non_letter_alphabetic_characters_separate_words() {
        let s = BannedTermSet::new(["cat"]);
        // Roman numeral (Nl), combining ypogegrammeni (Mn), circled A (So).
        for text in ["a cat\u{2160} here", "a cat\u{0345} here", "a \u{24b6}cat here"] {
            assert_eq!(
                s.check(text),
                Err(CheckError::BannedPrompt("cat".into())),
                "{text:?}"
            );
        }
    }

    #[test]
    fn empty_set_accepts_everything() {
        assert!(BannedTermSet::default().check("anything at all").is_ok());
    }
}
