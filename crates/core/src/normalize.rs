//! Lexical normalization of raw support queries.
//!
//! The normalized form is only a matching key for phrase tables and keyword
//! lookups. The caller's original text is what gets echoed back and handed to
//! the lookup and completion stages.

use std::fmt;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NormalizedQuery(String);

impl NormalizedQuery {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    /// True when `token` appears as a standalone word, so `it` does not match `item`.
    pub fn has_token(&self, token: &str) -> bool {
        self.tokens().any(|candidate| candidate == token)
    }

    /// Substring membership, the rule used by the handoff and custom-intent tables.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        self.0.contains(phrase)
    }
}

impl fmt::Display for NormalizedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Keeps `[A-Za-z0-9 ]`, lowercases, trims. Total and deterministic.
pub fn normalize(text: &str) -> NormalizedQuery {
    let kept = text
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || *character == ' ')
        .map(|character| character.to_ascii_lowercase())
        .collect::<String>();
    NormalizedQuery(kept.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("  Where's my ORDER, SH123?! ").as_str(), "wheres my order sh123");
    }

    #[test]
    fn drops_non_ascii_and_control_characters() {
        assert_eq!(normalize("caf\u{e9}\tstatus\n").as_str(), "cafstatus");
        assert!(normalize("?!...").is_empty());
    }

    #[test]
    fn token_match_is_whole_word() {
        let normalized = normalize("Is the item in stock?");
        assert!(!normalized.has_token("it"));
        assert!(normalize("what about it?").has_token("it"));
    }
}
