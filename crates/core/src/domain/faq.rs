use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Keywords must be longer than this many characters.
pub const KEYWORD_MIN_EXCLUSIVE_LEN: usize = 3;

/// Distinct keywords that must hit the same FAQ entry before it is returned.
pub const REQUIRED_KEYWORD_HITS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self { question: question.into(), answer: answer.into() }
    }
}

/// Comparison form of a question for exact matches and keyword containment.
/// Storage backends persist this next to the question so every backend
/// compares the same text.
pub fn faq_match_key(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Candidate keywords of a question: normalized tokens longer than three
/// characters, deduplicated, in the order they first appear.
pub fn faq_keywords(question: &str) -> Vec<String> {
    let normalized = normalize(question);
    let mut keywords: Vec<String> = Vec::new();
    for token in normalized.tokens() {
        if token.len() > KEYWORD_MIN_EXCLUSIVE_LEN && !keywords.iter().any(|seen| seen == token) {
            keywords.push(token.to_string());
        }
    }
    keywords
}

/// Counts distinct keyword hits per FAQ entry. Shared by the in-memory and
/// SQL lookup implementations so both apply the same two-keyword rule.
#[derive(Debug)]
pub struct KeywordTally<K> {
    hits: HashMap<K, usize>,
}

impl<K> Default for KeywordTally<K> {
    fn default() -> Self {
        Self { hits: HashMap::new() }
    }
}

impl<K: Eq + Hash> KeywordTally<K> {
    /// Records one keyword hit for `entry`; callers must feed each keyword at
    /// most once per entry. Returns true when the entry just qualified.
    pub fn record(&mut self, entry: K) -> bool {
        let count = self.hits.entry(entry).or_insert(0);
        *count += 1;
        *count == REQUIRED_KEYWORD_HITS
    }
}

/// Exact case-insensitive question match first, then the keyword rule.
pub fn match_faq<'a>(entries: &'a [FaqEntry], question: &str) -> Option<&'a FaqEntry> {
    let wanted = faq_match_key(question);
    if wanted.is_empty() {
        return None;
    }

    let keys = entries.iter().map(|entry| faq_match_key(&entry.question)).collect::<Vec<_>>();
    if let Some(index) = keys.iter().position(|key| *key == wanted) {
        return entries.get(index);
    }

    let mut tally = KeywordTally::default();
    for keyword in faq_keywords(question) {
        for (index, key) in keys.iter().enumerate() {
            if key.contains(keyword.as_str()) && tally.record(index) {
                return entries.get(index);
            }
        }
    }

    None
}
