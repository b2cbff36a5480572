//! Text Signals
//!
//! Pulls unresolved questions and mentioned entities out of free text.
//! `HeuristicExtractor` is pattern matching, not language understanding:
//! it treats any capitalized word run as an entity (sentence-initial words
//! included). Swap in another `SignalExtractor` for anything better.

use std::collections::HashSet;

use regex::Regex;

const MAX_QUESTIONS: usize = 5;
const MAX_ENTITIES: usize = 10;
const MIN_QUESTION_LEN: usize = 5;
const FALLBACK_QUESTION: &str = "What information is missing?";
const GAP_MARKERS: [&str; 4] = ["missing", "need", "unknown", "to find"];

/// Extracts steering signals from a generated thought
pub trait SignalExtractor: Send + Sync {
    /// Questions the thought leaves open, in extraction order
    fn questions(&self, text: &str) -> Vec<String>;

    /// Names the thought mentions, in first-seen order
    fn entities(&self, text: &str) -> Vec<String>;
}

/// Regex/substring based extractor
pub struct HeuristicExtractor {
    sentence_break: Regex,
    entity_run: Regex,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            sentence_break: Regex::new(r"[\n\r.]+").expect("Invalid sentence pattern"),
            entity_run: Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+){0,3}\b")
                .expect("Invalid entity pattern"),
        }
    }
}

impl SignalExtractor for HeuristicExtractor {
    fn questions(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();

        // The piece after the final '?' was never terminated by one.
        let mut fragments: Vec<&str> = text.split('?').collect();
        fragments.pop();

        for fragment in fragments {
            let fragment = fragment.trim();
            if fragment.is_empty() {
                continue;
            }
            let last_sentence = self
                .sentence_break
                .split(fragment)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .last();
            if let Some(sentence) = last_sentence {
                candidates.push(format!("{}?", sentence));
            }
        }

        if !text.contains('?') {
            let lower = text.to_lowercase();
            if GAP_MARKERS.iter().any(|marker| lower.contains(marker)) {
                candidates.push(FALLBACK_QUESTION.to_string());
            }
        }

        dedup_limited(
            candidates
                .into_iter()
                .map(|q| q.trim().to_string())
                .filter(|q| q.chars().count() >= MIN_QUESTION_LEN),
            MAX_QUESTIONS,
        )
    }

    fn entities(&self, text: &str) -> Vec<String> {
        dedup_limited(
            self.entity_run.find_iter(text).map(|m| m.as_str().to_string()),
            MAX_ENTITIES,
        )
    }
}

fn dedup_limited<I>(items: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .take(limit)
        .collect()
}
