//! Lemma analyzer: a pure function from text to lemma counts, and from a
//! search query to a deduplicated lemma list. Word splitting uses
//! `unicode-segmentation` to walk word boundaries rather than hand-rolling
//! whitespace splitting.
//!
//! "Lemma" here means normalized word form: lowercased, stripped of
//! non-alphabetic characters, stopwords dropped. There is no morphological
//! stemmer; a lemma is the normalized surface form itself.

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

/// Built-in stopword list (SPEC_FULL.md §11): function words dropped from
/// both indexing and query analysis so "stopwords dropped" has concrete
/// content. English-only; the underlying spec only requires *a* stopword
/// set, not any particular language's.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "has", "have", "he",
    "her", "hers", "him", "his", "i", "if", "in", "into", "is", "it", "its", "me", "my", "no",
    "nor", "not", "of", "on", "or", "our", "ours", "she", "so", "than", "that", "the", "their",
    "them", "then", "there", "these", "they", "this", "those", "to", "too", "us", "was", "we",
    "were", "what", "when", "where", "which", "who", "why", "will", "with", "you", "your",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Normalize a raw token: lowercase, strip everything but alphanumerics.
/// Returns `None` if nothing alphabetic survives or it's a stopword.
fn normalize(word: &str) -> Option<String> {
    let cleaned: String = word
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect();
    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    if is_stopword(&cleaned) {
        return None;
    }
    Some(cleaned)
}

/// Count lemma occurrences in free text. Used both for full-page indexing
/// and for per-sentence scoring during snippet extraction.
pub fn count_lemmas(text: &str) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for word in text.unicode_words() {
        if let Some(lemma) = normalize(word) {
            *counts.entry(lemma).or_insert(0) += 1;
        }
    }
    counts
}

/// Strip HTML tags, decode nothing (the scraper crate already yields decoded
/// text nodes), and collapse whitespace — used to turn a `scraper::Html`
/// document's extracted text into the plain-text blob the analyzer counts.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Analyze a search query into a deduplicated, stopword-free lemma list.
/// Order is not significant downstream (candidate-page lookups are
/// per-lemma), but is kept stable for deterministic test assertions.
pub fn analyze_query(query: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut lemmas = Vec::new();
    for word in query.unicode_words() {
        if let Some(lemma) = normalize(word) {
            if seen.insert(lemma.clone()) {
                lemmas.push(lemma);
            }
        }
    }
    lemmas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_lemmas_drops_stopwords_and_lowercases() {
        let counts = count_lemmas("The Cat sat on THE mat. A cat ran.");
        assert_eq!(counts.get("cat"), Some(&2));
        assert_eq!(counts.get("mat"), Some(&1));
        assert_eq!(counts.get("ran"), Some(&1));
        assert!(!counts.contains_key("the"));
        assert!(!counts.contains_key("on"));
        assert!(!counts.contains_key("a"));
    }

    #[test]
    fn analyze_query_dedupes_and_preserves_first_occurrence_order() {
        let lemmas = analyze_query("the quick brown fox the quick fox jumps");
        assert_eq!(lemmas, vec!["quick", "brown", "fox", "jumps"]);
    }

    #[test]
    fn normalize_strips_punctuation() {
        let counts = count_lemmas("Hello, world! Hello-world?");
        assert_eq!(counts.get("hello"), Some(&2));
        assert_eq!(counts.get("world"), Some(&2));
    }

    #[test]
    fn empty_text_yields_empty_counts() {
        assert!(count_lemmas("").is_empty());
        assert!(analyze_query("the a an").is_empty());
    }
}
