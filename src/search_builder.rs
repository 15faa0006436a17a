//! SearchBuilder.
//!
//! Assembles ranked pages (from `LemmaFrequencyService::search`) into
//! `SearchResult` values with a title, a snippet, and the relative score
//! already computed upstream. Snippet extraction splits page text into
//! sentences, scores each by how many distinct query lemmas it contains,
//! and keeps the best.

use std::sync::Arc;

use anyhow::Result;

use crate::analyzer;
use crate::domain::models::SearchResult;
use crate::fetcher;
use crate::lemma_frequency_service::RankedPage;
use crate::repository::{PageRepository, SiteRepository};

const SNIPPET_MAX_LEN: usize = 240;

pub struct SearchBuilder {
    pages: Arc<dyn PageRepository>,
    sites: Arc<dyn SiteRepository>,
}

impl SearchBuilder {
    pub fn new(pages: Arc<dyn PageRepository>, sites: Arc<dyn SiteRepository>) -> Self {
        Self { pages, sites }
    }

    pub async fn build(
        &self,
        ranked: Vec<RankedPage>,
        q_lemmas: &[String],
    ) -> Result<Vec<SearchResult>> {
        let mut results = Vec::with_capacity(ranked.len());
        for entry in ranked {
            let Some(page) = self.pages.find_by_id(entry.page_id).await? else {
                continue;
            };
            let Some(site) = self.sites.find_by_id(page.site_id).await? else {
                continue;
            };
            let text = fetcher::extract_text(&page.content);
            let title = fetcher::extract_title(&page.content).unwrap_or_else(|| page.path.clone());
            let snippet = best_snippet(&text, q_lemmas);

            results.push(SearchResult {
                site: site.url.clone(),
                site_name: site.name.clone(),
                uri: page.path.clone(),
                title,
                snippet,
                relevance: entry.score,
            });
        }
        Ok(results)
    }
}

/// Split `text` into sentences on `. ! ?`, score each by the count of
/// distinct query lemmas it contains, return the highest-scoring one
/// (ties broken by first occurrence), truncated with an ellipsis.
fn best_snippet(text: &str, q_lemmas: &[String]) -> String {
    let sentences: Vec<&str> = text
        .split(|c| c == '.' || c == '!' || c == '?')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.is_empty() {
        return truncate(text);
    }

    let mut best: Option<(&str, usize)> = None;
    for sentence in &sentences {
        let lemmas = analyzer::count_lemmas(sentence);
        let score = q_lemmas.iter().filter(|l| lemmas.contains_key(*l)).count();
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((sentence, score)),
        }
    }

    truncate(best.map(|(s, _)| s).unwrap_or(sentences[0]))
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= SNIPPET_MAX_LEN {
        return s.to_string();
    }
    let truncated: String = s.chars().take(SNIPPET_MAX_LEN).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_snippet_prefers_sentence_with_more_query_lemmas() {
        let text = "Cats are great pets. Dogs and cats make good friends together.";
        let snippet = best_snippet(text, &["cats".into(), "friends".into()]);
        assert_eq!(snippet, "Dogs and cats make good friends together");
    }

    #[test]
    fn best_snippet_truncates_long_sentences() {
        let long_sentence = "word ".repeat(100);
        let snippet = best_snippet(&long_sentence, &["word".into()]);
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= SNIPPET_MAX_LEN + 1);
    }
}
