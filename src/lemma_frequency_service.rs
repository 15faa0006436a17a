//! Owns the inverted index's three algorithms: the serialized write path
//! invoked per-page during crawl, the IDF recalculation pass run once per
//! site at the end of indexing, and the retrieval/ranking path invoked by
//! search. A plain struct over `Arc`-shared repositories, with no trait
//! object indirection beyond the repository contracts themselves.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::analyzer;
use crate::domain::factory::{IndexFactory, LemmaFactory};
use crate::repository::{IndexRepository, LemmaRepository, PageRepository, SiteRepository};

/// One ranked page surfaced by `search`, before title/snippet assembly.
pub struct RankedPage {
    pub page_id: i64,
    pub score: f64,
}

pub struct LemmaFrequencyService {
    sites: Arc<dyn SiteRepository>,
    pages: Arc<dyn PageRepository>,
    lemmas: Arc<dyn LemmaRepository>,
    indexes: Arc<dyn IndexRepository>,
    /// Process-wide monitor serializing the compound find-or-insert-increment
    /// on `(site, lemma).frequency` — without it, two concurrent writers
    /// finding the same missing lemma could both insert, breaking the
    /// `(site, lemma)` uniqueness invariant.
    write_lock: Mutex<()>,
    high_frequency_threshold: f64,
}

impl LemmaFrequencyService {
    pub fn new(
        sites: Arc<dyn SiteRepository>,
        pages: Arc<dyn PageRepository>,
        lemmas: Arc<dyn LemmaRepository>,
        indexes: Arc<dyn IndexRepository>,
        high_frequency_threshold: f64,
    ) -> Self {
        Self {
            sites,
            pages,
            lemmas,
            indexes,
            write_lock: Mutex::new(()),
            high_frequency_threshold,
        }
    }

    /// Write path: analyze `content`, upsert Lemma frequencies and insert
    /// Index rows for `page_id`. Serialized crate-wide.
    pub async fn save_page_lemmas_and_indexes_thread_safe(
        &self,
        site_id: i64,
        page_id: i64,
        content: &str,
    ) -> Result<()> {
        let counts = analyzer::count_lemmas(content);
        let _guard = self.write_lock.lock().await;
        for (name, count) in counts {
            let mut lemma = match self.lemmas.find_by_lemma_and_site(&name, site_id).await? {
                Some(mut existing) => {
                    existing.frequency += count;
                    existing
                }
                None => LemmaFactory::new(site_id, name, count),
            };
            self.lemmas.save(&mut lemma).await?;

            let mut index = IndexFactory::new(page_id, lemma.id, count as f64);
            self.indexes.save(&mut index).await?;
        }
        Ok(())
    }

    /// Decrement path: undo a page's contribution to lemma frequencies
    /// before it is deleted/replaced.
    pub async fn decrease_lemma_frequencies(&self, site_id: i64, content: &str) -> Result<()> {
        let counts = analyzer::count_lemmas(content);
        let _guard = self.write_lock.lock().await;
        for (name, count) in counts {
            let Some(mut lemma) = self.lemmas.find_by_lemma_and_site(&name, site_id).await? else {
                continue;
            };
            lemma.frequency = (lemma.frequency - count).max(0);
            if lemma.frequency == 0 {
                self.lemmas.delete_by_id(lemma.id).await?;
            } else {
                self.lemmas.save(&mut lemma).await?;
            }
        }
        Ok(())
    }

    /// IDF pass: rescale every Index row's raw count into
    /// `raw_count * ln(N / (df + 1))`, once per site at the end of
    /// indexing.
    pub async fn recalculate_rank_for_all_sites(&self, site_id: i64) -> Result<()> {
        let total_pages = self.pages.count_by_site(site_id).await?;
        let site_lemmas = self.lemmas.find_by_site(site_id).await?;

        for lemma in site_lemmas {
            let df = self
                .indexes
                .count_distinct_by_lemma_and_page_site(lemma.id, site_id)
                .await?;
            let factor = ((total_pages as f64) / (df as f64 + 1.0)).ln();
            let mut rows = self
                .indexes
                .find_by_lemma_and_page_site(lemma.id, site_id)
                .await?;
            for row in rows.iter_mut() {
                row.rank *= factor;
                self.indexes.save(row).await?;
            }
        }
        Ok(())
    }

    /// Analyzes a free-text query into lemmas, retrieves candidate pages,
    /// and returns them ranked by relative score, already paginated, plus
    /// the analyzed query lemmas (for snippet scoring downstream).
    pub async fn search(
        &self,
        query: &str,
        site_url: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<String>, Vec<RankedPage>)> {
        let q_lemmas = analyzer::analyze_query(query);
        if q_lemmas.is_empty() {
            return Ok((q_lemmas, Vec::new()));
        }

        let site_id = match site_url {
            Some(url) => match self.sites.find_by_url(url).await? {
                Some(site) => Some(site.id),
                None => return Ok((q_lemmas, Vec::new())),
            },
            None => None,
        };

        let candidate_lemmas = match site_url {
            Some(url) => self.lemmas.find_by_lemma_in_and_site_url(&q_lemmas, url).await?,
            None => self.lemmas.find_by_lemma_in(&q_lemmas).await?,
        };

        // High-frequency filter: drop lemmas on more than threshold of
        // their site's pages. Ratio is always computed against the
        // lemma's own site, even for cross-site search — a rare-globally
        // but common-on-its-own-site lemma is still excluded. On a small
        // site every query lemma can clear the threshold (e.g. a lemma on
        // 2 of a 2-page site), so when the filter would empty the
        // candidate set entirely it is skipped rather than starving the
        // search of results.
        let mut unfiltered = candidate_lemmas;
        unfiltered.sort_by_key(|l| l.frequency);

        let mut filtered = Vec::with_capacity(unfiltered.len());
        for lemma in &unfiltered {
            let total_pages = self.pages.count_by_site(lemma.site_id).await?;
            if total_pages == 0 {
                filtered.push(lemma.clone());
                continue;
            }
            let containing = self
                .indexes
                .count_distinct_by_lemma_and_page_site(lemma.id, lemma.site_id)
                .await?;
            let ratio = containing as f64 / total_pages as f64;
            if ratio <= self.high_frequency_threshold {
                filtered.push(lemma.clone());
            }
        }

        let filtered = if filtered.is_empty() {
            unfiltered
        } else {
            filtered
        };

        // Per-lemma page->rank maps, scoped to each lemma's own site.
        let mut per_lemma: Vec<HashMap<i64, f64>> = Vec::with_capacity(filtered.len());
        for lemma in &filtered {
            let rows = self
                .indexes
                .find_by_lemma_and_page_site(lemma.id, lemma.site_id)
                .await?;
            let mut map = HashMap::new();
            for row in rows {
                *map.entry(row.page_id).or_insert(0.0) += row.rank;
            }
            per_lemma.push(map);
        }

        let mut absolute: HashMap<i64, f64> = HashMap::new();
        let mut match_count: HashMap<i64, usize> = HashMap::new();

        if site_id.is_some() {
            // Single-site search: intersect candidate pages across all
            // filtered lemmas.
            let mut candidate_pages: Option<HashSet<i64>> = None;
            for map in &per_lemma {
                let keys: HashSet<i64> = map.keys().copied().collect();
                candidate_pages = Some(match candidate_pages {
                    Some(existing) => existing.intersection(&keys).copied().collect(),
                    None => keys,
                });
            }
            let candidate_pages = candidate_pages.unwrap_or_default();
            for map in &per_lemma {
                for (page_id, rank) in map {
                    if candidate_pages.contains(page_id) {
                        *absolute.entry(*page_id).or_insert(0.0) += rank;
                        *match_count.entry(*page_id).or_insert(0) += 1;
                    }
                }
            }
        } else {
            // Cross-site search: union of candidate pages. Intersection
            // would be too aggressive across sites since lemmas are
            // per-site entities.
            for map in &per_lemma {
                for (page_id, rank) in map {
                    *absolute.entry(*page_id).or_insert(0.0) += rank;
                    *match_count.entry(*page_id).or_insert(0) += 1;
                }
            }
        }

        if absolute.is_empty() {
            return Ok((q_lemmas, Vec::new()));
        }

        let max_rank = absolute.values().cloned().fold(f64::MIN, f64::max);
        let q_len = q_lemmas.len() as f64;

        let mut ranked: Vec<RankedPage> = absolute
            .into_iter()
            .map(|(page_id, abs)| {
                let matches = *match_count.get(&page_id).unwrap_or(&0) as f64;
                let score = if max_rank > 0.0 {
                    (abs / max_rank) * (1.0 + matches / q_len)
                } else {
                    0.0
                };
                RankedPage { page_id, score }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.page_id.cmp(&b.page_id))
        });

        let page = ranked.into_iter().skip(offset).take(limit).collect();
        Ok((q_lemmas, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sqlite::{
        SqliteIndexRepository, SqliteLemmaRepository, SqlitePageRepository, SqliteSiteRepository,
    };
    use crate::domain::factory::{PageFactory, SiteFactory};
    use sqlx::SqlitePool;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    async fn service(pool: SqlitePool) -> (Arc<dyn SiteRepository>, LemmaFrequencyService) {
        let sites: Arc<dyn SiteRepository> = Arc::new(SqliteSiteRepository::new(pool.clone()));
        let pages: Arc<dyn PageRepository> = Arc::new(SqlitePageRepository::new(pool.clone()));
        let lemmas: Arc<dyn LemmaRepository> = Arc::new(SqliteLemmaRepository::new(pool.clone()));
        let indexes: Arc<dyn IndexRepository> = Arc::new(SqliteIndexRepository::new(pool));
        let service = LemmaFrequencyService::new(
            sites.clone(),
            pages,
            lemmas,
            indexes,
            0.30,
        );
        (sites, service)
    }

    #[tokio::test]
    async fn write_path_accumulates_frequency_and_index_rows() {
        let pool = memory_pool().await;
        let (sites, service) = service(pool.clone()).await;

        let mut site = SiteFactory::new_indexing("http://example.test".into(), "Example".into());
        sites.save(&mut site).await.unwrap();

        let page_repo = SqlitePageRepository::new(pool.clone());
        let mut page_a = PageFactory::new(site.id, "/a".into(), 200, "foo bar baz".into());
        page_repo.save(&mut page_a).await.unwrap();
        let mut page_b = PageFactory::new(site.id, "/b".into(), 200, "bar bar qux".into());
        page_repo.save(&mut page_b).await.unwrap();

        service
            .save_page_lemmas_and_indexes_thread_safe(site.id, page_a.id, "foo bar baz")
            .await
            .unwrap();
        service
            .save_page_lemmas_and_indexes_thread_safe(site.id, page_b.id, "bar bar qux")
            .await
            .unwrap();

        let lemma_repo = SqliteLemmaRepository::new(pool.clone());
        let bar = lemma_repo
            .find_by_lemma_and_site("bar", site.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(bar.frequency, 3);

        let foo = lemma_repo
            .find_by_lemma_and_site("foo", site.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(foo.frequency, 1);
    }

    #[tokio::test]
    async fn idf_pass_matches_spec_scenario_one() {
        let pool = memory_pool().await;
        let (sites, service) = service(pool.clone()).await;

        let mut site = SiteFactory::new_indexing("http://example.test".into(), "Example".into());
        sites.save(&mut site).await.unwrap();

        let page_repo = SqlitePageRepository::new(pool.clone());
        let mut page_a = PageFactory::new(site.id, "/a".into(), 200, String::new());
        page_repo.save(&mut page_a).await.unwrap();
        let mut page_b = PageFactory::new(site.id, "/b".into(), 200, String::new());
        page_repo.save(&mut page_b).await.unwrap();

        service
            .save_page_lemmas_and_indexes_thread_safe(site.id, page_a.id, "foo bar baz")
            .await
            .unwrap();
        service
            .save_page_lemmas_and_indexes_thread_safe(site.id, page_b.id, "bar bar qux")
            .await
            .unwrap();

        service.recalculate_rank_for_all_sites(site.id).await.unwrap();

        let lemma_repo = SqliteLemmaRepository::new(pool.clone());
        let index_repo = SqliteIndexRepository::new(pool.clone());
        let bar = lemma_repo
            .find_by_lemma_and_site("bar", site.id)
            .await
            .unwrap()
            .unwrap();
        let rows = index_repo
            .find_by_lemma_and_page_site(bar.id, site.id)
            .await
            .unwrap();
        let b_row = rows.iter().find(|r| r.page_id == page_b.id).unwrap();
        let expected = 2.0 * (2.0_f64 / 3.0).ln();
        assert!((b_row.rank - expected).abs() < 1e-9);
    }
}
