//! Repository contracts: one `#[async_trait]` trait per entity describing
//! the persistence operations each needs, implemented against SQLite in
//! `repository::sqlite`.

pub mod sqlite;

use async_trait::async_trait;
use anyhow::Result;

use crate::domain::models::{IndexRow, Lemma, Page, Site};

#[async_trait]
pub trait SiteRepository: Send + Sync {
    async fn save(&self, site: &mut Site) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn delete_by_url(&self, url: &str) -> Result<()>;
    async fn find_by_url(&self, url: &str) -> Result<Option<Site>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Site>>;
    async fn find_all(&self) -> Result<Vec<Site>>;
    async fn exists_by_url(&self, url: &str) -> Result<bool>;
}

#[async_trait]
pub trait PageRepository: Send + Sync {
    async fn save(&self, page: &mut Page) -> Result<()>;
    async fn delete(&self, id: i64) -> Result<()>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Page>>;
    async fn find_by_path(&self, site_id: i64, path: &str) -> Result<Option<Page>>;
    async fn find_all_by_site(&self, site_id: i64) -> Result<Vec<Page>>;
    async fn count_by_site(&self, site_id: i64) -> Result<i64>;
}

#[async_trait]
pub trait LemmaRepository: Send + Sync {
    async fn save(&self, lemma: &mut Lemma) -> Result<()>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
    async fn find_by_lemma_and_site(&self, lemma: &str, site_id: i64) -> Result<Option<Lemma>>;
    async fn find_by_site(&self, site_id: i64) -> Result<Vec<Lemma>>;
    async fn find_by_lemma_in(&self, lemmas: &[String]) -> Result<Vec<Lemma>>;
    async fn find_by_lemma_in_and_site_url(
        &self,
        lemmas: &[String],
        site_url: &str,
    ) -> Result<Vec<Lemma>>;
    async fn count_by_site(&self, site_id: i64) -> Result<i64>;
    async fn has_any(&self, site_id: i64) -> Result<bool>;
}

#[async_trait]
pub trait IndexRepository: Send + Sync {
    async fn save(&self, index: &mut IndexRow) -> Result<()>;
    async fn save_all(&self, indexes: &mut [IndexRow]) -> Result<()>;
    async fn delete_by_id(&self, id: i64) -> Result<()>;
    async fn find_by_id(&self, id: i64) -> Result<Option<IndexRow>>;
    async fn find_by_lemma_and_page_site(
        &self,
        lemma_id: i64,
        site_id: i64,
    ) -> Result<Vec<IndexRow>>;
    async fn count_distinct_by_lemma_and_page_site(
        &self,
        lemma_id: i64,
        site_id: i64,
    ) -> Result<i64>;
}
