//! IndexingService.
//!
//! Orchestrates full reindex (wipe + launch all SiteTasks on the bounded
//! worker pool), single-page reindex, and cooperative stop. The background
//! indexing run is spawned once and tracked by its own `is_indexing` flag,
//! separate from the context's `stop_flag`, so `isIndexing()` answers
//! instantly without awaiting the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::config::SiteConfig;
use crate::context::IndexingContext;
use crate::crawl::site_task;
use crate::domain::factory::PageFactory;
use crate::domain::models::SiteStatus;
use crate::error::{AppError, Result};
use crate::fetcher;

pub struct IndexingService {
    ctx: IndexingContext,
    sites_config: Vec<SiteConfig>,
    is_indexing: Arc<AtomicBool>,
}

impl IndexingService {
    pub fn new(ctx: IndexingContext, sites_config: Vec<SiteConfig>) -> Self {
        Self {
            ctx,
            sites_config,
            is_indexing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_indexing(&self) -> bool {
        self.is_indexing.load(Ordering::SeqCst)
    }

    /// Wipes every configured site and launches a SiteTask for each, on a
    /// background task. Returns as soon as the run has been scheduled.
    pub async fn start_indexing(&self) -> Result<()> {
        if self.is_indexing() {
            return Err(AppError::bad_request("Индексация уже запущена"));
        }

        self.ctx.clear_stop();
        self.ctx.visited.clear();

        for site_config in &self.sites_config {
            if self.ctx.sites.exists_by_url(&site_config.url).await? {
                self.ctx.sites.delete_by_url(&site_config.url).await?;
            }
        }

        self.is_indexing.store(true, Ordering::SeqCst);

        let ctx = self.ctx.clone();
        let sites_config = self.sites_config.clone();
        let is_indexing = self.is_indexing.clone();

        tokio::spawn(async move {
            let mut handles = Vec::with_capacity(sites_config.len());
            for site_config in sites_config {
                let ctx = ctx.clone();
                handles.push(tokio::spawn(site_task::run(site_config, ctx)));
            }
            for handle in handles {
                let _ = handle.await;
            }

            if let Err(err) = finalize_stopped_sites(&ctx).await {
                tracing::error!(error = %err, "failed to finalize stopped sites");
            }

            is_indexing.store(false, Ordering::SeqCst);
        });

        Ok(())
    }

    /// Sets the global stop flag. Does not block for the run to drain.
    pub fn stop_indexing(&self) -> Result<()> {
        if !self.is_indexing() {
            return Err(AppError::bad_request("Индексация не запущена"));
        }
        self.ctx.set_stopped();
        Ok(())
    }

    /// Indexes (or re-indexes) a single page, without recomputing IDF.
    pub async fn index_page(&self, url: &str) -> Result<()> {
        let parsed = Url::parse(url)
            .map_err(|_| AppError::bad_request(format!("некорректный URL: {url}")))?;

        let Some(site_config) = self.ctx.config.site_for_url(&parsed) else {
            return Err(AppError::bad_request(
                "Страница находится за пределами сконфигурированных сайтов",
            ));
        };

        let mut site = match self.ctx.sites.find_by_url(&site_config.url).await? {
            Some(site) => site,
            None => {
                let mut site = crate::domain::factory::SiteFactory::new_indexing(
                    site_config.url.clone(),
                    site_config.name.clone(),
                );
                site.status = SiteStatus::Indexed;
                self.ctx.sites.save(&mut site).await?;
                site
            }
        };

        let path = relative_path(&parsed);
        if let Some(existing) = self.ctx.pages.find_by_path(site.id, &path).await? {
            let text = fetcher::extract_text(&existing.content);
            self.ctx
                .lemma_frequency
                .decrease_lemma_frequencies(site.id, &text)
                .await?;
            self.ctx.pages.delete(existing.id).await?;
        }

        let outcome = self.ctx.fetcher.fetch(&parsed).await?;
        let is_success_html = (200..300).contains(&outcome.status) && !outcome.html.is_empty();
        let mut page = if is_success_html {
            PageFactory::new(site.id, path, outcome.status, outcome.html.clone())
        } else {
            let code = fetcher::recorded_status_code(outcome.status, outcome.html.is_empty());
            PageFactory::new(site.id, path, code, String::new())
        };
        self.ctx.pages.save(&mut page).await?;

        if is_success_html {
            let text = fetcher::extract_text(&outcome.html);
            self.ctx
                .lemma_frequency
                .save_page_lemmas_and_indexes_thread_safe(site.id, page.id, &text)
                .await?;
        }

        site.status_time = chrono::Utc::now();
        self.ctx.sites.save(&mut site).await?;

        Ok(())
    }
}

fn relative_path(url: &Url) -> String {
    let mut path = url.path().to_string();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if path.is_empty() {
        path.push('/');
    }
    path
}

/// Runs once the worker pool has fully drained: any Site still left
/// `INDEXING` (because `stopIndexing` was called mid-run) transitions to
/// `FAILED` with the stop message.
async fn finalize_stopped_sites(ctx: &IndexingContext) -> anyhow::Result<()> {
    if !ctx.is_stopped() {
        return Ok(());
    }
    for mut site in ctx.sites.find_all().await? {
        if site.status == SiteStatus::Indexing {
            site.status = SiteStatus::Failed;
            site.last_error = Some("Индексация остановлена пользователем".to_string());
            ctx.sites.save(&mut site).await?;
            ctx.visited.unregister_active_site(site.id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_defaults_to_root() {
        let url = Url::parse("https://example.test").unwrap();
        assert_eq!(relative_path(&url), "/");
    }
}
