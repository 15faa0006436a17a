//! SiteTask: per-site root worker.
//!
//! The root URL is dispatched as the first PageTask rather than
//! special-cased as a bare fetcher call: marking it visited and handing it
//! to `page_task::run` persists and indexes the root page exactly like any
//! other page, and its recursion discovers and forks the same child-page
//! tree a two-step "fetch root, then spawn children" approach would.

use url::Url;

use crate::config::SiteConfig;
use crate::context::IndexingContext;
use crate::crawl::page_task;
use crate::domain::factory::SiteFactory;
use crate::domain::models::SiteStatus;

/// Runs one SiteTask to completion. Never returns `Err`: every failure
/// mode (fetch, repository, abnormal PageTask) is captured and reflected
/// in the Site's terminal status — a Site ends exactly one of
/// `{INDEXED, FAILED}` once its SiteTask returns.
pub async fn run(site_config: SiteConfig, ctx: IndexingContext) {
    if ctx.is_stopped() {
        return;
    }

    let mut site = SiteFactory::new_indexing(site_config.url.clone(), site_config.name.clone());
    if let Err(err) = ctx.sites.save(&mut site).await {
        tracing::error!(site = %site_config.url, error = %err, "failed to create site row");
        return;
    }
    ctx.visited.register_active_site(site.clone());

    let outcome = run_inner(&site_config, site.id, &ctx).await;

    if ctx.is_stopped() {
        // Left INDEXING; IndexingService's finalizer fails every still-
        // INDEXING site with the stop message once the worker pool drains.
        ctx.visited.unregister_active_site(site.id);
        return;
    }

    match outcome {
        Ok(()) => {
            site.status = SiteStatus::Indexed;
            site.last_error = None;
        }
        Err(message) => {
            site.status = SiteStatus::Failed;
            site.last_error = Some(message);
        }
    }

    if let Err(err) = ctx.sites.save(&mut site).await {
        tracing::error!(site = %site.url, error = %err, "failed to persist site terminal status");
    }
    ctx.visited.unregister_active_site(site.id);
}

async fn run_inner(
    site_config: &SiteConfig,
    site_id: i64,
    ctx: &IndexingContext,
) -> Result<(), String> {
    let root_url = Url::parse(&site_config.url).map_err(|e| e.to_string())?;

    if ctx.visited.visit_url(root_url.as_str()) {
        page_task::run(root_url, site_id, ctx.clone())
            .await
            .map_err(|e| e.to_string())?;
    }

    if ctx.is_stopped() {
        // Left INDEXING; IndexingService's finalizer will fail it with the
        // stop message once the whole worker pool has drained.
        return Ok(());
    }

    ctx.lemma_frequency
        .recalculate_rank_for_all_sites(site_id)
        .await
        .map_err(|e| e.to_string())
}
