//! PageTask: recursive per-URL worker.
//!
//! Implemented as a plain async fn that forks children with `tokio::spawn`
//! rather than a literal recursive `async fn` calling itself in the same
//! stack frame — each spawned child runs as its own task on the runtime's
//! work-stealing pool. A `Semaphore` permit, acquired before the fetch and
//! held until this task's own work (not its children's) is done, bounds
//! how many fetches run concurrently.

use chrono::Utc;
use url::Url;

use crate::context::IndexingContext;
use crate::domain::factory::PageFactory;
use crate::fetcher;

/// Runs one PageTask to completion, including awaiting every child it
/// forks. Returns `Err` only for a genuine abnormal termination (a
/// repository failure propagating past the write path) — fetch failures
/// and non-2xx responses are recorded as ordinary Page rows and return
/// `Ok(())`.
pub async fn run(url: Url, site_id: i64, ctx: IndexingContext) -> anyhow::Result<()> {
    if ctx.is_stopped() {
        return Ok(());
    }

    let _permit = ctx.worker_permits.clone().acquire_owned().await?;
    let outcome = ctx.fetcher.fetch(&url).await?;
    drop(_permit);

    let path = relative_path(&url);
    let is_success_html = (200..300).contains(&outcome.status) && !outcome.html.is_empty();

    if !is_success_html {
        let code = fetcher::recorded_status_code(outcome.status, outcome.html.is_empty());
        let mut page = PageFactory::new(site_id, path, code, String::new());
        ctx.pages.save(&mut page).await?;
        return Ok(());
    }

    let mut page = PageFactory::new(site_id, path, outcome.status, outcome.html.clone());
    ctx.pages.save(&mut page).await?;

    touch_site_status_time(&ctx, site_id).await?;

    let text = fetcher::extract_text(&outcome.html);
    ctx.lemma_frequency
        .save_page_lemmas_and_indexes_thread_safe(site_id, page.id, &text)
        .await?;

    if ctx.is_stopped() {
        return Ok(());
    }

    let mut children = Vec::new();
    for link in outcome.links {
        if ctx.visited.visit_url(link.as_str()) {
            let ctx = ctx.clone();
            children.push(tokio::spawn(
                async move { run(link, site_id, ctx).await },
            ));
        }
    }

    // Fork-join barrier: wait for every child PageTask before this one is
    // considered done.
    for result in futures::future::try_join_all(children).await? {
        result?;
    }

    Ok(())
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

async fn touch_site_status_time(ctx: &IndexingContext, site_id: i64) -> anyhow::Result<()> {
    if let Some(mut site) = ctx.sites.find_by_id(site_id).await? {
        site.status_time = Utc::now();
        ctx.sites.save(&mut site).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::relative_path;
    use url::Url;

    #[test]
    fn relative_path_includes_query_and_defaults_to_root() {
        let root = Url::parse("https://example.test").unwrap();
        assert_eq!(relative_path(&root), "/");

        let with_query = Url::parse("https://example.test/search?q=x").unwrap();
        assert_eq!(relative_path(&with_query), "/search?q=x");
    }
}
