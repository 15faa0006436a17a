//! End-to-end pipeline test: crawl a small mocked site, index it, then
//! search it — two pages, shared and unique lemmas, IDF rescaling,
//! intersection search — against the real crawl/index/search wiring
//! instead of calling each service in isolation.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Semaphore;

use lumen_search::config::{Config, FetcherConfig, SiteConfig};
use lumen_search::context::IndexingContext;
use lumen_search::crawl::site_task;
use lumen_search::fetcher::Fetcher;
use lumen_search::lemma_frequency_service::LemmaFrequencyService;
use lumen_search::repository::sqlite::{
    SqliteIndexRepository, SqliteLemmaRepository, SqlitePageRepository, SqliteSiteRepository,
};
use lumen_search::repository::{IndexRepository, LemmaRepository, PageRepository, SiteRepository};
use lumen_search::search_builder::SearchBuilder;
use lumen_search::visited_store::VisitedStore;

async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn build_context(pool: SqlitePool, fetcher: Fetcher) -> (IndexingContext, Config) {
    let sites: Arc<dyn SiteRepository> = Arc::new(SqliteSiteRepository::new(pool.clone()));
    let pages: Arc<dyn PageRepository> = Arc::new(SqlitePageRepository::new(pool.clone()));
    let lemmas: Arc<dyn LemmaRepository> = Arc::new(SqliteLemmaRepository::new(pool.clone()));
    let indexes: Arc<dyn IndexRepository> = Arc::new(SqliteIndexRepository::new(pool));

    let lemma_frequency = Arc::new(LemmaFrequencyService::new(
        sites.clone(),
        pages.clone(),
        lemmas.clone(),
        indexes.clone(),
        0.30,
    ));

    let config = Config {
        sites: Vec::new(),
        ..Default::default()
    };

    let ctx = IndexingContext {
        config: Arc::new(config.clone()),
        sites,
        pages,
        lemmas,
        indexes,
        lemma_frequency,
        fetcher: Arc::new(fetcher),
        visited: Arc::new(VisitedStore::new()),
        worker_permits: Arc::new(Semaphore::new(4)),
        stop_flag: Arc::new(AtomicBool::new(false)),
    };
    (ctx, config)
}

/// Crawls a two-page mocked site (root linking to `/b`), indexes it, and
/// verifies shared vs. unique lemma frequencies, IDF-rescaled ranks, and
/// the relative-score ordering that (thanks to the negative `ln` factor on
/// a two-page site) places `/b` ahead of the root despite its larger raw
/// rank.
#[tokio::test]
async fn crawl_index_and_search_ranks_pages_correctly() {
    let mut server = mockito::Server::new_async().await;
    let root_body = r#"<html><head><title>Root</title></head>
        <body><p>foo bar baz</p><a href="/b">next</a></body></html>"#;
    let b_body = r#"<html><head><title>Page B</title></head>
        <body><p>bar bar qux</p></body></html>"#;

    let root_mock = server
        .mock("GET", "/")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(root_body)
        .create_async()
        .await;
    let b_mock = server
        .mock("GET", "/b")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(b_body)
        .create_async()
        .await;

    let pool = memory_pool().await;
    let mut fetcher_config = FetcherConfig::default();
    fetcher_config.politeness_delay_ms = 0;
    let fetcher = Fetcher::new(fetcher_config).unwrap();
    let (ctx, _config) = build_context(pool, fetcher).await;

    let site_config = SiteConfig {
        url: server.url(),
        name: "Example".to_string(),
    };
    site_task::run(site_config.clone(), ctx.clone()).await;

    root_mock.assert_async().await;
    b_mock.assert_async().await;

    let site = ctx.sites.find_by_url(&site_config.url).await.unwrap().unwrap();
    assert_eq!(site.status.as_str(), "INDEXED");
    assert_eq!(ctx.pages.count_by_site(site.id).await.unwrap(), 2);

    let bar = ctx
        .lemmas
        .find_by_lemma_and_site("bar", site.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(bar.frequency, 3);
    let foo = ctx
        .lemmas
        .find_by_lemma_and_site("foo", site.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(foo.frequency, 1);

    let rows = ctx
        .indexes
        .find_by_lemma_and_page_site(bar.id, site.id)
        .await
        .unwrap();
    let b_page = ctx.pages.find_by_path(site.id, "/b").await.unwrap().unwrap();
    let root_page = ctx.pages.find_by_path(site.id, "/").await.unwrap().unwrap();
    let b_row = rows.iter().find(|r| r.page_id == b_page.id).unwrap();
    let root_row = rows.iter().find(|r| r.page_id == root_page.id).unwrap();
    let factor = (2.0_f64 / 3.0).ln();
    assert!((b_row.rank - 2.0 * factor).abs() < 1e-9);
    assert!((root_row.rank - 1.0 * factor).abs() < 1e-9);

    let search_builder = SearchBuilder::new(ctx.pages.clone(), ctx.sites.clone());

    let (q_lemmas, ranked) = ctx
        .lemma_frequency
        .search("bar", Some(&site_config.url), 0, 20)
        .await
        .unwrap();
    let results = search_builder.build(ranked, &q_lemmas).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].uri, "/b");
    assert_eq!(results[1].uri, "/");

    let (q_lemmas, ranked) = ctx
        .lemma_frequency
        .search("bar qux", Some(&site_config.url), 0, 20)
        .await
        .unwrap();
    let results = search_builder.build(ranked, &q_lemmas).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].uri, "/b");
}
