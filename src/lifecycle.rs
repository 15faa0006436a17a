//! Application lifecycle: logging init and composition-root setup for the
//! `actix-web` server in `main.rs`.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::context::IndexingContext;
use crate::db;
use crate::fetcher::Fetcher;
use crate::http::AppState;
use crate::indexing_service::IndexingService;
use crate::lemma_frequency_service::LemmaFrequencyService;
use crate::repository::sqlite::{
    SqliteIndexRepository, SqliteLemmaRepository, SqlitePageRepository, SqliteSiteRepository,
};
use crate::repository::{IndexRepository, LemmaRepository, PageRepository, SiteRepository};
use crate::search_builder::SearchBuilder;
use crate::statistics_service::StatisticsService;
use crate::visited_store::VisitedStore;

/// Initialize `tracing_subscriber`: an `EnvFilter` seeded from `RUST_LOG`,
/// `sqlx` quieted to `warn`, target names suppressed, compact formatting.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn")),
        )
        .compact()
        .with_target(false)
        .init();
}

/// Build every repository, service and the shared `IndexingContext`,
/// returning the `AppState` the HTTP routes close over.
pub async fn setup(config: Config) -> Result<AppState> {
    let pool = db::init_db(&config.database_url).await?;

    let sites: Arc<dyn SiteRepository> = Arc::new(SqliteSiteRepository::new(pool.clone()));
    let pages: Arc<dyn PageRepository> = Arc::new(SqlitePageRepository::new(pool.clone()));
    let lemmas: Arc<dyn LemmaRepository> = Arc::new(SqliteLemmaRepository::new(pool.clone()));
    let indexes: Arc<dyn IndexRepository> = Arc::new(SqliteIndexRepository::new(pool.clone()));

    let lemma_frequency = Arc::new(LemmaFrequencyService::new(
        sites.clone(),
        pages.clone(),
        lemmas.clone(),
        indexes.clone(),
        config.search.high_frequency_lemma_threshold,
    ));

    let fetcher = Arc::new(Fetcher::new(config.fetcher.clone())?);
    let parallelism = config.indexing.parallelism.max(1);

    let ctx = IndexingContext {
        config: Arc::new(config.clone()),
        sites: sites.clone(),
        pages: pages.clone(),
        lemmas: lemmas.clone(),
        indexes: indexes.clone(),
        lemma_frequency: lemma_frequency.clone(),
        fetcher,
        visited: Arc::new(VisitedStore::new()),
        worker_permits: Arc::new(Semaphore::new(parallelism)),
        stop_flag: Arc::new(AtomicBool::new(false)),
    };

    let indexing = Arc::new(IndexingService::new(ctx, config.sites.clone()));
    let statistics = Arc::new(StatisticsService::new(sites.clone(), pages.clone(), lemmas));
    let search_builder = Arc::new(SearchBuilder::new(pages, sites));

    Ok(AppState {
        indexing,
        statistics,
        lemma_frequency,
        search_builder,
    })
}
