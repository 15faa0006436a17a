//! The `/api` endpoints: start/stop indexing, statistics, single-page
//! reindex, and search.

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::error::{AppError, Result};
use crate::http::dto::{IndexPageRequest, OkResponse, SearchQuery, SearchResponse, StatisticsResponse};
use crate::indexing_service::IndexingService;
use crate::lemma_frequency_service::LemmaFrequencyService;
use crate::search_builder::SearchBuilder;
use crate::statistics_service::StatisticsService;

pub struct AppState {
    pub indexing: Arc<IndexingService>,
    pub statistics: Arc<StatisticsService>,
    pub lemma_frequency: Arc<LemmaFrequencyService>,
    pub search_builder: Arc<SearchBuilder>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/startIndexing", web::get().to(start_indexing))
            .route("/stopIndexing", web::get().to(stop_indexing))
            .route("/statistics", web::get().to(statistics))
            .route("/indexPage", web::post().to(index_page))
            .route("/search", web::get().to(search)),
    );
}

async fn start_indexing(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.indexing.start_indexing().await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

async fn stop_indexing(state: web::Data<AppState>) -> Result<HttpResponse> {
    state.indexing.stop_indexing()?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

async fn statistics(state: web::Data<AppState>) -> Result<HttpResponse> {
    let statistics = state
        .statistics
        .statistics(state.indexing.is_indexing())
        .await?;
    Ok(HttpResponse::Ok().json(StatisticsResponse {
        result: true,
        statistics,
    }))
}

async fn index_page(
    state: web::Data<AppState>,
    body: web::Json<IndexPageRequest>,
) -> Result<HttpResponse> {
    if body.url.trim().is_empty() {
        return Err(AppError::bad_request("url must not be blank"));
    }
    state.indexing.index_page(body.url.trim()).await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    if query.query.trim().is_empty() {
        return Err(AppError::bad_request("query must not be blank"));
    }

    let (q_lemmas, ranked) = state
        .lemma_frequency
        .search(&query.query, query.site.as_deref(), query.offset(), query.limit())
        .await?;

    if q_lemmas.is_empty() {
        return Err(AppError::bad_request("query contains no indexable terms"));
    }

    let data = state.search_builder.build(ranked, &q_lemmas).await?;

    if data.is_empty() {
        return Err(AppError::NotFound);
    }

    Ok(HttpResponse::Ok().json(SearchResponse {
        result: true,
        count: data.len(),
        data,
    }))
}
