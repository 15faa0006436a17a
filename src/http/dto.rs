//! Request/response DTOs for the `/api` endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::models::{SearchResult, Statistics};

#[derive(Debug, Deserialize)]
pub struct IndexPageRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub site: Option<String>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchQuery {
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(20)
    }
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub result: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { result: true }
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub result: bool,
    pub statistics: Statistics,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result: bool,
    pub count: usize,
    pub data: Vec<SearchResult>,
}
