//! Domain entities for the four-table index schema: Site, Page, Lemma, Index.
//!
//! A directed acyclic schema `Site ← Page ← Index → Lemma → Site`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// SITE
// ============================================================================

/// Lifecycle state of a configured crawl root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteStatus {
    Indexing,
    Indexed,
    Failed,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Indexing => "INDEXING",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for SiteStatus {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INDEXING" => Ok(Self::Indexing),
            "INDEXED" => Ok(Self::Indexed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for SiteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A configured root to crawl. Maps to the `sites` table.
#[derive(Debug, Clone, Serialize)]
pub struct Site {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: DateTime<Utc>,
    pub last_error: Option<String>,
}

// ============================================================================
// PAGE
// ============================================================================

/// A single fetched document. Maps to the `pages` table.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    pub path: String,
    pub code: i32,
    pub content: String,
}

// ============================================================================
// LEMMA
// ============================================================================

/// A normalized word form scoped to a site. Maps to the `lemmas` table.
#[derive(Debug, Clone, Serialize)]
pub struct Lemma {
    pub id: i64,
    pub site_id: i64,
    pub lemma: String,
    pub frequency: i64,
}

// ============================================================================
// INDEX
// ============================================================================

/// One edge of the inverted index: lemma x page. Maps to the `indexes` table.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRow {
    pub id: i64,
    pub page_id: i64,
    pub lemma_id: i64,
    pub rank: f64,
}

// ============================================================================
// SEARCH RESULT
// ============================================================================

/// A ranked search result ready for the HTTP response.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub site: String,
    pub site_name: String,
    pub uri: String,
    pub title: String,
    pub snippet: String,
    pub relevance: f64,
}

// ============================================================================
// STATISTICS
// ============================================================================

#[derive(Debug, Clone, Serialize, Default)]
pub struct TotalStatistics {
    pub sites: i64,
    pub pages: i64,
    pub lemmas: i64,
    pub indexing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedSiteStatistics {
    pub url: String,
    pub name: String,
    pub status: SiteStatus,
    pub status_time: i64,
    pub error: Option<String>,
    pub pages: i64,
    pub lemmas: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    pub total: TotalStatistics,
    pub detailed: Vec<DetailedSiteStatistics>,
}
