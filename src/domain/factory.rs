//! Entity factory.
//!
//! Constructs new Site/Page/Lemma/Index values with correct defaults and
//! timestamps, keeping that construction logic out of the repository and
//! service layers.

use chrono::Utc;

use super::models::{IndexRow, Lemma, Page, Site, SiteStatus};

pub struct SiteFactory;

impl SiteFactory {
    /// A freshly started crawl root: status INDEXING, no error, `id` unset
    /// (assigned by the repository on insert).
    pub fn new_indexing(url: String, name: String) -> Site {
        Site {
            id: 0,
            url,
            name,
            status: SiteStatus::Indexing,
            status_time: Utc::now(),
            last_error: None,
        }
    }
}

pub struct PageFactory;

impl PageFactory {
    pub fn new(site_id: i64, path: String, code: i32, content: String) -> Page {
        Page {
            id: 0,
            site_id,
            path,
            code,
            content,
        }
    }
}

pub struct LemmaFactory;

impl LemmaFactory {
    pub fn new(site_id: i64, lemma: String, frequency: i64) -> Lemma {
        Lemma {
            id: 0,
            site_id,
            lemma,
            frequency,
        }
    }
}

pub struct IndexFactory;

impl IndexFactory {
    pub fn new(page_id: i64, lemma_id: i64, rank: f64) -> IndexRow {
        IndexRow {
            id: 0,
            page_id,
            lemma_id,
            rank,
        }
    }
}
