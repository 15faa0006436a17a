//! Process-wide set of URLs already claimed for crawl, plus a map of
//! currently-active sites. `DashSet`/`DashMap` give atomic test-and-add
//! semantics (exactly one of any concurrent `visit_url(u)` calls for the
//! same `u` returns `true`) without a process-wide lock.

use dashmap::{DashMap, DashSet};

use crate::domain::models::Site;

#[derive(Default)]
pub struct VisitedStore {
    visited: DashSet<String>,
    active_sites: DashMap<i64, Site>,
}

impl VisitedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic test-and-add. Returns `true` the first time `url` is seen,
    /// `false` on every subsequent call for the same URL — the sole
    /// deduplication mechanism for the crawl.
    pub fn visit_url(&self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Drop every remembered URL, called at the start of a full reindex.
    pub fn clear(&self) {
        self.visited.clear();
        self.active_sites.clear();
    }

    pub fn register_active_site(&self, site: Site) {
        self.active_sites.insert(site.id, site);
    }

    pub fn unregister_active_site(&self, site_id: i64) {
        self.active_sites.remove(&site_id);
    }

    pub fn is_site_active(&self, site_id: i64) -> bool {
        self.active_sites.contains_key(&site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn visit_url_is_test_and_add() {
        let store = VisitedStore::new();
        assert!(store.visit_url("https://a.test/"));
        assert!(!store.visit_url("https://a.test/"));
        assert!(store.visit_url("https://a.test/other"));
    }

    #[tokio::test]
    async fn concurrent_visit_url_returns_true_exactly_once() {
        let store = Arc::new(VisitedStore::new());
        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.visit_url("https://a.test/x") }));
        }
        let mut true_count = 0;
        for handle in handles {
            if handle.await.unwrap() {
                true_count += 1;
            }
        }
        assert_eq!(true_count, 1);
    }
}
