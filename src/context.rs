//! Composition root: a struct of `Arc`-shared handles passed by value
//! through the crawl task tree. Repositories and services are constructed
//! once during startup and cloned into every SiteTask/PageTask.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::fetcher::Fetcher;
use crate::lemma_frequency_service::LemmaFrequencyService;
use crate::repository::{IndexRepository, LemmaRepository, PageRepository, SiteRepository};
use crate::visited_store::VisitedStore;

/// Shared state threaded through every SiteTask/PageTask. Cheap to clone:
/// every field is already `Arc`-backed or itself a reference-counted
/// wrapper.
#[derive(Clone)]
pub struct IndexingContext {
    pub config: Arc<Config>,
    pub sites: Arc<dyn SiteRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub lemmas: Arc<dyn LemmaRepository>,
    pub indexes: Arc<dyn IndexRepository>,
    pub lemma_frequency: Arc<LemmaFrequencyService>,
    pub fetcher: Arc<Fetcher>,
    pub visited: Arc<VisitedStore>,
    /// Bounds how many PageTasks run concurrently at once across the whole
    /// indexing run. Tokio's multi-thread runtime already supplies the
    /// work-stealing thread pool itself; this semaphore is the admission
    /// control layered on top of it.
    pub worker_permits: Arc<Semaphore>,
    /// Single process-wide cooperative cancellation flag.
    pub stop_flag: Arc<AtomicBool>,
}

impl IndexingContext {
    pub fn is_stopped(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    pub fn set_stopped(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
    }

    pub fn clear_stop(&self) {
        self.stop_flag.store(false, Ordering::SeqCst);
    }
}
