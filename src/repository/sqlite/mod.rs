pub mod index_repository;
pub mod lemma_repository;
pub mod page_repository;
pub mod site_repository;

pub use index_repository::SqliteIndexRepository;
pub use lemma_repository::SqliteLemmaRepository;
pub use page_repository::SqlitePageRepository;
pub use site_repository::SqliteSiteRepository;
