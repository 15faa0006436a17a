pub mod analyzer;
pub mod config;
pub mod context;
pub mod crawl;
pub mod db;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod indexing_service;
pub mod lemma_frequency_service;
pub mod lifecycle;
pub mod repository;
pub mod search_builder;
pub mod statistics_service;
pub mod visited_store;
