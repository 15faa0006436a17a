//! Typed configuration, loaded once at startup from a TOML file: static
//! crawl topology (which sites to index, pool sizes, fetch politeness),
//! deserialized via `serde` over a `toml`-parsed file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub url: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexingConfig {
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

fn default_parallelism() -> usize {
    num_cpus::get()
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
}

fn default_user_agent() -> String {
    "SearchBot/1.0".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_politeness_delay_ms() -> u64 {
    500
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            referrer: None,
            request_timeout_ms: default_request_timeout_ms(),
            politeness_delay_ms: default_politeness_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_high_frequency_threshold")]
    pub high_frequency_lemma_threshold: f64,
}

fn default_high_frequency_threshold() -> f64 {
    0.30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            high_frequency_lemma_threshold: default_high_frequency_threshold(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_database_url() -> String {
    "sqlite://search_engine.db?mode=rwc".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1:8080".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Find the configured site whose host+scheme is a prefix of `url`
    /// (used by `indexPage` to resolve which site a URL belongs to).
    pub fn site_for_url(&self, url: &url::Url) -> Option<&SiteConfig> {
        self.sites.iter().find(|site| {
            url::Url::parse(&site.url)
                .ok()
                .map(|root| {
                    root.scheme() == url.scheme()
                        && root.host_str() == url.host_str()
                        && root.port_or_known_default() == url.port_or_known_default()
                })
                .unwrap_or(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_for_url_matches_by_host_and_scheme() {
        let config = Config {
            sites: vec![SiteConfig {
                url: "https://example.test".to_string(),
                name: "Example".to_string(),
            }],
            ..Default::default()
        };

        let matched = url::Url::parse("https://example.test/a/b").unwrap();
        assert!(config.site_for_url(&matched).is_some());

        let unmatched = url::Url::parse("https://other.test/").unwrap();
        assert!(config.site_for_url(&unmatched).is_none());
    }
}
