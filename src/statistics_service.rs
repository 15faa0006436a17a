//! StatisticsService.
//!
//! Aggregates counts (sites, pages, lemmas per site) and the current
//! indexing state for the `/api/statistics` endpoint.

use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::{DetailedSiteStatistics, Statistics, TotalStatistics};
use crate::repository::{LemmaRepository, PageRepository, SiteRepository};

pub struct StatisticsService {
    sites: Arc<dyn SiteRepository>,
    pages: Arc<dyn PageRepository>,
    lemmas: Arc<dyn LemmaRepository>,
}

impl StatisticsService {
    pub fn new(
        sites: Arc<dyn SiteRepository>,
        pages: Arc<dyn PageRepository>,
        lemmas: Arc<dyn LemmaRepository>,
    ) -> Self {
        Self {
            sites,
            pages,
            lemmas,
        }
    }

    pub async fn statistics(&self, is_indexing: bool) -> Result<Statistics> {
        let sites = self.sites.find_all().await?;

        let mut total = TotalStatistics {
            indexing: is_indexing,
            ..Default::default()
        };
        let mut detailed = Vec::with_capacity(sites.len());

        for site in sites {
            let pages = self.pages.count_by_site(site.id).await?;
            let lemmas = self.lemmas.count_by_site(site.id).await?;

            total.sites += 1;
            total.pages += pages;
            total.lemmas += lemmas;

            detailed.push(DetailedSiteStatistics {
                url: site.url,
                name: site.name,
                status: site.status,
                status_time: site.status_time.timestamp_millis(),
                error: site.last_error,
                pages,
                lemmas,
            });
        }

        Ok(Statistics { total, detailed })
    }
}
