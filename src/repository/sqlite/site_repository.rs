//! Site repository.
//!
//! Uses the runtime-checked `sqlx::query`/`query_as` API rather than the
//! `query!` macro: the macro needs either a live database or a committed
//! offline query cache at compile time, and this crate ships neither.

use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::models::{Site, SiteStatus};
use crate::repository::SiteRepository as SiteRepositoryTrait;

pub struct SqliteSiteRepository {
    pool: SqlitePool,
}

impl SqliteSiteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_site(row: &sqlx::sqlite::SqliteRow) -> Result<Site> {
        let status_str: String = row.try_get("status")?;
        let status_time_str: String = row.try_get("status_time")?;
        Ok(Site {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            name: row.try_get("name")?,
            status: SiteStatus::from_str(&status_str)
                .map_err(|_| anyhow::anyhow!("unknown site status {status_str}"))?,
            status_time: DateTime::parse_from_rfc3339(&status_time_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            last_error: row.try_get("last_error")?,
        })
    }
}

#[async_trait]
impl SiteRepositoryTrait for SqliteSiteRepository {
    async fn save(&self, site: &mut Site) -> Result<()> {
        let status_time_str = site.status_time.to_rfc3339();
        if site.id == 0 {
            let row = sqlx::query(
                r#"
                INSERT INTO sites (url, name, status, status_time, last_error)
                VALUES (?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(&site.url)
            .bind(&site.name)
            .bind(site.status.as_str())
            .bind(&status_time_str)
            .bind(&site.last_error)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert site {}", site.url))?;
            site.id = row.try_get("id")?;
        } else {
            sqlx::query(
                r#"
                UPDATE sites SET url = ?, name = ?, status = ?, status_time = ?, last_error = ?
                WHERE id = ?
                "#,
            )
            .bind(&site.url)
            .bind(&site.name)
            .bind(site.status.as_str())
            .bind(&status_time_str)
            .bind(&site.last_error)
            .bind(site.id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to update site {}", site.id))?;
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM sites WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete site {id}"))?;
        Ok(())
    }

    async fn delete_by_url(&self, url: &str) -> Result<()> {
        sqlx::query("DELETE FROM sites WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete site {url}"))?;
        Ok(())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Site>> {
        let row = sqlx::query("SELECT * FROM sites WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query site by url")?;
        row.as_ref().map(Self::row_to_site).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Site>> {
        let row = sqlx::query("SELECT * FROM sites WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query site by id")?;
        row.as_ref().map(Self::row_to_site).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Site>> {
        let rows = sqlx::query("SELECT * FROM sites ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .context("failed to list sites")?;
        rows.iter().map(Self::row_to_site).collect()
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM sites WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .context("failed to check site existence")?;
        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }
}
