//! Page repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::models::Page;
use crate::repository::PageRepository as PageRepositoryTrait;

pub struct SqlitePageRepository {
    pool: SqlitePool,
}

impl SqlitePageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_page(row: &sqlx::sqlite::SqliteRow) -> Result<Page> {
        Ok(Page {
            id: row.try_get("id")?,
            site_id: row.try_get("site_id")?,
            path: row.try_get("path")?,
            code: row.try_get("code")?,
            content: row.try_get("content")?,
        })
    }
}

#[async_trait]
impl PageRepositoryTrait for SqlitePageRepository {
    async fn save(&self, page: &mut Page) -> Result<()> {
        if page.id == 0 {
            let row = sqlx::query(
                r#"
                INSERT INTO pages (site_id, path, code, content)
                VALUES (?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(page.site_id)
            .bind(&page.path)
            .bind(page.code)
            .bind(&page.content)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert page {}", page.path))?;
            page.id = row.try_get("id")?;
        } else {
            sqlx::query("UPDATE pages SET site_id = ?, path = ?, code = ?, content = ? WHERE id = ?")
                .bind(page.site_id)
                .bind(&page.path)
                .bind(page.code)
                .bind(&page.content)
                .bind(page.id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update page {}", page.id))?;
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete page {id}"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Page>> {
        let row = sqlx::query("SELECT * FROM pages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query page by id")?;
        row.as_ref().map(Self::row_to_page).transpose()
    }

    async fn find_by_path(&self, site_id: i64, path: &str) -> Result<Option<Page>> {
        let row = sqlx::query("SELECT * FROM pages WHERE site_id = ? AND path = ?")
            .bind(site_id)
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query page by path")?;
        row.as_ref().map(Self::row_to_page).transpose()
    }

    async fn find_all_by_site(&self, site_id: i64) -> Result<Vec<Page>> {
        let rows = sqlx::query("SELECT * FROM pages WHERE site_id = ? ORDER BY id ASC")
            .bind(site_id)
            .fetch_all(&self.pool)
            .await
            .context("failed to list pages for site")?;
        rows.iter().map(Self::row_to_page).collect()
    }

    async fn count_by_site(&self, site_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE site_id = ?")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await
            .context("failed to count pages for site")?;
        Ok(row.try_get("count")?)
    }
}
