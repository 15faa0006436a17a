//! Index repository — the lemma<->page edge table of the inverted index.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::models::IndexRow;
use crate::repository::IndexRepository as IndexRepositoryTrait;

pub struct SqliteIndexRepository {
    pool: SqlitePool,
}

impl SqliteIndexRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_index(row: &sqlx::sqlite::SqliteRow) -> Result<IndexRow> {
        Ok(IndexRow {
            id: row.try_get("id")?,
            page_id: row.try_get("page_id")?,
            lemma_id: row.try_get("lemma_id")?,
            rank: row.try_get("rank")?,
        })
    }
}

#[async_trait]
impl IndexRepositoryTrait for SqliteIndexRepository {
    async fn save(&self, index: &mut IndexRow) -> Result<()> {
        if index.id == 0 {
            let row = sqlx::query(
                r#"
                INSERT INTO indexes (page_id, lemma_id, rank)
                VALUES (?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(index.page_id)
            .bind(index.lemma_id)
            .bind(index.rank)
            .fetch_one(&self.pool)
            .await
            .context("failed to insert index row")?;
            index.id = row.try_get("id")?;
        } else {
            sqlx::query("UPDATE indexes SET rank = ? WHERE id = ?")
                .bind(index.rank)
                .bind(index.id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update index row {}", index.id))?;
        }
        Ok(())
    }

    async fn save_all(&self, indexes: &mut [IndexRow]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for index in indexes.iter_mut() {
            let row = sqlx::query(
                r#"
                INSERT INTO indexes (page_id, lemma_id, rank)
                VALUES (?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(index.page_id)
            .bind(index.lemma_id)
            .bind(index.rank)
            .fetch_one(&mut *tx)
            .await
            .context("failed to batch insert index rows")?;
            index.id = row.try_get("id")?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM indexes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete index row {id}"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<IndexRow>> {
        let row = sqlx::query("SELECT * FROM indexes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query index row by id")?;
        row.as_ref().map(Self::row_to_index).transpose()
    }

    async fn find_by_lemma_and_page_site(
        &self,
        lemma_id: i64,
        site_id: i64,
    ) -> Result<Vec<IndexRow>> {
        let rows = sqlx::query(
            r#"
            SELECT i.* FROM indexes i
            JOIN pages p ON p.id = i.page_id
            WHERE i.lemma_id = ? AND p.site_id = ?
            "#,
        )
        .bind(lemma_id)
        .bind(site_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to query index rows by lemma and site")?;
        rows.iter().map(Self::row_to_index).collect()
    }

    async fn count_distinct_by_lemma_and_page_site(
        &self,
        lemma_id: i64,
        site_id: i64,
    ) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT i.page_id) as count FROM indexes i
            JOIN pages p ON p.id = i.page_id
            WHERE i.lemma_id = ? AND p.site_id = ?
            "#,
        )
        .bind(lemma_id)
        .bind(site_id)
        .fetch_one(&self.pool)
        .await
        .context("failed to count distinct pages for lemma")?;
        Ok(row.try_get("count")?)
    }
}
