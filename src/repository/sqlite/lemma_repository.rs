//! Lemma repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::models::Lemma;
use crate::repository::LemmaRepository as LemmaRepositoryTrait;

pub struct SqliteLemmaRepository {
    pool: SqlitePool,
}

impl SqliteLemmaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_lemma(row: &sqlx::sqlite::SqliteRow) -> Result<Lemma> {
        Ok(Lemma {
            id: row.try_get("id")?,
            site_id: row.try_get("site_id")?,
            lemma: row.try_get("lemma")?,
            frequency: row.try_get("frequency")?,
        })
    }

    /// Build a `(?, ?, ...)` placeholder list for an `IN` clause, since
    /// sqlx's runtime query API has no native array binding for SQLite.
    fn placeholders(n: usize) -> String {
        std::iter::repeat("?").take(n).collect::<Vec<_>>().join(", ")
    }
}

#[async_trait]
impl LemmaRepositoryTrait for SqliteLemmaRepository {
    async fn save(&self, lemma: &mut Lemma) -> Result<()> {
        if lemma.id == 0 {
            let row = sqlx::query(
                r#"
                INSERT INTO lemmas (site_id, lemma, frequency)
                VALUES (?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(lemma.site_id)
            .bind(&lemma.lemma)
            .bind(lemma.frequency)
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("failed to insert lemma {}", lemma.lemma))?;
            lemma.id = row.try_get("id")?;
        } else {
            sqlx::query("UPDATE lemmas SET frequency = ? WHERE id = ?")
                .bind(lemma.frequency)
                .bind(lemma.id)
                .execute(&self.pool)
                .await
                .with_context(|| format!("failed to update lemma {}", lemma.id))?;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM lemmas WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to delete lemma {id}"))?;
        Ok(())
    }

    async fn find_by_lemma_and_site(&self, lemma: &str, site_id: i64) -> Result<Option<Lemma>> {
        let row = sqlx::query("SELECT * FROM lemmas WHERE lemma = ? AND site_id = ?")
            .bind(lemma)
            .bind(site_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to query lemma by lemma and site")?;
        row.as_ref().map(Self::row_to_lemma).transpose()
    }

    async fn find_by_site(&self, site_id: i64) -> Result<Vec<Lemma>> {
        let rows = sqlx::query("SELECT * FROM lemmas WHERE site_id = ? ORDER BY id ASC")
            .bind(site_id)
            .fetch_all(&self.pool)
            .await
            .context("failed to list lemmas for site")?;
        rows.iter().map(Self::row_to_lemma).collect()
    }

    async fn find_by_lemma_in(&self, lemmas: &[String]) -> Result<Vec<Lemma>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM lemmas WHERE lemma IN ({})",
            Self::placeholders(lemmas.len())
        );
        let mut query = sqlx::query(&sql);
        for lemma in lemmas {
            query = query.bind(lemma);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("failed to query lemmas by lemma list")?;
        rows.iter().map(Self::row_to_lemma).collect()
    }

    async fn find_by_lemma_in_and_site_url(
        &self,
        lemmas: &[String],
        site_url: &str,
    ) -> Result<Vec<Lemma>> {
        if lemmas.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT l.* FROM lemmas l
            JOIN sites s ON s.id = l.site_id
            WHERE s.url = ? AND l.lemma IN ({})
            "#,
            Self::placeholders(lemmas.len())
        );
        let mut query = sqlx::query(&sql).bind(site_url);
        for lemma in lemmas {
            query = query.bind(lemma);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .context("failed to query lemmas by lemma list and site url")?;
        rows.iter().map(Self::row_to_lemma).collect()
    }

    async fn count_by_site(&self, site_id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM lemmas WHERE site_id = ?")
            .bind(site_id)
            .fetch_one(&self.pool)
            .await
            .context("failed to count lemmas for site")?;
        Ok(row.try_get("count")?)
    }

    async fn has_any(&self, site_id: i64) -> Result<bool> {
        Ok(self.count_by_site(site_id).await? > 0)
    }
}
