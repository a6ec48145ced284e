//! PostgreSQL backend.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::QueryBackend;
use super::sql::SqlQueryBuilder;
use crate::error::GridResult;
use crate::grid::plan::QueryPlan;
use crate::grid::response::Row;

/// Executes grid statements on a PostgreSQL pool.
///
/// Every statement runs in its own transaction with
/// `SET LOCAL statement_timeout`, which resets on commit.
pub struct PgBackend {
    pool: PgPool,
    builder: SqlQueryBuilder,
    statement_timeout_secs: u64,
}

impl PgBackend {
    pub fn new(pool: PgPool, builder: SqlQueryBuilder, statement_timeout_secs: u64) -> Self {
        Self {
            pool,
            builder,
            statement_timeout_secs,
        }
    }

    pub fn builder(&self) -> &SqlQueryBuilder {
        &self.builder
    }

    async fn fetch_count(&self, sql: &str) -> GridResult<u64> {
        let mut tx = self.pool.begin().await?;
        self.set_timeout(&mut tx).await?;

        let count: i64 = sqlx::query_scalar(sql).fetch_one(&mut *tx).await?;
        tx.commit().await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn set_timeout(&self, tx: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> GridResult<()> {
        // SET does not accept bind parameters; the value is a formatted integer.
        sqlx::query(&format!(
            "SET LOCAL statement_timeout = '{}s'",
            self.statement_timeout_secs
        ))
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl QueryBackend for PgBackend {
    async fn count_all(&self) -> GridResult<u64> {
        self.fetch_count(&self.builder.build_total()).await
    }

    async fn count_filtered(&self, plan: &QueryPlan) -> GridResult<u64> {
        self.fetch_count(&self.builder.build_count(plan)).await
    }

    async fn fetch_page(&self, plan: &QueryPlan, page: u32, limit: u32) -> GridResult<Vec<Row>> {
        let page_sql = self.builder.build_page(plan, page, limit);

        let mut tx = self.pool.begin().await?;
        self.set_timeout(&mut tx).await?;

        let rows: Vec<Value> =
            sqlx::query_scalar(&format!("SELECT row_to_json(t) FROM ({page_sql}) t"))
                .fetch_all(&mut *tx)
                .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect())
    }

    fn query_text(&self, plan: &QueryPlan, page: u32, limit: u32) -> Option<String> {
        Some(self.builder.build_page(plan, page, limit))
    }
}
