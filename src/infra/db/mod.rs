//! Postgres-backed repository implementations.

mod archive;
mod menu;
mod pages;
mod posts;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::{
    Postgres, Transaction,
    postgres::{PgPool, PgPoolOptions},
    query,
};

use crate::application::repos::RepoError;

#[derive(Clone)]
pub struct PostgresRepositories {
    pool: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'_, Postgres>, sqlx::Error> {
        self.pool.begin().await
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    }

    pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        query("SELECT 1").execute(self.pool()).await.map(|_| ())
    }

    /// Write `position = index` for each id of `table` in a single transaction.
    async fn write_positions(&self, table: &'static str, ids: &[i64]) -> Result<(), RepoError> {
        let statement =
            format!("UPDATE {table} SET position = $1, updated_at = now() WHERE id = $2");
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;
        for (index, id) in ids.iter().enumerate() {
            let position = i32::try_from(index).map_err(|_| RepoError::InvalidInput {
                message: "too many items to order".to_string(),
            })?;
            query(&statement)
                .bind(position)
                .bind(*id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        tx.commit().await.map_err(map_sqlx_error)
    }
}
