use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use time::OffsetDateTime;

use crate::{
    application::repos::{ContentRepo, RepoError},
    domain::{entities::StoredPage, pages::PageKey},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct PageContentRow {
    page_key: String,
    content: Json<Map<String, Value>>,
    updated_at: OffsetDateTime,
}

impl TryFrom<PageContentRow> for StoredPage {
    type Error = RepoError;

    fn try_from(row: PageContentRow) -> Result<Self, Self::Error> {
        let key = row
            .page_key
            .parse::<PageKey>()
            .map_err(|_| RepoError::InvalidInput {
                message: format!("unknown page key `{}` in page_contents", row.page_key),
            })?;
        Ok(Self {
            key,
            content: row.content.0,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl ContentRepo for PostgresRepositories {
    async fn find_page(&self, key: PageKey) -> Result<Option<StoredPage>, RepoError> {
        let row = sqlx::query_as::<_, PageContentRow>(
            "SELECT page_key, content, updated_at FROM page_contents WHERE page_key = $1",
        )
        .bind(key.as_str())
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(StoredPage::try_from).transpose()
    }

    async fn save_page(
        &self,
        key: PageKey,
        content: &Map<String, Value>,
    ) -> Result<StoredPage, RepoError> {
        let row = sqlx::query_as::<_, PageContentRow>(
            r#"
            INSERT INTO page_contents (page_key, content, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (page_key) DO UPDATE
                SET content = EXCLUDED.content,
                    updated_at = EXCLUDED.updated_at
            RETURNING page_key, content, updated_at
            "#,
        )
        .bind(key.as_str())
        .bind(Json(content))
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        StoredPage::try_from(row)
    }

    async fn list_pages(&self) -> Result<Vec<StoredPage>, RepoError> {
        let rows = sqlx::query_as::<_, PageContentRow>(
            "SELECT page_key, content, updated_at FROM page_contents ORDER BY page_key",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(StoredPage::try_from).collect()
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}
