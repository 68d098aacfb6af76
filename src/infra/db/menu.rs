use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{MenuItemParams, MenuRepo, RepoError};
use crate::domain::entities::MenuItemRecord;

use super::{PostgresRepositories, map_sqlx_error};

const MENU_COLUMNS: &str =
    "id, category, name, description, price_cents, available, position, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: i64,
    category: String,
    name: String,
    description: String,
    price_cents: i32,
    available: bool,
    position: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MenuItemRow> for MenuItemRecord {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            category: row.category,
            name: row.name,
            description: row.description,
            price_cents: row.price_cents,
            available: row.available,
            position: row.position,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MenuRepo for PostgresRepositories {
    async fn list_menu_items(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<MenuItemRecord>, RepoError> {
        let sql = format!(
            "SELECT {MENU_COLUMNS} FROM menu_items \
             WHERE ($1::text IS NULL OR category = $1) \
             ORDER BY category, position, id"
        );
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(category)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(MenuItemRecord::from).collect())
    }

    async fn find_menu_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menu_items WHERE id = $1");
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(MenuItemRecord::from))
    }

    async fn create_menu_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        let sql = format!(
            r#"
            INSERT INTO menu_items (category, name, description, price_cents, available, position)
            VALUES ($1, $2, $3, $4, $5,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM menu_items WHERE category = $1))
            RETURNING {MENU_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(params.category)
            .bind(params.name)
            .bind(params.description)
            .bind(params.price_cents)
            .bind(params.available)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_menu_item(
        &self,
        id: i64,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        let sql = format!(
            r#"
            UPDATE menu_items
            SET category = $2, name = $3, description = $4, price_cents = $5,
                available = $6, updated_at = now()
            WHERE id = $1
            RETURNING {MENU_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .bind(params.category)
            .bind(params.name)
            .bind(params.description)
            .bind(params.price_cents)
            .bind(params.available)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(MenuItemRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_menu_item(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn reorder_menu_items(&self, ids: &[i64]) -> Result<(), RepoError> {
        self.write_positions("menu_items", ids).await
    }
}
