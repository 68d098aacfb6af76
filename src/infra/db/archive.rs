use async_trait::async_trait;
use sqlx::types::Json;

use crate::application::repos::{RepoError, SiteArchiveRepo};
use crate::domain::entities::{MenuItemRecord, PostRecord, StoredPage};

use super::{PostgresRepositories, map_sqlx_error};

#[async_trait]
impl SiteArchiveRepo for PostgresRepositories {
    async fn replace_site(
        &self,
        pages: &[StoredPage],
        posts: &[PostRecord],
        menu: &[MenuItemRecord],
    ) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("TRUNCATE page_contents, posts, menu_items RESTART IDENTITY")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for page in pages {
            sqlx::query(
                "INSERT INTO page_contents (page_key, content, updated_at) VALUES ($1, $2, $3)",
            )
            .bind(page.key.as_str())
            .bind(Json(&page.content))
            .bind(page.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        for post in posts {
            sqlx::query(
                r#"
                INSERT INTO posts (
                    id, slug, title, excerpt, body, image, position, published,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(post.id)
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.excerpt)
            .bind(&post.body)
            .bind(&post.image)
            .bind(post.position)
            .bind(post.published)
            .bind(post.created_at)
            .bind(post.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        for item in menu {
            sqlx::query(
                r#"
                INSERT INTO menu_items (
                    id, category, name, description, price_cents, available, position,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(item.id)
            .bind(&item.category)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.price_cents)
            .bind(item.available)
            .bind(item.position)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        // Explicit ids leave the sequences behind.
        for table in ["posts", "menu_items"] {
            let statement = format!(
                "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
                 COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
            );
            sqlx::query(&statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
