use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str =
    "id, slug, title, excerpt, body, image, position, published, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    slug: String,
    title: String,
    excerpt: String,
    body: String,
    image: Option<String>,
    position: i32,
    published: bool,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            body: row.body,
            image: row.image,
            position: row.position,
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, published_only: bool) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE ($1 = FALSE OR published) ORDER BY position, id"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(published_only)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_post(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }

    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            slug,
            title,
            excerpt,
            body,
            image,
            published,
        } = params;

        let sql = format!(
            r#"
            INSERT INTO posts (slug, title, excerpt, body, image, published, position)
            VALUES ($1, $2, $3, $4, $5, $6,
                    (SELECT COALESCE(MAX(position) + 1, 0) FROM posts))
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .bind(title)
            .bind(excerpt)
            .bind(body)
            .bind(image)
            .bind(published)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.into())
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            slug,
            title,
            excerpt,
            body,
            image,
            published,
        } = params;

        let sql = format!(
            r#"
            UPDATE posts
            SET slug = $2, title = $3, excerpt = $4, body = $5, image = $6,
                published = $7, updated_at = now()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .bind(slug)
            .bind(title)
            .bind(excerpt)
            .bind(body)
            .bind(image)
            .bind(published)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn reorder_posts(&self, ids: &[i64]) -> Result<(), RepoError> {
        self.write_positions("posts", ids).await
    }
}
