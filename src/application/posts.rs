//! Blog posts: CRUD plus manual ordering.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, UpdatePostParams};
use crate::domain::{
    collections::ensure_unique,
    entities::PostRecord,
    error::DomainError,
    slug::{SlugLookupError, derive_slug, unique_slug},
};
use crate::infra::telemetry::REORDERS_TOTAL;

#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<SlugLookupError<RepoError>> for PostError {
    fn from(err: SlugLookupError<RepoError>) -> Self {
        match err {
            SlugLookupError::Slug(err) => {
                PostError::Domain(DomainError::validation(err.to_string()))
            }
            SlugLookupError::Lookup(err) => PostError::Repo(err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: String,
    pub body: String,
    pub image: Option<String>,
    pub published: bool,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostsRepo>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostsRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, published_only: bool) -> Result<Vec<PostRecord>, PostError> {
        Ok(self.repo.list_posts(published_only).await?)
    }

    pub async fn get(&self, id: i64) -> Result<PostRecord, PostError> {
        self.repo
            .find_post(id)
            .await?
            .ok_or_else(|| DomainError::not_found("post").into())
    }

    pub async fn create(&self, draft: PostDraft) -> Result<PostRecord, PostError> {
        let title = required_title(&draft.title)?;
        let slug = match draft.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => self.claim_slug(explicit, None).await?,
            _ => {
                let repo = self.repo.clone();
                unique_slug(&title, move |candidate| {
                    let repo = repo.clone();
                    async move {
                        repo.find_post_by_slug(&candidate)
                            .await
                            .map(|post| post.is_none())
                    }
                })
                .await?
            }
        };

        let post = self
            .repo
            .create_post(CreatePostParams {
                slug,
                title,
                excerpt: draft.excerpt,
                body: draft.body,
                image: normalize_image(draft.image),
                published: draft.published,
            })
            .await?;
        info!(target = "tavola::posts", id = post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    pub async fn update(&self, id: i64, draft: PostDraft) -> Result<PostRecord, PostError> {
        let existing = self.get(id).await?;
        let title = required_title(&draft.title)?;
        let slug = match draft.slug.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => self.claim_slug(explicit, Some(id)).await?,
            _ => existing.slug,
        };

        let post = self
            .repo
            .update_post(UpdatePostParams {
                id,
                slug,
                title,
                excerpt: draft.excerpt,
                body: draft.body,
                image: normalize_image(draft.image),
                published: draft.published,
            })
            .await?;
        info!(target = "tavola::posts", id, "post updated");
        Ok(post)
    }

    pub async fn delete(&self, id: i64) -> Result<(), PostError> {
        match self.repo.delete_post(id).await {
            Ok(()) => {
                info!(target = "tavola::posts", id, "post deleted");
                Ok(())
            }
            Err(RepoError::NotFound) => Err(DomainError::not_found("post").into()),
            Err(err) => Err(err.into()),
        }
    }

    /// Persist the given order; positions follow list order and unknown ids are ignored.
    pub async fn reorder(&self, ids: &[i64]) -> Result<Vec<PostRecord>, PostError> {
        ensure_unique(ids)?;
        self.repo.reorder_posts(ids).await?;
        counter!(REORDERS_TOTAL, "collection" => "posts").increment(1);
        self.list(false).await
    }

    async fn claim_slug(&self, requested: &str, owner: Option<i64>) -> Result<String, PostError> {
        let slug = derive_slug(requested)
            .map_err(|err| DomainError::validation(format!("invalid slug: {err}")))?;
        match self.repo.find_post_by_slug(&slug).await? {
            Some(other) if Some(other.id) != owner => Err(DomainError::validation(format!(
                "slug `{slug}` is already used by another post"
            ))
            .into()),
            _ => Ok(slug),
        }
    }
}

fn required_title(title: &str) -> Result<String, DomainError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("post title must not be empty"));
    }
    Ok(title.to_string())
}

fn normalize_image(image: Option<String>) -> Option<String> {
    image
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
