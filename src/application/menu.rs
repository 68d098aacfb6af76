//! Menu items grouped by category, kept in a manual order.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tracing::info;

use crate::application::repos::{MenuItemParams, MenuRepo, RepoError};
use crate::domain::{collections::ensure_unique, entities::MenuItemRecord, error::DomainError};
use crate::infra::telemetry::REORDERS_TOTAL;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct MenuService {
    repo: Arc<dyn MenuRepo>,
}

impl MenuService {
    pub fn new(repo: Arc<dyn MenuRepo>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<MenuItemRecord>, MenuError> {
        let category = category.map(str::trim).filter(|value| !value.is_empty());
        Ok(self.repo.list_menu_items(category).await?)
    }

    pub async fn get(&self, id: i64) -> Result<MenuItemRecord, MenuError> {
        self.repo
            .find_menu_item(id)
            .await?
            .ok_or_else(|| DomainError::not_found("menu item").into())
    }

    pub async fn create(&self, params: MenuItemParams) -> Result<MenuItemRecord, MenuError> {
        let params = validate(params)?;
        let item = self.repo.create_menu_item(params).await?;
        info!(target = "tavola::menu", id = item.id, name = %item.name, "menu item created");
        Ok(item)
    }

    pub async fn update(&self, id: i64, params: MenuItemParams) -> Result<MenuItemRecord, MenuError> {
        let params = validate(params)?;
        match self.repo.update_menu_item(id, params).await {
            Ok(item) => Ok(item),
            Err(RepoError::NotFound) => Err(DomainError::not_found("menu item").into()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, id: i64) -> Result<(), MenuError> {
        match self.repo.delete_menu_item(id).await {
            Ok(()) => {
                info!(target = "tavola::menu", id, "menu item deleted");
                Ok(())
            }
            Err(RepoError::NotFound) => Err(DomainError::not_found("menu item").into()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn reorder(&self, ids: &[i64]) -> Result<Vec<MenuItemRecord>, MenuError> {
        ensure_unique(ids)?;
        self.repo.reorder_menu_items(ids).await?;
        counter!(REORDERS_TOTAL, "collection" => "menu").increment(1);
        self.list(None).await
    }
}

fn validate(params: MenuItemParams) -> Result<MenuItemParams, DomainError> {
    let name = params.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::validation("menu item name must not be empty"));
    }
    let category = params.category.trim().to_string();
    if category.is_empty() {
        return Err(DomainError::validation("menu item category must not be empty"));
    }
    if params.price_cents < 0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    Ok(MenuItemParams {
        name,
        category,
        ..params
    })
}
