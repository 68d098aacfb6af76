use std::sync::Arc;

use crate::application::{
    content::ContentService,
    menu::MenuService,
    posts::PostService,
    repos::{ContentRepo, MenuRepo, PostsRepo},
    sessions::AdminSessions,
    uploads::UploadMergeService,
};
use crate::config::Settings;
use crate::infra::{error::InfraError, uploads::UploadStorage};

/// Services and request-independent settings shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub content: ContentService,
    pub uploads: UploadMergeService,
    pub posts: PostService,
    pub menu: MenuService,
    pub sessions: Arc<AdminSessions>,
    pub public_prefix: String,
    pub max_request_bytes: usize,
    pub secure_cookie: bool,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        content_repo: Arc<dyn ContentRepo>,
        posts_repo: Arc<dyn PostsRepo>,
        menu_repo: Arc<dyn MenuRepo>,
    ) -> Result<Self, InfraError> {
        let storage = Arc::new(UploadStorage::new(settings.uploads.directory.clone())?);
        let content = ContentService::new(content_repo, settings.content.merge_strategy);
        let uploads = UploadMergeService::new(
            content.clone(),
            storage,
            settings.uploads.public_prefix.clone(),
        );
        let sessions = Arc::new(AdminSessions::new(
            settings.admin.password_sha256,
            settings.admin.session_ttl,
        ));
        let max_request_bytes = usize::try_from(settings.uploads.max_request_bytes.get())
            .map_err(|_| InfraError::configuration("uploads.max_request_bytes is too large"))?;

        Ok(Self {
            content,
            uploads,
            posts: PostService::new(posts_repo),
            menu: MenuService::new(menu_repo),
            sessions,
            public_prefix: settings.uploads.public_prefix.clone(),
            max_request_bytes,
            secure_cookie: settings.admin.secure_cookie,
        })
    }

    pub fn storage(&self) -> &UploadStorage {
        self.uploads.storage()
    }
}
