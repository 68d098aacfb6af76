//! Upload-and-merge: multipart submissions that mix a JSON fragment with files.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::{counter, histogram};
use serde_json::{Map, Value};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::content::{ContentError, ContentService, PageSnapshot};
use crate::application::repos::RepoError;
use crate::domain::{
    content_path::ContentPath,
    error::DomainError,
    pages::PageKey,
    uploads::{asset_destination, file_extension, resolve_binding, versioned_url},
};
use crate::infra::telemetry::{PLACED_FILES_TOTAL, UPLOAD_BYTES, UPLOAD_FAILURES_TOTAL};
use crate::infra::uploads::{StagedFile, UploadStorage, UploadStorageError};

/// One file part of a submission, already received into staging.
#[derive(Debug)]
pub struct StagedUpload {
    pub field: String,
    pub original_name: Option<String>,
    pub content_type: Option<String>,
    pub staged: StagedFile,
}

/// Raw parts of a multipart submission.
#[derive(Debug, Default)]
pub struct UploadSubmission {
    pub content: Option<String>,
    pub bindings: Option<String>,
    pub files: Vec<StagedUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFile {
    pub field: String,
    /// Destination relative to the upload root.
    pub path: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub page: PageSnapshot,
    pub placed: Vec<PlacedFile>,
}

#[derive(Debug, Error)]
pub enum UploadMergeError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error("failed to place file `{field}` at `{destination}`")]
    Placement {
        field: String,
        destination: String,
        orphaned: Vec<String>,
        #[source]
        source: UploadStorageError,
    },
    #[error("files were placed but the page could not be saved")]
    Persistence {
        placed: Vec<PlacedFile>,
        #[source]
        source: RepoError,
    },
}

struct PendingFile {
    field: String,
    destination: String,
    url: String,
    staged: StagedFile,
}

#[derive(Clone)]
pub struct UploadMergeService {
    content: ContentService,
    storage: Arc<UploadStorage>,
    public_prefix: String,
}

impl UploadMergeService {
    pub fn new(content: ContentService, storage: Arc<UploadStorage>, public_prefix: String) -> Self {
        Self {
            content,
            storage,
            public_prefix,
        }
    }

    pub fn storage(&self) -> &Arc<UploadStorage> {
        &self.storage
    }

    /// Apply a submission to the page `key`.
    ///
    /// The fragment is parsed, every file is bound and named, and the merged
    /// document is validated before any file leaves staging. A placement
    /// failure leaves already placed files where they are.
    pub async fn submit(
        &self,
        key: PageKey,
        submission: UploadSubmission,
    ) -> Result<UploadOutcome, UploadMergeError> {
        let result = self.apply(key, submission).await;
        if let Err(err) = &result {
            counter!(UPLOAD_FAILURES_TOTAL, "page" => key.as_str()).increment(1);
            warn!(
                target = "tavola::uploads",
                page = %key,
                error = %err,
                "upload submission rejected"
            );
        }
        result
    }

    async fn apply(
        &self,
        key: PageKey,
        submission: UploadSubmission,
    ) -> Result<UploadOutcome, UploadMergeError> {
        let UploadSubmission {
            content,
            bindings,
            files,
        } = submission;

        let mut fragment = parse_fragment(content.as_deref())?;
        let bindings = parse_bindings(bindings.as_deref())?;
        let current = self.content.load(key).await?;
        let version = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

        let mut pending = Vec::with_capacity(files.len());
        for upload in files {
            let path = resolve_binding(key, &upload.field, &bindings)?;
            seed_section(&mut fragment, &current, &path);

            let extension =
                file_extension(upload.original_name.as_deref(), upload.content_type.as_deref());
            let checksum = upload.staged.checksum();
            let mut destination = String::new();
            let mut url = String::new();
            path.assign_with(&mut fragment, |assigned| {
                destination = asset_destination(key, assigned, checksum, &extension)?;
                url = versioned_url(&self.public_prefix, &destination, version);
                Ok(Value::String(url.clone()))
            })?;

            histogram!(UPLOAD_BYTES).record(upload.staged.size_bytes() as f64);
            pending.push(PendingFile {
                field: upload.field,
                destination,
                url,
                staged: upload.staged,
            });
        }

        let document = self.content.merged_document(&current, fragment)?;

        let mut placed: Vec<PlacedFile> = Vec::with_capacity(pending.len());
        for file in pending {
            let checksum = file.staged.checksum().to_string();
            if let Err(source) = self.storage.place(file.staged, &file.destination).await {
                return Err(UploadMergeError::Placement {
                    field: file.field,
                    destination: file.destination,
                    orphaned: placed.into_iter().map(|done| done.path).collect(),
                    source,
                });
            }
            counter!(PLACED_FILES_TOTAL, "page" => key.as_str()).increment(1);
            info!(
                target = "tavola::uploads",
                page = %key,
                field = %file.field,
                destination = %file.destination,
                checksum = %checksum,
                "upload placed"
            );
            placed.push(PlacedFile {
                field: file.field,
                path: file.destination,
                url: file.url,
            });
        }

        let page = match self.content.save_document(key, document).await {
            Ok(page) => page,
            Err(ContentError::Repo(source)) => {
                return Err(UploadMergeError::Persistence { placed, source });
            }
            Err(err) => return Err(err.into()),
        };

        Ok(UploadOutcome { page, placed })
    }
}

fn parse_fragment(raw: Option<&str>) -> Result<Map<String, Value>, DomainError> {
    let raw = raw.ok_or_else(|| DomainError::validation("missing `content` field"))?;
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(DomainError::validation("`content` must be a JSON object")),
        Err(err) => Err(DomainError::validation(format!(
            "`content` is not valid JSON: {err}"
        ))),
    }
}

fn parse_bindings(raw: Option<&str>) -> Result<BTreeMap<String, ContentPath>, DomainError> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    let entries: BTreeMap<String, String> = serde_json::from_str(raw).map_err(|err| {
        DomainError::validation(format!(
            "`bindings` must map field names to content paths: {err}"
        ))
    })?;
    entries
        .into_iter()
        .map(|(field, path)| Ok((field, path.parse::<ContentPath>()?)))
        .collect()
}

/// Copy the stored section a path starts from into the fragment when the fragment omits it.
fn seed_section(fragment: &mut Map<String, Value>, current: &PageSnapshot, path: &ContentPath) {
    let root = path.root_field();
    if fragment.contains_key(root) {
        return;
    }
    if let Some(section) = current.content.get(root) {
        fragment.insert(root.to_string(), section.clone());
    }
}
