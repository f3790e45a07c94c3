//! In-memory CMS for tests and offline runs.

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;

use toolscout_shared::{ControlledVocabulary, Result, ToolscoutError, VocabularyKind};

use crate::{CmsClient, ImageUpload, UploadedAsset};

/// CMS backed by a fixed vocabulary.
///
/// Failures can be injected per vocabulary kind and for uploads. Every
/// upload and query is recorded for assertions.
#[derive(Default)]
pub struct MemoryCms {
    vocabulary: ControlledVocabulary,
    failing_kinds: HashSet<VocabularyKind>,
    fail_uploads: bool,
    uploads_disabled: bool,
    uploads: RwLock<Vec<ImageUpload>>,
    queries: RwLock<Vec<VocabularyKind>>,
}

impl MemoryCms {
    /// Create a CMS serving the given vocabulary.
    pub fn new(vocabulary: ControlledVocabulary) -> Self {
        Self {
            vocabulary,
            ..Self::default()
        }
    }

    /// Make queries for `kind` fail.
    pub fn failing(mut self, kind: VocabularyKind) -> Self {
        self.failing_kinds.insert(kind);
        self
    }

    /// Make every upload fail.
    pub fn failing_uploads(mut self) -> Self {
        self.fail_uploads = true;
        self
    }

    /// Report that uploads are not possible (no write access).
    pub fn read_only(mut self) -> Self {
        self.uploads_disabled = true;
        self
    }

    /// Uploads received so far.
    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.uploads
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of label queries served so far.
    pub fn query_count(&self) -> usize {
        self.queries.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl CmsClient for MemoryCms {
    async fn list_labels(&self, kind: VocabularyKind) -> Result<Vec<String>> {
        self.queries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(kind);

        if self.failing_kinds.contains(&kind) {
            return Err(ToolscoutError::Cms(format!("{kind} query failed (injected)")));
        }
        Ok(self.vocabulary.labels(kind).to_vec())
    }

    async fn upload_image(&self, upload: ImageUpload) -> Result<UploadedAsset> {
        if self.fail_uploads || self.uploads_disabled {
            return Err(ToolscoutError::Cms(format!(
                "upload of {} failed (injected)",
                upload.filename
            )));
        }

        let id = format!("image-memory-{}", upload.filename.replace('.', "-"));
        let url = format!("memory://assets/{}", upload.filename);
        self.uploads
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(upload);

        Ok(UploadedAsset { id, url: Some(url) })
    }

    fn accepts_uploads(&self) -> bool {
        !self.uploads_disabled
    }

    fn name(&self) -> &str {
        "memory"
    }
}
