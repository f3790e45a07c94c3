//! Headless CMS collaborator: vocabulary queries and image uploads.
//!
//! [`CmsClient`] is the seam the pipeline depends on. [`SanityClient`] talks to
//! the Sanity HTTP API; [`MemoryCms`] serves fixed data for tests and for runs
//! without a configured project.

mod memory;
mod sanity;

use async_trait::async_trait;

use toolscout_shared::{Result, VocabularyKind};

pub use memory::MemoryCms;
pub use sanity::SanityClient;

/// Image bytes to persist in the CMS asset store.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A persisted asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// Asset document id.
    pub id: String,
    /// CDN URL, when the CMS reports one.
    pub url: Option<String>,
}

/// Operations the extraction pipeline needs from the CMS.
#[async_trait]
pub trait CmsClient: Send + Sync {
    /// Names of every label of the given kind, in CMS order.
    async fn list_labels(&self, kind: VocabularyKind) -> Result<Vec<String>>;

    /// Upload an image to the asset store.
    async fn upload_image(&self, upload: ImageUpload) -> Result<UploadedAsset>;

    /// Whether uploads can succeed at all (e.g. a write token is present).
    fn accepts_uploads(&self) -> bool {
        true
    }

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}
