//! Sanity HTTP API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use toolscout_shared::{CmsConfig, Result, ToolscoutError, VocabularyKind};

use crate::{CmsClient, ImageUpload, UploadedAsset};

/// Client for a single Sanity project/dataset.
#[derive(Clone)]
pub struct SanityClient {
    http: Client,
    base_url: String,
    api_version: String,
    dataset: String,
    token: Option<String>,
}

impl std::fmt::Debug for SanityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SanityClient")
            .field("base_url", &self.base_url)
            .field("dataset", &self.dataset)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    document: AssetDocument,
}

#[derive(Debug, Deserialize)]
struct AssetDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    url: Option<String>,
}

impl SanityClient {
    /// Build a client from the `[cms]` section. `token` is the resolved API token.
    pub fn from_config(config: &CmsConfig, token: Option<String>) -> Result<Self> {
        let base_url = match (&config.base_url, &config.project_id) {
            (Some(base), _) => base.trim_end_matches('/').to_string(),
            (None, Some(project)) => format!("https://{project}.api.sanity.io"),
            (None, None) => {
                return Err(ToolscoutError::config(
                    "cms.project_id is not set; cannot reach the CMS",
                ));
            }
        };

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ToolscoutError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            api_version: config.api_version.trim_start_matches('v').to_string(),
            dataset: config.dataset.clone(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v{}/{path}/{}", self.base_url, self.api_version, self.dataset)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// GROQ query returning the `name` of every document of a label type.
fn label_query(kind: VocabularyKind) -> String {
    format!(
        r#"*[_type == "{}" && defined(name)] | order(name asc).name"#,
        kind.document_type()
    )
}

#[async_trait]
impl CmsClient for SanityClient {
    #[instrument(skip(self), fields(kind = %kind))]
    async fn list_labels(&self, kind: VocabularyKind) -> Result<Vec<String>> {
        let query = label_query(kind);
        let response = self
            .authorize(self.http.get(self.endpoint("data/query")))
            .query(&[("query", query.as_str())])
            .send()
            .await
            .map_err(|e| ToolscoutError::Cms(format!("{kind} query failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ToolscoutError::http(
                format!("sanity {kind} query"),
                status.as_u16(),
                body,
            ));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| ToolscoutError::parse(format!("{kind} query response: {e}")))?;

        let labels: Vec<String> = parsed
            .result
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        debug!(count = labels.len(), "labels loaded");
        Ok(labels)
    }

    #[instrument(skip_all, fields(filename = %upload.filename, bytes = upload.data.len()))]
    async fn upload_image(&self, upload: ImageUpload) -> Result<UploadedAsset> {
        if self.token.is_none() {
            return Err(ToolscoutError::Cms("no API token configured for uploads".into()));
        }

        let response = self
            .authorize(self.http.post(self.endpoint("assets/images")))
            .query(&[("filename", upload.filename.as_str())])
            .header(reqwest::header::CONTENT_TYPE, upload.content_type.as_str())
            .body(upload.data)
            .send()
            .await
            .map_err(|e| ToolscoutError::Cms(format!("upload failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "asset upload rejected");
            return Err(ToolscoutError::http("sanity upload", status.as_u16(), body));
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| ToolscoutError::parse(format!("upload response: {e}")))?;

        Ok(UploadedAsset {
            id: parsed.document.id,
            url: parsed.document.url,
        })
    }

    fn accepts_uploads(&self) -> bool {
        self.token.is_some()
    }

    fn name(&self) -> &str {
        "sanity"
    }
}
