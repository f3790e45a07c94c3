//! Page and asset fetching for listing extraction.
//!
//! This crate provides:
//! - [`PageFetcher`]: timeout-bounded page fetch with HTML sanitization
//! - [`AssetFetcher`]: binary download of icons and screenshots
//! - [`sanitize_html`], [`to_markdown`], [`extract_hints`]: content passes
//! - URL helpers: [`tool_name_from_url`], [`favicon_url`], [`slugify`]

mod hints;
mod markdown;
mod sanitize;

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::{Host, Url};

use toolscout_shared::{AssetsConfig, FetchConfig, Result, ToolscoutError};

pub use hints::{PageHints, extract_hints};
pub use markdown::to_markdown;
pub use sanitize::sanitize_html;

/// User-Agent string for outbound requests.
const USER_AGENT: &str = concat!("toolscout/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Favicon service used when nothing else provides an icon.
const FAVICON_SERVICE: &str = "https://s2.googleusercontent.com/s2/favicons";

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// A page retrieved for extraction.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL requested.
    pub url: Url,
    /// HTTP status code.
    pub status: u16,
    /// Sanitized HTML. Empty when the server answered but the body was unusable.
    pub html: String,
    /// Head metadata read from the raw body.
    pub hints: PageHints,
}

impl FetchedPage {
    /// Whether there is any content to hand to the model.
    pub fn has_content(&self) -> bool {
        !self.html.trim().is_empty()
    }

    fn empty(url: &Url, status: u16) -> Self {
        Self {
            url: url.clone(),
            status,
            html: String::new(),
            hints: PageHints::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// PageFetcher
// ---------------------------------------------------------------------------

/// Fetches a submitted page with a bounded timeout.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    /// Allow localhost/private IPs (for tests against mock servers).
    allow_private_hosts: bool,
}

impl PageFetcher {
    /// Create a fetcher from the `[fetch]` config.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            allow_private_hosts: false,
        })
    }

    /// Allow fetching localhost/private IPs.
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }

    /// Fetch and sanitize a page.
    ///
    /// Returns `Err` only when no response could be obtained at all
    /// (blocked target, DNS, connect, TLS, timeout before headers). A response
    /// with a non-2xx status or an unreadable body yields an empty page.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            warn!("SSRF protection: blocked");
            return Err(ToolscoutError::validation(format!(
                "{url}: target host is not publicly routable"
            )));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ToolscoutError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "page fetch returned non-success status");
            return Ok(FetchedPage::empty(url, status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "failed to read page body");
                return Ok(FetchedPage::empty(url, status.as_u16()));
            }
        };

        let hints = extract_hints(&body, url);
        let html = sanitize_html(&body);

        debug!(
            status = status.as_u16(),
            raw_len = body.len(),
            sanitized_len = html.len(),
            "page fetched"
        );

        Ok(FetchedPage {
            url: url.clone(),
            status: status.as_u16(),
            html,
            hints,
        })
    }
}

// ---------------------------------------------------------------------------
// AssetFetcher
// ---------------------------------------------------------------------------

/// A response for an asset whose body has not been read yet.
#[derive(Debug)]
pub struct AssetResponse {
    pub url: Url,
    pub status: u16,
    response: reqwest::Response,
}

impl AssetResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the body into memory.
    pub async fn into_bytes(self) -> Result<AssetBytes> {
        let content_type = self
            .response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| guess_content_type(&self.url).to_string());

        let data = self
            .response
            .bytes()
            .await
            .map_err(|e| ToolscoutError::Network(format!("{}: body read failed: {e}", self.url)))?
            .to_vec();

        Ok(AssetBytes {
            url: self.url,
            content_type,
            data,
        })
    }
}

/// A downloaded asset.
#[derive(Debug, Clone)]
pub struct AssetBytes {
    pub url: Url,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl AssetBytes {
    /// File extension matching the content type.
    pub fn extension(&self) -> &'static str {
        extension_for(&self.content_type)
    }
}

/// Downloads icons and screenshots.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    client: Client,
    allow_private_hosts: bool,
}

impl AssetFetcher {
    /// Create an asset fetcher from the `[assets]` config.
    pub fn new(config: &AssetsConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            allow_private_hosts: false,
        })
    }

    /// Allow fetching localhost/private IPs.
    pub fn allow_private_hosts(mut self) -> Self {
        self.allow_private_hosts = true;
        self
    }

    /// Issue the request; the body is read separately with [`AssetResponse::into_bytes`].
    pub async fn fetch(&self, raw_url: &str) -> Result<AssetResponse> {
        let url = Url::parse(raw_url)
            .map_err(|e| ToolscoutError::validation(format!("invalid asset URL '{raw_url}': {e}")))?;

        if !self.allow_private_hosts && is_ssrf_target(&url) {
            return Err(ToolscoutError::validation(format!(
                "{url}: target host is not publicly routable"
            )));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ToolscoutError::Network(format!("{url}: {e}")))?;

        Ok(AssetResponse {
            status: response.status().as_u16(),
            url,
            response,
        })
    }
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Guess a tool name from a URL's hostname.
///
/// Strips `www.` and takes the first dot segment. Hosts with a single label
/// (`localhost`, `totally-invalid-host`) and IP addresses yield `None`.
pub fn tool_name_from_url(url: &Url) -> Option<String> {
    let Some(Host::Domain(domain)) = url.host() else {
        return None;
    };

    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    let domain = domain.strip_prefix("www.").unwrap_or(&domain);
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();

    if labels.len() < 2 {
        return None;
    }
    Some(labels[0].to_string())
}

/// Favicon-service URL for a raw (possibly unparsable) URL string.
pub fn favicon_url(raw_url: &str) -> String {
    format!("{FAVICON_SERVICE}?domain={}&sz=128", raw_url.trim())
}

/// Lowercase, hyphen-separated, ASCII-only slug. Never empty.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        "tool".to_string()
    } else {
        slug
    }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ToolscoutError::Network(format!("failed to build HTTP client: {e}")))
}

fn guess_content_type(url: &Url) -> &'static str {
    let path = url.path().to_ascii_lowercase();
    if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".webp") {
        "image/webp"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with(".ico") {
        "image/x-icon"
    } else if path.ends_with(".gif") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/gif" => "gif",
        "image/avif" => "avif",
        _ => "bin",
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
