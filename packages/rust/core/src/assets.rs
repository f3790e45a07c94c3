//! Persists the listing's icon and image in the CMS asset store.
//!
//! Fetches are settled independently; body reads and uploads only start once
//! both fetches succeeded and fail together. Any failure leaves the draft with
//! its original URLs.

use tracing::{info, instrument, warn};

use toolscout_cms::{CmsClient, ImageUpload};
use toolscout_fetch::{AssetBytes, AssetFetcher, AssetResponse, slugify};
use toolscout_shared::{ListingDraft, Result};

use crate::report::Degradation;

/// Upload icon and image, updating `draft` in place on success.
///
/// Returns the degradations to report; empty when both assets were stored.
#[instrument(skip_all, fields(name = %draft.name, cms = cms.name()))]
pub async fn upload_assets(
    draft: &mut ListingDraft,
    fetcher: &AssetFetcher,
    cms: &dyn CmsClient,
) -> Vec<Degradation> {
    let (Some(icon_url), Some(image_url)) = (draft.icon.clone(), draft.image.clone()) else {
        info!("icon or image missing; skipping asset upload");
        return vec![Degradation::AssetsSkipped];
    };
    if !cms.accepts_uploads() {
        info!("CMS does not accept uploads; skipping asset upload");
        return vec![Degradation::AssetsSkipped];
    }

    let (icon, image) = tokio::join!(fetcher.fetch(&icon_url), fetcher.fetch(&image_url));
    let (Some(icon), Some(image)) = (settled(icon, "icon"), settled(image, "image")) else {
        return vec![Degradation::AssetFetchFailed];
    };

    let (icon, image) = match tokio::try_join!(icon.into_bytes(), image.into_bytes()) {
        Ok(bodies) => bodies,
        Err(e) => {
            warn!(error = %e, "failed to read asset bodies");
            return vec![Degradation::AssetFetchFailed];
        }
    };

    let slug = slugify(&draft.name);
    let logo_upload = to_upload(&slug, "logo", icon);
    let image_upload = to_upload(&slug, "image", image);

    match tokio::try_join!(cms.upload_image(logo_upload), cms.upload_image(image_upload)) {
        Ok((logo, screenshot)) => {
            info!(icon_id = %logo.id, image_id = %screenshot.id, "assets uploaded");
            draft.icon_id = Some(logo.id);
            draft.image_id = Some(screenshot.id);
            if let Some(url) = logo.url {
                draft.icon = Some(url);
            }
            if let Some(url) = screenshot.url {
                draft.image = Some(url);
            }
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "asset upload failed; keeping original URLs");
            vec![Degradation::AssetUploadFailed]
        }
    }
}

/// Keep a fetch outcome only when it produced a 2xx response.
fn settled(outcome: Result<AssetResponse>, role: &str) -> Option<AssetResponse> {
    match outcome {
        Ok(response) if response.is_success() => Some(response),
        Ok(response) => {
            warn!(
                role,
                url = %response.url,
                status = response.status,
                "asset fetch returned non-success status"
            );
            None
        }
        Err(e) => {
            warn!(role, error = %e, "asset fetch failed");
            None
        }
    }
}

fn to_upload(slug: &str, suffix: &str, asset: AssetBytes) -> ImageUpload {
    ImageUpload {
        filename: format!("{slug}_{suffix}.{}", asset.extension()),
        content_type: asset.content_type,
        data: asset.data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use toolscout_cms::MemoryCms;
    use toolscout_shared::{AssetsConfig, ControlledVocabulary};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0, 1, 2, 3];

    fn fetcher() -> AssetFetcher {
        AssetFetcher::new(&AssetsConfig::default())
            .unwrap()
            .allow_private_hosts()
    }

    fn draft(server: &MockServer) -> ListingDraft {
        ListingDraft {
            name: "Acme Cloud".into(),
            icon: Some(format!("{}/logo.png", server.uri())),
            image: Some(format!("{}/og.jpg", server.uri())),
            ..ListingDraft::default()
        }
    }

    async fn serve_images(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/png")
                    .set_body_bytes(PNG),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/og.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg; charset=binary")
                    .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn uploads_both_assets_with_slugged_names() {
        let server = MockServer::start().await;
        serve_images(&server).await;
        let cms = MemoryCms::new(ControlledVocabulary::default());

        let mut listing = draft(&server);
        let degradations = upload_assets(&mut listing, &fetcher(), &cms).await;

        assert!(degradations.is_empty());
        let mut names: Vec<String> = cms.uploads().into_iter().map(|u| u.filename).collect();
        names.sort();
        assert_eq!(names, vec!["acme-cloud_image.jpg", "acme-cloud_logo.png"]);
        assert_eq!(listing.icon_id.as_deref(), Some("image-memory-acme-cloud_logo-png"));
        assert_eq!(listing.icon.as_deref(), Some("memory://assets/acme-cloud_logo.png"));
        assert_eq!(listing.image.as_deref(), Some("memory://assets/acme-cloud_image.jpg"));
    }

    #[tokio::test]
    async fn upload_failure_keeps_original_urls() {
        let server = MockServer::start().await;
        serve_images(&server).await;
        let cms = MemoryCms::new(ControlledVocabulary::default()).failing_uploads();

        let mut listing = draft(&server);
        let original = listing.clone();
        let degradations = upload_assets(&mut listing, &fetcher(), &cms).await;

        assert_eq!(degradations, vec![Degradation::AssetUploadFailed]);
        assert_eq!(listing, original);
    }

    #[tokio::test]
    async fn one_failed_fetch_skips_uploads() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/og.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        let cms = MemoryCms::new(ControlledVocabulary::default());

        let mut listing = draft(&server);
        let degradations = upload_assets(&mut listing, &fetcher(), &cms).await;

        assert_eq!(degradations, vec![Degradation::AssetFetchFailed]);
        assert!(cms.uploads().is_empty());
        assert_eq!(listing.icon_id, None);
    }

    #[tokio::test]
    async fn missing_image_or_read_only_cms_skips() {
        let cms = MemoryCms::new(ControlledVocabulary::default());
        let mut listing = ListingDraft {
            icon: Some("https://acme.dev/logo.png".into()),
            ..ListingDraft::default()
        };
        assert_eq!(
            upload_assets(&mut listing, &fetcher(), &cms).await,
            vec![Degradation::AssetsSkipped]
        );

        let server = MockServer::start().await;
        let read_only = MemoryCms::new(ControlledVocabulary::default()).read_only();
        let mut listing = draft(&server);
        assert_eq!(
            upload_assets(&mut listing, &fetcher(), &read_only).await,
            vec![Degradation::AssetsSkipped]
        );
    }
}
