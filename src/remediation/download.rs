//! Release metadata and artifact downloads.
//!
//! The [`Downloader`] trait is the seam between the remediator and the
//! network; [`HttpDownloader`] is the production implementation.

use crate::error::{DeskprovError, Result};
use crate::remediation::hashing::normalize_digest;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// A published release (GitHub releases API subset).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseInfo {
    /// Release tag, e.g. `v1.9.25200`
    pub tag_name: String,
    /// Downloadable assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable file of a release.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
    /// `sha256:<hex>` when the publisher records one
    #[serde(default)]
    pub digest: Option<String>,
}

impl ReleaseAsset {
    /// The published SHA-256 as bare lowercase hex, if there is a usable one.
    pub fn sha256(&self) -> Option<String> {
        self.digest.as_deref().and_then(normalize_digest)
    }
}

impl ReleaseInfo {
    /// First asset whose name ends with `suffix` (case-insensitive).
    pub fn asset_with_suffix(&self, suffix: &str) -> Option<&ReleaseAsset> {
        let suffix = suffix.to_ascii_lowercase();
        self.assets
            .iter()
            .find(|a| a.name.to_ascii_lowercase().ends_with(&suffix))
    }

    /// The asset called `name` (case-insensitive).
    pub fn asset_named(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// Fetches release metadata and files.
pub trait Downloader {
    /// Fetch and parse release metadata from `url`.
    fn fetch_release(&self, url: &str) -> Result<ReleaseInfo>;

    /// Download `url` to `dest`, replacing any existing file.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Downloads over HTTPS with a blocking client.
///
/// Every connection attempt is bounded by the connect timeout. Only the
/// release metadata request has a total deadline; artifact bodies may take
/// as long as the transfer needs.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
    metadata_timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the given connect and metadata timeouts.
    pub fn new(connect_timeout: Duration, metadata_timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("deskprov/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| DeskprovError::Download {
                url: String::new(),
                message: format!("could not build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            metadata_timeout,
        })
    }
}

fn download_error(url: &str, message: impl std::fmt::Display) -> DeskprovError {
    DeskprovError::Download {
        url: url.to_string(),
        message: message.to_string(),
    }
}

impl Downloader for HttpDownloader {
    fn fetch_release(&self, url: &str) -> Result<ReleaseInfo> {
        tracing::debug!("Fetching release metadata from {}", url);
        let response = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json")
            .timeout(self.metadata_timeout)
            .send()
            .map_err(|e| download_error(url, e))?;

        if !response.status().is_success() {
            return Err(download_error(url, format!("HTTP {}", response.status())));
        }

        response
            .json::<ReleaseInfo>()
            .map_err(|e| download_error(url, format!("invalid release metadata: {}", e)))
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        tracing::info!("Downloading {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| download_error(url, e))?;

        if !response.status().is_success() {
            return Err(download_error(url, format!("HTTP {}", response.status())));
        }

        let mut file = File::create(dest)?;
        response
            .copy_to(&mut file)
            .map_err(|e| download_error(url, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    const RELEASE_JSON: &str = r#"{
        "tag_name": "v1.9.25200",
        "html_url": "https://github.com/microsoft/winget-cli/releases/tag/v1.9.25200",
        "assets": [
            {
                "name": "DesktopAppInstaller_Dependencies.zip",
                "browser_download_url": "https://example.com/deps.zip",
                "digest": null
            },
            {
                "name": "Microsoft.DesktopAppInstaller_8wekyb3d8bbwe.msixbundle",
                "browser_download_url": "https://example.com/bundle.msixbundle",
                "digest": "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
            }
        ]
    }"#;

    fn downloader() -> HttpDownloader {
        HttpDownloader::new(Duration::from_secs(3), Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn parses_release_metadata() {
        let info: ReleaseInfo = serde_json::from_str(RELEASE_JSON).unwrap();
        assert_eq!(info.tag_name, "v1.9.25200");
        let bundle = info.asset_with_suffix(".MSIXBUNDLE").unwrap();
        assert!(bundle.name.ends_with(".msixbundle"));
        assert!(bundle.digest.as_deref().unwrap().starts_with("sha256:"));
        assert!(info.asset_with_suffix(".appx").is_none());
    }

    #[test]
    fn fetch_release_reads_json() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/releases/latest");
            then.status(200)
                .header("content-type", "application/json")
                .body(RELEASE_JSON);
        });

        let info = downloader()
            .fetch_release(&server.url("/releases/latest"))
            .unwrap();
        assert_eq!(info.assets.len(), 2);
    }

    #[test]
    fn fetch_release_reports_http_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/releases/latest");
            then.status(403).body("rate limited");
        });

        let err = downloader()
            .fetch_release(&server.url("/releases/latest"))
            .unwrap_err();
        assert!(err.to_string().contains("403"), "{}", err);
    }

    #[test]
    fn download_writes_body_to_file() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkg.appx");
            then.status(200).body("package bytes");
        });
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("pkg.appx");

        downloader()
            .download(&server.url("/pkg.appx"), &dest)
            .unwrap();

        mock.assert();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "package bytes");
    }

    #[test]
    fn download_fails_on_404() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });
        let temp = TempDir::new().unwrap();

        let result = downloader().download(&server.url("/missing"), &temp.path().join("x"));
        assert!(matches!(result, Err(DeskprovError::Download { .. })));
    }

    #[test]
    fn metadata_request_has_a_deadline() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/releases/latest");
            then.status(200)
                .delay(Duration::from_millis(1500))
                .body(RELEASE_JSON);
        });
        let impatient =
            HttpDownloader::new(Duration::from_secs(3), Duration::from_millis(300)).unwrap();

        let result = impatient.fetch_release(&server.url("/releases/latest"));
        assert!(matches!(result, Err(DeskprovError::Download { .. })));
    }

    #[test]
    fn artifact_download_outlasts_the_metadata_deadline() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/bundle.msixbundle");
            then.status(200)
                .delay(Duration::from_millis(1000))
                .body("bundle bytes");
        });
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("bundle.msixbundle");
        let impatient =
            HttpDownloader::new(Duration::from_secs(3), Duration::from_millis(300)).unwrap();

        impatient
            .download(&server.url("/bundle.msixbundle"), &dest)
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "bundle bytes");
    }

    #[test]
    fn asset_lookup_by_name_and_digest() {
        let info: ReleaseInfo = serde_json::from_str(RELEASE_JSON).unwrap();
        let deps = info.asset_named("desktopappinstaller_dependencies.zip").unwrap();
        assert_eq!(deps.sha256(), None);
        let bundle = info.asset_with_suffix(".msixbundle").unwrap();
        assert_eq!(
            bundle.sha256().as_deref(),
            Some("b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9")
        );
    }
}
