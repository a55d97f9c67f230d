//! GitHub API interaction module
//!
//! Looks up the latest release tag of the configured repository.

use crate::error::InstallError;
use crate::types::{InstallerSettings, ReleaseInfo};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;

/// Build GitHub API URL for the latest release of `repo` ("owner/repo")
pub fn build_latest_release_url(api_base: &str, repo: &str) -> String {
    format!("{}/repos/{}/releases/latest", api_base, repo)
}

/// HTTP client shared by the metadata request and the download.
///
/// Only the connect phase has a client-wide timeout; request-level bounds are
/// applied by the callers so that large downloads are not cut off.
pub fn build_client(settings: &InstallerSettings) -> Result<Client, InstallError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = &settings.github_token {
        match HeaderValue::from_str(&format!("token {}", token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
                tracing::debug!("Using GITHUB_TOKEN");
            }
            Err(_) => tracing::warn!("Ignoring GITHUB_TOKEN: not a valid header value"),
        }
    }

    Client::builder()
        .user_agent(concat!("ollama-installer/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(settings.http_timeout)
        .default_headers(headers)
        .build()
        .map_err(|e| InstallError::network(&settings.api_base, e))
}

/// Fetch the latest release from the GitHub API. Single attempt.
pub async fn fetch_latest_release(
    client: &Client,
    settings: &InstallerSettings,
) -> Result<ReleaseInfo, InstallError> {
    let url = build_latest_release_url(&settings.api_base, &settings.repo);
    tracing::debug!("Fetching GitHub release info from: {}", url);

    let response = client
        .get(&url)
        .header(ACCEPT, "application/vnd.github.v3+json")
        .timeout(settings.http_timeout)
        .send()
        .await
        .map_err(|e| InstallError::network(&url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(InstallError::Network {
            url,
            reason: format!("GitHub API returned status {}", status),
            source: None,
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| InstallError::network(&url, e))?;

    parse_release(&body)
}

fn parse_release(body: &[u8]) -> Result<ReleaseInfo, InstallError> {
    let release: ReleaseInfo = serde_json::from_slice(body).map_err(|e| InstallError::Parse {
        reason: e.to_string(),
        source: Some(e),
    })?;

    if release.tag_name.trim().is_empty() {
        return Err(InstallError::Parse {
            reason: "tag_name is empty".to_string(),
            source: None,
        });
    }

    Ok(release)
}
