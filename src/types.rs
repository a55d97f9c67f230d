use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    pub os: String,
    pub arch: String,
}

/// The subset of a GitHub release we care about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub tag_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerSettings {
    pub home_dir: PathBuf,
    pub api_base: String,
    pub download_base: String,
    pub repo: String,
    pub http_timeout: Duration,
    pub github_token: Option<String>,
    pub modify_windows_path: bool,
}

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_DOWNLOAD_BASE: &str = "https://github.com";
pub const DEFAULT_REPO: &str = "ollama/ollama";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

impl InstallerSettings {
    pub fn with_home(home_dir: PathBuf) -> Self {
        Self {
            home_dir,
            api_base: DEFAULT_API_BASE.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
            repo: DEFAULT_REPO.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            github_token: None,
            modify_windows_path: false,
        }
    }
}
