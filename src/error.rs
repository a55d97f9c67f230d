use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while installing.
///
/// `PathUpdate` is the only non-fatal kind: the orchestrator logs it and
/// still reports a successful install.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("request to {url} failed: {reason}")]
    Network {
        url: String,
        reason: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("could not parse release metadata: {reason}")]
    Parse {
        reason: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("download of {url} failed: {reason}")]
    Download {
        url: String,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("could not read archive {}", archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("binary '{binary}' not found in archive {}", archive.display())]
    BinaryNotFound { binary: String, archive: PathBuf },

    #[error("failed to {action} {}", path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not update PATH: {reason}")]
    PathUpdate { reason: String },

    #[error("installation interrupted")]
    Interrupted,
}

impl InstallError {
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        InstallError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }

    pub fn network(url: &str, source: reqwest::Error) -> Self {
        let reason = if source.is_timeout() {
            "timed out".to_string()
        } else if source.is_connect() {
            "could not connect".to_string()
        } else {
            "request error".to_string()
        };
        InstallError::Network {
            url: url.to_string(),
            reason,
            source: Some(source),
        }
    }
}

/// Pipeline stage, attached as context to fatal errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchRelease,
    Download,
    PrepareInstallDir,
    Extract,
    Install,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::FetchRelease => "failed to get the latest release",
            Stage::Download => "failed to download the release archive",
            Stage::PrepareInstallDir => "failed to prepare the install directory",
            Stage::Extract => "failed to extract the release archive",
            Stage::Install => "failed to install the binary",
        };
        f.write_str(s)
    }
}
