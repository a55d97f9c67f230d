use crate::error::InstallError;
use crate::types::*;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_API_BASE: &str = "OLLAMA_INSTALLER_API_BASE";
pub const ENV_DOWNLOAD_BASE: &str = "OLLAMA_INSTALLER_DOWNLOAD_BASE";
pub const ENV_REPO: &str = "OLLAMA_INSTALLER_REPO";
pub const ENV_TIMEOUT_SECS: &str = "OLLAMA_INSTALLER_TIMEOUT_SECS";
pub const ENV_MODIFY_WINDOWS_PATH: &str = "OLLAMA_INSTALLER_MODIFY_WINDOWS_PATH";
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";

pub fn get_home_dir() -> Result<PathBuf, InstallError> {
    let path = dirs::home_dir().ok_or_else(|| {
        InstallError::filesystem(
            "determine home directory",
            "~",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no home directory"),
        )
    })?;
    tracing::debug!("Home directory: {}", path.display());
    Ok(path)
}

pub fn load_settings() -> Result<InstallerSettings, InstallError> {
    let home = get_home_dir()?;
    Ok(apply_env_overrides(
        InstallerSettings::with_home(home),
        |key| std::env::var(key).ok(),
    ))
}

/// Applies `OLLAMA_INSTALLER_*` (and `GITHUB_TOKEN`) overrides on top of
/// `settings`. Empty values are treated as unset.
pub fn apply_env_overrides<F>(mut settings: InstallerSettings, lookup: F) -> InstallerSettings
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(base) = var(ENV_API_BASE) {
        settings.api_base = base.trim_end_matches('/').to_string();
    }

    if let Some(base) = var(ENV_DOWNLOAD_BASE) {
        settings.download_base = base.trim_end_matches('/').to_string();
    }

    if let Some(repo) = var(ENV_REPO) {
        settings.repo = repo.trim_matches('/').to_string();
    }

    if let Some(secs) = var(ENV_TIMEOUT_SECS) {
        match secs.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => settings.http_timeout = Duration::from_secs(secs),
            _ => tracing::warn!("Ignoring invalid {} value '{}'", ENV_TIMEOUT_SECS, secs),
        }
    }

    if let Some(flag) = var(ENV_MODIFY_WINDOWS_PATH) {
        settings.modify_windows_path = flag.to_lowercase() == "true" || flag == "1";
    }

    if let Some(token) = var(ENV_GITHUB_TOKEN) {
        settings.github_token = Some(token);
    }

    settings
}
