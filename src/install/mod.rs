//! Installation pipeline
//!
//! Runs each step in order: latest release lookup, download, extraction,
//! copy into the install directory, and the PATH update. Temporary files
//! live in [`TempDir`]s under the home directory, so they are removed on
//! every exit path.

pub mod github;

use crate::archive::extract_archive;
use crate::download::download_file;
use crate::error::{InstallError, Stage};
use crate::path_update::PathUpdate;
use crate::platform::PlatformConfig;
use crate::types::InstallerSettings;
use anyhow::{Context, Result};
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use github::{build_client, fetch_latest_release};

#[cfg(unix)]
const EXECUTABLE_MODE: u32 = 0o755;

/// Installs the latest release and returns the path of the installed binary.
pub async fn install(
    client: &Client,
    settings: &InstallerSettings,
    platform: &PlatformConfig,
) -> Result<PathBuf> {
    let release = fetch_latest_release(client, settings)
        .await
        .context(Stage::FetchRelease)?;
    let url = platform.download_url(&release.tag_name);
    println!("Latest Ollama version: {}", release.tag_name);
    println!("Download URL: {}", url);

    let download_dir =
        scratch_dir(&settings.home_dir, ".ollama-download-").context(Stage::Download)?;
    let archive_path = download_dir.path().join(&platform.archive_file_name);
    download_file(client, &url, &archive_path, settings.http_timeout)
        .await
        .context(Stage::Download)?;

    fs::create_dir_all(&platform.install_dir)
        .map_err(|e| InstallError::filesystem("create directory", &platform.install_dir, e))
        .context(Stage::PrepareInstallDir)?;

    println!("Extracting Ollama binary...");
    let extract_dir =
        scratch_dir(&settings.home_dir, ".ollama-extract-").context(Stage::Extract)?;
    let format = platform
        .archive_format()
        .ok_or_else(|| InstallError::Extraction {
            archive: archive_path.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "unsupported archive format",
            ),
        })
        .context(Stage::Extract)?;
    let binary = extract_archive(
        &archive_path,
        format,
        extract_dir.path(),
        &platform.binary_name,
    )
    .context(Stage::Extract)?;

    let install_path = platform.install_path();
    copy_binary(&binary, &install_path).context(Stage::Install)?;

    if let Err(e) = update_path(settings, platform) {
        tracing::warn!("Failed to update PATH: {}", e);
    }

    discard(download_dir);
    discard(extract_dir);

    tracing::info!("Installed {} to {}", release.tag_name, install_path.display());
    Ok(install_path)
}

fn scratch_dir(home: &Path, prefix: &str) -> Result<TempDir, InstallError> {
    let dir = tempfile::Builder::new()
        .prefix(prefix)
        .tempdir_in(home)
        .map_err(|e| InstallError::filesystem("create temporary directory in", home, e))?;
    tracing::debug!("Created {}", dir.path().display());
    Ok(dir)
}

/// Removes a temporary directory now, reporting failures instead of
/// swallowing them as `Drop` would.
fn discard(dir: TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        tracing::warn!("Failed to remove {}: {}", path.display(), e);
    }
}

fn copy_binary(source: &Path, dest: &Path) -> Result<(), InstallError> {
    fs::copy(source, dest).map_err(|e| InstallError::filesystem("copy binary to", dest, e))?;
    make_executable(dest)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(EXECUTABLE_MODE))
        .map_err(|e| InstallError::filesystem("make executable", path, e))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

#[cfg(not(windows))]
fn update_path(
    settings: &InstallerSettings,
    platform: &PlatformConfig,
) -> Result<Option<PathUpdate>, InstallError> {
    if settings.modify_windows_path {
        tracing::debug!("Windows PATH setting has no effect on this platform");
    }
    crate::path_update::update_unix_path(&settings.home_dir, &platform.install_dir).map(Some)
}

#[cfg(windows)]
fn update_path(
    settings: &InstallerSettings,
    platform: &PlatformConfig,
) -> Result<Option<PathUpdate>, InstallError> {
    if settings.modify_windows_path {
        return crate::path_update::update_windows_path(&platform.install_dir).map(Some);
    }
    println!("Using standard Windows Ollama location (already in PATH)");
    Ok(None)
}
