use crate::archive::ArchiveFormat;
use crate::types::*;
use std::path::{Path, PathBuf};

pub const VERSION_SLOT: &str = "{version}";

pub fn get_system_info() -> PlatformInfo {
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();

    let normalized_arch = match arch.as_str() {
        "x86_64" => "amd64".to_string(),
        "aarch64" => "arm64".to_string(),
        _ => arch,
    };

    PlatformInfo {
        os,
        arch: normalized_arch,
    }
}

/// Where the release comes from and where it goes, for one host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Download URL with a single `{version}` slot.
    pub download_url_template: String,
    /// Name of the temporary archive; its extension selects the format.
    pub archive_file_name: String,
    pub binary_name: String,
    pub install_dir: PathBuf,
}

impl PlatformConfig {
    /// Picks the configuration for `platform`. Unknown operating systems get
    /// the Linux layout.
    pub fn resolve(platform: &PlatformInfo, settings: &InstallerSettings) -> Self {
        let home = settings.home_dir.as_path();
        let arm = platform.arch == "arm64";

        let (asset, archive_file_name, binary_name, install_dir) = match platform.os.as_str() {
            "windows" => (
                if arm {
                    "ollama-windows-arm64.zip"
                } else {
                    "ollama-windows-amd64.zip"
                },
                "ollama.zip",
                "ollama.exe",
                windows_install_dir(home),
            ),
            "macos" | "darwin" => ("ollama-darwin.zip", "ollama.zip", "ollama", home.join("bin")),
            os => {
                if os != "linux" {
                    tracing::debug!("Unrecognized OS '{}', using the Linux layout", os);
                }
                (
                    if arm {
                        "ollama-linux-arm64.tgz"
                    } else {
                        "ollama-linux-amd64.tgz"
                    },
                    "ollama.tgz",
                    "ollama",
                    home.join("bin"),
                )
            }
        };

        Self {
            download_url_template: format!(
                "{}/{}/releases/download/{}/{}",
                settings.download_base, settings.repo, VERSION_SLOT, asset
            ),
            archive_file_name: archive_file_name.to_string(),
            binary_name: binary_name.to_string(),
            install_dir,
        }
    }

    pub fn download_url(&self, version: &str) -> String {
        self.download_url_template.replacen(VERSION_SLOT, version, 1)
    }

    pub fn install_path(&self) -> PathBuf {
        self.install_dir.join(&self.binary_name)
    }

    pub fn archive_format(&self) -> Option<ArchiveFormat> {
        ArchiveFormat::from_path(Path::new(&self.archive_file_name))
    }
}

fn windows_install_dir(home: &Path) -> PathBuf {
    home.join("AppData")
        .join("Local")
        .join("Programs")
        .join("Ollama")
}
