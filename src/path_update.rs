//! Making the install directory reachable through `PATH`.
//!
//! On Unix an `export PATH=...` line is appended to one shell startup file.
//! On Windows the persistent user-scope `PATH` is rewritten as a whole.

use crate::error::InstallError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathUpdate {
    AlreadyPresent,
    Appended(PathBuf),
    #[cfg_attr(not(windows), allow(dead_code))]
    Updated,
}

struct ShellConfig {
    file_name: &'static str,
    only_if_exists: bool,
}

/// Candidates in order of preference.
const SHELL_CONFIGS: &[ShellConfig] = &[
    ShellConfig {
        file_name: ".zshrc",
        only_if_exists: true,
    },
    ShellConfig {
        file_name: ".bash_profile",
        only_if_exists: false,
    },
    ShellConfig {
        file_name: ".bashrc",
        only_if_exists: false,
    },
    ShellConfig {
        file_name: ".profile",
        only_if_exists: false,
    },
];

/// The line that puts `bin_dir` in front of `PATH`, spelled relative to
/// `$HOME` when possible.
pub fn export_line(home: &Path, bin_dir: &Path) -> String {
    let dir = match bin_dir.strip_prefix(home) {
        Ok(rel) if rel.as_os_str().is_empty() => "$HOME".to_string(),
        Ok(rel) => format!("$HOME/{}", rel.to_string_lossy().replace('\\', "/")),
        Err(_) => bin_dir.to_string_lossy().to_string(),
    };
    format!("export PATH=\"{}:$PATH\"", dir)
}

pub fn update_unix_path(home: &Path, bin_dir: &Path) -> Result<PathUpdate, InstallError> {
    let line = export_line(home, bin_dir);

    for config in SHELL_CONFIGS {
        let path = home.join(config.file_name);
        if contains_line(&path, &line) {
            tracing::debug!("{} already exports {}", path.display(), bin_dir.display());
            return Ok(PathUpdate::AlreadyPresent);
        }
    }

    let mut tried = Vec::new();
    for config in SHELL_CONFIGS {
        let path = home.join(config.file_name);
        if config.only_if_exists && !path.exists() {
            continue;
        }

        match append_line(&path, &line) {
            Ok(()) => {
                println!("Updated {} with PATH export", config.file_name);
                return Ok(PathUpdate::Appended(path));
            }
            Err(e) => {
                tracing::debug!("Could not append to {}: {}", path.display(), e);
                tried.push(config.file_name);
            }
        }
    }

    Err(InstallError::PathUpdate {
        reason: format!(
            "no shell configuration file could be updated (tried {})",
            tried.join(", ")
        ),
    })
}

fn contains_line(path: &Path, line: &str) -> bool {
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .any(|l| l.contains(line)),
        Err(_) => false,
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(CONFIG_FILE_MODE);
    }
    let mut file = options.open(path)?;
    file.write_all(format!("\n{}\n", line).as_bytes())?;
    file.flush()
}

/// Reads, checks and rewrites the user PATH in one PowerShell process. The
/// directory comes in through `OLLAMA_INSTALLER_DIR` and only a status word
/// goes out, so the PATH value never passes through the console encoding.
#[cfg(windows)]
const WINDOWS_PATH_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$dir = $env:OLLAMA_INSTALLER_DIR
$current = [Environment]::GetEnvironmentVariable('PATH', 'User')
if ($null -eq $current) { $current = '' }
$wanted = $dir.Trim().TrimEnd('\', '/')
foreach ($entry in $current.Split(';')) {
    if ($entry.Trim().TrimEnd('\', '/') -ieq $wanted) {
        Write-Output 'present'
        exit 0
    }
}
if ($current.Trim() -eq '') { $updated = $dir } else { $updated = "$dir;$current" }
[Environment]::SetEnvironmentVariable('PATH', $updated, 'User')
Write-Output 'updated'
"#;

/// Maps the status word printed by the PATH script.
#[cfg_attr(not(windows), allow(dead_code))]
fn parse_windows_status(stdout: &str) -> Result<PathUpdate, InstallError> {
    match stdout.trim() {
        "present" => Ok(PathUpdate::AlreadyPresent),
        "updated" => Ok(PathUpdate::Updated),
        other => Err(InstallError::PathUpdate {
            reason: format!("unexpected output from powershell: '{}'", other),
        }),
    }
}

/// Adds `dir` in front of the persistent user PATH.
///
/// `[Environment]::SetEnvironmentVariable` has no length cap, unlike `setx`.
/// Entries are compared case-insensitively, ignoring trailing separators.
#[cfg(windows)]
pub fn update_windows_path(dir: &Path) -> Result<PathUpdate, InstallError> {
    use std::process::Command;

    let output = Command::new("powershell")
        .args([
            "-NoProfile",
            "-NonInteractive",
            "-Command",
            WINDOWS_PATH_SCRIPT,
        ])
        .env("OLLAMA_INSTALLER_DIR", dir)
        .output()
        .map_err(|e| InstallError::PathUpdate {
            reason: format!("failed to run powershell: {}", e),
        })?;
    if !output.status.success() {
        return Err(InstallError::PathUpdate {
            reason: format!(
                "powershell failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let update = parse_windows_status(&String::from_utf8_lossy(&output.stdout))?;
    match update {
        PathUpdate::AlreadyPresent => println!("PATH already contains {}", dir.display()),
        _ => println!("Added {} to the user PATH", dir.display()),
    }
    Ok(update)
}
