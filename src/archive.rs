//! Release archive extraction.
//!
//! Both formats go through [`Extraction`], which owns the containment check
//! and the binary-matching rule, so a `.tgz` and a `.zip` with the same
//! entries behave identically.

use crate::error::InstallError;
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Format tag from a file name's extension (`.tgz`, `.tar.gz`, `.zip`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".tgz") || name.ends_with(".tar.gz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }

    fn extract(
        self,
        archive_path: &Path,
        extraction: &mut Extraction<'_>,
    ) -> Result<(), InstallError> {
        match self {
            ArchiveFormat::TarGz => extract_tar_gz(archive_path, extraction),
            ArchiveFormat::Zip => extract_zip(archive_path, extraction),
        }
    }
}

/// Unpacks `archive_path` into `target_dir` and returns the extracted path of
/// `binary_name`.
///
/// `target_dir` is emptied first. Entries that would land outside it are
/// skipped, not treated as errors.
pub fn extract_archive(
    archive_path: &Path,
    format: ArchiveFormat,
    target_dir: &Path,
    binary_name: &str,
) -> Result<PathBuf, InstallError> {
    tracing::info!(
        "Extracting {} into {}",
        archive_path.display(),
        target_dir.display()
    );

    let mut extraction = Extraction::new(target_dir, binary_name, format)?;
    format.extract(archive_path, &mut extraction)?;

    let binary = extraction.binary.ok_or_else(|| InstallError::BinaryNotFound {
        binary: binary_name.to_string(),
        archive: archive_path.to_path_buf(),
    })?;

    tracing::info!("Found {} at {}", binary_name, binary.display());
    Ok(binary)
}

struct Extraction<'a> {
    /// Canonical form of the target directory.
    root: PathBuf,
    binary_name: &'a str,
    format: ArchiveFormat,
    binary: Option<PathBuf>,
}

impl<'a> Extraction<'a> {
    fn new(
        target_dir: &Path,
        binary_name: &'a str,
        format: ArchiveFormat,
    ) -> Result<Self, InstallError> {
        if target_dir.exists() {
            fs::remove_dir_all(target_dir)
                .map_err(|e| InstallError::filesystem("clear directory", target_dir, e))?;
        }
        fs::create_dir_all(target_dir)
            .map_err(|e| InstallError::filesystem("create directory", target_dir, e))?;
        let root = target_dir
            .canonicalize()
            .map_err(|e| InstallError::filesystem("resolve directory", target_dir, e))?;

        Ok(Self {
            root,
            binary_name,
            format,
            binary: None,
        })
    }

    /// Normalizes `entry` to a path relative to the root. An empty result
    /// names the root itself; `None` means the entry is absolute or climbs
    /// out of the root.
    fn relative_path(entry: &Path) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for component in entry.components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return None;
                    }
                }
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(relative)
    }

    fn is_contained(&self, path: &Path) -> io::Result<bool> {
        Ok(path.canonicalize()?.starts_with(&self.root))
    }

    fn is_binary(&self, entry: &Path) -> bool {
        let base_name_matches = entry
            .file_name()
            .is_some_and(|name| name == self.binary_name);
        match self.format {
            ArchiveFormat::TarGz => {
                base_name_matches || entry.ends_with(Path::new("bin").join(self.binary_name))
            }
            ArchiveFormat::Zip => base_name_matches,
        }
    }

    /// Creates `relative` under the root one level at a time. Every level
    /// that already exists must resolve inside the root, so nothing is ever
    /// created behind a link. Returns `None` when that check fails.
    fn ensure_dir(&self, relative: &Path) -> Result<Option<PathBuf>, InstallError> {
        let mut dir = self.root.clone();
        for part in relative.components() {
            dir.push(part);
            match fs::symlink_metadata(&dir) {
                Ok(_) => {
                    let contained = self
                        .is_contained(&dir)
                        .map_err(|e| InstallError::filesystem("resolve directory", &dir, e))?;
                    if !contained {
                        return Ok(None);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    fs::create_dir(&dir)
                        .map_err(|e| InstallError::filesystem("create directory", &dir, e))?;
                }
                Err(e) => return Err(InstallError::filesystem("inspect", &dir, e)),
            }
        }
        Ok(Some(dir))
    }

    /// Creates one directory entry. Returns `Ok(false)` when the entry was
    /// skipped by the containment guard.
    fn create_dir(&self, entry: &Path) -> Result<bool, InstallError> {
        let Some(relative) = Self::relative_path(entry) else {
            tracing::warn!("Skipping directory outside extraction root: {}", entry.display());
            return Ok(false);
        };
        if relative.as_os_str().is_empty() {
            return Ok(true);
        }
        if self.ensure_dir(&relative)?.is_none() {
            tracing::warn!(
                "Skipping directory resolving outside extraction root: {}",
                entry.display()
            );
            return Ok(false);
        }
        Ok(true)
    }

    /// Writes one regular-file entry. Returns `Ok(false)` when the entry was
    /// skipped by the containment guard.
    fn write_file<R: Read>(
        &mut self,
        entry: &Path,
        mode: Option<u32>,
        contents: &mut R,
        archive_path: &Path,
    ) -> Result<bool, InstallError> {
        let Some(relative) = Self::relative_path(entry) else {
            tracing::warn!("Skipping file outside extraction root: {}", entry.display());
            return Ok(false);
        };
        let Some(file_name) = relative.file_name() else {
            tracing::debug!("Skipping file entry naming the extraction root: {}", entry.display());
            return Ok(false);
        };
        let parent = relative.parent().unwrap_or(Path::new(""));
        let Some(dir) = self.ensure_dir(parent)? else {
            tracing::warn!("Skipping file resolving outside extraction root: {}", entry.display());
            return Ok(false);
        };
        let dest = dir.join(file_name);

        let mut file = fs::File::create(&dest)
            .map_err(|e| InstallError::filesystem("create file", &dest, e))?;
        io::copy(contents, &mut file).map_err(|source| InstallError::Extraction {
            archive: archive_path.to_path_buf(),
            source,
        })?;
        drop(file);

        if let Some(mode) = mode {
            set_mode(&dest, mode)?;
        }

        if self.is_binary(entry) {
            tracing::debug!("Entry {} matches {}", entry.display(), self.binary_name);
            self.binary = Some(dest);
        }
        Ok(true)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| InstallError::filesystem("set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), InstallError> {
    Ok(())
}

fn extract_tar_gz(
    archive_path: &Path,
    extraction: &mut Extraction<'_>,
) -> Result<(), InstallError> {
    let read_error = |source: io::Error| InstallError::Extraction {
        archive: archive_path.to_path_buf(),
        source,
    };

    let file = fs::File::open(archive_path).map_err(read_error)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive.entries().map_err(read_error)? {
        let mut entry = entry.map_err(read_error)?;
        let path = entry.path().map_err(read_error)?.into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            extraction.create_dir(&path)?;
        } else if entry_type.is_file() {
            let mode = entry.header().mode().ok();
            extraction.write_file(&path, mode, &mut entry, archive_path)?;
        } else {
            tracing::debug!("Skipping {:?} entry {}", entry_type, path.display());
        }
    }

    Ok(())
}

/// File type bits of a Unix mode, and the value marking a symlink.
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

fn extract_zip(archive_path: &Path, extraction: &mut Extraction<'_>) -> Result<(), InstallError> {
    let read_error = |source: io::Error| InstallError::Extraction {
        archive: archive_path.to_path_buf(),
        source,
    };

    let file = fs::File::open(archive_path).map_err(read_error)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| read_error(e.into()))?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i).map_err(|e| read_error(e.into()))?;
        let path = PathBuf::from(file.name());
        let mode = file.unix_mode();

        if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
            tracing::debug!("Skipping Symlink entry {}", path.display());
        } else if file.is_dir() {
            extraction.create_dir(&path)?;
        } else {
            extraction.write_file(&path, mode, &mut file, archive_path)?;
        }
    }

    Ok(())
}
