// ibx_core/src/backup.rs
use std::fs;
use std::path::{Path, PathBuf};

use plist::Value;
use tracing::debug;

use crate::error::Result;

pub const STATUS_FILE: &str = "Status.plist";
pub const MANIFEST_FILE: &str = "Manifest.db";

/// One backup directory under the backup root.
#[derive(Clone, Debug)]
pub struct BackupInfo {
    pub name: String,
    pub status: Value,
    pub root: PathBuf,
    pub manifest_path: PathBuf,
}

impl BackupInfo {
    fn new(name: String, status: Value, root: PathBuf) -> Self {
        let manifest_path = root.join(MANIFEST_FILE);
        Self {
            name,
            status,
            root,
            manifest_path,
        }
    }

    /// Resolve a backup by name (or absolute path) without reading its status.
    pub fn locate(base: &Path, name: impl AsRef<Path>) -> Self {
        let root = base.join(name.as_ref());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.to_string_lossy().into_owned());
        Self::new(name, Value::Dictionary(plist::Dictionary::new()), root)
    }
}

/// Every child of `base` holding a `Status.plist`, sorted by name.
///
/// A missing or non-directory `base` yields no backups.
pub fn list_backups(base: &Path) -> Result<Vec<BackupInfo>> {
    if !base.is_dir() {
        debug!(base = %base.display(), "backup root is not a directory");
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let root = entry.path();
        let status_path = root.join(STATUS_FILE);
        if !status_path.exists() {
            continue;
        }
        let status = Value::from_file(&status_path)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        out.push(BackupInfo::new(name, status, root));
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// Where a read-only command finds its manifest.
#[derive(Clone, Debug)]
pub enum ManifestSource {
    /// A bare manifest file given directly.
    File(PathBuf),
    Backup(BackupInfo),
}

impl ManifestSource {
    /// An existing regular file is taken as the manifest itself; anything else names a backup.
    pub fn resolve(base: &Path, arg: &str) -> Self {
        let p = Path::new(arg);
        if p.is_file() {
            ManifestSource::File(p.to_path_buf())
        } else {
            ManifestSource::Backup(BackupInfo::locate(base, p))
        }
    }

    pub fn manifest_path(&self) -> &Path {
        match self {
            ManifestSource::File(p) => p,
            ManifestSource::Backup(b) => &b.manifest_path,
        }
    }
}
