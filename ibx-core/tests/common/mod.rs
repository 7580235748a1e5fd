#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ibx_core::{BackupInfo, Config};
use plist::{Dictionary, Value};
use rusqlite::{Connection, params};
use tempfile::TempDir;
use walkdir::WalkDir;

/// A synthetic backup laid out like the vendor format:
/// `<base>/<name>/{Status.plist, Manifest.db, xx/xxID...}`.
pub struct FakeBackup {
    pub base: TempDir,
    pub name: String,
}

impl FakeBackup {
    pub fn new(name: &str) -> Self {
        let base = TempDir::new().expect("Failed to create temp dir");
        let root = base.path().join(name);
        fs::create_dir_all(&root).unwrap();

        let conn = Connection::open(root.join("Manifest.db")).unwrap();
        conn.execute(
            "CREATE TABLE Files (fileID TEXT PRIMARY KEY, domain TEXT, relativePath TEXT, flags INTEGER, file BLOB)",
            [],
        )
        .unwrap();

        let mut status = Dictionary::new();
        status.insert("BackupState".into(), Value::from("new"));
        status.insert("IsFullBackup".into(), Value::Boolean(false));
        Value::Dictionary(status)
            .to_file_xml(root.join("Status.plist"))
            .unwrap();

        Self {
            base,
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> PathBuf {
        self.base.path().join(&self.name)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root().join("Manifest.db")
    }

    pub fn info(&self) -> BackupInfo {
        BackupInfo::locate(self.base.path(), &self.name)
    }

    /// Record a manifest row; with `bytes` also store the content at its hashed path.
    pub fn add(&self, file_id: &str, domain: &str, rel: &str, bytes: Option<&[u8]>) {
        let conn = Connection::open(self.manifest()).unwrap();
        conn.execute(
            "INSERT INTO Files (fileID, domain, relativePath, flags) VALUES (?1, ?2, ?3, ?4)",
            params![file_id, domain, rel, if bytes.is_some() { 1 } else { 2 }],
        )
        .unwrap();
        if let Some(bytes) = bytes {
            let dir = self.root().join(&file_id[..2]);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join(file_id), bytes).unwrap();
        }
    }
}

/// Config that keeps manifest copies inside `scratch` so leaks are observable.
pub fn config_in(scratch: &Path) -> Config {
    Config {
        backup_root: PathBuf::from("/nonexistent"),
        temp_dir: Some(scratch.to_path_buf()),
        jobs: None,
    }
}

/// A 40-char hex id starting with `prefix`.
pub fn file_id(prefix: &str, fill: char) -> String {
    let mut id = prefix.to_string();
    while id.len() < 40 {
        id.push(fill);
    }
    id
}

/// Relative paths of everything under `root`, sorted, directories suffixed with `/`.
pub fn tree(root: &Path) -> Vec<String> {
    let mut out: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            if e.file_type().is_dir() { format!("{rel}/") } else { rel }
        })
        .collect();
    out.sort();
    out
}

pub fn is_empty_dir(p: &Path) -> bool {
    fs::read_dir(p).map(|mut d| d.next().is_none()).unwrap_or(false)
}
