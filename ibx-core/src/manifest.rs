use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::domain::FileRow;
use crate::error::{IbxError, Result};

/// Columns every manifest `Files` table must expose.
const REQUIRED_COLUMNS: [&str; 3] = ["fileID", "domain", "relativePath"];

/// Read-only view over a private copy of a backup's `Manifest.db`.
///
/// The caller's manifest is copied into a temporary file and only the copy
/// is opened, so the backup itself is never locked or written. The copy is
/// removed by [`ManifestStore::close`] or, failing that, on drop.
pub struct ManifestStore {
    source: PathBuf,
    conn: Option<Connection>,
    copy: Option<NamedTempFile>,
}

impl ManifestStore {
    pub fn open(manifest: &Path, temp_dir: Option<&Path>) -> Result<Self> {
        let copy = copy_to_temp(manifest, temp_dir)
            .map_err(|e| IbxError::store(manifest, format!("copy failed: {e}")))?;
        debug!(source = %manifest.display(), copy = %copy.path().display(), "manifest copied");

        let conn = Connection::open_with_flags(
            copy.path(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| IbxError::store(manifest, e))?;

        let store = Self {
            source: manifest.to_path_buf(),
            conn: Some(conn),
            copy: Some(copy),
        };
        // on error `store` drops here and takes the copy with it
        store.check_schema()?;
        Ok(store)
    }

    /// Path of the original manifest this store was copied from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Path of the private copy, while it still exists.
    pub fn copy_path(&self) -> Option<&Path> {
        self.copy.as_ref().map(|c| c.path())
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| IbxError::store(&self.source, "store already closed"))
    }

    fn check_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("PRAGMA table_info(Files)")
            .map_err(|e| IbxError::store(&self.source, e))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| IbxError::store(&self.source, e))?;

        if columns.is_empty() {
            return Err(IbxError::store(&self.source, "no Files table"));
        }
        for required in REQUIRED_COLUMNS {
            if !columns.iter().any(|c| c.eq_ignore_ascii_case(required)) {
                return Err(IbxError::store(
                    &self.source,
                    format!("Files table lacks column {required}"),
                ));
            }
        }
        Ok(())
    }

    /// Every distinct full domain name, in no particular order.
    pub fn list_domains(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT domain FROM Files")
            .map_err(|e| IbxError::store(&self.source, e))?;
        let domains = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| IbxError::store(&self.source, e))?;
        Ok(domains)
    }

    /// Distinct `(fileID, relativePath)` rows for one domain. Unknown domains yield no rows.
    pub fn list_files(&self, domain: &str) -> Result<Vec<FileRow>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT fileID, relativePath FROM Files WHERE domain = ?1")
            .map_err(|e| IbxError::store(&self.source, e))?;
        let rows = stmt
            .query_map([domain], |row| {
                Ok(FileRow {
                    file_id: row.get(0)?,
                    relative_path: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
            .map_err(|e| IbxError::store(&self.source, e))?;
        debug!(domain, rows = rows.len(), "manifest rows");
        Ok(rows)
    }

    pub fn contains_domain(&self, domain: &str) -> Result<bool> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM Files WHERE domain = ?1)",
            [domain],
            |row| row.get::<_, bool>(0),
        )
        .map_err(|e| IbxError::store(&self.source, e))
    }

    /// Close the connection and delete the private copy.
    ///
    /// Cleanup problems are logged and never returned.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, e)) = conn.close() {
                warn!(manifest = %self.source.display(), "closing manifest copy failed: {e}");
            }
        }
        if let Some(copy) = self.copy.take() {
            let path = copy.path().to_path_buf();
            match copy.close() {
                Ok(()) => debug!(copy = %path.display(), "manifest copy removed"),
                Err(e) => warn!(copy = %path.display(), "removing manifest copy failed: {e}"),
            }
        }
    }
}

impl Drop for ManifestStore {
    fn drop(&mut self) {
        self.release();
    }
}

fn copy_to_temp(src: &Path, temp_dir: Option<&Path>) -> std::io::Result<NamedTempFile> {
    let mut input = File::open(src)?;
    let mut builder = tempfile::Builder::new();
    builder.prefix("ibx-manifest-").suffix(".db");
    let mut tmp = match temp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    std::io::copy(&mut input, tmp.as_file_mut())?;
    tmp.as_file_mut().flush()?;
    Ok(tmp)
}
