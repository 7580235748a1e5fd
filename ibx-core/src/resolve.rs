use tracing::debug;

use crate::domain::{DomainInfo, FileRow, PathMapping, hashed_path};
use crate::error::Result;
use crate::manifest::ManifestStore;

/// Build the hashed-path mapping for one domain from its manifest rows.
///
/// Two ids deriving the same key is a data anomaly; the later row wins.
pub fn resolve(full_name: &str, rows: impl IntoIterator<Item = FileRow>) -> DomainInfo {
    let mut mapping = PathMapping::new();
    for row in rows {
        let key = hashed_path(&row.file_id);
        if let Some(prev) = mapping.insert(key, row.relative_path) {
            debug!(domain = full_name, file_id = %row.file_id, replaced = %prev, "duplicate hashed path");
        }
    }
    DomainInfo::new(full_name, mapping)
}

pub fn resolve_domain(store: &ManifestStore, full_name: &str) -> Result<DomainInfo> {
    let rows = store.list_files(full_name)?;
    Ok(resolve(full_name, rows))
}

/// One `DomainInfo` per distinct domain in the manifest.
pub fn resolve_all(store: &ManifestStore) -> Result<Vec<DomainInfo>> {
    let mut domains = store.list_domains()?;
    domains.sort();
    domains
        .iter()
        .map(|d| resolve_domain(store, d))
        .collect()
}
