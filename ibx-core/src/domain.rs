// ibx_core/src/domain.rs
use serde::Serialize;
use std::collections::BTreeMap;

/// Hashed storage path (`ab/ab12...`) -> path relative to the domain root.
pub type PathMapping = BTreeMap<String, String>;

/// One distinct `(fileID, relativePath)` row of the manifest.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileRow {
    pub file_id: String,
    pub relative_path: String,
}

impl FileRow {
    pub fn new(file_id: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// Split `AppDomain-com.example.app` into `("AppDomain", "com.example.app")`.
///
/// Only the first hyphen separates; the name keeps any further hyphens.
/// A domain without a hyphen has an empty name.
pub fn split_domain(full: &str) -> (&str, &str) {
    full.split_once('-').unwrap_or((full, ""))
}

/// Location of a file's bytes relative to the backup root: `<first two chars>/<fileID>`.
pub fn hashed_path(file_id: &str) -> String {
    let head = file_id.get(..2).unwrap_or(file_id);
    format!("{head}/{file_id}")
}

#[derive(Clone, Debug, Serialize)]
pub struct DomainInfo {
    pub full_name: String,
    pub domain_type: String,
    pub domain_name: String,
    pub path_mapping: PathMapping,
}

impl DomainInfo {
    pub fn new(full_name: &str, path_mapping: PathMapping) -> Self {
        let (domain_type, domain_name) = split_domain(full_name);
        Self {
            full_name: full_name.to_string(),
            domain_type: domain_type.to_string(),
            domain_name: domain_name.to_string(),
            path_mapping,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path_mapping.is_empty()
    }

    pub fn len(&self) -> usize {
        self.path_mapping.len()
    }
}
