#![forbid(unsafe_code)]

pub mod backup;
pub mod config;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod materialize;
pub mod ops;
pub mod resolve;

// Re-exports: stable API surface
pub use backup::{BackupInfo, ManifestSource, list_backups};
pub use config::Config;
pub use domain::{DomainInfo, FileRow, PathMapping, hashed_path, split_domain};
pub use error::{IbxError, Result};
pub use manifest::ManifestStore;
pub use materialize::{CopyFailure, DumpOptions, MaterializeReport, materialize};
pub use ops::{DumpSummary, Selection, domain_info, dump_files, list_domains};
pub use resolve::{resolve, resolve_all, resolve_domain};
