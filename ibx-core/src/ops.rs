use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::backup::BackupInfo;
use crate::config::Config;
use crate::domain::DomainInfo;
use crate::error::Result;
use crate::manifest::ManifestStore;
use crate::materialize::{DumpOptions, MaterializeReport, materialize};
use crate::resolve::{resolve_all, resolve_domain};

/// Which domains an operation covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Domain(String),
}

impl Selection {
    /// `"all"` selects every domain, anything else is a full domain name.
    pub fn parse(arg: &str) -> Self {
        if arg == "all" {
            Selection::All
        } else {
            Selection::Domain(arg.to_string())
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct DumpSummary {
    pub domains: Vec<MaterializeReport>,
}

impl DumpSummary {
    pub fn files_copied(&self) -> usize {
        self.domains.iter().map(|d| d.files_copied).sum()
    }

    pub fn directories_created(&self) -> usize {
        self.domains.iter().map(|d| d.directories_created).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.domains.iter().map(|d| d.failures.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.domains.iter().all(MaterializeReport::is_clean)
    }
}

/// Sorted distinct domains of a manifest.
pub fn list_domains(manifest: &Path, cfg: &Config) -> Result<Vec<String>> {
    let store = ManifestStore::open(manifest, cfg.temp_dir.as_deref())?;
    let res = store.list_domains();
    store.close();
    let mut domains = res?;
    domains.sort();
    Ok(domains)
}

pub fn domain_info(manifest: &Path, sel: &Selection, cfg: &Config) -> Result<Vec<DomainInfo>> {
    let store = ManifestStore::open(manifest, cfg.temp_dir.as_deref())?;
    let res = select(&store, sel);
    store.close();
    res
}

/// Copy the selected domains of `backup` out under `dest`.
///
/// The manifest copy is released before any file is written.
pub fn dump_files(
    backup: &BackupInfo,
    sel: &Selection,
    dest: &Path,
    cfg: &Config,
) -> Result<DumpSummary> {
    let store = ManifestStore::open(&backup.manifest_path, cfg.temp_dir.as_deref())?;
    let res = select(&store, sel);
    store.close();
    let domains = res?;

    // one worker pool for the whole dump
    let opts = DumpOptions::with_jobs(cfg.jobs)?;
    let mut summary = DumpSummary::default();
    for d in &domains {
        summary.domains.push(materialize(d, &backup.root, dest, &opts)?);
    }
    info!(
        backup = %backup.name,
        domains = summary.domains.len(),
        files = summary.files_copied(),
        failed = summary.failure_count(),
        "dump finished"
    );
    Ok(summary)
}

fn select(store: &ManifestStore, sel: &Selection) -> Result<Vec<DomainInfo>> {
    match sel {
        Selection::All => resolve_all(store),
        Selection::Domain(name) => {
            if !store.contains_domain(name)? {
                warn!(domain = %name, manifest = %store.source().display(), "domain not in manifest");
            }
            Ok(vec![resolve_domain(store, name)?])
        }
    }
}
