use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{IbxError, Result};

pub const ENV_BACKUP_ROOT: &str = "IBX_BACKUP_ROOT";
pub const ENV_TEMP_DIR: &str = "IBX_TEMP_DIR";
pub const ENV_JOBS: &str = "IBX_JOBS";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory per backup.
    pub backup_root: PathBuf,
    /// Where the private manifest copy is made; system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Copy workers for dumps.
    pub jobs: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            temp_dir: None,
            jobs: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Layer overrides from `lookup` (an environment) over the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(root) = lookup(ENV_BACKUP_ROOT).filter(|v| !v.is_empty()) {
            cfg.backup_root = PathBuf::from(root);
        }
        if let Some(dir) = lookup(ENV_TEMP_DIR).filter(|v| !v.is_empty()) {
            cfg.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(jobs) = lookup(ENV_JOBS).filter(|v| !v.is_empty()) {
            cfg.jobs = Some(parse_jobs(&jobs)?);
        }
        Ok(cfg)
    }
}

pub fn parse_jobs(s: &str) -> Result<usize> {
    match s.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(IbxError::Config(format!(
            "jobs must be a positive integer, got {s:?}"
        ))),
    }
}

/// `~/Library/Application Support/MobileSync/Backup`
pub fn default_backup_root() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join("Library")
        .join("Application Support")
        .join("MobileSync")
        .join("Backup")
}
