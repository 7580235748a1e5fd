use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use ibx_core::backup::{BackupInfo, ManifestSource, list_backups};
use ibx_core::config::Config;
use ibx_core::domain::split_domain;
use ibx_core::error::Result;
use ibx_core::ops::{self, Selection};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Domain types shown by `list-domains` when no filter is given.
const DEFAULT_DOMAIN_TYPES: [&str; 1] = ["AppDomain"];

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

pub fn handle_list_backups(cfg: &Config) -> Result<ExitCode> {
    debug!(root = %cfg.backup_root.display(), "listing backups");
    for b in list_backups(&cfg.backup_root)? {
        print_json(&json!({
            "backupname": b.name,
            "fullpath": b.root,
            "status": b.status,
        }))?;
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_list_domains(
    cfg: &Config,
    backup: &str,
    types: Vec<String>,
    all_types: bool,
) -> Result<ExitCode> {
    let source = ManifestSource::resolve(&cfg.backup_root, backup);
    let domains = ops::list_domains(source.manifest_path(), cfg)?;
    let wanted: Vec<String> = if types.is_empty() {
        DEFAULT_DOMAIN_TYPES.iter().map(|s| s.to_string()).collect()
    } else {
        types
    };
    let mut out = std::io::stdout().lock();
    for d in domains {
        let (domain_type, _) = split_domain(&d);
        if all_types || wanted.iter().any(|t| t == domain_type) {
            writeln!(out, "{d}")?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_domain_info(cfg: &Config, backup: &str, domain: &str) -> Result<ExitCode> {
    let source = ManifestSource::resolve(&cfg.backup_root, backup);
    let infos = ops::domain_info(source.manifest_path(), &Selection::parse(domain), cfg)?;
    for info in &infos {
        if info.is_empty() {
            eprintln!("{}: no files", info.full_name);
        }
        print_json(info)?;
    }
    Ok(ExitCode::SUCCESS)
}

pub fn handle_dump_files(cfg: &Config, backup: &str, domain: &str, dest: &Path) -> Result<ExitCode> {
    let backup = BackupInfo::locate(&cfg.backup_root, backup);
    let summary = ops::dump_files(&backup, &Selection::parse(domain), dest, cfg)?;

    for d in &summary.domains {
        if d.files_copied == 0 && d.directories_created == 0 && d.is_clean() {
            eprintln!("{}: no files", d.full_name);
            continue;
        }
        eprintln!(
            "{}: {} files, {} dirs, {} failed",
            d.full_name,
            d.files_copied,
            d.directories_created,
            d.failures.len()
        );
        for f in &d.failures {
            eprintln!("  failed: {} -> {}: {}", f.relative_path, f.destination.display(), f.error);
        }
    }
    eprintln!(
        "dump: {} domains, {} files, {} dirs -> {}",
        summary.domains.len(),
        summary.files_copied(),
        summary.directories_created(),
        dest.display()
    );

    if summary.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("dump: {} entries failed", summary.failure_count());
        Ok(ExitCode::FAILURE)
    }
}
