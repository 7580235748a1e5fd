use crate::domain::DomainInfo;
use crate::error::{IbxError, Result};

use rayon::ThreadPool;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Copy workers shared by every domain of a dump.
#[derive(Clone, Default)]
pub struct DumpOptions {
    /// Dedicated pool; rayon's global pool when `None`.
    pool: Option<Arc<ThreadPool>>,
}

impl DumpOptions {
    /// `Some(n)` builds one pool of `n` threads (`1` copies sequentially).
    pub fn with_jobs(jobs: Option<usize>) -> Result<Self> {
        let pool = match jobs {
            Some(n) => Some(Arc::new(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n.max(1))
                    .build()?,
            )),
            None => None,
        };
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        match &self.pool {
            Some(p) => p.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(p) => p.install(op),
            None => op(),
        }
    }
}

/// One entry that could not be written.
#[derive(Debug, Serialize)]
pub struct CopyFailure {
    pub relative_path: String,
    pub destination: PathBuf,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct MaterializeReport {
    pub full_name: String,
    pub files_copied: usize,
    pub directories_created: usize,
    pub failures: Vec<CopyFailure>,
}

impl MaterializeReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Written {
    File,
    Dir,
}

/// Rebuild `<dest>/<type>/<name>/<relativePath>` for every entry of `info`.
///
/// A hashed path with no file behind it marks a directory. Per-entry errors
/// are collected in the report; only an uncreatable `dest` aborts.
pub fn materialize(
    info: &DomainInfo,
    backup_root: &Path,
    dest: &Path,
    opts: &DumpOptions,
) -> Result<MaterializeReport> {
    fs::create_dir_all(dest).map_err(|source| IbxError::DestinationUnwritable {
        path: dest.to_path_buf(),
        source,
    })?;
    let domain_root = dest.join(&info.domain_type).join(&info.domain_name);

    let run = || -> Vec<(String, PathBuf, std::io::Result<Written>)> {
        info.path_mapping
            .par_iter()
            .map(|(internal, rel)| {
                let outp = safe_join(&domain_root, rel);
                let res = match &outp {
                    Ok(p) => write_entry(&backup_root.join(internal), p),
                    Err(e) => Err(std::io::Error::new(e.kind(), e.to_string())),
                };
                (rel.clone(), outp.unwrap_or_else(|_| domain_root.clone()), res)
            })
            .collect()
    };

    let results = opts.install(run);

    let mut report = MaterializeReport {
        full_name: info.full_name.clone(),
        ..Default::default()
    };
    for (rel, outp, res) in results {
        match res {
            Ok(Written::File) => report.files_copied += 1,
            Ok(Written::Dir) => report.directories_created += 1,
            Err(e) => {
                warn!(domain = %info.full_name, path = %rel, "copy failed: {e}");
                report.failures.push(CopyFailure {
                    relative_path: rel,
                    destination: outp,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        domain = %info.full_name,
        files = report.files_copied,
        dirs = report.directories_created,
        failed = report.failures.len(),
        "domain materialized"
    );
    Ok(report)
}

fn write_entry(src: &Path, outp: &Path) -> std::io::Result<Written> {
    debug!(src = %src.display(), dst = %outp.display(), "materialize");
    // stat errors (EACCES) must fail the entry, not read as a directory marker
    if !src.try_exists()? {
        fs::create_dir_all(outp)?;
        return Ok(Written::Dir);
    }
    let mut input = File::open(src)?;
    if !input.metadata()?.is_file() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("not a regular file: {}", src.display()),
        ));
    }
    if let Some(parent) = outp.parent() {
        fs::create_dir_all(parent)?;
    }
    // content only; the source's mode bits are not carried over
    let mut out = File::create(outp)?;
    std::io::copy(&mut input, &mut out)?;
    Ok(Written::File)
}

fn safe_join(root: &Path, rel: &str) -> std::io::Result<PathBuf> {
    let p = Path::new(rel);
    let escapes = p
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("unsafe path: {rel}"),
        ));
    }
    Ok(root.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PathMapping;
    use tempfile::TempDir;

    fn info(full: &str, entries: &[(&str, &str)]) -> DomainInfo {
        let mapping: PathMapping = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DomainInfo::new(full, mapping)
    }

    #[test]
    fn safe_join_rejects_escapes() {
        let root = Path::new("/dst");
        assert!(safe_join(root, "../etc/passwd").is_err());
        assert!(safe_join(root, "a/../../b").is_err());
        assert!(safe_join(root, "/abs").is_err());
        assert_eq!(safe_join(root, "a/b").unwrap(), PathBuf::from("/dst/a/b"));
        assert_eq!(safe_join(root, "").unwrap(), PathBuf::from("/dst/"));
    }

    #[test]
    fn missing_source_becomes_directory() {
        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let d = info("AppDomain-com.x", &[("aa/aa00", "Library/Caches")]);

        let report = materialize(&d, backup.path(), dest.path(), &DumpOptions::default()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.directories_created, 1);
        assert!(dest.path().join("AppDomain/com.x/Library/Caches").is_dir());
    }

    #[test]
    fn copies_bytes_and_overwrites() {
        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(backup.path().join("bb")).unwrap();
        fs::write(backup.path().join("bb/bb11"), b"\x00\x01payload\xff").unwrap();
        let target = dest.path().join("HomeDomain/Library/data.bin");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"stale contents that are longer").unwrap();

        let d = info("HomeDomain", &[("bb/bb11", "Library/data.bin")]);
        let report = materialize(
            &d,
            backup.path(),
            dest.path(),
            &DumpOptions::with_jobs(Some(1)).unwrap(),
        )
        .unwrap();
        assert_eq!(report.files_copied, 1);
        assert_eq!(fs::read(&target).unwrap(), b"\x00\x01payload\xff");
    }

    #[test]
    fn failures_are_collected_not_fatal() {
        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(backup.path().join("cc")).unwrap();
        fs::write(backup.path().join("cc/cc01"), b"ok").unwrap();
        fs::write(backup.path().join("cc/cc02"), b"bad").unwrap();

        let d = info(
            "AppDomain-com.y",
            &[("cc/cc01", "Documents/ok.txt"), ("cc/cc02", "../escape.txt")],
        );
        let report = materialize(
            &d,
            backup.path(),
            dest.path(),
            &DumpOptions::with_jobs(Some(2)).unwrap(),
        )
        .unwrap();
        assert_eq!(report.files_copied, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].relative_path, "../escape.txt");
        assert!(dest.path().join("AppDomain/com.y/Documents/ok.txt").is_file());
        assert!(!dest.path().join("AppDomain/escape.txt").exists());
    }

    #[test]
    fn uncreatable_destination_is_fatal() {
        let backup = TempDir::new().unwrap();
        let scratch = TempDir::new().unwrap();
        let blocker = scratch.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let d = info("HomeDomain", &[("aa/aa00", "x")]);
        let err = materialize(
            &d,
            backup.path(),
            &blocker.join("dest"),
            &DumpOptions::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, IbxError::DestinationUnwritable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_source_can_be_dumped_twice() {
        use std::os::unix::fs::PermissionsExt;

        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(backup.path().join("ab")).unwrap();
        let src = backup.path().join("ab/ab01");
        fs::write(&src, b"locked").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o444)).unwrap();

        let d = info("HomeDomain", &[("ab/ab01", "Library/a.txt")]);
        let opts = DumpOptions::default();
        for _ in 0..2 {
            let report = materialize(&d, backup.path(), dest.path(), &opts).unwrap();
            assert!(report.is_clean(), "failures: {:?}", report.failures);
            assert_eq!(report.files_copied, 1);
        }
        let out = dest.path().join("HomeDomain/Library/a.txt");
        assert_eq!(fs::read(&out).unwrap(), b"locked");
        assert!(!fs::metadata(&out).unwrap().permissions().readonly());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_hashed_dir_is_not_a_directory_marker() {
        use std::os::unix::fs::PermissionsExt;

        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let hashed_dir = backup.path().join("ab");
        fs::create_dir_all(&hashed_dir).unwrap();
        fs::write(hashed_dir.join("ab01"), b"secret").unwrap();
        fs::set_permissions(&hashed_dir, fs::Permissions::from_mode(0o000)).unwrap();

        let d = info("HomeDomain", &[("ab/ab01", "Library/a.txt")]);
        let report = materialize(&d, backup.path(), dest.path(), &DumpOptions::default());
        fs::set_permissions(&hashed_dir, fs::Permissions::from_mode(0o755)).unwrap();
        let report = report.unwrap();

        // root bypasses the mode bits and copies; anyone else gets a recorded failure
        let out = dest.path().join("HomeDomain/Library/a.txt");
        assert_eq!(report.directories_created, 0);
        assert_eq!(report.files_copied + report.failures.len(), 1);
        assert!(!out.is_dir());
    }

    #[test]
    fn directory_at_hashed_path_fails_without_creating_output() {
        let backup = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::create_dir_all(backup.path().join("ab/ab01")).unwrap();

        let d = info("HomeDomain", &[("ab/ab01", "Library/a.txt")]);
        let report = materialize(&d, backup.path(), dest.path(), &DumpOptions::default()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(!dest.path().join("HomeDomain/Library/a.txt").exists());
    }

    #[test]
    fn pool_is_built_once_and_shared() {
        let opts = DumpOptions::with_jobs(Some(3)).unwrap();
        let copy = opts.clone();
        assert_eq!(opts.threads(), 3);
        assert!(Arc::ptr_eq(
            opts.pool.as_ref().unwrap(),
            copy.pool.as_ref().unwrap()
        ));
        assert_eq!(opts.install(rayon::current_num_threads), 3);
        assert!(DumpOptions::with_jobs(None).unwrap().pool.is_none());
    }
}
