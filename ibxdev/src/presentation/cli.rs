use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "ibxdev: inspect and export iOS backups", long_about = None)]
pub struct Cli {
    /// Directory holding one subdirectory per backup (default: MobileSync/Backup)
    #[arg(long, global = true)]
    pub backup_root: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List backups found under the backup root
    ListBackups,

    /// List full domain names in a backup (AppDomain only unless told otherwise)
    ListDomains {
        /// backup name, backup path, or a Manifest.db file
        backup: String,
        /// only show domains of this type (repeatable)
        #[arg(long = "type", value_name = "TYPE")]
        types: Vec<String>,
        /// show every domain type
        #[arg(long, conflicts_with = "types")]
        all_types: bool,
    },

    /// Show the hashed-path -> relative-path mapping of one domain, or `all`
    DomainInfo {
        /// backup name, backup path, or a Manifest.db file
        backup: String,
        /// full domain name (e.g. AppDomain-com.example.app) or `all`
        domain: String,
    },

    /// Copy one domain (or `all`) out of a backup into <dest>/<type>/<name>/...
    DumpFiles {
        /// backup name or path
        backup: String,
        /// full domain name or `all`
        domain: String,
        dest: PathBuf,
        /// copy worker threads
        #[arg(long, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
        jobs: Option<usize>,
    },
}
