pub mod handlers;

use std::process::ExitCode;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use ibx_core::config::Config;
use ibx_core::error::Result;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut cfg = Config::from_env()?;
    if let Some(root) = cli.backup_root {
        cfg.backup_root = root;
    }

    match cli.command {
        Commands::ListBackups => handlers::handle_list_backups(&cfg),
        Commands::ListDomains {
            backup,
            types,
            all_types,
        } => handlers::handle_list_domains(&cfg, &backup, types, all_types),
        Commands::DomainInfo { backup, domain } => {
            handlers::handle_domain_info(&cfg, &backup, &domain)
        }
        Commands::DumpFiles {
            backup,
            domain,
            dest,
            jobs,
        } => {
            if jobs.is_some() {
                cfg.jobs = jobs;
            }
            handlers::handle_dump_files(&cfg, &backup, &domain, &dest)
        }
    }
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "ibx_core=debug,ibxdev=debug"
    } else {
        "ibx_core=info,ibxdev=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
