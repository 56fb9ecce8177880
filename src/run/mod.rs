mod apply;
mod disks;
mod plan;
mod zfs;

use std::env;
use std::io::ErrorKind;

use colored::Colorize;
use tracing::info;

use crate::cli;
use crate::constants::{self, REQUIRED_COMMANDS, REQUIRED_COMMANDS_ZFS};
use crate::errors::ProvError;
use crate::host::SystemHost;
use crate::linux;
use crate::manifest::Manifest;
use crate::sanity;

pub fn run(cli_args: cli::Cli) -> Result<(), ProvError> {
    let host = SystemHost;

    match cli_args.commands {
        cli::Commands::Apply => {
            warn_non_root();
            sanity::check_commands(&REQUIRED_COMMANDS)?;

            let manifest = load_manifest(&cli_args.manifest, cli_args.disk.as_deref())?;
            let report = apply::run(&host, &manifest, cli_args.dry_run)?;

            println!("{}", report.to_json_string());
        }

        cli::Commands::Plan => {
            sanity::check_commands(&["sfdisk", "blockdev"])?;

            let manifest = load_manifest(&cli_args.manifest, cli_args.disk.as_deref())?;
            let preview = plan::run(&host, &manifest)?;

            println!("{}", preview.to_json());
        }

        cli::Commands::Zfs => {
            warn_non_root();
            sanity::check_commands(&REQUIRED_COMMANDS_ZFS)?;

            let manifest = load_manifest_or_default(&cli_args.manifest)?;
            let report = zfs::run(&host, &manifest, cli_args.disk, cli_args.dry_run)?;

            println!("{}", report.to_json_string());
        }

        cli::Commands::Disks => disks::run(&host)?,
    }

    Ok(())
}

fn warn_non_root() {
    if !linux::user::is_root() {
        println!("{}", "WARN: running as non-root user".yellow())
    }
}

// Root mountpoint override from the environment
fn install_location() -> Option<String> {
    env::var(constants::ENV_CRYPTPROV_LOC).ok()
}

fn read_manifest(manifest_file: &str) -> Result<Option<Manifest>, ProvError> {
    match std::fs::read_to_string(manifest_file) {
        Ok(yaml) => Manifest::from_yaml(&yaml).map(Some),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(ProvError::FileError(
            err,
            format!("failed to read manifest {manifest_file}"),
        )),
    }
}

/// Reads the manifest, with `disk` taking precedence over its target disk.
/// A missing manifest file is fine as long as `disk` is given.
fn load_manifest(manifest_file: &str, disk: Option<&str>) -> Result<Manifest, ProvError> {
    let mut manifest = match (read_manifest(manifest_file)?, disk) {
        (Some(manifest), _) => manifest,
        (None, Some(_)) => {
            info!(manifest_file, "manifest not found, using defaults");
            Manifest::default()
        }
        (None, None) => {
            return Err(ProvError::BadArgs(format!(
                "manifest {manifest_file} not found and no --disk given"
            )))
        }
    };

    if let Some(disk) = disk {
        manifest.disk = Some(disk.to_string());
    }

    Ok(manifest)
}

fn load_manifest_or_default(manifest_file: &str) -> Result<Manifest, ProvError> {
    Ok(read_manifest(manifest_file)?.unwrap_or_default())
}
