use clap::{Parser, Subcommand};

use crate::constants::defaults;
use crate::errors::ProvError;

#[derive(Debug, Parser)]
#[clap(
    version,
    about = "Idempotent LUKS2/btrfs disk provisioner with preserved data partition"
)]
pub struct Cli {
    #[command(subcommand)]
    pub commands: Commands,

    /// Manifest file
    #[arg(
        global = true,
        short = 'f',
        long = "file",
        value_parser = validate_filename,
        default_value_t = String::from(defaults::MANIFEST)
    )]
    pub manifest: String,

    /// Dry-run, cryptprov-rs will not write to disks,
    /// and will just log commands to be performed.
    /// Read-only probes still run.
    #[arg(global = true, short = 'n', long = "dry-run", default_value_t = false)]
    pub dry_run: bool,

    /// Target disk, overrides the manifest
    #[arg(global = true, short = 'd', long = "disk")]
    pub disk: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Partition, encrypt, format and mount the target disk
    Apply,

    /// Show the current partition table and the planned writes
    Plan,

    /// Create an encrypted zfs pool on a disk,
    /// asking which one unless --disk is given
    Zfs,

    /// List candidate disks under /dev/disk/by-id
    Disks,
}

fn validate_filename(name: &str) -> Result<String, ProvError> {
    if name.is_empty() {
        return Err(ProvError::BadArgs(String::from("empty filename")));
    }

    Ok(name.to_string())
}
