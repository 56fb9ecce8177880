use tracing::info;

use crate::entity::report::ZfsReport;
use crate::errors::ProvError;
use crate::host::Host;
use crate::manifest::Manifest;
use crate::{prompt, zfs};

pub(super) fn run(
    host: &dyn Host,
    manifest: &Manifest,
    disk: Option<String>,
    dry_run: bool,
) -> Result<ZfsReport, ProvError> {
    let config = manifest.zfs_config()?;

    let disk = match disk {
        Some(disk) => disk,
        None => prompt::select_disk(zfs::candidates(host)?)?.path,
    };

    info!(disk = %disk, pool = %config.pool, dry_run, "provisioning zfs pool");

    zfs::provision_pool(host, &disk, &config, dry_run)
}
