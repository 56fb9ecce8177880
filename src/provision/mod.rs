mod inspect;
mod partition;
mod plan;
mod progress;
mod validate;
mod volumes;


use std::time::Instant;

use tracing::info;

use crate::constants::{EFI_PARTITION, ROOT_PARTITION};
use crate::entity::action::Action;
use crate::entity::disk::DataPartitionDecision;
use crate::entity::report::{Preview, Report};
use crate::entity::secret::Passphrase;
use crate::errors::ProvError;
use crate::host::Host;
use crate::linux::sgdisk;

pub use self::inspect::inspect;
pub use self::plan::plan;
pub(crate) use self::partition::{reread, wait_for_node};
pub(crate) use self::progress::Progress;

/// Runs the whole pipeline against `config.disk`:
/// inspect, release leftovers, decide, plan, partition, encrypt, format, mount.
///
/// An empty passphrase is refused before the disk is touched.
/// Nothing destructive happens before the data partition decision is made
/// and any preserved volume has been validated and closed again.
/// With `dry_run`, the run stops after planning and reports the planned ops.
pub fn provision(
    host: &dyn Host,
    config: &crate::manifest::Config,
    passphrase: Passphrase,
    dry_run: bool,
) -> Result<Report, ProvError> {
    let start = Instant::now();
    let mut progress = Progress::default();

    if passphrase.is_empty() {
        return Err(ProvError::EmptyPassphrase);
    }

    info!(disk = %config.disk, dry_run, "inspecting disk");
    let disk = inspect(host, &config.disk)?;
    progress.push(Action::InspectDisk {
        device: disk.path.clone(),
        partitions: disk.partitions.len(),
    });

    if !dry_run {
        volumes::release_stale(host, config, &mut progress)?;
    }

    info!("validating data partition");
    let decision = validate::decide(host, &disk, config, &passphrase)?;
    progress.push(Action::DecideDataPartition(decision.clone()));

    let ops = plan(&disk, &config.plan, &decision)?;

    if dry_run {
        for op in &ops {
            for cmd in sgdisk::op_cmds(&disk.path, op) {
                info!(cmd = %cmd, "dry-run: would run");
            }
        }

        return Ok(Report {
            actions: progress.into_performed(),
            duration: start.elapsed(),
            dry_run,
            decision: Some(decision),
            planned: ops,
            mounts: None,
            handoff: None,
        });
    }

    info!(decision = ?decision, ops = ops.len(), "writing partition table");
    let expected = [EFI_PARTITION, ROOT_PARTITION, config.plan.data_partition];
    partition::apply_ops(host, &disk, &ops, &expected, config.wait, &mut progress)?;

    info!("setting up encrypted volumes");
    volumes::open_volumes(host, &disk, config, &decision, &passphrase, &mut progress)?;

    drop(passphrase);
    progress.push(Action::ReleasePassphrase);

    info!("creating filesystems");
    let handoff = volumes::create_filesystems(host, &disk, config, &decision, &mut progress)?;

    info!(mountpoint = %config.mountpoint, "mounting filesystems");
    let mounts = volumes::mount_layout(host, &disk, config, &mut progress)?;

    Ok(Report {
        actions: progress.into_performed(),
        duration: start.elapsed(),
        dry_run,
        decision: Some(decision),
        planned: ops,
        mounts: Some(mounts),
        handoff: Some(handoff),
    })
}

/// Read-only look at what `provision` would do to `config.disk`.
/// The preserve plan assumes the existing data partition would pass validation.
pub fn preview(host: &dyn Host, config: &crate::manifest::Config) -> Result<Preview, ProvError> {
    let disk = inspect(host, &config.disk)?;

    let create = plan(&disk, &config.plan, &DataPartitionDecision::Create)?;
    let preserve = match disk.partition(config.plan.data_partition) {
        Some(data) => {
            let decision = DataPartitionDecision::Preserve {
                number: data.number,
                start: data.start,
            };

            Some(plan(&disk, &config.plan, &decision))
        }
        None => None,
    };

    Ok(Preview {
        disk,
        create,
        preserve: preserve.transpose()?,
    })
}
