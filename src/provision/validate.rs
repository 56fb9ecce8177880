use tracing::{debug, info, warn};

use crate::constants::{SIGNATURE_BTRFS, SIGNATURE_LUKS, VERIFY_MAPPER_SUFFIX};
use crate::entity::disk::{DataPartitionDecision, Disk};
use crate::entity::secret::Passphrase;
use crate::errors::{PreserveFailure, ProvError};
use crate::host::Host;
use crate::linux::{self, blkid, btrfs, luks, mount};
use crate::manifest::Config;

/// Decides whether the reserved data partition is preserved or created.
///
/// A present partition is kept only if it carries a LUKS signature, opens
/// with `passphrase`, holds btrfs, and has the data subvolume. The volume
/// is opened read-only under a throwaway mapper name and closed again
/// before this returns. Nothing here writes to the partition table.
pub fn decide(
    host: &dyn Host,
    disk: &Disk,
    config: &Config,
    passphrase: &Passphrase,
) -> Result<DataPartitionDecision, ProvError> {
    let number = config.plan.data_partition;

    let Some(partition) = disk.partition(number) else {
        info!(number, "data partition absent, it will be created");
        return Ok(DataPartitionDecision::Create);
    };

    let device = linux::partition_name(&disk.path, number);
    let failed = |reason: PreserveFailure| {
        warn!(partition = %device, %reason, "data partition rejected");
        ProvError::PreservedDataValidationFailed {
            partition: device.clone(),
            reason,
        }
    };

    let header = blkid::probe(host, &device)?.unwrap_or_default();
    if header.dev_type.as_deref() != Some(SIGNATURE_LUKS) {
        return Err(failed(PreserveFailure::NotEncrypted {
            found: header.dev_type,
        }));
    }

    debug!(
        partition = %device,
        uuid = ?header.uuid,
        version = ?header.version,
        "found LUKS header"
    );

    let verify_name = format!("{}{VERIFY_MAPPER_SUFFIX}", config.mapper.data);
    if luks::is_open(host, &verify_name) {
        return Err(failed(PreserveFailure::StaleMapper(verify_name)));
    }

    if let Err(stderr) = luks::try_open(host, &device, &verify_name, true, passphrase)? {
        return Err(failed(PreserveFailure::Unlock { stderr }));
    }

    let checked = check_unlocked(host, &verify_name, config);

    // Close even when a check failed. A failed close is fatal.
    let closed = luks::close(host, &verify_name);

    if let Err(reason) = checked? {
        return Err(failed(reason));
    }
    closed?;

    info!(
        partition = %device,
        start = partition.start,
        end = partition.end(),
        "data partition will be preserved"
    );

    Ok(DataPartitionDecision::Preserve {
        number,
        start: partition.start,
    })
}

// Outer error: a tool failed. Inner error: the volume is not what we expect.
fn check_unlocked(
    host: &dyn Host,
    verify_name: &str,
    config: &Config,
) -> Result<Result<(), PreserveFailure>, ProvError> {
    let mapper = luks::mapper_path(verify_name);

    let inner = blkid::probe(host, &mapper)?.unwrap_or_default();
    if inner.dev_type.as_deref() != Some(SIGNATURE_BTRFS) {
        return Ok(Err(PreserveFailure::WrongFilesystem {
            found: inner.dev_type,
        }));
    }

    debug!(mapper = %mapper, label = ?inner.label, "found btrfs inside LUKS");

    host.mkdir_p(&config.scratch)?;
    mount::mount(host, &mapper, &config.scratch, Some("ro"))?;
    let subvolumes = btrfs::list_subvolumes(host, &config.scratch);
    mount::umount(host, &config.scratch)?;

    if !subvolumes?.contains(&config.subvolumes.data) {
        return Ok(Err(PreserveFailure::MissingSubvolume(
            config.subvolumes.data.clone(),
        )));
    }

    Ok(Ok(()))
}
