use tracing::{info, warn};

use crate::constants::{DISK_BY_ID, GPT_BACKUP_SECTORS};
use crate::entity::disk::Disk;
use crate::errors::ProvError;
use crate::host::Host;
use crate::linux::{blockdev, sfdisk};

/// Reads the partition table of `path`. Never writes anything.
pub fn inspect(host: &dyn Host, path: &str) -> Result<Disk, ProvError> {
    if !host.is_block_device(path) {
        return Err(ProvError::DeviceNotFound(path.to_string()));
    }

    if !path.starts_with(DISK_BY_ID) {
        warn!(disk = path, "not a {DISK_BY_ID} path, kernel device names may be reordered");
    }

    let node = host.canonicalize(path)?;
    let sector_size = blockdev::sector_size(host, &node)?;
    let total_sectors = blockdev::size_bytes(host, &node)? / sector_size;
    let table = sfdisk::read_table(host, &node)?;

    // Last usable LBA sits right before the backup GPT entries and header
    let last_usable_sector = table
        .last_lba
        .unwrap_or_else(|| total_sectors.saturating_sub(GPT_BACKUP_SECTORS + 1));

    let disk = Disk {
        path: path.to_string(),
        node,
        sector_size,
        last_usable_sector,
        partitions: table.partitions,
    };

    info!(
        disk = %disk.path,
        node = %disk.node,
        sector_size,
        partitions = ?disk.partitions.iter().map(|p| p.number).collect::<Vec<_>>(),
        "inspected disk"
    );

    Ok(disk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::utils::shell::CmdOutput;

    #[test]
    fn test_inspect_blank_disk() {
        let host = FakeHost::new()
            .with_block_device("/dev/vdb")
            .respond("blockdev --getss", CmdOutput::ok("512\n"))
            .respond("blockdev --getsize64", CmdOutput::ok("10737418240\n"))
            .respond(
                "sfdisk --json",
                CmdOutput::failed(1, "sfdisk: /dev/vdb: does not contain a recognized partition table"),
            );

        let disk = inspect(&host, "/dev/vdb").expect("inspect failed");

        assert!(disk.partitions.is_empty());
        assert_eq!(20971520 - 34, disk.last_usable_sector);
        assert_eq!(512, disk.sector_size);
    }

    #[test]
    fn test_inspect_not_block_device() {
        let host = FakeHost::new().with_path("/dev/disk/by-id/ata-gone");

        let err = inspect(&host, "/dev/disk/by-id/ata-gone").unwrap_err();

        assert!(matches!(err, ProvError::DeviceNotFound(ref p) if p == "/dev/disk/by-id/ata-gone"));
        assert!(host.commands().is_empty());
    }

    #[test]
    fn test_inspect_sfdisk_error() {
        let host = FakeHost::new()
            .with_block_device("/dev/vdb")
            .respond("blockdev --getss", CmdOutput::ok("512"))
            .respond("blockdev --getsize64", CmdOutput::ok("10737418240"))
            .respond("sfdisk --json", CmdOutput::failed(1, "sfdisk: cannot open /dev/vdb: Permission denied"));

        assert!(matches!(
            inspect(&host, "/dev/vdb"),
            Err(ProvError::SubsystemCommandFailed { .. })
        ));
    }
}
