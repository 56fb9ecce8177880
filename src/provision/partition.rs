use tracing::{debug, info};

use super::progress::Progress;
use crate::entity::action::Action;
use crate::entity::disk::{Disk, PartitionOp};
use crate::errors::ProvError;
use crate::host::Host;
use crate::linux::{self, blockdev, sgdisk};
use crate::manifest::PartitionWait;

/// Writes `ops` to the partition table of `disk` in order, asks the kernel
/// to re-read the table, then waits for every partition in `expected`.
pub(super) fn apply_ops(
    host: &dyn Host,
    disk: &Disk,
    ops: &[PartitionOp],
    expected: &[u32],
    wait: PartitionWait,
    progress: &mut Progress,
) -> Result<(), ProvError> {
    for op in ops {
        let action = op_action(&disk.path, op);

        progress.run(action, || {
            for cmd in sgdisk::op_cmds(&disk.path, op) {
                host.exec(&cmd)?;
            }

            Ok(())
        })?;
    }

    reread(host, &disk.path, progress)?;

    for number in expected {
        let path = linux::partition_name(&disk.path, *number);
        progress.run(Action::WaitPartition(path.clone()), || {
            wait_for_node(host, &path, wait)
        })?;
    }

    Ok(())
}

pub(crate) fn reread(host: &dyn Host, device: &str, progress: &mut Progress) -> Result<(), ProvError> {
    progress.run(
        Action::RereadPartitionTable {
            device: device.to_string(),
        },
        || host.exec(&blockdev::reread_cmd(device)).map(|_| ()),
    )
}

/// Polls for `path` until it exists, sleeping `wait.interval` between
/// checks, at most `wait.retries` times.
pub(crate) fn wait_for_node(host: &dyn Host, path: &str, wait: PartitionWait) -> Result<(), ProvError> {
    for attempt in 1..=wait.retries {
        if host.exists(path) {
            debug!(partition = path, attempt, "partition node ready");
            return Ok(());
        }

        host.sleep(wait.interval);
    }

    if host.exists(path) {
        return Ok(());
    }

    Err(ProvError::PartitionNotReady {
        path: path.to_string(),
        attempts: wait.retries,
    })
}

fn op_action(device: &str, op: &PartitionOp) -> Action {
    let device = device.to_string();

    match op {
        PartitionOp::WipeTable => {
            info!(disk = %device, "wiping partition table");
            Action::WipePartitionTable { device }
        }

        PartitionOp::Delete { number } => {
            info!(disk = %device, number, "deleting partition");
            Action::DeletePartition {
                device,
                number: *number,
            }
        }

        PartitionOp::Create {
            number, start, end, ..
        } => {
            info!(disk = %device, number, start, end = ?end, "creating partition");
            Action::CreatePartition {
                device,
                number: *number,
                start: *start,
                end: end.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_wait_for_node() {
        let wait = PartitionWait {
            retries: 4,
            interval: Duration::from_millis(10),
        };

        let host = FakeHost::new().with_path("/dev/sda9");
        wait_for_node(&host, "/dev/sda9", wait).expect("present node should be ready");
        assert_eq!(0, host.sleeps());

        let host = FakeHost::new();
        let err = wait_for_node(&host, "/dev/sda9", wait).unwrap_err();

        assert!(matches!(
            err,
            ProvError::PartitionNotReady { ref path, attempts: 4 } if path == "/dev/sda9"
        ));
        assert_eq!(4, host.sleeps());
    }
}
