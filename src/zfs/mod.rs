mod candidates;

pub use self::candidates::{candidates, Candidate};

use std::path::Path;
use std::time::Instant;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::info;
use zeroize::Zeroizing;

use crate::constants::{TYPE_CODE_ZFS, ZFS_KEY_BYTES};
use crate::entity::action::Action;
use crate::entity::disk::{PartitionEnd, PartitionOp};
use crate::entity::report::ZfsReport;
use crate::errors::ProvError;
use crate::host::Host;
use crate::linux::{self, sgdisk, zpool};
use crate::manifest::ZfsConfig;
use crate::provision::{self, Progress};

/// Creates an encrypted pool on partition `config.partition` of `disk`.
///
/// Each step is skipped when its result already exists: an existing
/// partition is never re-created, an existing key file is never
/// overwritten, and an existing pool is left alone. An existing pool
/// whose key file is gone is an error, no new key is written for it.
pub fn provision_pool(
    host: &dyn Host,
    disk: &str,
    config: &ZfsConfig,
    dry_run: bool,
) -> Result<ZfsReport, ProvError> {
    let start = Instant::now();
    let mut progress = Progress::default();

    let table = provision::inspect(host, disk)?;
    progress.push(Action::InspectDisk {
        device: table.path.clone(),
        partitions: table.partitions.len(),
    });

    let device = linux::partition_name(disk, config.partition);

    if table.has_partition(config.partition) {
        keep(&mut progress, "partition", &device);
    } else {
        let op = PartitionOp::Create {
            number: config.partition,
            start: 0,
            end: PartitionEnd::Fill,
            type_code: TYPE_CODE_ZFS.to_string(),
            label: config.pool.clone(),
        };

        if dry_run {
            would_run(sgdisk::op_cmds(disk, &op).iter().map(|c| c.to_string()));
        } else {
            info!(disk, partition = config.partition, "creating zfs partition");
            let action = Action::CreateZfsPartition {
                device: disk.to_string(),
                number: config.partition,
            };

            progress.run(action, || {
                for cmd in sgdisk::op_cmds(disk, &op) {
                    host.exec(&cmd)?;
                }

                Ok(())
            })?;

            provision::reread(host, disk, &mut progress)?;
            progress.run(Action::WaitPartition(device.clone()), || {
                provision::wait_for_node(host, &device, config.wait)
            })?;
        }
    }

    let key_file = &config.options.key_file;
    let pool_exists = zpool::exists(host, &config.pool)?;

    if host.exists(key_file) {
        keep(&mut progress, "keyFile", key_file);
    } else if pool_exists {
        // A fresh key could never unlock the existing pool
        return Err(ProvError::MissingKeyFile {
            pool: config.pool.clone(),
            key_file: key_file.clone(),
        });
    } else if dry_run {
        info!(key_file = %key_file, "dry-run: would generate key file");
    } else {
        progress.run(Action::GenerateKeyFile(key_file.clone()), || {
            generate_key(host, key_file)
        })?;
    }

    if pool_exists {
        keep(&mut progress, "pool", &config.pool);
    } else if dry_run {
        would_run([zpool::create_cmd(&config.pool, &device, &config.options).to_string()]);
    } else {
        info!(pool = %config.pool, device = %device, "creating zpool");
        let action = Action::CreateZpool {
            name: config.pool.clone(),
            device: device.clone(),
        };

        progress.run(action, || zpool::create(host, &config.pool, &device, &config.options))?;
    }

    Ok(ZfsReport {
        actions: progress.into_performed(),
        duration: start.elapsed(),
        dry_run,
        pool: config.pool.clone(),
        device,
        key_file: key_file.clone(),
    })
}

// Raw 32-byte key for keyformat=raw, readable by root only
fn generate_key(host: &dyn Host, key_file: &str) -> Result<(), ProvError> {
    if let Some(dir) = Path::new(key_file).parent() {
        host.mkdir_p(&dir.to_string_lossy())?;
    }

    let mut key = Zeroizing::new(vec![0u8; ZFS_KEY_BYTES]);
    OsRng.fill_bytes(&mut key);

    info!(key_file, "writing new zfs key file");
    host.write_secret(key_file, &key)
}

fn keep(progress: &mut Progress, kind: &str, target: &str) {
    info!(kind, target, "already exists, skipping");
    progress.push(Action::KeepExisting {
        kind: kind.to_string(),
        target: target.to_string(),
    });
}

fn would_run<I: IntoIterator<Item = String>>(cmds: I) {
    for cmd in cmds {
        info!(cmd = %cmd, "dry-run: would run");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::manifest::Manifest;
    use crate::utils::shell::CmdOutput;

    const DISK: &str = "/dev/disk/by-id/nvme-WD_BLACK_SN850X_2TB_23";
    const PART9: &str = "/dev/disk/by-id/nvme-WD_BLACK_SN850X_2TB_23-part9";
    const KEY: &str = "/etc/zfs/keys/zdata.key";

    fn zfs_config() -> ZfsConfig {
        Manifest::default().zfs_config().unwrap()
    }

    fn blank_disk() -> FakeHost {
        FakeHost::new()
            .with_block_device(DISK)
            .with_link(DISK, "/dev/nvme0n1")
            .respond("blockdev --getss", CmdOutput::ok("512\n"))
            .respond("blockdev --getsize64", CmdOutput::ok("2000398934016\n"))
            .respond(
                "sfdisk --json",
                CmdOutput::failed(1, "sfdisk: /dev/nvme0n1: does not contain a recognized partition table"),
            )
    }

    fn fresh_disk() -> FakeHost {
        blank_disk().on("partprobe", &[PART9])
    }

    // State left behind by a completed run
    fn provisioned_disk() -> FakeHost {
        let table = r#"{"partitiontable": {"device": "/dev/nvme0n1", "lastlba": 3907029134, "partitions": [
            {"node": "/dev/nvme0n1p9", "start": 2048, "size": 3907027087, "type": "6A898CC3-1DD2-11B2-99A6-080020736631", "name": "zdata"}
        ]}}"#;

        fresh_disk()
            .with_path(PART9)
            .with_path(KEY)
            .respond("sfdisk --json", CmdOutput::ok(table))
            .respond("zpool list -H -o name zdata", CmdOutput::ok("zdata\n"))
    }

    #[test]
    fn test_provision_pool_fresh() {
        let host = fresh_disk();
        let report = provision_pool(&host, DISK, &zfs_config(), false).expect("zfs run failed");

        assert!(host.ran(&format!("sgdisk --new=9:0:0 --typecode=9:bf00 --change-name=9:zdata {DISK}")));
        assert!(host.ran(&format!("partprobe {DISK}")));
        assert!(host.ran("zpool create -o ashift=12 -O compression=lz4"));
        assert!(host.commands().last().unwrap().ends_with(&format!("zdata {PART9}")));

        let key = host.secret(KEY).expect("key file not written");
        assert_eq!(ZFS_KEY_BYTES, key.len());

        assert_eq!(PART9, report.device);
        assert!(report.actions.contains(&Action::GenerateKeyFile(KEY.into())));
    }

    #[test]
    fn test_provision_pool_idempotent() {
        let host = provisioned_disk();
        let report = provision_pool(&host, DISK, &zfs_config(), false).expect("zfs re-run failed");

        assert!(!host.ran("sgdisk"));
        assert!(!host.ran("partprobe"));
        assert!(!host.ran("zpool create"));
        assert!(host.secret(KEY).is_none());

        let kept: Vec<&str> = report
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::KeepExisting { kind, .. } => Some(kind.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(vec!["partition", "keyFile", "pool"], kept);
    }

    #[test]
    fn test_provision_pool_keeps_key() {
        // Key survives from an earlier run that died before zpool create
        let host = fresh_disk().with_path(KEY);
        provision_pool(&host, DISK, &zfs_config(), false).expect("zfs run failed");

        assert!(host.secret(KEY).is_none());
        assert!(host.ran("zpool create"));
    }

    #[test]
    fn test_provision_pool_lost_key() {
        for dry_run in [false, true] {
            let host = provisioned_disk();
            let mut config = zfs_config();
            config.options.key_file = "/etc/zfs/keys/other.key".to_string();

            let err = provision_pool(&host, DISK, &config, dry_run).unwrap_err();

            assert!(matches!(
                err,
                ProvError::MissingKeyFile { ref pool, ref key_file }
                    if pool == "zdata" && key_file == "/etc/zfs/keys/other.key"
            ));
            assert!(host.secret("/etc/zfs/keys/other.key").is_none());
            assert!(!host.ran("zpool create"));
        }
    }

    #[test]
    fn test_provision_pool_dry_run() {
        let host = fresh_disk();
        let report = provision_pool(&host, DISK, &zfs_config(), true).expect("dry run failed");

        assert!(report.dry_run);
        assert!(!host.ran("sgdisk"));
        assert!(!host.ran("zpool create"));
        assert!(host.secret(KEY).is_none());
        assert!(host.ran("zpool list"));
    }

    #[test]
    fn test_provision_pool_not_ready() {
        // partprobe never makes the node show up
        let host = blank_disk();
        let mut config = zfs_config();
        config.wait.retries = 2;

        let err = provision_pool(&host, DISK, &config, false).unwrap_err();

        assert!(matches!(err.root_cause(), ProvError::PartitionNotReady { attempts: 2, .. }));
        assert!(!host.ran("zpool create"));
        assert!(host.secret(KEY).is_none());
    }
}
