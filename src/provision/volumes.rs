use tracing::{info, warn};

use super::progress::Progress;
use crate::constants::{EFI_PARTITION, ROOT_PARTITION, VERIFY_MAPPER_SUFFIX};
use crate::entity::action::Action;
use crate::entity::disk::{DataPartitionDecision, Disk};
use crate::entity::report::{DataHandoff, Mounts};
use crate::entity::secret::Passphrase;
use crate::errors::{PreserveFailure, ProvError};
use crate::host::Host;
use crate::linux::{self, btrfs, luks, mkfs, mount};
use crate::manifest::Config;

/// Unmounts leftovers from an earlier interrupted run and closes
/// any of our mapper devices that are still open.
pub(super) fn release_stale(
    host: &dyn Host,
    config: &Config,
    progress: &mut Progress,
) -> Result<(), ProvError> {
    for dir in [&config.mountpoint, &config.scratch] {
        if mount::is_mountpoint(host, dir)? {
            warn!(mountpoint = %dir, "unmounting leftover mounts");
            progress.run(Action::UnmountStale(dir.clone()), || {
                mount::umount_recursive(host, dir)
            })?;
        }
    }

    let verify = format!("{}{VERIFY_MAPPER_SUFFIX}", config.mapper.data);
    for name in [&config.mapper.root, &config.mapper.data, &verify] {
        if luks::is_open(host, name) {
            warn!(mapper = %name, "closing leftover LUKS mapping");
            progress.run(Action::CloseStaleLuks(name.clone()), || luks::close(host, name))?;
        }
    }

    Ok(())
}

/// Formats (unless preserved) and opens the root and data LUKS volumes.
/// This is the last use of `passphrase` in a run.
pub(super) fn open_volumes(
    host: &dyn Host,
    disk: &Disk,
    config: &Config,
    decision: &DataPartitionDecision,
    passphrase: &Passphrase,
    progress: &mut Progress,
) -> Result<(), ProvError> {
    let root = linux::partition_name(&disk.path, ROOT_PARTITION);
    let data = linux::partition_name(&disk.path, config.plan.data_partition);

    info!(device = %root, "formatting root LUKS volume");
    progress.run(Action::CreateDmLuks { device: root.clone() }, || {
        luks::format(host, &root, passphrase)
    })?;

    progress.run(
        Action::OpenDmLuks {
            device: root.clone(),
            name: config.mapper.root.clone(),
        },
        || luks::open(host, &root, &config.mapper.root, passphrase),
    )?;

    let open_data = Action::OpenDmLuks {
        device: data.clone(),
        name: config.mapper.data.clone(),
    };

    match decision {
        DataPartitionDecision::Create => {
            info!(device = %data, "formatting data LUKS volume");
            progress.run(Action::CreateDmLuks { device: data.clone() }, || {
                luks::format(host, &data, passphrase)
            })?;

            progress.run(open_data, || luks::open(host, &data, &config.mapper.data, passphrase))?;
        }

        DataPartitionDecision::Preserve { .. } => {
            info!(device = %data, "opening preserved data LUKS volume");
            progress.run(open_data, || {
                if let Err(stderr) = luks::try_open(host, &data, &config.mapper.data, false, passphrase)? {
                    warn!(device = %data, %stderr, "cryptsetup open refused");
                    return Err(ProvError::UnlockFailed {
                        device: data.clone(),
                        name: config.mapper.data.clone(),
                    });
                }

                Ok(())
            })?;
        }
    }

    Ok(())
}

/// Creates the EFI and btrfs filesystems and their subvolumes, then closes
/// the data volume and returns its handoff.
/// A preserved data volume keeps its filesystem; only its subvolume is checked.
pub(super) fn create_filesystems(
    host: &dyn Host,
    disk: &Disk,
    config: &Config,
    decision: &DataPartitionDecision,
    progress: &mut Progress,
) -> Result<DataHandoff, ProvError> {
    let efi = linux::partition_name(&disk.path, EFI_PARTITION);
    let root = luks::mapper_path(&config.mapper.root);
    let data = luks::mapper_path(&config.mapper.data);
    let labels = &config.plan.labels;

    progress.run(
        Action::CreateFs {
            device: efi.clone(),
            fs_type: "vfat".to_string(),
        },
        || mkfs::create_fat32(host, &efi, &labels.efi),
    )?;

    progress.run(
        Action::CreateFs {
            device: root.clone(),
            fs_type: "btrfs".to_string(),
        },
        || mkfs::create_btrfs(host, &root, &labels.root),
    )?;

    let root_subvolumes = [config.subvolumes.root.as_str(), config.subvolumes.home.as_str()];
    with_scratch(host, &root, &config.scratch, progress, |progress| {
        ensure_subvolumes(host, &root, &config.scratch, &root_subvolumes, progress)
    })?;

    let subvolume = config.subvolumes.data.as_str();
    match decision {
        DataPartitionDecision::Create => {
            progress.run(
                Action::CreateFs {
                    device: data.clone(),
                    fs_type: "btrfs".to_string(),
                },
                || mkfs::create_btrfs(host, &data, &labels.data),
            )?;

            with_scratch(host, &data, &config.scratch, progress, |progress| {
                ensure_subvolumes(host, &data, &config.scratch, &[subvolume], progress)
            })?;
        }

        DataPartitionDecision::Preserve { number, .. } => {
            let reuse = Action::ReuseSubvolume {
                device: data.clone(),
                subvolume: subvolume.to_string(),
            };

            with_scratch(host, &data, &config.scratch, progress, |progress| {
                progress.run(reuse, || {
                    let existing = btrfs::list_subvolumes(host, &config.scratch)?;
                    if !existing.iter().any(|s| s == subvolume) {
                        // Validation already saw it, so something changed under us
                        warn!(device = %data, subvolume, "preserved subvolume disappeared");
                        return Err(ProvError::PreservedDataValidationFailed {
                            partition: linux::partition_name(&disk.path, *number),
                            reason: PreserveFailure::MissingSubvolume(subvolume.to_string()),
                        });
                    }

                    info!(device = %data, subvolume, "reusing preserved subvolume");
                    Ok(())
                })
            })?;
        }
    }

    progress.run(Action::CloseDmLuks(config.mapper.data.clone()), || {
        luks::close(host, &config.mapper.data)
    })?;

    Ok(DataHandoff {
        partition: linux::partition_name(&disk.path, config.plan.data_partition),
        mapper: config.mapper.data.clone(),
        subvolume: subvolume.to_string(),
    })
}

/// Mounts root, home and EFI under the mountpoint for the installer
pub(super) fn mount_layout(
    host: &dyn Host,
    disk: &Disk,
    config: &Config,
    progress: &mut Progress,
) -> Result<Mounts, ProvError> {
    let root_dev = luks::mapper_path(&config.mapper.root);
    let efi_dev = linux::partition_name(&disk.path, EFI_PARTITION);

    let root = config.mountpoint.trim_end_matches('/').to_string();
    let home = format!("{root}/home");
    let boot = format!("{root}/boot");

    mkdir(host, &config.mountpoint, progress)?;
    mount_fs(
        host,
        &root_dev,
        &config.mountpoint,
        Some(mount::subvol_opts(&config.subvolumes.root, &config.mount_options)),
        progress,
    )?;

    mkdir(host, &home, progress)?;
    mkdir(host, &boot, progress)?;

    mount_fs(
        host,
        &root_dev,
        &home,
        Some(mount::subvol_opts(&config.subvolumes.home, &config.mount_options)),
        progress,
    )?;
    mount_fs(host, &efi_dev, &boot, None, progress)?;

    info!(root = %config.mountpoint, %home, %boot, "filesystems mounted");

    Ok(Mounts {
        efi: boot,
        root: config.mountpoint.clone(),
        home,
    })
}

// Creates each subvolume unless it is already listed
fn ensure_subvolumes(
    host: &dyn Host,
    device: &str,
    mountpoint: &str,
    names: &[&str],
    progress: &mut Progress,
) -> Result<(), ProvError> {
    let existing = btrfs::list_subvolumes(host, mountpoint)?;

    for name in names {
        if existing.iter().any(|s| s == name) {
            info!(device, subvolume = name, "subvolume exists, skipping");
            progress.push(Action::KeepExisting {
                kind: "subvolume".to_string(),
                target: format!("{device}:{name}"),
            });

            continue;
        }

        progress.run(
            Action::CreateSubvolume {
                device: device.to_string(),
                subvolume: name.to_string(),
            },
            || btrfs::create_subvolume(host, mountpoint, name),
        )?;
    }

    Ok(())
}

// Mounts `device` on the scratch directory for the duration of `f`.
// The scratch mount is left in place if `f` fails, the next run releases it.
fn with_scratch<F>(
    host: &dyn Host,
    device: &str,
    scratch: &str,
    progress: &mut Progress,
    f: F,
) -> Result<(), ProvError>
where
    F: FnOnce(&mut Progress) -> Result<(), ProvError>,
{
    mkdir(host, scratch, progress)?;
    mount_fs(host, device, scratch, None, progress)?;

    f(progress)?;

    progress.run(Action::UnmountFs(scratch.to_string()), || {
        mount::umount(host, scratch)
    })
}

fn mkdir(host: &dyn Host, path: &str, progress: &mut Progress) -> Result<(), ProvError> {
    progress.run(Action::Mkdir(path.to_string()), || host.mkdir_p(path))
}

fn mount_fs(
    host: &dyn Host,
    src: &str,
    dst: &str,
    opts: Option<String>,
    progress: &mut Progress,
) -> Result<(), ProvError> {
    let action = Action::MountFs {
        src: src.to_string(),
        dst: dst.to_string(),
        opts: opts.clone(),
    };

    progress.run(action, || mount::mount(host, src, dst, opts.as_deref()))
}
