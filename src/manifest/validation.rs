use super::{Config, ZfsConfig};
use crate::constants::{EFI_PARTITION, FAT_LABEL_MAX, GPT_MAX_PARTITIONS, GPT_NAME_MAX, ROOT_PARTITION};
use crate::errors::ProvError;

pub(super) fn validate_config(config: &Config) -> Result<(), ProvError> {
    const MSG: &str = "manifest validation failed";

    if config.disk.is_empty() {
        return Err(ProvError::BadManifest(format!("{MSG}: empty disk path")));
    }

    let plan = &config.plan;
    validate_partition_number(plan.data_partition)?;
    if plan.data_partition == EFI_PARTITION || plan.data_partition == ROOT_PARTITION {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: data partition {} collides with EFI/root partition numbers",
            plan.data_partition
        )));
    }

    if plan.efi_size == 0 {
        return Err(ProvError::BadManifest(format!("{MSG}: zero EFI size")));
    }

    if plan.root_size == 0 {
        return Err(ProvError::BadManifest(format!("{MSG}: zero root size")));
    }

    for (what, name) in [
        ("root mapper", &config.mapper.root),
        ("data mapper", &config.mapper.data),
        ("root subvolume", &config.subvolumes.root),
        ("home subvolume", &config.subvolumes.home),
        ("data subvolume", &config.subvolumes.data),
        ("EFI label", &config.plan.labels.efi),
        ("root label", &config.plan.labels.root),
        ("data label", &config.plan.labels.data),
    ] {
        validate_name(what, name)?;
    }

    let labels = &config.plan.labels;
    for (what, label) in [
        ("EFI label", &labels.efi),
        ("root label", &labels.root),
        ("data label", &labels.data),
    ] {
        validate_gpt_name(what, label)?;
    }

    // The EFI label doubles as the vfat volume label
    if labels.efi.len() > FAT_LABEL_MAX || !labels.efi.is_ascii() {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: EFI label {:?} must be at most {FAT_LABEL_MAX} ASCII characters",
            labels.efi
        )));
    }

    if config.mapper.root == config.mapper.data {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: root and data share mapper name {}",
            config.mapper.root
        )));
    }

    if config.subvolumes.root == config.subvolumes.home {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: root and home share subvolume {}",
            config.subvolumes.root
        )));
    }

    for (what, path) in [("mountpoint", &config.mountpoint), ("scratch", &config.scratch)] {
        if !path.starts_with('/') {
            return Err(ProvError::BadManifest(format!(
                "{MSG}: {what} {path} is not an absolute path"
            )));
        }
    }

    if config.wait.retries == 0 {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: partition wait needs at least 1 retry"
        )));
    }

    Ok(())
}

pub(super) fn validate_zfs(config: &ZfsConfig) -> Result<(), ProvError> {
    const MSG: &str = "zfs manifest validation failed";

    validate_partition_number(config.partition)?;
    validate_name("pool", &config.pool)?;
    validate_gpt_name("pool", &config.pool)?;

    if !(9..=16).contains(&config.options.ashift) {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: ashift {} out of range 9-16",
            config.options.ashift
        )));
    }

    if !config.options.key_file.starts_with('/') {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: key file {} is not an absolute path",
            config.options.key_file
        )));
    }

    if config.wait.retries == 0 {
        return Err(ProvError::BadManifest(format!(
            "{MSG}: partition wait needs at least 1 retry"
        )));
    }

    Ok(())
}

fn validate_partition_number(number: u32) -> Result<(), ProvError> {
    if number == 0 || number > GPT_MAX_PARTITIONS {
        return Err(ProvError::BadManifest(format!(
            "partition number {number} out of range 1-{GPT_MAX_PARTITIONS}"
        )));
    }

    Ok(())
}

fn validate_name(what: &str, name: &str) -> Result<(), ProvError> {
    if name.is_empty() {
        return Err(ProvError::BadManifest(format!("empty {what}")));
    }

    if name.contains('/') || name.chars().any(char::is_whitespace) {
        return Err(ProvError::BadManifest(format!(
            "{what} {name:?} must not contain slashes or whitespace"
        )));
    }

    Ok(())
}

// GPT partition names are stored as UTF-16
fn validate_gpt_name(what: &str, name: &str) -> Result<(), ProvError> {
    if name.encode_utf16().count() > GPT_NAME_MAX {
        return Err(ProvError::BadManifest(format!(
            "{what} {name:?} is longer than the {GPT_NAME_MAX} characters a GPT partition name holds"
        )));
    }

    Ok(())
}
