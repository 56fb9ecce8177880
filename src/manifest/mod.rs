pub mod validation;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::defaults;
use crate::entity::disk::{Labels, PartitionPlan};
use crate::entity::parse_human_bytes;
use crate::errors::ProvError;
use crate::linux::zpool::PoolOptions;

/// Operator-supplied provisioning manifest (YAML).
/// Anything left out falls back to `constants::defaults`.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(alias = "device", alias = "target")]
    pub disk: Option<String>,

    #[serde(alias = "data-partition")]
    pub data_partition: Option<u32>,

    #[serde(alias = "efi-size", alias = "efi")]
    pub efi_size: Option<String>,

    #[serde(alias = "root-size", alias = "root")]
    pub root_size: Option<String>,

    #[serde(alias = "mappers", alias = "luks")]
    pub mapper: Option<ManifestMapper>,

    #[serde(alias = "subvols")]
    pub subvolumes: Option<ManifestSubvolumes>,

    pub labels: Option<ManifestLabels>,

    #[serde(alias = "location", alias = "mnt")]
    pub mountpoint: Option<String>,

    pub scratch: Option<String>,

    #[serde(alias = "mntopts", alias = "mount-options")]
    pub mount_options: Option<String>,

    #[serde(alias = "partition-wait")]
    pub partition_wait: Option<ManifestWait>,

    pub zfs: Option<ManifestZfs>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestMapper {
    pub root: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSubvolumes {
    pub root: Option<String>,
    pub home: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestLabels {
    pub efi: Option<String>,
    pub root: Option<String>,
    pub data: Option<String>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestWait {
    pub retries: Option<u32>,

    #[serde(alias = "interval")]
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestZfs {
    #[serde(alias = "name")]
    pub pool: Option<String>,

    pub partition: Option<u32>,

    #[serde(alias = "key", alias = "key-file")]
    pub key_file: Option<String>,

    pub ashift: Option<u8>,

    pub compression: Option<String>,
}

/// Fully resolved settings for the encrypted btrfs flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub disk: String,
    pub plan: PartitionPlan,
    pub mapper: MapperNames,
    pub subvolumes: Subvolumes,
    pub mountpoint: String,
    pub scratch: String,
    pub mount_options: String,
    pub wait: PartitionWait,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapperNames {
    pub root: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subvolumes {
    pub root: String,
    pub home: String,
    pub data: String,
}

/// Poll budget for partition nodes to show up after a table re-read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionWait {
    pub retries: u32,
    pub interval: Duration,
}

impl Default for PartitionWait {
    fn default() -> Self {
        Self {
            retries: defaults::PARTITION_WAIT_RETRIES,
            interval: Duration::from_millis(defaults::PARTITION_WAIT_INTERVAL_MS),
        }
    }
}

/// Fully resolved settings for the ZFS pool flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZfsConfig {
    pub pool: String,
    pub partition: u32,
    pub options: PoolOptions,
    pub wait: PartitionWait,
}

impl Manifest {
    #[inline]
    pub fn from_yaml(manifest_yaml: &str) -> Result<Self, ProvError> {
        parse(manifest_yaml)
    }

    /// Resolves defaults and validates the result.
    /// `location` (from the environment) overrides the manifest mountpoint.
    pub fn config(&self, location: Option<String>) -> Result<Config, ProvError> {
        let disk = self
            .disk
            .clone()
            .ok_or_else(|| ProvError::BadManifest("missing target disk".to_string()))?;

        let efi_size = self.efi_size.as_deref().unwrap_or(defaults::EFI_SIZE);
        let root_size = self.root_size.as_deref().unwrap_or(defaults::ROOT_SIZE);

        let mapper = self.mapper.as_ref();
        let subvols = self.subvolumes.as_ref();
        let labels = self.labels.as_ref();

        let pick = |value: Option<&Option<String>>, default: &str| {
            value.and_then(|v| v.clone()).unwrap_or_else(|| default.to_string())
        };

        let config = Config {
            disk,
            plan: PartitionPlan {
                data_partition: self.data_partition.unwrap_or(defaults::DATA_PARTITION),
                efi_size: parse_human_bytes(efi_size)?.size() as u64,
                root_size: parse_human_bytes(root_size)?.size() as u64,
                labels: Labels {
                    efi: pick(labels.map(|l| &l.efi), defaults::LABEL_EFI),
                    root: pick(labels.map(|l| &l.root), defaults::LABEL_ROOT),
                    data: pick(labels.map(|l| &l.data), defaults::LABEL_DATA),
                },
            },
            mapper: MapperNames {
                root: pick(mapper.map(|m| &m.root), defaults::MAPPER_ROOT),
                data: pick(mapper.map(|m| &m.data), defaults::MAPPER_DATA),
            },
            subvolumes: Subvolumes {
                root: pick(subvols.map(|s| &s.root), defaults::SUBVOL_ROOT),
                home: pick(subvols.map(|s| &s.home), defaults::SUBVOL_HOME),
                data: pick(subvols.map(|s| &s.data), defaults::SUBVOL_DATA),
            },
            mountpoint: location
                .or_else(|| self.mountpoint.clone())
                .unwrap_or_else(|| defaults::MOUNTPOINT.to_string()),
            scratch: self
                .scratch
                .clone()
                .unwrap_or_else(|| defaults::SCRATCH.to_string()),
            mount_options: self
                .mount_options
                .clone()
                .unwrap_or_else(|| defaults::MOUNT_OPTIONS.to_string()),
            wait: self.wait(),
        };

        validation::validate_config(&config)?;

        Ok(config)
    }

    pub fn zfs_config(&self) -> Result<ZfsConfig, ProvError> {
        let zfs = self.zfs.as_ref();

        let pool = zfs
            .and_then(|z| z.pool.clone())
            .unwrap_or_else(|| defaults::ZFS_POOL.to_string());

        let key_file = zfs
            .and_then(|z| z.key_file.clone())
            .unwrap_or_else(|| format!("{}/{pool}.key", defaults::ZFS_KEY_DIR));

        let config = ZfsConfig {
            partition: zfs
                .and_then(|z| z.partition)
                .unwrap_or(defaults::ZFS_PARTITION),
            options: PoolOptions {
                ashift: zfs.and_then(|z| z.ashift).unwrap_or(defaults::ZFS_ASHIFT),
                compression: zfs
                    .and_then(|z| z.compression.clone())
                    .unwrap_or_else(|| defaults::ZFS_COMPRESSION.to_string()),
                key_file,
            },
            pool,
            wait: self.wait(),
        };

        validation::validate_zfs(&config)?;

        Ok(config)
    }

    fn wait(&self) -> PartitionWait {
        let default = PartitionWait::default();
        let wait = self.partition_wait.as_ref();

        PartitionWait {
            retries: wait.and_then(|w| w.retries).unwrap_or(default.retries),
            interval: wait
                .and_then(|w| w.interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(default.interval),
        }
    }
}

#[inline]
pub fn parse(manifest: &str) -> Result<Manifest, ProvError> {
    serde_yaml::from_str(manifest).map_err(|err| ProvError::BadManifest(err.to_string()))
}
