pub mod defaults {
    pub const MANIFEST: &str = "./provision.yaml";
    pub const DATA_PARTITION: u32 = 9;
    pub const EFI_SIZE: &str = "1GiB";
    pub const ROOT_SIZE: &str = "150GiB";

    pub const MAPPER_ROOT: &str = "cryptroot";
    pub const MAPPER_DATA: &str = "cryptdata";

    pub const SUBVOL_ROOT: &str = "@";
    pub const SUBVOL_HOME: &str = "@home";
    pub const SUBVOL_DATA: &str = "@data";

    pub const LABEL_EFI: &str = "EFI";
    pub const LABEL_ROOT: &str = "root";
    pub const LABEL_DATA: &str = "data";

    pub const MOUNTPOINT: &str = "/mnt";
    pub const SCRATCH: &str = "/run/cryptprov";
    pub const MOUNT_OPTIONS: &str = "noatime,compress=zstd";

    pub const PARTITION_WAIT_RETRIES: u32 = 10;
    pub const PARTITION_WAIT_INTERVAL_MS: u64 = 500;

    pub const ZFS_POOL: &str = "zdata";
    pub const ZFS_PARTITION: u32 = 9;
    pub const ZFS_KEY_DIR: &str = "/etc/zfs/keys";
    pub const ZFS_ASHIFT: u8 = 12;
    pub const ZFS_COMPRESSION: &str = "lz4";
}

pub const ENV_CRYPTPROV_LOC: &str = "CRYPTPROV_LOC";

// Use programs instead of bindings to avoid API dependencies
pub const REQUIRED_COMMANDS: [&str; 12] = [
    "sfdisk",
    "sgdisk",
    "blockdev",
    "partprobe",
    "blkid",
    "cryptsetup",
    "mkfs.btrfs",
    "mkfs.fat",
    "btrfs",
    "mount",
    "umount",
    "mountpoint",
];

pub const REQUIRED_COMMANDS_ZFS: [&str; 5] = ["sfdisk", "sgdisk", "partprobe", "blockdev", "zpool"];

pub const DISK_BY_ID: &str = "/dev/disk/by-id";
pub const DEV_MAPPER: &str = "/dev/mapper";

// GPT layout: partitions start on 1MiB boundaries whatever the sector size.
// The backup header takes the last 33 sectors on 512-byte disks, fewer on 4Kn.
pub const GPT_ALIGNMENT_BYTES: u64 = 1 << 20;
pub const GPT_BACKUP_SECTORS: u64 = 33;
pub const GPT_NAME_MAX: usize = 36;
pub const FAT_LABEL_MAX: usize = 11;
pub const GPT_MAX_PARTITIONS: u32 = 128;

// sgdisk type codes
pub const TYPE_CODE_EFI: &str = "ef00";
pub const TYPE_CODE_LUKS: &str = "8309";
pub const TYPE_CODE_ZFS: &str = "bf00";

// blkid signatures
pub const SIGNATURE_LUKS: &str = "crypto_LUKS";
pub const SIGNATURE_BTRFS: &str = "btrfs";

pub const EFI_PARTITION: u32 = 1;
pub const ROOT_PARTITION: u32 = 2;

pub const VERIFY_MAPPER_SUFFIX: &str = "-verify";
pub const ZFS_KEY_BYTES: usize = 32;
