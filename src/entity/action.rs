use serde::{Deserialize, Serialize};

use super::disk::{DataPartitionDecision, PartitionEnd};

/// Every step the provisioner performs is recorded as an action,
/// so that a failed run can report how far it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "inspectDisk")]
    InspectDisk { device: String, partitions: usize },

    #[serde(rename = "unmountStale")]
    UnmountStale(String),

    #[serde(rename = "closeStaleLuks")]
    CloseStaleLuks(String),

    #[serde(rename = "decideDataPartition")]
    DecideDataPartition(DataPartitionDecision),

    #[serde(rename = "wipePartitionTable")]
    WipePartitionTable { device: String },

    #[serde(rename = "deletePartition")]
    DeletePartition { device: String, number: u32 },

    #[serde(rename = "createPartition")]
    CreatePartition {
        device: String,
        number: u32,
        start: u64,
        end: PartitionEnd,
    },

    #[serde(rename = "rereadPartitionTable")]
    RereadPartitionTable { device: String },

    #[serde(rename = "waitPartition")]
    WaitPartition(String),

    #[serde(rename = "createDmLuks")]
    CreateDmLuks { device: String },

    #[serde(rename = "openDmLuks")]
    OpenDmLuks { device: String, name: String },

    #[serde(rename = "closeDmLuks")]
    CloseDmLuks(String),

    #[serde(rename = "releasePassphrase")]
    ReleasePassphrase,

    #[serde(rename = "createFilesystem")]
    CreateFs { device: String, fs_type: String },

    #[serde(rename = "createSubvolume")]
    CreateSubvolume { device: String, subvolume: String },

    #[serde(rename = "reuseSubvolume")]
    ReuseSubvolume { device: String, subvolume: String },

    #[serde(rename = "mkdir")]
    Mkdir(String),

    #[serde(rename = "mountFilesystem")]
    MountFs {
        src: String,
        dst: String,
        opts: Option<String>,
    },

    #[serde(rename = "unmountFilesystem")]
    UnmountFs(String),

    #[serde(rename = "createZfsPartition")]
    CreateZfsPartition { device: String, number: u32 },

    #[serde(rename = "generateKeyFile")]
    GenerateKeyFile(String),

    #[serde(rename = "createZpool")]
    CreateZpool { name: String, device: String },

    #[serde(rename = "keepExisting")]
    KeepExisting { kind: String, target: String },
}
