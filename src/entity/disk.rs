use serde::{Deserialize, Serialize};

/// A target block device and its partition table as read at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disk {
    // Path as given by the operator, preferably /dev/disk/by-id/...
    pub path: String,

    // Kernel node the path resolves to, e.g. /dev/sda
    pub node: String,

    pub sector_size: u64,

    // Last sector a GPT partition may occupy
    pub last_usable_sector: u64,

    // Ordered by partition number
    pub partitions: Vec<Partition>,
}

impl Disk {
    pub fn partition(&self, number: u32) -> Option<&Partition> {
        self.partitions.iter().find(|p| p.number == number)
    }

    pub fn has_partition(&self, number: u32) -> bool {
        self.partition(number).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub number: u32,

    #[serde(rename = "typeGuid")]
    pub type_guid: String,

    pub label: Option<String>,

    // Sectors
    pub start: u64,
    pub size: u64,
}

impl Partition {
    /// Last sector occupied by this partition (inclusive)
    pub fn end(&self) -> u64 {
        self.start + self.size.saturating_sub(1)
    }
}

/// Declarative target layout, sizes in bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    pub data_partition: u32,
    pub efi_size: u64,
    pub root_size: u64,
    pub labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub efi: String,
    pub root: String,
    pub data: String,
}

/// Whether the reserved data partition is kept or made anew.
/// Every step after validation matches on this instead of
/// re-inspecting the disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision")]
pub enum DataPartitionDecision {
    #[serde(rename = "create")]
    Create,

    #[serde(rename = "preserve")]
    Preserve { number: u32, start: u64 },
}

/// Where a new partition ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionEnd {
    // Inclusive last sector
    #[serde(rename = "sector")]
    Sector(u64),

    // Take all remaining space
    #[serde(rename = "fill")]
    Fill,
}

/// A single partition table write, in the order it must be issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionOp {
    #[serde(rename = "wipeTable")]
    WipeTable,

    #[serde(rename = "deletePartition")]
    Delete { number: u32 },

    #[serde(rename = "createPartition")]
    Create {
        number: u32,
        start: u64,
        end: PartitionEnd,
        type_code: String,
        label: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(number: u32, start: u64, size: u64) -> Partition {
        Partition {
            number,
            type_guid: "CA7D7CCB-63ED-4C53-861C-1742536059CC".into(),
            label: None,
            start,
            size,
        }
    }

    #[test]
    fn test_partition_lookup() {
        let disk = Disk {
            path: "/dev/disk/by-id/nvme-foo".into(),
            node: "/dev/nvme0n1".into(),
            sector_size: 512,
            last_usable_sector: 1_000_000_000,
            partitions: vec![part(1, 2048, 2048), part(9, 500_000_000, 1000)],
        };

        assert!(disk.has_partition(9));
        assert!(!disk.has_partition(2));
        assert_eq!(Some(500_000_999), disk.partition(9).map(|p| p.end()));
    }
}
