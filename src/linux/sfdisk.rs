use serde::Deserialize;

use crate::entity::disk::Partition;
use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

const NO_TABLE: &str = "does not contain a recognized partition table";

// For parsing `sfdisk --json` output
#[derive(Debug, Deserialize)]
struct Dump {
    partitiontable: Table,
}

#[derive(Debug, Deserialize)]
struct Table {
    device: String,
    lastlba: Option<u64>,

    #[serde(default)]
    partitions: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    node: String,
    start: u64,
    size: u64,

    #[serde(rename = "type")]
    part_type: String,

    name: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PartitionTable {
    pub last_lba: Option<u64>,
    pub partitions: Vec<Partition>,
}

/// Reads the partition table of kernel node `device`.
/// A disk without any table yields an empty one.
///
/// Executes:
/// ```shell
/// sfdisk --json {device}
/// ```
pub fn read_table(host: &dyn Host, device: &str) -> Result<PartitionTable, ProvError> {
    let cmd = Cmd::new("sfdisk").args(["--json", device]);
    let out = host.run(&cmd)?;

    if !out.success() {
        if out.stderr.contains(NO_TABLE) {
            return Ok(PartitionTable::default());
        }

        return Err(ProvError::SubsystemCommandFailed {
            command: cmd.to_string(),
            status: out.status,
            stderr: out.stderr.trim().to_string(),
            error: None,
        });
    }

    parse_dump(&out.stdout)
}

pub(crate) fn parse_dump(json: &str) -> Result<PartitionTable, ProvError> {
    if json.trim().is_empty() {
        return Ok(PartitionTable::default());
    }

    let dump: Dump = serde_json::from_str(json)
        .map_err(|err| ProvError::CryptProvBug(format!("unexpected sfdisk json: {err}")))?;

    let mut partitions = Vec::new();
    for entry in dump.partitiontable.partitions {
        let number = partition_number(&entry.node, &dump.partitiontable.device).ok_or_else(|| {
            ProvError::CryptProvBug(format!("cannot tell partition number of {}", entry.node))
        })?;

        partitions.push(Partition {
            number,
            type_guid: entry.part_type.to_uppercase(),
            label: entry.name.filter(|n| !n.is_empty()),
            start: entry.start,
            size: entry.size,
        });
    }

    partitions.sort_by_key(|p| p.number);

    Ok(PartitionTable {
        last_lba: dump.partitiontable.lastlba,
        partitions,
    })
}

// /dev/sda9 => 9, /dev/nvme0n1p9 => 9
fn partition_number(node: &str, device: &str) -> Option<u32> {
    if let Some(suffix) = node.strip_prefix(device) {
        let suffix = suffix.trim_start_matches("-part").trim_start_matches('p');
        if let Ok(n) = suffix.parse() {
            return Some(n);
        }
    }

    let digits: String = node
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dump() {
        let json = r#"{
   "partitiontable": {
      "label": "gpt",
      "id": "6E1C3B1A-7D0F-4E55-9C0B-0A7E2B3C4D5E",
      "device": "/dev/nvme0n1",
      "unit": "sectors",
      "firstlba": 2048,
      "lastlba": 1000215182,
      "sectorsize": 512,
      "partitions": [
         {
            "node": "/dev/nvme0n1p9",
            "start": 316669952,
            "size": 683545231,
            "type": "ca7d7ccb-63ed-4c53-861c-1742536059cc",
            "uuid": "9A1B2C3D-0000-4000-8000-000000000009",
            "name": "data"
         },
         {
            "node": "/dev/nvme0n1p1",
            "start": 2048,
            "size": 2097152,
            "type": "C12A7328-F81F-11D2-BA4B-00A0C93EC93B",
            "uuid": "9A1B2C3D-0000-4000-8000-000000000001",
            "name": ""
         }
      ]
   }
}"#;

        let table = parse_dump(json).expect("failed to parse sfdisk dump");

        assert_eq!(Some(1000215182), table.last_lba);
        assert_eq!(2, table.partitions.len());

        let efi = &table.partitions[0];
        assert_eq!(1, efi.number);
        assert_eq!(None, efi.label);

        let data = &table.partitions[1];
        assert_eq!(9, data.number);
        assert_eq!(316669952, data.start);
        assert_eq!("CA7D7CCB-63ED-4C53-861C-1742536059CC", data.type_guid);
        assert_eq!(Some("data".to_string()), data.label);
    }

    #[test]
    fn test_partition_number() {
        let tests = vec![
            ("/dev/sda9", "/dev/sda", Some(9)),
            ("/dev/nvme0n1p12", "/dev/nvme0n1", Some(12)),
            ("/dev/mmcblk0p1", "/dev/mmcblk0", Some(1)),
            ("/dev/disk/by-id/ata-X-part3", "/dev/disk/by-id/ata-X", Some(3)),
            ("/dev/sdb2", "/dev/sda", Some(2)),
            ("/dev/sda", "/dev/sda", None),
        ];

        for (node, device, expected) in tests {
            assert_eq!(expected, partition_number(node, device), "node {node}");
        }
    }

    #[test]
    fn test_parse_empty() {
        let json = r#"{"partitiontable": {"label": "gpt", "device": "/dev/sda", "unit": "sectors"}}"#;
        assert_eq!(PartitionTable::default(), parse_dump(json).unwrap());
    }
}
