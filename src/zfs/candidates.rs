use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::constants::DISK_BY_ID;
use crate::errors::ProvError;
use crate::host::Host;

/// A whole disk the pool may be created on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub path: String,
    pub node: String,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.path, self.node)
    }
}

/// Lists by-id links of whole disks, sorted by name.
///
/// Device-mapper, LVM and partition links are skipped,
/// as are `wwn-` links pointing at a disk that already has another by-id name.
pub fn candidates(host: &dyn Host) -> Result<Vec<Candidate>, ProvError> {
    let mut names = host.read_dir(DISK_BY_ID)?;
    names.sort();

    let mut resolved = Vec::new();
    for name in names {
        if name.starts_with("dm-") || name.starts_with("lvm-") || name.contains("-part") {
            continue;
        }

        let path = format!("{DISK_BY_ID}/{name}");
        let node = host.canonicalize(&path)?;
        resolved.push((name, Candidate { path, node }));
    }

    let named: HashSet<String> = resolved
        .iter()
        .filter(|(name, _)| !name.starts_with("wwn-"))
        .map(|(_, c)| c.node.clone())
        .collect();

    Ok(resolved
        .into_iter()
        .filter(|(name, c)| !(name.starts_with("wwn-") && named.contains(&c.node)))
        .map(|(_, c)| c)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;

    #[test]
    fn test_candidates() {
        let host = FakeHost::new()
            .with_dir(
                DISK_BY_ID,
                &[
                    "wwn-0x5002538e40a1b2c3",
                    "ata-Samsung_SSD_860_S3Z9",
                    "ata-Samsung_SSD_860_S3Z9-part1",
                    "dm-name-cryptroot",
                    "dm-uuid-CRYPT-LUKS2-abc",
                    "lvm-pv-uuid-xyz",
                    "nvme-WD_BLACK_SN850X_2TB_23",
                    "nvme-WD_BLACK_SN850X_2TB_23-part9",
                    "wwn-0x5000c500a1b2c3d4",
                ],
            )
            .with_link("/dev/disk/by-id/wwn-0x5002538e40a1b2c3", "/dev/sda")
            .with_link("/dev/disk/by-id/ata-Samsung_SSD_860_S3Z9", "/dev/sda")
            .with_link("/dev/disk/by-id/nvme-WD_BLACK_SN850X_2TB_23", "/dev/nvme0n1")
            .with_link("/dev/disk/by-id/wwn-0x5000c500a1b2c3d4", "/dev/sdb");

        let result = candidates(&host).expect("listing candidates failed");

        assert_eq!(
            vec![
                Candidate {
                    path: "/dev/disk/by-id/ata-Samsung_SSD_860_S3Z9".into(),
                    node: "/dev/sda".into(),
                },
                Candidate {
                    path: "/dev/disk/by-id/nvme-WD_BLACK_SN850X_2TB_23".into(),
                    node: "/dev/nvme0n1".into(),
                },
                // Only reachable through its wwn- link
                Candidate {
                    path: "/dev/disk/by-id/wwn-0x5000c500a1b2c3d4".into(),
                    node: "/dev/sdb".into(),
                },
            ],
            result
        );
    }

    #[test]
    fn test_candidates_no_by_id() {
        assert!(candidates(&FakeHost::new()).is_err());
    }
}
