use crate::constants::{
    EFI_PARTITION,
    GPT_ALIGNMENT_BYTES,
    ROOT_PARTITION,
    TYPE_CODE_EFI,
    TYPE_CODE_LUKS,
};
use crate::entity::disk::{DataPartitionDecision, Disk, PartitionEnd, PartitionOp, PartitionPlan};
use crate::entity::{align_up, bytes_to_sectors};
use crate::errors::ProvError;

/// Computes the ordered partition table writes that take `disk` to `plan`.
///
/// Preserve: every partition except the data partition is deleted, EFI is
/// recreated at the start of the disk, and root fills the gap up to the
/// sector before the data partition.
///
/// Create: the table is wiped, EFI and root get their fixed sizes,
/// and the data partition takes everything after root.
pub fn plan(
    disk: &Disk,
    plan: &PartitionPlan,
    decision: &DataPartitionDecision,
) -> Result<Vec<PartitionOp>, ProvError> {
    // 2048 on 512-byte sectors, 256 on 4Kn
    let alignment = bytes_to_sectors(GPT_ALIGNMENT_BYTES, disk.sector_size);

    let efi_start = alignment;
    let efi_end = efi_start + bytes_to_sectors(plan.efi_size, disk.sector_size) - 1;
    let root_start = align_up(efi_end + 1, alignment);

    let efi = PartitionOp::Create {
        number: EFI_PARTITION,
        start: efi_start,
        end: PartitionEnd::Sector(efi_end),
        type_code: TYPE_CODE_EFI.to_string(),
        label: plan.labels.efi.clone(),
    };

    let root = |root_end: u64| PartitionOp::Create {
        number: ROOT_PARTITION,
        start: root_start,
        end: PartitionEnd::Sector(root_end),
        type_code: TYPE_CODE_LUKS.to_string(),
        label: plan.labels.root.clone(),
    };

    let (ops, data_start) = match decision {
        DataPartitionDecision::Create => {
            let root_end = root_start + bytes_to_sectors(plan.root_size, disk.sector_size) - 1;
            let data_start = align_up(root_end + 1, alignment);

            if data_start >= disk.last_usable_sector {
                return Err(ProvError::InvalidPlan(format!(
                    "disk {} too small: root would end at sector {root_end}, last usable sector is {}",
                    disk.path, disk.last_usable_sector
                )));
            }

            let data = PartitionOp::Create {
                number: plan.data_partition,
                start: data_start,
                end: PartitionEnd::Fill,
                type_code: TYPE_CODE_LUKS.to_string(),
                label: plan.labels.data.clone(),
            };

            (vec![PartitionOp::WipeTable, efi, root(root_end), data], data_start)
        }

        DataPartitionDecision::Preserve { number, start } => {
            if *start <= root_start {
                return Err(ProvError::InvalidPlan(format!(
                    "preserved partition {number} starts at sector {start}, \
                    leaving no room for root after EFI (root would start at {root_start})"
                )));
            }

            let mut ops: Vec<PartitionOp> = disk
                .partitions
                .iter()
                .filter(|p| p.number != *number)
                .map(|p| PartitionOp::Delete { number: p.number })
                .collect();

            ops.push(efi);
            ops.push(root(start - 1));

            (ops, *start)
        }
    };

    check_layout(&ops, data_start)?;

    Ok(ops)
}

// Every new partition apart from data must end before the data partition starts
fn check_layout(ops: &[PartitionOp], data_start: u64) -> Result<(), ProvError> {
    for op in ops {
        if let PartitionOp::Create {
            number,
            start,
            end: PartitionEnd::Sector(end),
            ..
        } = op
        {
            if end < start {
                return Err(ProvError::InvalidPlan(format!(
                    "partition {number} ends at {end} before its start {start}"
                )));
            }

            if *end >= data_start {
                return Err(ProvError::InvalidPlan(format!(
                    "partition {number} ends at {end}, overlapping data partition at {data_start}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::disk::{Labels, Partition};

    const GIB: u64 = 1 << 30;

    fn test_plan() -> PartitionPlan {
        PartitionPlan {
            data_partition: 9,
            efi_size: GIB,
            root_size: 150 * GIB,
            labels: Labels {
                efi: "EFI".into(),
                root: "root".into(),
                data: "data".into(),
            },
        }
    }

    fn test_disk(partitions: Vec<Partition>) -> Disk {
        Disk {
            path: "/dev/disk/by-id/X".into(),
            node: "/dev/sda".into(),
            sector_size: 512,
            last_usable_sector: 1_953_525_134,
            partitions,
        }
    }

    fn part(number: u32, start: u64, size: u64) -> Partition {
        Partition {
            number,
            type_guid: "0FC63DAF-8483-4772-8E79-3D69D8477DE4".into(),
            label: None,
            start,
            size,
        }
    }

    fn created(ops: &[PartitionOp]) -> Vec<(u32, u64, PartitionEnd)> {
        ops.iter()
            .filter_map(|op| match op {
                PartitionOp::Create {
                    number, start, end, ..
                } => Some((*number, *start, end.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_plan_create() {
        let ops = plan(&test_disk(vec![]), &test_plan(), &DataPartitionDecision::Create)
            .expect("create plan failed");

        assert_eq!(PartitionOp::WipeTable, ops[0]);
        assert_eq!(
            vec![
                (1, 2048, PartitionEnd::Sector(2099199)),
                (2, 2099200, PartitionEnd::Sector(316671999)),
                (9, 316672000, PartitionEnd::Fill),
            ],
            created(&ops)
        );

        // 1GiB EFI and 150GiB root, in 512-byte sectors
        assert_eq!(2097152, 2099199 - 2048 + 1);
        assert_eq!(150 * 2097152, 316671999 - 2099200 + 1);
    }

    #[test]
    fn test_plan_create_wipes_existing() {
        let disk = test_disk(vec![part(1, 2048, 1000), part(3, 4096, 1000)]);
        let ops = plan(&disk, &test_plan(), &DataPartitionDecision::Create).unwrap();

        assert_eq!(PartitionOp::WipeTable, ops[0]);
        assert!(!ops.iter().any(|op| matches!(op, PartitionOp::Delete { .. })));
        assert_eq!(3, created(&ops).len());
    }

    #[test]
    fn test_plan_preserve() {
        let data_start = 316672000;
        let disk = test_disk(vec![
            part(1, 2048, 2097152),
            part(2, 2099200, 314572800),
            part(3, 316000000, 1000),
            part(9, data_start, 1_000_000),
        ]);

        let decision = DataPartitionDecision::Preserve {
            number: 9,
            start: data_start,
        };

        let ops = plan(&disk, &test_plan(), &decision).expect("preserve plan failed");

        assert_eq!(
            vec![
                PartitionOp::Delete { number: 1 },
                PartitionOp::Delete { number: 2 },
                PartitionOp::Delete { number: 3 },
            ],
            ops[..3].to_vec()
        );
        assert!(!ops.contains(&PartitionOp::WipeTable));
        assert!(!ops.contains(&PartitionOp::Delete { number: 9 }));
        assert_eq!(
            vec![
                (1, 2048, PartitionEnd::Sector(2099199)),
                (2, 2099200, PartitionEnd::Sector(data_start - 1)),
            ],
            created(&ops)
        );
    }

    #[test]
    fn test_plan_preserve_root_fills_gap() {
        // Root always ends right before the data partition, whatever its offset
        for data_start in [2_101_248u64, 10_000_000, 316_672_000, 1_900_000_000] {
            let disk = test_disk(vec![part(9, data_start, 1000)]);
            let decision = DataPartitionDecision::Preserve {
                number: 9,
                start: data_start,
            };

            let ops = plan(&disk, &test_plan(), &decision).unwrap();
            let root = created(&ops).into_iter().find(|(n, _, _)| *n == 2).unwrap();

            assert_eq!(PartitionEnd::Sector(data_start - 1), root.2);
            assert!(root.1 <= data_start - 1);
        }
    }

    #[test]
    fn test_plan_preserve_no_room() {
        // Data partition sits inside where EFI would go
        let disk = test_disk(vec![part(9, 2_000_000, 1000)]);
        let decision = DataPartitionDecision::Preserve {
            number: 9,
            start: 2_000_000,
        };

        assert!(matches!(
            plan(&disk, &test_plan(), &decision),
            Err(ProvError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_plan_disk_too_small() {
        let mut disk = test_disk(vec![]);
        disk.last_usable_sector = 100 * 2097152;

        assert!(matches!(
            plan(&disk, &test_plan(), &DataPartitionDecision::Create),
            Err(ProvError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_plan_4k_sectors() {
        let mut disk = test_disk(vec![]);
        disk.sector_size = 4096;
        disk.last_usable_sector = 244_190_640;

        let ops = plan(&disk, &test_plan(), &DataPartitionDecision::Create).unwrap();

        assert_eq!(
            vec![
                (1, 256, PartitionEnd::Sector(256 + 262144 - 1)),
                (2, 262400, PartitionEnd::Sector(262400 + 39321600 - 1)),
                (9, 39584000, PartitionEnd::Fill),
            ],
            created(&ops)
        );
    }
}
