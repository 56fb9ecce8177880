pub mod blkid;
pub mod blockdev;
pub mod btrfs;
pub mod luks;
pub mod mkfs;
pub mod mount;
pub mod sfdisk;
pub mod sgdisk;
pub mod user;
pub mod zpool;

// udev names partitions of a by-id link "<link>-part<N>".
// For kernel nodes, see linux/block/partition-generic.c:
//
// char *disk_name(struct gendisk *hd, int partno, char *buf)
// {
// 	if (!partno)
// 		snprintf(buf, BDEVNAME_SIZE, "%s", hd->disk_name);
// 	else if (isdigit(hd->disk_name[strlen(hd->disk_name)-1]))
// 		snprintf(buf, BDEVNAME_SIZE, "%sp%d", hd->disk_name, partno);
// 	else
// 		snprintf(buf, BDEVNAME_SIZE, "%s%d", hd->disk_name, partno);
// 	return buf;
// }
//
pub(crate) fn partition_name(name: &str, part_number: u32) -> String {
    if name.starts_with("/dev/disk/by-") {
        return format!("{name}-part{part_number}");
    }

    match name.chars().last() {
        Some(c) if c.is_numeric() => format!("{name}p{part_number}"),
        _ => format!("{name}{part_number}"),
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_partition_name() {
        use std::collections::HashMap;

        use super::partition_name;

        let tests = HashMap::from([
            (("/dev/nvme0n1", 1u32), "/dev/nvme0n1p1"),
            (("/dev/mmcblk7", 2u32), "/dev/mmcblk7p2"),
            (("/dev/vdb", 10u32), "/dev/vdb10"),
            (("/dev/sda", 9u32), "/dev/sda9"),
            (("/dev/disk/by-id/nvme-Samsung_SSD_970_S46", 9u32), "/dev/disk/by-id/nvme-Samsung_SSD_970_S46-part9"),
            (("/dev/disk/by-id/ata-WDC_WD40", 1u32), "/dev/disk/by-id/ata-WDC_WD40-part1"),
        ]);

        for ((device, part_num), expected) in tests {
            let result = partition_name(device, part_num);

            assert_eq!(expected, result.as_str());
        }
    }
}
