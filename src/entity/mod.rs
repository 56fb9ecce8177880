pub mod action;
pub mod disk;
pub mod report;
pub mod secret;

use humanize_rs::bytes;

use crate::errors::ProvError;

pub fn parse_human_bytes(s: &str) -> std::result::Result<bytes::Bytes, ProvError> {
    (s.to_lowercase())
        .parse::<bytes::Bytes>()
        .map_err(|err| ProvError::BadManifest(format!("bad byte unit string {s}: {err}")))
}

/// Converts a byte count into whole sectors, rounding up so that
/// the resulting partition is never smaller than requested.
pub fn bytes_to_sectors(bytes: u64, sector_size: u64) -> u64 {
    bytes.div_ceil(sector_size)
}

/// Rounds `sector` up to the next multiple of `alignment`
pub fn align_up(sector: u64, alignment: u64) -> u64 {
    sector.div_ceil(alignment) * alignment
}

#[test]
#[rustfmt::skip]
fn test_parse_human_bytes() {
    let valids: Vec<(&str, u64)> = vec![
        ("1GiB", 1 << 30), ("1gib", 1 << 30), ("1Gi", 1 << 30),
        ("150GiB", 150 << 30), ("512MiB", 512 << 20), ("1ki", 1 << 10),
        ("0g", 0),
    ];

    for (v, expected) in valids {
        match parse_human_bytes(v) {
            Ok(b) => assert_eq!(expected as usize, b.size(), "bad size for {v}"),
            Err(err) => panic!("{v} should be valid, but was invalid: {err}"),
        }
    }

    let invalids = vec![
        "GiB", "-1 GiB", "0.5 GiB", "10.29 MiB", "kibibyte", "2000EiB",
    ];

    for v in invalids {
        if let Ok(bytes) = parse_human_bytes(v) {
            panic!("{v} should be invalid, but got {bytes:?}");
        }
    }
}

#[test]
fn test_sector_math() {
    assert_eq!(2097152, bytes_to_sectors(1 << 30, 512));
    assert_eq!(262144, bytes_to_sectors(1 << 30, 4096));
    assert_eq!(1, bytes_to_sectors(1, 512));

    assert_eq!(2048, align_up(1, 2048));
    assert_eq!(2048, align_up(2048, 2048));
    assert_eq!(2099200, align_up(2099200, 2048));
    assert_eq!(4096, align_up(2049, 2048));
}
