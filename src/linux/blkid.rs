use std::collections::HashMap;

use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

// blkid exits 2 when no signature was found on the device
const BLKID_NOTHING_FOUND: i32 = 2;

// For parsing `blkid -o export` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryBlkid {
    pub dev_type: Option<String>,
    pub uuid: Option<String>,
    pub version: Option<String>,
    pub label: Option<String>,
}

/// Low-level probe of the signature on `device`, bypassing the blkid cache.
/// Returns `None` if the device carries no recognizable signature.
///
/// Executes:
/// ```shell
/// blkid -p -o export {device}
/// ```
pub fn probe(host: &dyn Host, device: &str) -> Result<Option<EntryBlkid>, ProvError> {
    let cmd = Cmd::new("blkid").args(["-p", "-o", "export", device]);
    let out = host.run(&cmd)?;

    match out.status {
        Some(0) => Ok(Some(parse_export(&out.stdout))),
        Some(BLKID_NOTHING_FOUND) => Ok(None),
        status => Err(ProvError::SubsystemCommandFailed {
            command: cmd.to_string(),
            status,
            stderr: out.stderr.trim().to_string(),
            error: None,
        }),
    }
}

pub(crate) fn parse_export(output: &str) -> EntryBlkid {
    let fields: HashMap<&str, &str> = output
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .collect();

    let get = |key: &str| fields.get(key).map(|v| v.to_string());

    EntryBlkid {
        dev_type: get("TYPE"),
        uuid: get("UUID"),
        version: get("VERSION"),
        label: get("LABEL"),
    }
}

#[test]
fn test_parse_export() {
    let luks = "DEVNAME=/dev/sda9\nUUID=4f0c1d2e-aaaa-bbbb-cccc-123456789abc\nVERSION=2\nTYPE=crypto_LUKS\nUSAGE=crypto\nPART_ENTRY_NUMBER=9\n";
    let entry = parse_export(luks);

    assert_eq!(Some("crypto_LUKS".to_string()), entry.dev_type);
    assert_eq!(Some("2".to_string()), entry.version);
    assert_eq!(None, entry.label);

    let btrfs = "DEVNAME=/dev/mapper/cryptdata\nLABEL=data\nUUID=0e8d\nUUID_SUB=77aa\nBLOCK_SIZE=4096\nTYPE=btrfs\n";
    let entry = parse_export(btrfs);

    assert_eq!(Some("btrfs".to_string()), entry.dev_type);
    assert_eq!(Some("data".to_string()), entry.label);

    assert_eq!(EntryBlkid::default(), parse_export(""));
}
