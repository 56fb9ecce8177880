use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

/// Executes:
/// ```shell
/// blockdev --getss {device}
/// ```
pub fn sector_size(host: &dyn Host, device: &str) -> Result<u64, ProvError> {
    let out = host.exec(&Cmd::new("blockdev").args(["--getss", device]))?;
    parse_number(&out, "sector size", device)
}

/// Executes:
/// ```shell
/// blockdev --getsize64 {device}
/// ```
pub fn size_bytes(host: &dyn Host, device: &str) -> Result<u64, ProvError> {
    let out = host.exec(&Cmd::new("blockdev").args(["--getsize64", device]))?;
    parse_number(&out, "size", device)
}

/// Asks the kernel to re-read the partition table of `device`.
/// The new nodes show up asynchronously.
pub fn reread_cmd(device: &str) -> Cmd {
    Cmd::new("partprobe").arg(device)
}

fn parse_number(out: &str, what: &str, device: &str) -> Result<u64, ProvError> {
    out.trim().parse::<u64>().map_err(|err| {
        ProvError::CryptProvBug(format!("unexpected blockdev {what} output for {device}: {out:?}: {err}"))
    })
}

#[test]
fn test_parse_number() {
    assert_eq!(512, parse_number("512\n", "sector size", "/dev/sda").unwrap());
    assert!(parse_number("", "size", "/dev/sda").is_err());
    assert!(parse_number("blockdev: cannot open", "size", "/dev/sda").is_err());
}
