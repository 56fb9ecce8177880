use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

/// Executes:
/// ```shell
/// mount [-o {opts}] {src} {dst}
/// ```
pub fn mount(host: &dyn Host, src: &str, dst: &str, opts: Option<&str>) -> Result<(), ProvError> {
    let cmd = match opts {
        Some(opts) => Cmd::new("mount").args(["-o", opts, src, dst]),
        None => Cmd::new("mount").args([src, dst]),
    };

    host.exec(&cmd).map(|_| ())
}

pub fn umount(host: &dyn Host, dst: &str) -> Result<(), ProvError> {
    host.exec(&Cmd::new("umount").arg(dst)).map(|_| ())
}

/// Unmounts `dst` and everything mounted below it
pub fn umount_recursive(host: &dyn Host, dst: &str) -> Result<(), ProvError> {
    host.exec(&Cmd::new("umount").args(["-R", dst])).map(|_| ())
}

/// Executes:
/// ```shell
/// mountpoint -q {dst}
/// ```
pub fn is_mountpoint(host: &dyn Host, dst: &str) -> Result<bool, ProvError> {
    Ok(host.run(&Cmd::new("mountpoint").args(["-q", dst]))?.success())
}

/// `subvol={subvolume}` followed by extra btrfs mount options
pub fn subvol_opts(subvolume: &str, extra: &str) -> String {
    match extra.trim() {
        "" => format!("subvol={subvolume}"),
        extra => format!("subvol={subvolume},{extra}"),
    }
}

#[test]
fn test_subvol_opts() {
    assert_eq!("subvol=@", subvol_opts("@", ""));
    assert_eq!("subvol=@home,noatime,compress=zstd", subvol_opts("@home", "noatime,compress=zstd"));
}
