use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

/// Fixed tuning for the data pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    pub ashift: u8,
    pub compression: String,
    pub key_file: String,
}

/// Executes:
/// ```shell
/// zpool list -H -o name {pool}
/// ```
pub fn exists(host: &dyn Host, pool: &str) -> Result<bool, ProvError> {
    let out = host.run(&Cmd::new("zpool").args(["list", "-H", "-o", "name", pool]))?;

    Ok(out.success() && out.stdout.lines().any(|line| line.trim() == pool))
}

/// ```shell
/// zpool create -o ashift={ashift} \
///     -O compression={compression} -O acltype=posixacl -O xattr=sa \
///     -O encryption=aes-256-gcm -O keyformat=raw -O keylocation=file://{key_file} \
///     -O mountpoint=none {pool} {device}
/// ```
pub fn create_cmd(pool: &str, device: &str, opts: &PoolOptions) -> Cmd {
    Cmd::new("zpool")
        .arg("create")
        .args(["-o", &format!("ashift={}", opts.ashift)])
        .args(["-O", &format!("compression={}", opts.compression)])
        .args(["-O", "acltype=posixacl"])
        .args(["-O", "xattr=sa"])
        .args(["-O", "encryption=aes-256-gcm"])
        .args(["-O", "keyformat=raw"])
        .args(["-O", &format!("keylocation=file://{}", opts.key_file)])
        .args(["-O", "mountpoint=none"])
        .args([pool, device])
}

pub fn create(host: &dyn Host, pool: &str, device: &str, opts: &PoolOptions) -> Result<(), ProvError> {
    host.exec(&create_cmd(pool, device, opts)).map(|_| ())
}

#[test]
fn test_create_cmd() {
    let opts = PoolOptions {
        ashift: 12,
        compression: "lz4".into(),
        key_file: "/etc/zfs/keys/zdata.key".into(),
    };

    let cmd = create_cmd("zdata", "/dev/disk/by-id/ata-X-part9", &opts).to_string();

    assert!(cmd.starts_with("zpool create -o ashift=12 -O compression=lz4"));
    assert!(cmd.contains("-O keylocation=file:///etc/zfs/keys/zdata.key"));
    assert!(cmd.ends_with("-O mountpoint=none zdata /dev/disk/by-id/ata-X-part9"));
}
