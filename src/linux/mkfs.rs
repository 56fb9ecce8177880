use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

/// Executes:
/// ```shell
/// mkfs.btrfs -f -L {label} {device}
/// ```
pub fn create_btrfs(host: &dyn Host, device: &str, label: &str) -> Result<(), ProvError> {
    host.exec(&Cmd::new("mkfs.btrfs").args(["-f", "-L", label, device]))
        .map(|_| ())
}

/// Executes:
/// ```shell
/// mkfs.fat -F 32 -n {label} {device}
/// ```
pub fn create_fat32(host: &dyn Host, device: &str, label: &str) -> Result<(), ProvError> {
    host.exec(&Cmd::new("mkfs.fat").args(["-F", "32", "-n", label, device]))
        .map(|_| ())
}
