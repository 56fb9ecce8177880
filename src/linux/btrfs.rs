use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

/// Names of the subvolumes of the btrfs mounted at `mountpoint`
///
/// Executes:
/// ```shell
/// btrfs subvolume list {mountpoint}
/// ```
pub fn list_subvolumes(host: &dyn Host, mountpoint: &str) -> Result<Vec<String>, ProvError> {
    let out = host.exec(&Cmd::new("btrfs").args(["subvolume", "list", mountpoint]))?;

    Ok(parse_subvolume_list(&out))
}

/// Executes:
/// ```shell
/// btrfs subvolume create {mountpoint}/{name}
/// ```
pub fn create_subvolume(host: &dyn Host, mountpoint: &str, name: &str) -> Result<(), ProvError> {
    let path = format!("{}/{name}", mountpoint.trim_end_matches('/'));

    host.exec(&Cmd::new("btrfs").args(["subvolume", "create", &path]))
        .map(|_| ())
}

// Lines look like:
// ID 256 gen 10 top level 5 path @
pub(crate) fn parse_subvolume_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_once(" path "))
        .map(|(_, path)| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect()
}

#[test]
fn test_parse_subvolume_list() {
    let output = "ID 256 gen 10 top level 5 path @\nID 257 gen 11 top level 5 path @home\nID 258 gen 9 top level 5 path @data/snapshots\n\n";

    assert_eq!(
        vec!["@", "@home", "@data/snapshots"],
        parse_subvolume_list(output)
    );

    assert!(parse_subvolume_list("").is_empty());
}
