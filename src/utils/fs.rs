use nix::sys::stat::{stat, SFlag};

pub fn file_exists<P>(path: P) -> bool
where
    P: AsRef<std::path::Path>,
{
    path.as_ref().exists()
}

/// Follows symlinks, so /dev/disk/by-id paths resolve to their node
pub fn is_block_device<P>(path: P) -> bool
where
    P: AsRef<std::path::Path>,
{
    match stat(path.as_ref()) {
        Ok(st) => SFlag::from_bits_truncate(st.st_mode) & SFlag::S_IFMT == SFlag::S_IFBLK,
        Err(_) => false,
    }
}

#[test]
fn test_is_block_device() {
    assert!(!is_block_device("/etc/hostname-does-not-exist"));
    assert!(!is_block_device("/"));
}
