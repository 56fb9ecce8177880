use crate::errors::ProvError;
use crate::host::Host;
use crate::zfs;

pub(super) fn run(host: &dyn Host) -> Result<(), ProvError> {
    for candidate in zfs::candidates(host)? {
        println!("{candidate}");
    }

    Ok(())
}
