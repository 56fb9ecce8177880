use crate::entity::report::Report;
use crate::errors::ProvError;
use crate::host::Host;
use crate::manifest::Manifest;
use crate::prompt::{self, Terminal};
use crate::provision;

pub(super) fn run(host: &dyn Host, manifest: &Manifest, dry_run: bool) -> Result<Report, ProvError> {
    let config = manifest.config(super::install_location())?;

    // Validation needs the passphrase even for a dry run
    let passphrase = prompt::read_passphrase(&mut Terminal)?;

    provision::provision(host, &config, passphrase, dry_run)
}
