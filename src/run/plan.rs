use crate::entity::report::Preview;
use crate::errors::ProvError;
use crate::host::Host;
use crate::manifest::Manifest;
use crate::provision;

pub(super) fn run(host: &dyn Host, manifest: &Manifest) -> Result<Preview, ProvError> {
    let config = manifest.config(super::install_location())?;

    provision::preview(host, &config)
}
