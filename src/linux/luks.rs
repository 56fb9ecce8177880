use crate::constants::DEV_MAPPER;
use crate::entity::secret::Passphrase;
use crate::errors::ProvError;
use crate::host::Host;
use crate::utils::shell::Cmd;

// libcryptsetup bindings: https://github.com/stratis-storage/libcryptsetup-rs/
// The passphrase is always fed through stdin with --key-file=-,
// so cryptsetup reads it verbatim (no trailing newline).

pub fn mapper_path(name: &str) -> String {
    format!("{DEV_MAPPER}/{name}")
}

/// Executes:
/// ```shell
/// cryptsetup luksFormat --type luks2 --batch-mode --key-file=- {device}
/// ```
pub fn format(host: &dyn Host, device: &str, passphrase: &Passphrase) -> Result<(), ProvError> {
    let cmd = Cmd::new("cryptsetup")
        .args(["luksFormat", "--type", "luks2", "--batch-mode", "--key-file=-", device])
        .secret(passphrase);

    host.exec(&cmd).map(|_| ())
}

fn open_cmd(device: &str, name: &str, readonly: bool, passphrase: &Passphrase) -> Cmd {
    let mut cmd = Cmd::new("cryptsetup").args(["open", "--type", "luks2", "--key-file=-"]);
    if readonly {
        cmd = cmd.arg("--readonly");
    }

    cmd.args([device, name]).secret(passphrase)
}

/// Opens `device` as /dev/mapper/{name}
///
/// Executes:
/// ```shell
/// cryptsetup open --type luks2 --key-file=- {device} {name}
/// ```
pub fn open(host: &dyn Host, device: &str, name: &str, passphrase: &Passphrase) -> Result<(), ProvError> {
    host.exec(&open_cmd(device, name, false, passphrase)).map(|_| ())
}

/// Like [open], but reports a rejected passphrase (or any other refusal)
/// as `Ok(Err(stderr))` instead of an error.
pub fn try_open(
    host: &dyn Host,
    device: &str,
    name: &str,
    readonly: bool,
    passphrase: &Passphrase,
) -> Result<Result<(), String>, ProvError> {
    let out = host.run(&open_cmd(device, name, readonly, passphrase))?;
    if out.success() {
        return Ok(Ok(()));
    }

    Ok(Err(out.stderr.trim().to_string()))
}

/// Executes:
/// ```shell
/// cryptsetup close {name}
/// ```
pub fn close(host: &dyn Host, name: &str) -> Result<(), ProvError> {
    host.exec(&Cmd::new("cryptsetup").args(["close", name])).map(|_| ())
}

pub fn is_open(host: &dyn Host, name: &str) -> bool {
    host.exists(&mapper_path(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::utils::shell::CmdOutput;

    #[test]
    fn test_luks_cmds() {
        let host = FakeHost::new();
        let pass = Passphrase::new("pass1234".to_string());

        format(&host, "/dev/sda2", &pass).expect("luksFormat failed");
        open(&host, "/dev/sda2", "cryptroot", &pass).expect("open failed");
        close(&host, "cryptroot").expect("close failed");

        assert_eq!(
            vec![
                "cryptsetup luksFormat --type luks2 --batch-mode --key-file=- /dev/sda2",
                "cryptsetup open --type luks2 --key-file=- /dev/sda2 cryptroot",
                "cryptsetup close cryptroot",
            ],
            host.commands(),
        );

        assert!(host.fed_stdin("cryptsetup luksFormat"));
        assert!(host.fed_stdin("cryptsetup open"));
        assert!(!host.fed_stdin("cryptsetup close"));
        assert!(host.commands().iter().all(|c| !c.contains("pass1234")));
    }

    #[test]
    fn test_try_open_rejected() {
        let host = FakeHost::new().respond(
            "cryptsetup open",
            CmdOutput::failed(2, "No key available with this passphrase."),
        );
        let pass = Passphrase::new("wrong".to_string());

        let opened = try_open(&host, "/dev/sda9", "cryptdata-verify", true, &pass).unwrap();
        assert_eq!(Err("No key available with this passphrase.".to_string()), opened);
        assert!(host.commands()[0].contains("--readonly"));

        assert!(open(&host, "/dev/sda9", "cryptdata", &pass).is_err());
    }
}
