use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::time::Duration;

use tracing::debug;

use crate::errors::ProvError;
use crate::utils::shell::{self, Cmd, CmdOutput};
use crate::utils::fs::{file_exists, is_block_device};

/// Everything the provisioner does to the machine goes through a `Host`,
/// which lets the state machine be exercised against a scripted fake.
pub trait Host {
    /// Runs `cmd` to completion; a non-zero exit is not an error here
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ProvError>;

    fn is_block_device(&self, path: &str) -> bool;

    fn exists(&self, path: &str) -> bool;

    /// Entry names (not full paths) of `dir`
    fn read_dir(&self, dir: &str) -> Result<Vec<String>, ProvError>;

    fn canonicalize(&self, path: &str) -> Result<String, ProvError>;

    fn mkdir_p(&self, path: &str) -> Result<(), ProvError>;

    /// Creates `path` with mode 0400. Fails if `path` already exists.
    fn write_secret(&self, path: &str, bytes: &[u8]) -> Result<(), ProvError>;

    fn sleep(&self, duration: Duration);

    /// Runs `cmd` and maps a non-zero exit to `SubsystemCommandFailed`
    fn exec(&self, cmd: &Cmd) -> Result<String, ProvError> {
        let out = self.run(cmd)?;
        if !out.success() {
            return Err(ProvError::SubsystemCommandFailed {
                command: cmd.to_string(),
                status: out.status,
                stderr: out.stderr.trim().to_string(),
                error: None,
            });
        }

        Ok(out.stdout)
    }
}

/// The live system
pub struct SystemHost;

impl Host for SystemHost {
    fn run(&self, cmd: &Cmd) -> Result<CmdOutput, ProvError> {
        debug!(cmd = %cmd, stdin = cmd.has_stdin(), "running command");
        let out = shell::run(cmd)?;
        debug!(cmd = %cmd, status = ?out.status, "command finished");

        Ok(out)
    }

    fn is_block_device(&self, path: &str) -> bool {
        is_block_device(path)
    }

    fn exists(&self, path: &str) -> bool {
        file_exists(path)
    }

    fn read_dir(&self, dir: &str) -> Result<Vec<String>, ProvError> {
        let entries = fs::read_dir(dir)
            .map_err(|err| ProvError::FileError(err, format!("failed to read directory {dir}")))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| ProvError::FileError(err, format!("failed to read entry in {dir}")))?;

            names.push(entry.file_name().to_string_lossy().into_owned());
        }

        Ok(names)
    }

    fn canonicalize(&self, path: &str) -> Result<String, ProvError> {
        fs::canonicalize(path)
            .map(|p| p.to_string_lossy().into_owned())
            .map_err(|err| ProvError::FileError(err, format!("failed to resolve {path}")))
    }

    fn mkdir_p(&self, path: &str) -> Result<(), ProvError> {
        fs::create_dir_all(path)
            .map_err(|err| ProvError::FileError(err, format!("failed to create directory {path}")))
    }

    fn write_secret(&self, path: &str, bytes: &[u8]) -> Result<(), ProvError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o400)
            .open(path)
            .map_err(|err| ProvError::FileError(err, format!("failed to create secret file {path}")))?;

        file.write_all(bytes)
            .and_then(|_| file.sync_all())
            .map_err(|err| ProvError::FileError(err, format!("failed to write secret file {path}")))
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}
