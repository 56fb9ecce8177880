use std::fmt;

use thiserror::Error;

use crate::entity::action::Action;

#[derive(Debug, Error)]
pub enum ProvError {
    #[error("no such block device: {0}")]
    DeviceNotFound(String),

    #[error("preserved data partition {partition} failed validation: {reason}")]
    PreservedDataValidationFailed {
        partition: String,
        reason: PreserveFailure,
    },

    #[error("passphrase confirmation does not match")]
    PassphraseMismatch,

    #[error("empty passphrase: cryptsetup does not accept an empty key on stdin")]
    EmptyPassphrase,

    #[error("pool {pool} exists but its key file {key_file} is missing")]
    MissingKeyFile { pool: String, key_file: String },

    #[error("partition {path} did not appear after {attempts} attempts")]
    PartitionNotReady { path: String, attempts: u32 },

    #[error("failed to unlock {device} as {name}")]
    UnlockFailed { device: String, name: String },

    #[error("command `{command}` failed ({}): {stderr}", fmt_status(.status))]
    SubsystemCommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
        #[source]
        error: Option<std::io::Error>,
    },

    #[error("file error: {1}")]
    FileError(#[source] std::io::Error, String),

    #[error("bad manifest: {0}")]
    BadManifest(String),

    #[error("required programs not found in PATH: {0}")]
    MissingCommands(String),

    #[error("bad cli arguments: {0}")]
    BadArgs(String),

    #[error("invalid partition plan: {0}")]
    InvalidPlan(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("provisioning error: {error}")]
    ApplyError {
        error: Box<ProvError>,
        action_failed: Box<Action>,
        actions_performed: Vec<Action>,
    },

    #[error("cryptprov-rs bug: {0}")]
    CryptProvBug(String),
}

impl ProvError {
    /// Returns the error that actually stopped the pipeline,
    /// looking through `ApplyError` wrappers.
    pub fn root_cause(&self) -> &ProvError {
        match self {
            Self::ApplyError { error, .. } => error.root_cause(),
            _ => self,
        }
    }
}

/// Which of the preservation checks rejected the data partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreserveFailure {
    NotEncrypted { found: Option<String> },
    Unlock { stderr: String },
    StaleMapper(String),
    WrongFilesystem { found: Option<String> },
    MissingSubvolume(String),
}

impl fmt::Display for PreserveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEncrypted { found } => {
                write!(f, "expected crypto_LUKS signature, found {}", found.as_deref().unwrap_or("nothing"))
            }
            Self::Unlock { stderr } => write!(f, "does not unlock with the supplied passphrase: {stderr}"),
            Self::StaleMapper(name) => write!(f, "mapper {name} is already open"),
            Self::WrongFilesystem { found } => {
                write!(f, "expected btrfs inside LUKS, found {}", found.as_deref().unwrap_or("nothing"))
            }
            Self::MissingSubvolume(name) => write!(f, "missing btrfs subvolume {name}"),
        }
    }
}

fn fmt_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit status {code}"),
        None => "no exit status".to_string(),
    }
}
