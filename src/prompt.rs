use inquire::{Password, PasswordDisplayMode, Select};
use tracing::warn;

use crate::entity::secret::Passphrase;
use crate::errors::ProvError;
use crate::zfs::Candidate;

/// Where passphrase entries come from
pub trait PassphraseSource {
    fn read(&mut self, message: &str) -> Result<Passphrase, ProvError>;
}

/// Interactive terminal with hidden input
pub struct Terminal;

impl PassphraseSource for Terminal {
    fn read(&mut self, message: &str) -> Result<Passphrase, ProvError> {
        Password::new(message)
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Hidden)
            .prompt()
            .map(Passphrase::new)
            .map_err(|err| ProvError::Prompt(err.to_string()))
    }
}

pub fn confirm(entry: &Passphrase, confirmation: &Passphrase) -> Result<(), ProvError> {
    if entry != confirmation {
        return Err(ProvError::PassphraseMismatch);
    }

    Ok(())
}

/// Asks for the passphrase twice until both entries match.
/// Two empty entries are accepted.
pub fn read_passphrase(source: &mut dyn PassphraseSource) -> Result<Passphrase, ProvError> {
    loop {
        let entry = source.read("LUKS passphrase:")?;
        let confirmation = source.read("Confirm passphrase:")?;

        match confirm(&entry, &confirmation) {
            Ok(()) => {
                if entry.is_empty() {
                    warn!("empty passphrase, cryptsetup will not accept it");
                }

                return Ok(entry);
            }
            Err(ProvError::PassphraseMismatch) => warn!("passphrases do not match, try again"),
            Err(err) => return Err(err),
        }
    }
}

pub fn select_disk(candidates: Vec<Candidate>) -> Result<Candidate, ProvError> {
    if candidates.is_empty() {
        return Err(ProvError::BadArgs("no candidate disks found".to_string()));
    }

    Select::new("Disk for the zfs pool:", candidates)
        .prompt()
        .map_err(|err| ProvError::Prompt(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct Scripted {
        entries: VecDeque<&'static str>,
        reads: usize,
    }

    impl Scripted {
        fn new(entries: &[&'static str]) -> Self {
            Self {
                entries: entries.iter().copied().collect(),
                reads: 0,
            }
        }
    }

    impl PassphraseSource for Scripted {
        fn read(&mut self, _message: &str) -> Result<Passphrase, ProvError> {
            self.reads += 1;
            self.entries
                .pop_front()
                .map(|e| Passphrase::new(e.to_string()))
                .ok_or_else(|| ProvError::Prompt("input closed".to_string()))
        }
    }

    #[test]
    fn test_read_passphrase() {
        struct Test {
            entries: Vec<&'static str>,
            expected: Option<&'static str>,
            reads: usize,
        }

        let tests = vec![
            Test {
                entries: vec!["hunter2", "hunter2"],
                expected: Some("hunter2"),
                reads: 2,
            },
            Test {
                entries: vec!["hunter2", "hunter3", "a", "b", "hunter2", "hunter2"],
                expected: Some("hunter2"),
                reads: 6,
            },
            Test {
                entries: vec!["", ""],
                expected: Some(""),
                reads: 2,
            },
            Test {
                entries: vec!["", "x"],
                expected: None,
                reads: 3,
            },
        ];

        for test in tests {
            let mut source = Scripted::new(&test.entries);
            let result = read_passphrase(&mut source);

            match test.expected {
                Some(expected) => {
                    let passphrase = result.expect("confirmation loop failed");
                    assert_eq!(Passphrase::new(expected.to_string()), passphrase);
                }
                // Source runs dry while re-prompting
                None => assert!(matches!(result, Err(ProvError::Prompt(_)))),
            }

            assert_eq!(test.reads, source.reads, "entries {:?}", test.entries);
        }
    }

    #[test]
    fn test_confirm() {
        let a = Passphrase::new("one".to_string());
        let b = Passphrase::new("two".to_string());

        assert!(confirm(&a, &a).is_ok());
        assert!(matches!(confirm(&a, &b), Err(ProvError::PassphraseMismatch)));
    }
}
