use std::env;
use std::fmt;
use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use zeroize::Zeroizing;

use crate::entity::secret::Passphrase;
use crate::errors::ProvError;

/// An external program invocation.
///
/// Secrets are attached as stdin payload only,
/// so they never show up in argv, logs or `Display` output.
#[derive(Clone)]
pub struct Cmd {
    program: String,
    args: Vec<String>,
    stdin: Option<Zeroizing<Vec<u8>>>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            stdin: None,
        }
    }

    pub fn arg<S: AsRef<str>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_string()));
        self
    }

    pub fn secret(mut self, passphrase: &Passphrase) -> Self {
        self.stdin = Some(Zeroizing::new(passphrase.as_bytes().to_vec()));
        self
    }

    pub fn has_stdin(&self) -> bool {
        self.stdin.is_some()
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words: Vec<String> = std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| quote(word))
            .collect();

        write!(f, "{}", words.join(" "))
    }
}

// Leaves option-looking words like --new=2:0:0 or subvol=@,noatime readable
fn quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "+-./:@_=,%".contains(c));

    if plain {
        return word.to_string();
    }

    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .unwrap_or_else(|_| format!("{word:?}"))
}

impl fmt::Debug for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cmd")
            .field("cmd", &self.to_string())
            .field("stdin", &self.stdin.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdOutput {
    // None if terminated by signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn ok(stdout: &str) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stderr: &str) -> Self {
        Self {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Spawns `cmd`, feeds its stdin payload if any, and waits for it.
/// Only spawn/wait failures are errors here; callers decide what
/// a non-zero exit status means.
pub fn run(cmd: &Cmd) -> Result<CmdOutput, ProvError> {
    let spawn_failed = |err: std::io::Error, context: &str| ProvError::SubsystemCommandFailed {
        command: cmd.to_string(),
        status: None,
        stderr: context.to_string(),
        error: Some(err),
    };

    let mut command = Command::new(&cmd.program);
    command.args(&cmd.args).stdout(Stdio::piped()).stderr(Stdio::piped());

    if cmd.stdin.is_some() {
        command.stdin(Stdio::piped());
    } else {
        command.stdin(Stdio::null());
    }

    let mut child = command
        .spawn()
        .map_err(|err| spawn_failed(err, "failed to spawn"))?;

    if let (Some(payload), Some(mut stdin)) = (&cmd.stdin, child.stdin.take()) {
        stdin
            .write_all(payload)
            .map_err(|err| spawn_failed(err, "failed to write stdin"))?;
        // stdin is dropped here, closing the pipe
    }

    let output = child
        .wait_with_output()
        .map_err(|err| spawn_failed(err, "failed to wait"))?;

    Ok(CmdOutput {
        status: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

pub fn in_path(program: &str) -> bool {
    if let Ok(path) = env::var("PATH") {
        for p in path.split(':') {
            let p_str = format!("{}/{}", p, program);
            if fs::metadata(p_str).is_ok() {
                return true;
            }
        }
    }

    false
}

#[test]
fn test_cmd_display() {
    let pass = Passphrase::new("s3cret pass".to_string());
    let cmd = Cmd::new("cryptsetup")
        .args(["open", "/dev/sda9"])
        .arg("my data")
        .secret(&pass);

    let shown = cmd.to_string();
    assert!(shown.starts_with("cryptsetup open /dev/sda9 "));
    assert!(shown.contains("my data"));
    assert!(!shown.contains("s3cret"));
    assert!(!format!("{cmd:?}").contains("s3cret"));
    assert!(cmd.has_stdin());
}

#[ignore]
#[test]
fn test_run() {
    let out = run(&Cmd::new("echo").arg("hello, world!")).expect("failed to run echo");
    assert!(out.success());
    assert_eq!("hello, world!\n", out.stdout);

    let pass = Passphrase::new("piped".to_string());
    let out = run(&Cmd::new("cat").secret(&pass)).expect("failed to run cat");
    assert_eq!("piped", out.stdout);

    let out = run(&Cmd::new("sh").args(["-c", "exit 3"])).expect("failed to run sh");
    assert_eq!(Some(3), out.status);
}
