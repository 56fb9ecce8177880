use std::fmt;

use zeroize::Zeroizing;

/// The shared LUKS passphrase for root and data volumes.
///
/// Only ever lives in memory: the buffer is wiped on drop,
/// `Debug` is redacted, and tools receive it over stdin.
pub struct Passphrase(Zeroizing<String>);

impl Passphrase {
    pub fn new(passphrase: String) -> Self {
        Self(Zeroizing::new(passphrase))
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Passphrase {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passphrase(<redacted>)")
    }
}

#[test]
fn test_passphrase_debug_redacted() {
    let pass = Passphrase::new("hunter2".to_string());
    let debug = format!("{pass:?}");

    assert!(!debug.contains("hunter2"));
    assert_eq!(b"hunter2", pass.as_bytes());
}
