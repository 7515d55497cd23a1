//! Core identifier types.
//!
//! The newtype wrapper keeps mailbox identifiers from being mixed up with
//! arbitrary strings such as subjects or file names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-assigned IMAP UID, kept in its string form.
///
/// The string form is what the ledger persists, so two UIDs compare equal
/// exactly when their ledger lines would.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(pub String);

impl Uid {
    /// Returns the UID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<u32> for Uid {
    fn from(uid: u32) -> Self {
        Self(uid.to_string())
    }
}
