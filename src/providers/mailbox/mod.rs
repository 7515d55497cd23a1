//! Mailbox client implementations.
//!
//! This module contains the [`MailboxClient`] trait and its IMAP
//! implementation, [`ImapMailbox`].
//!
//! # Architecture
//!
//! The poll orchestrator only sees the trait. Each cycle it disconnects any
//! stale session, reconnects, searches by subject prefix and then works
//! through the returned UIDs one at a time:
//!
//! ```text
//! connect -> search_by_subject -> fetch_raw -> (print) -> delete? -> mark_seen
//! ```
//!
//! `mark_seen` and `delete` are best effort; the orchestrator logs their
//! failures and carries on.

mod imap;
mod traits;

pub use imap::{ImapCredentials, ImapMailbox, KEYCHAIN_SERVICE, PASSWORD_ENV};
#[cfg(test)]
pub use traits::MockMailboxClient;
pub use traits::{MailboxClient, MailboxError, Result};
