//! Mailbox client trait definition.
//!
//! This module defines the [`MailboxClient`] trait which abstracts the IMAP
//! transport away from the poll orchestrator, so the orchestrator can be
//! driven by a mock in tests.

use async_trait::async_trait;

use crate::domain::Uid;

/// Result type alias for mailbox operations.
pub type Result<T> = std::result::Result<T, MailboxError>;

/// Errors that can occur during mailbox operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MailboxError {
    /// Network, TLS, authentication or protocol failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The message disappeared between search and fetch.
    #[error("not found: {0}")]
    NotFound(String),
}

/// A connection to one mailbox folder.
///
/// Implementations hold no state across cycles other than the connection
/// handle; the orchestrator disconnects and reconnects every cycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailboxClient: Send {
    /// Opens an authenticated session and selects the configured folder.
    async fn connect(&mut self) -> Result<()>;

    /// Returns UIDs whose subject contains `prefix`, in ascending order.
    async fn search_by_subject(&mut self, prefix: &str) -> Result<Vec<Uid>>;

    /// Fetches the full RFC 5322 message without setting `\Seen`.
    async fn fetch_raw(&mut self, uid: &Uid) -> Result<Vec<u8>>;

    /// Sets the `\Seen` flag.
    async fn mark_seen(&mut self, uid: &Uid) -> Result<()>;

    /// Flags the message `\Deleted` and expunges the folder.
    async fn delete(&mut self, uid: &Uid) -> Result<()>;

    /// Closes the session. Safe to call when not connected.
    async fn disconnect(&mut self);
}
