//! External collaborator implementations.
//!
//! This module contains provider traits and implementations for the two
//! things the service talks to outside the process:
//!
//! - [`mailbox`] - The IMAP mailbox messages are read from
//! - [`engine`] - The browser that renders and prints artifacts

pub mod engine;
pub mod mailbox;
