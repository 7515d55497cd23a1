//! Domain types for the print pipeline.
//!
//! Identifiers, decoded messages and job outcomes shared by the mailbox
//! providers, the storage layer and the poll orchestrator.

mod message;
mod types;

pub use message::{
    escape_html, plain_text_shell, subject_matches_prefix, DecodedMessage, JobOutcome, MessageRef,
    EMPTY_BODY_HTML,
};
pub use types::Uid;
