//! autoprint - Unattended printing of order emails
//!
//! This crate polls an IMAP folder for messages whose subject starts with a
//! configured prefix, renders each one to a temporary HTML file and prints
//! it through a local Chromium-family browser. Handled messages are
//! recorded in an append-only ledger so they are printed at most once per
//! ledger.

pub mod app;
pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;

pub use app::App;
