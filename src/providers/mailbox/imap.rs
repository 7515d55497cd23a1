//! IMAP mailbox client implementation.
//!
//! This module provides a [`MailboxClient`] implementation on top of
//! `async-imap`. The connection is either implicit TLS (rustls with the
//! webpki root store) or plaintext, for local bridges that terminate TLS
//! themselves.
//!
//! # Protocol Details
//!
//! - Messages are located with `UID SEARCH SUBJECT`
//! - Bodies are fetched with `BODY.PEEK[]` so that a failed print leaves the
//!   message unseen
//! - Deletion is `UID STORE +FLAGS (\Deleted)` followed by `EXPUNGE`

use async_imap::types::Fetch;
use async_trait::async_trait;
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tokio_util::compat::TokioAsyncReadCompatExt;

use super::{MailboxClient, MailboxError, Result};
use crate::config::MailboxSettings;
use crate::domain::Uid;

/// Keychain service name under which IMAP passwords are looked up.
pub const KEYCHAIN_SERVICE: &str = "autoprint";

/// Environment variable consulted when the settings carry no password.
pub const PASSWORD_ENV: &str = "AUTOPRINT_IMAP_PASSWORD";

/// Byte stream the IMAP session runs over, TLS or plain.
trait ImapStream:
    futures::AsyncRead + futures::AsyncWrite + Unpin + Send + Sync + std::fmt::Debug
{
}

impl<T> ImapStream for T where
    T: futures::AsyncRead + futures::AsyncWrite + Unpin + Send + Sync + std::fmt::Debug
{
}

type ImapSession = async_imap::Session<Box<dyn ImapStream>>;

/// Login credentials for the mailbox.
#[derive(Clone)]
pub struct ImapCredentials {
    /// Username (usually email address).
    pub username: String,
    /// Password or app-specific password.
    pub password: String,
}

impl std::fmt::Debug for ImapCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ImapCredentials {
    /// Keychain key for a username.
    pub fn keychain_key(username: &str) -> String {
        format!("imap.{}", username)
    }

    /// Resolves the password from the settings, then the environment, then
    /// the system keychain.
    pub async fn resolve(settings: &MailboxSettings) -> Result<Self> {
        let username = settings.username.clone();

        if let Some(password) = settings.password.clone().filter(|p| !p.is_empty()) {
            return Ok(Self { username, password });
        }

        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                tracing::debug!("using IMAP password from {}", PASSWORD_ENV);
                return Ok(Self { username, password });
            }
        }

        let key = Self::keychain_key(&username);
        let password = tokio::task::spawn_blocking(move || {
            keyring::Entry::new(KEYCHAIN_SERVICE, &key).and_then(|entry| entry.get_password())
        })
        .await
        .map_err(|e| MailboxError::Transport(format!("keychain task failed: {}", e)))?
        .map_err(|e| {
            MailboxError::Transport(format!(
                "no password in settings, {} or keychain: {}",
                PASSWORD_ENV, e
            ))
        })?;

        tracing::debug!("using IMAP password from system keychain");
        Ok(Self { username, password })
    }
}

/// IMAP mailbox client.
///
/// # Example
///
/// ```ignore
/// use autoprint::providers::mailbox::{ImapCredentials, ImapMailbox, MailboxClient};
///
/// let credentials = ImapCredentials::resolve(&settings.mailbox).await?;
/// let mut mailbox = ImapMailbox::new(settings.mailbox.clone(), credentials);
/// mailbox.connect().await?;
/// let uids = mailbox.search_by_subject("[PRINT]").await?;
/// ```
pub struct ImapMailbox {
    settings: MailboxSettings,
    credentials: ImapCredentials,
    session: Option<ImapSession>,
}

impl ImapMailbox {
    /// Creates a client; no connection is made until [`MailboxClient::connect`].
    pub fn new(settings: MailboxSettings, credentials: ImapCredentials) -> Self {
        Self {
            settings,
            credentials,
            session: None,
        }
    }

    /// Returns whether a session is currently open.
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the mailbox settings.
    pub fn settings(&self) -> &MailboxSettings {
        &self.settings
    }

    async fn open_stream(&self) -> Result<Box<dyn ImapStream>> {
        let tcp_stream = TcpStream::connect((self.settings.host.as_str(), self.settings.port))
            .await
            .map_err(|e| MailboxError::Transport(format!("TCP connect failed: {}", e)))?;

        if !self.settings.use_tls {
            return Ok(Box::new(tcp_stream.compat()));
        }

        let config = ClientConfig::builder()
            .with_root_certificates(tokio_rustls::rustls::RootCertStore::from_iter(
                webpki_roots::TLS_SERVER_ROOTS.iter().cloned(),
            ))
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        let server_name = ServerName::try_from(self.settings.host.clone())
            .map_err(|e| MailboxError::Transport(format!("invalid server name: {}", e)))?;

        let tls_stream = connector
            .connect(server_name, tcp_stream)
            .await
            .map_err(|e| MailboxError::Transport(format!("TLS handshake failed: {}", e)))?;

        Ok(Box::new(tls_stream.compat()))
    }

    fn session(&mut self) -> Result<&mut ImapSession> {
        self.session
            .as_mut()
            .ok_or_else(|| MailboxError::Transport("not connected".to_string()))
    }

    /// Builds the SEARCH criteria, quoting the prefix as an IMAP string.
    fn subject_query(prefix: &str) -> String {
        let escaped = prefix.replace('\\', "\\\\").replace('"', "\\\"");
        format!("SUBJECT \"{}\"", escaped)
    }

    async fn store_flag(&mut self, uid: &Uid, query: &str) -> Result<()> {
        let session = self.session()?;
        let updates: Vec<Fetch> = session
            .uid_store(uid.as_str(), query)
            .await
            .map_err(|e| MailboxError::Transport(format!("STORE failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| MailboxError::Transport(format!("STORE stream: {}", e)))?;
        tracing::trace!(uid = %uid, responses = updates.len(), query, "STORE complete");
        Ok(())
    }
}

#[async_trait]
impl MailboxClient for ImapMailbox {
    async fn connect(&mut self) -> Result<()> {
        let stream = self.open_stream().await?;
        let client = async_imap::Client::new(stream);

        let mut session = client
            .login(&self.credentials.username, &self.credentials.password)
            .await
            .map_err(|e| MailboxError::Transport(format!("IMAP login failed: {}", e.0)))?;

        session
            .select(&self.settings.folder)
            .await
            .map_err(|e| MailboxError::Transport(format!("SELECT failed: {}", e)))?;

        self.session = Some(session);
        tracing::info!(
            host = %self.settings.host,
            folder = %self.settings.folder,
            "connected to mailbox"
        );
        Ok(())
    }

    async fn search_by_subject(&mut self, prefix: &str) -> Result<Vec<Uid>> {
        let query = Self::subject_query(prefix);
        let session = self.session()?;
        let found = session
            .uid_search(&query)
            .await
            .map_err(|e| MailboxError::Transport(format!("SEARCH failed: {}", e)))?;

        let mut uids: Vec<u32> = found.into_iter().collect();
        uids.sort_unstable();
        Ok(uids.into_iter().map(Uid::from).collect())
    }

    async fn fetch_raw(&mut self, uid: &Uid) -> Result<Vec<u8>> {
        let session = self.session()?;
        let fetches: Vec<Fetch> = session
            .uid_fetch(uid.as_str(), "(UID BODY.PEEK[])")
            .await
            .map_err(|e| MailboxError::Transport(format!("FETCH failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| MailboxError::Transport(format!("FETCH stream: {}", e)))?;

        fetches
            .iter()
            .find_map(|fetch| fetch.body().map(<[u8]>::to_vec))
            .ok_or_else(|| MailboxError::NotFound(format!("UID {} no longer exists", uid)))
    }

    async fn mark_seen(&mut self, uid: &Uid) -> Result<()> {
        self.store_flag(uid, "+FLAGS (\\Seen)").await
    }

    async fn delete(&mut self, uid: &Uid) -> Result<()> {
        self.store_flag(uid, "+FLAGS (\\Deleted)").await?;

        let session = self.session()?;
        let expunged: Vec<_> = session
            .expunge()
            .await
            .map_err(|e| MailboxError::Transport(format!("EXPUNGE failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| MailboxError::Transport(format!("EXPUNGE stream: {}", e)))?;

        tracing::info!(uid = %uid, expunged = expunged.len(), "message deleted from mailbox");
        Ok(())
    }

    async fn disconnect(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if let Err(e) = session.close().await {
            tracing::debug!(error = %e, "CLOSE failed during disconnect");
        }
        if let Err(e) = session.logout().await {
            tracing::debug!(error = %e, "LOGOUT failed during disconnect");
        }
    }
}
