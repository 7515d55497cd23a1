//! Application wiring and lifecycle.

pub mod events;
pub mod journal;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::providers::engine::ChromeLauncher;
use crate::providers::mailbox::{ImapCredentials, ImapMailbox};
use crate::services::{PollOptions, PollOrchestrator, PrintDispatcher, StatusBoard};
use crate::storage::{ArtifactStore, PrintLedger};

pub use events::{EventBus, StatusEvent, SubscriberId};

/// The print service.
pub struct App;

impl App {
    /// Builds every component from `settings` and polls until Ctrl-C.
    ///
    /// Fails before the first cycle when no print engine can be found, the
    /// ledger cannot be opened for appending, or no password is available.
    pub async fn run(settings: Settings) -> Result<()> {
        let bus = EventBus::new();
        journal::attach(&bus);
        let status = Arc::new(StatusBoard::with_bus(bus));

        let temp_root = settings.storage.temp_root();
        let dispatcher = PrintDispatcher::new(
            &settings.printing,
            temp_root.clone(),
            Arc::new(ChromeLauncher::new()),
        )
        .context("cannot start without a print engine")?;
        let ledger = PrintLedger::open(&settings.storage.ledger_path)
            .context("cannot open the print ledger")?;
        let artifacts =
            ArtifactStore::new(&temp_root).context("cannot create the temp artifact directory")?;
        let credentials = ImapCredentials::resolve(&settings.mailbox)
            .await
            .context("cannot resolve mailbox credentials")?;
        let mailbox = ImapMailbox::new(settings.mailbox.clone(), credentials);

        Self::log_banner(&settings, dispatcher.engine_path());

        let mut orchestrator = PollOrchestrator::new(
            Box::new(mailbox),
            ledger,
            artifacts,
            dispatcher,
            status,
            PollOptions::from_settings(&settings),
        );

        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("interrupt received, stopping"),
                Err(e) => tracing::error!(error = %e, "cannot listen for Ctrl-C, stopping"),
            }
            trigger.cancel();
        });

        orchestrator.run(shutdown).await;
        tracing::info!("autoprint stopped");
        Ok(())
    }

    fn log_banner(settings: &Settings, engine: &std::path::Path) {
        let mode = if settings.printing.auto_print {
            "silent"
        } else {
            "print dialog"
        };
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            mailbox = %format!("{}@{}:{}", settings.mailbox.username, settings.mailbox.host, settings.mailbox.port),
            tls = settings.mailbox.use_tls,
            folder = %settings.mailbox.folder,
            prefix = %settings.polling.subject_prefix,
            interval_secs = settings.polling.interval_secs,
            mode,
            delete_after_print = settings.printing.delete_after_print,
            retention_hours = settings.storage.retention_hours,
            engine = %engine.display(),
            "autoprint started"
        );
    }
}
