//! Poll orchestrator.
//!
//! One [`PollOrchestrator`] owns the mailbox connection, the ledger, the
//! artifact store and the dispatcher, and drives them through strictly
//! sequential poll cycles:
//!
//! ```text
//! sweep? -> disconnect -> connect -> search -> minus ledger
//!        -> per UID: fetch -> decode -> prefix check -> artifact -> print
//!                    -> delete? -> mark seen -> record
//! ```
//!
//! A transport failure before the per-UID stage aborts the cycle and puts
//! the loop into error backoff. A per-UID failure is reported and the UID is
//! left out of the ledger so the next cycle retries it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::print_service::{PrintDispatcher, PrintError};
use super::status_service::{PollState, StatusBoard};
use crate::config::Settings;
use crate::domain::{DecodedMessage, JobOutcome, MessageRef, Uid};
use crate::providers::mailbox::{MailboxClient, MailboxError};
use crate::storage::{ArtifactStore, PrintLedger, StorageError};

/// Why a single message could not be handled.
#[derive(Debug, Error)]
pub enum JobError {
    /// Fetching the message failed or it disappeared.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),

    /// The tracked artifact could not be written.
    #[error("artifact: {0}")]
    Artifact(#[from] StorageError),

    /// The print engine could not be driven.
    #[error(transparent)]
    Print(#[from] PrintError),
}

/// Orchestrator knobs taken from [`Settings`].
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Time between cycles.
    pub interval: Duration,
    /// Time to wait after a transport error.
    pub error_backoff: Duration,
    /// Subject prefix to search for and verify.
    pub subject_prefix: String,
    /// Silent printing instead of the print dialog.
    pub auto_print: bool,
    /// Delete the source message after a successful dispatch.
    pub delete_after_print: bool,
    /// Artifact retention window.
    pub retention: Duration,
}

impl PollOptions {
    /// Extracts the orchestrator's options.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.polling.interval(),
            error_backoff: settings.polling.error_backoff(),
            subject_prefix: settings.polling.subject_prefix.clone(),
            auto_print: settings.printing.auto_print,
            delete_after_print: settings.printing.delete_after_print,
            retention: settings.storage.retention(),
        }
    }
}

/// Tally of one poll cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// UIDs returned by the search.
    pub found: usize,
    /// UIDs not yet in the ledger.
    pub candidates: usize,
    /// Messages handed to the print engine.
    pub printed: usize,
    /// Messages recorded without printing.
    pub skipped: usize,
    /// Messages left for the next cycle.
    pub failed: usize,
}

/// Drives the poll, print and record pipeline.
pub struct PollOrchestrator {
    mailbox: Box<dyn MailboxClient>,
    ledger: PrintLedger,
    artifacts: ArtifactStore,
    dispatcher: PrintDispatcher,
    status: Arc<StatusBoard>,
    options: PollOptions,
    last_sweep: Instant,
}

impl PollOrchestrator {
    /// Assembles an orchestrator. The artifact store counts as freshly swept.
    pub fn new(
        mailbox: Box<dyn MailboxClient>,
        ledger: PrintLedger,
        artifacts: ArtifactStore,
        dispatcher: PrintDispatcher,
        status: Arc<StatusBoard>,
        options: PollOptions,
    ) -> Self {
        let now = Local::now();
        status.cleanup_timing(now, after(now, options.retention));

        Self {
            mailbox,
            ledger,
            artifacts,
            dispatcher,
            status,
            options,
            last_sweep: Instant::now(),
        }
    }

    /// The dedup ledger.
    pub fn ledger(&self) -> &PrintLedger {
        &self.ledger
    }

    /// The status board this orchestrator reports to.
    pub fn status(&self) -> &Arc<StatusBoard> {
        &self.status
    }

    /// Runs cycles until `shutdown` is cancelled, then cleans up.
    ///
    /// Cancellation is honoured between cycles and during the idle and
    /// backoff waits, never in the middle of a cycle.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        while !shutdown.is_cancelled() {
            match self.run_cycle().await {
                Ok(report) => {
                    let now = Local::now();
                    self.status.cycle_timing(now, after(now, self.options.interval));
                    self.status
                        .transition(PollState::IdleWait, "Idle, waiting for next check");
                    tracing::debug!(?report, "poll cycle finished");

                    if !self.idle_countdown(&shutdown).await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "poll cycle failed");
                    self.status.report_error(format!("Mailbox error: {}", e));
                    self.status
                        .transition(PollState::ErrorBackoff, "Mailbox error, reconnecting");
                    self.mailbox.disconnect().await;

                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.options.error_backoff) => {}
                    }
                }
            }
        }

        self.shutdown().await;
    }

    /// Runs one poll cycle.
    ///
    /// Only connect and search failures are returned; per-UID failures are
    /// reported to the status board and counted in the report.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MailboxError> {
        self.maybe_sweep();

        self.status
            .transition(PollState::Connecting, "Connecting to mailbox");
        self.mailbox.disconnect().await;
        self.mailbox.connect().await?;

        self.status
            .transition(PollState::Searching, "Searching for new messages");
        let uids = self
            .mailbox
            .search_by_subject(&self.options.subject_prefix)
            .await?;
        let found = uids.len();
        self.status.set_messages_found(found);

        let candidates: Vec<Uid> = uids
            .into_iter()
            .filter(|uid| !self.ledger.contains(uid))
            .collect();
        let mut report = CycleReport {
            found,
            candidates: candidates.len(),
            ..CycleReport::default()
        };
        self.status.set_pending(candidates.len());
        if !candidates.is_empty() {
            tracing::info!(count = candidates.len(), "new messages to process");
        }

        self.status
            .transition(PollState::Processing, "Processing messages");
        for (index, uid) in candidates.iter().enumerate() {
            match self.process_uid(uid).await {
                Ok(JobOutcome::Skipped) => report.skipped += 1,
                Ok(_) => report.printed += 1,
                Err(e) => {
                    report.failed += 1;
                    self.report_job_error(uid, &e);
                }
            }
            self.status.set_pending(candidates.len() - index - 1);
        }

        Ok(report)
    }

    /// Handles one candidate UID.
    async fn process_uid(&mut self, uid: &Uid) -> Result<JobOutcome, JobError> {
        let raw = self.mailbox.fetch_raw(uid).await?;
        let message = DecodedMessage::parse(&raw);
        let job = MessageRef {
            uid: uid.clone(),
            subject: message.subject.clone(),
        };

        if !message.matches_prefix(&self.options.subject_prefix) {
            tracing::info!(%uid, subject = %job.subject, "subject does not start with prefix, skipping");
            self.finish(&job).await;
            return Ok(JobOutcome::Skipped);
        }

        let artifact = self.artifacts.write(&message.subject, &message.body_html)?;
        let outcome = self
            .dispatcher
            .render_and_print(&artifact, self.options.auto_print)
            .await?;

        if self.options.delete_after_print {
            match self.mailbox.delete(uid).await {
                Ok(()) => tracing::info!(%uid, subject = %job.subject, "printed and deleted from mailbox"),
                Err(e) => self.status.report_error(format!(
                    "Printed \"{}\" but could not delete it: {}",
                    job.subject, e
                )),
            }
        }
        self.finish(&job).await;

        self.status.job_completed(&job.subject, outcome);
        tracing::info!(%uid, subject = %job.subject, outcome = outcome.label(), "job completed");
        Ok(outcome)
    }

    /// Marks a handled message seen and records it in the ledger.
    async fn finish(&mut self, job: &MessageRef) {
        if let Err(e) = self.mailbox.mark_seen(&job.uid).await {
            tracing::warn!(uid = %job.uid, error = %e, "could not mark message seen");
        }
        self.record(&job.uid);
    }

    fn record(&mut self, uid: &Uid) {
        if let Err(e) = self.ledger.record(uid) {
            tracing::error!(%uid, error = %e, "ledger append failed");
            self.status
                .report_error(format!("Could not record UID {}: {}", uid, e));
        }
    }

    fn report_job_error(&self, uid: &Uid, error: &JobError) {
        let message = match error {
            JobError::Mailbox(MailboxError::NotFound(_)) => {
                format!("UID {} vanished before it could be fetched", uid)
            }
            JobError::Mailbox(e) => format!("Fetching UID {} failed: {}", uid, e),
            JobError::Artifact(e) => format!("Writing UID {} failed: {}", uid, e),
            JobError::Print(e) => format!("Printing UID {} failed: {}", uid, e),
        };
        tracing::error!(%uid, error = %error, "message processing failed");
        self.status.report_error(message);
    }

    fn maybe_sweep(&mut self) {
        if self.last_sweep.elapsed() < self.options.retention {
            return;
        }
        self.status.set_status("Cleaning up old temp files");
        let report = self.artifacts.sweep(self.options.retention);
        self.last_sweep = Instant::now();

        let now = Local::now();
        self.status.cleanup_timing(now, after(now, self.options.retention));
        tracing::debug!(removed = report.total(), "retention sweep finished");
    }

    /// Counts down the poll interval one second at a time. Returns false
    /// when shutdown was requested.
    async fn idle_countdown(&self, shutdown: &CancellationToken) -> bool {
        let total = self.options.interval.as_secs().max(1);
        for remaining in (1..=total).rev() {
            self.status.countdown_tick(remaining, total);
            tokio::select! {
                _ = shutdown.cancelled() => return false,
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            }
        }
        self.status.countdown_tick(0, total);
        true
    }

    async fn shutdown(&mut self) {
        self.status
            .transition(PollState::ShuttingDown, "Shutting down");
        let removed = self.artifacts.purge_all();
        self.mailbox.disconnect().await;
        tracing::info!(artifacts_removed = removed, "poller stopped");
    }
}

/// `now + duration`, saturating at `now` when out of range.
fn after(now: DateTime<Local>, duration: Duration) -> DateTime<Local> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::engine::{EngineProcess, MockEngineLauncher, MockEngineProcess};
    use crate::providers::mailbox::MockMailboxClient;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Seen(String),
        Deleted(String),
    }

    fn raw(subject: &str) -> Vec<u8> {
        format!(
            "From: shop@example.com\r\nSubject: {}\r\nContent-Type: text/html\r\n\r\n<html><body>Order</body></html>\r\n",
            subject
        )
        .into_bytes()
    }

    struct Fixture {
        dir: tempfile::TempDir,
        calls: Arc<Mutex<Vec<Call>>>,
        launches: Arc<AtomicUsize>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                calls: Arc::new(Mutex::new(Vec::new())),
                launches: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Mailbox serving `messages` in order; fetches of unknown UIDs
        /// return `NotFound`.
        fn mailbox(&self, messages: Vec<(&str, &str)>) -> MockMailboxClient {
            let uids: Vec<Uid> = messages.iter().map(|(uid, _)| Uid::from(*uid)).collect();
            let bodies: HashMap<Uid, Vec<u8>> = messages
                .iter()
                .map(|(uid, subject)| (Uid::from(*uid), raw(subject)))
                .collect();

            let mut mailbox = MockMailboxClient::new();
            mailbox.expect_disconnect().returning(|| ());
            mailbox.expect_connect().returning(|| Ok(()));
            mailbox
                .expect_search_by_subject()
                .returning(move |_| Ok(uids.clone()));
            mailbox.expect_fetch_raw().returning(move |uid| {
                bodies
                    .get(uid)
                    .cloned()
                    .ok_or_else(|| MailboxError::NotFound(uid.to_string()))
            });
            let calls = Arc::clone(&self.calls);
            mailbox.expect_mark_seen().returning(move |uid| {
                calls.lock().unwrap().push(Call::Seen(uid.to_string()));
                Ok(())
            });
            let calls = Arc::clone(&self.calls);
            mailbox.expect_delete().returning(move |uid| {
                calls.lock().unwrap().push(Call::Deleted(uid.to_string()));
                Ok(())
            });
            mailbox
        }

        fn launcher(&self, fail: bool) -> MockEngineLauncher {
            let launches = Arc::clone(&self.launches);
            let mut launcher = MockEngineLauncher::new();
            launcher.expect_launch().returning(move |_| {
                launches.fetch_add(1, Ordering::SeqCst);
                if fail {
                    return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
                }
                let mut process = MockEngineProcess::new();
                process.expect_terminate().return_const(());
                Ok(Box::new(process) as Box<dyn EngineProcess>)
            });
            launcher
        }

        fn orchestrator(
            &self,
            mailbox: MockMailboxClient,
            launcher: MockEngineLauncher,
            delete_after_print: bool,
        ) -> PollOrchestrator {
            let options = PollOptions {
                interval: Duration::from_secs(1),
                error_backoff: Duration::from_secs(1),
                subject_prefix: "[PRINT]".to_string(),
                auto_print: true,
                delete_after_print,
                retention: Duration::from_secs(3600),
            };
            self.orchestrator_with(mailbox, launcher, options)
        }

        fn orchestrator_with(
            &self,
            mailbox: MockMailboxClient,
            launcher: MockEngineLauncher,
            options: PollOptions,
        ) -> PollOrchestrator {
            let ledger = PrintLedger::open(self.dir.path().join("printed_uids.txt")).unwrap();
            let artifacts = ArtifactStore::new(self.dir.path()).unwrap();
            let dispatcher = PrintDispatcher::with_engine(
                "/usr/bin/chromium",
                self.dir.path(),
                Duration::ZERO,
                Arc::new(launcher),
            );
            PollOrchestrator::new(
                Box::new(mailbox),
                ledger,
                artifacts,
                dispatcher,
                Arc::new(StatusBoard::new()),
                options,
            )
        }

        /// Tracked artifacts written by this process's store.
        fn tracked_files(&self) -> Vec<std::path::PathBuf> {
            std::fs::read_dir(self.dir.path())
                .unwrap()
                .flatten()
                .filter(|e| e.path().is_dir())
                .filter(|e| e.file_name().to_string_lossy().starts_with(crate::storage::WORK_DIR_PREFIX))
                .flat_map(|e| std::fs::read_dir(e.path()).unwrap().flatten())
                .map(|e| e.path())
                .collect()
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn launches(&self) -> usize {
            self.launches.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn matching_and_mismatching_messages_are_both_recorded() {
        let fx = Fixture::new();
        let mailbox = fx.mailbox(vec![
            ("101", "[PRINT] Order #123"),
            ("102", "Re: [PRINT] Order #123"),
        ]);
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let report = poller.run_cycle().await.unwrap();

        assert_eq!(
            report,
            CycleReport {
                found: 2,
                candidates: 2,
                printed: 1,
                skipped: 1,
                failed: 0
            }
        );
        assert_eq!(fx.launches(), 1);
        assert!(poller.ledger().contains(&Uid::from("101")));
        assert!(poller.ledger().contains(&Uid::from("102")));
        assert_eq!(
            fx.calls(),
            vec![Call::Seen("101".into()), Call::Seen("102".into())]
        );

        let snapshot = poller.status().snapshot();
        assert_eq!(snapshot.jobs_processed, 1);
        assert_eq!(snapshot.recent_jobs.len(), 1);
        assert_eq!(snapshot.recent_jobs[0].subject, "[PRINT] Order #123");
        assert_eq!(snapshot.recent_jobs[0].outcome, JobOutcome::AutoPrinted);
        assert_eq!(snapshot.pending, 0);
    }

    #[tokio::test]
    async fn recorded_uids_are_never_dispatched_again() {
        let fx = Fixture::new();
        let mailbox = fx.mailbox(vec![("7", "[PRINT] Order 7")]);
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        poller.run_cycle().await.unwrap();
        let second = poller.run_cycle().await.unwrap();

        assert_eq!(fx.launches(), 1);
        assert_eq!(second.found, 1);
        assert_eq!(second.candidates, 0);
    }

    #[tokio::test]
    async fn ledger_survives_a_restart() {
        let fx = Fixture::new();
        let mut poller =
            fx.orchestrator(fx.mailbox(vec![("7", "[PRINT] Order 7")]), fx.launcher(false), false);
        poller.run_cycle().await.unwrap();
        drop(poller);

        let mut restarted =
            fx.orchestrator(fx.mailbox(vec![("7", "[PRINT] Order 7")]), fx.launcher(false), false);
        let report = restarted.run_cycle().await.unwrap();

        assert_eq!(report.candidates, 0);
        assert_eq!(fx.launches(), 1);
    }

    #[tokio::test]
    async fn dispatch_failure_leaves_message_for_retry() {
        let fx = Fixture::new();
        let mailbox = fx.mailbox(vec![("9", "[PRINT] Order 9")]);
        let mut poller = fx.orchestrator(mailbox, fx.launcher(true), true);

        let report = poller.run_cycle().await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(!poller.ledger().contains(&Uid::from("9")));
        assert!(fx.calls().is_empty());
        let errors = poller.status().snapshot().recent_errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.starts_with("Printing UID 9 failed"));

        // Still a candidate next time.
        let again = poller.run_cycle().await.unwrap();
        assert_eq!(again.candidates, 1);
    }

    #[tokio::test]
    async fn vanished_message_is_skipped_without_recording() {
        let fx = Fixture::new();
        let mut mailbox = MockMailboxClient::new();
        mailbox.expect_disconnect().returning(|| ());
        mailbox.expect_connect().returning(|| Ok(()));
        mailbox
            .expect_search_by_subject()
            .returning(|_| Ok(vec![Uid::from("5")]));
        mailbox
            .expect_fetch_raw()
            .returning(|uid| Err(MailboxError::NotFound(uid.to_string())));
        mailbox.expect_mark_seen().never();
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let report = poller.run_cycle().await.unwrap();

        assert_eq!(report.failed, 1);
        assert!(!poller.ledger().contains(&Uid::from("5")));
        assert_eq!(fx.launches(), 0);
        let errors = poller.status().snapshot().recent_errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("vanished"));
    }

    #[tokio::test]
    async fn delete_happens_only_when_enabled() {
        let fx = Fixture::new();
        let mut poller =
            fx.orchestrator(fx.mailbox(vec![("1", "[PRINT] A")]), fx.launcher(false), false);
        poller.run_cycle().await.unwrap();
        assert!(!fx.calls().contains(&Call::Deleted("1".into())));

        let fx = Fixture::new();
        let mut poller =
            fx.orchestrator(fx.mailbox(vec![("1", "[PRINT] A")]), fx.launcher(false), true);
        poller.run_cycle().await.unwrap();
        assert_eq!(
            fx.calls(),
            vec![Call::Deleted("1".into()), Call::Seen("1".into())]
        );
    }

    #[tokio::test]
    async fn mismatched_subject_is_never_deleted() {
        let fx = Fixture::new();
        let mut poller =
            fx.orchestrator(fx.mailbox(vec![("3", "FW: [PRINT] A")]), fx.launcher(false), true);
        poller.run_cycle().await.unwrap();
        assert_eq!(fx.calls(), vec![Call::Seen("3".into())]);
        assert_eq!(fx.launches(), 0);
    }

    #[tokio::test]
    async fn connect_failure_aborts_the_cycle() {
        let fx = Fixture::new();
        let mut mailbox = MockMailboxClient::new();
        mailbox.expect_disconnect().returning(|| ());
        mailbox
            .expect_connect()
            .returning(|| Err(MailboxError::Transport("refused".into())));
        mailbox.expect_search_by_subject().never();
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let result = poller.run_cycle().await;
        assert!(matches!(result, Err(MailboxError::Transport(_))));
    }

    #[tokio::test]
    async fn cancelled_before_start_only_cleans_up() {
        let fx = Fixture::new();
        let mut mailbox = MockMailboxClient::new();
        mailbox.expect_disconnect().times(1).returning(|| ());
        mailbox.expect_connect().never();
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let token = CancellationToken::new();
        token.cancel();
        poller.run(token).await;

        assert_eq!(poller.status().snapshot().state, PollState::ShuttingDown);
    }

    #[tokio::test]
    async fn cancellation_interrupts_idle_wait() {
        let fx = Fixture::new();
        let mailbox = fx.mailbox(vec![]);
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), poller.run(token))
            .await
            .unwrap();

        let snapshot = poller.status().snapshot();
        assert_eq!(snapshot.state, PollState::ShuttingDown);
        assert!(snapshot.last_check.is_some());
    }

    #[tokio::test]
    async fn transport_error_reports_and_backs_off() {
        let fx = Fixture::new();
        let mut mailbox = MockMailboxClient::new();
        mailbox.expect_disconnect().returning(|| ());
        mailbox
            .expect_connect()
            .returning(|| Err(MailboxError::Transport("timeout".into())));
        let mut poller = fx.orchestrator(mailbox, fx.launcher(false), false);

        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), poller.run(token))
            .await
            .unwrap();

        let errors = poller.status().snapshot().recent_errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("timeout"));
    }

    #[tokio::test]
    async fn elapsed_retention_sweeps_before_connecting() {
        let fx = Fixture::new();
        let mailbox = fx.mailbox(vec![("21", "[PRINT] Order 21")]);
        let options = PollOptions {
            interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(1),
            subject_prefix: "[PRINT]".to_string(),
            auto_print: true,
            delete_after_print: false,
            retention: Duration::ZERO,
        };
        let mut poller = fx.orchestrator_with(mailbox, fx.launcher(false), options);

        poller.run_cycle().await.unwrap();
        assert_eq!(fx.tracked_files().len(), 1);
        let first_cleanup = poller.status().snapshot().last_cleanup.unwrap();

        let stale = fx.dir.path().join(crate::storage::dispatch_artifact_name());
        std::fs::write(&stale, "<html></html>").unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        poller.run_cycle().await.unwrap();

        assert!(fx.tracked_files().is_empty());
        assert!(!stale.exists());
        let second_cleanup = poller.status().snapshot().last_cleanup.unwrap();
        assert!(second_cleanup > first_cleanup);
        assert_eq!(fx.launches(), 1);
    }

    #[test]
    fn after_saturates() {
        let now = Local::now();
        assert_eq!(after(now, Duration::MAX), now);
        assert_eq!(after(now, Duration::from_secs(60)), now + chrono::Duration::seconds(60));
    }
}
