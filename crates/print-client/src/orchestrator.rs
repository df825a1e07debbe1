//! Print orchestrator: a single-flow state machine over encode, assemble and
//! dispatch.
//!
//! ```text
//! Idle → Preparing → Generating → Dispatching → Completed | PartialSuccess | Failed
//!            └────────────┴──────────→ Failed
//! terminal → Idle   (display timeout, dismiss, or the next request)
//! ```
//!
//! Callers observe progress through [`Orchestrator::subscribe`]; the final
//! outcome is also returned from [`Orchestrator::print_batch`]. Transport
//! errors never escape: they become a `Failed` phase plus a message.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zpl_labels_core::{GeometrySpec, LabelError, LabelRecord, assemble, validate_records};

use crate::client::BatchDispatcher;
use crate::config::OrchestratorConfig;
use crate::result::{JobOutcome, PrintJobResult};

/// Error type returned by [`PreviewSink`] implementations.
pub type PreviewError = Box<dyn std::error::Error + Send + Sync>;

// ── Phases ──────────────────────────────────────────────────────────────

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintPhase {
    /// Nothing in progress, nothing displayed.
    #[default]
    Idle,
    /// Validating the request.
    Preparing,
    /// Encoding frames and assembling the batch.
    Generating,
    /// Waiting for the gateway.
    Dispatching,
    /// Every label printed.
    Completed,
    /// Some labels printed.
    PartialSuccess,
    /// Nothing printed, or the run failed.
    Failed,
}

impl PrintPhase {
    /// Returns `true` for `Completed`, `PartialSuccess` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PrintPhase::Completed | PrintPhase::PartialSuccess | PrintPhase::Failed
        )
    }

    /// Returns `true` while a run is in progress.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            PrintPhase::Preparing | PrintPhase::Generating | PrintPhase::Dispatching
        )
    }

    /// Whether the state machine allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: PrintPhase) -> bool {
        use PrintPhase::*;
        matches!(
            (self, next),
            (Idle, Preparing)
                | (Preparing, Generating)
                | (Preparing, Failed)
                | (Generating, Dispatching)
                | (Generating, Failed)
                | (Dispatching, Completed)
                | (Dispatching, PartialSuccess)
                | (Dispatching, Failed)
                | (Completed, Idle)
                | (PartialSuccess, Idle)
                | (Failed, Idle)
        )
    }

    /// Semantic class of a terminal phase.
    pub fn class(self) -> Option<StatusClass> {
        match self {
            PrintPhase::Completed => Some(StatusClass::Success),
            PrintPhase::PartialSuccess => Some(StatusClass::Partial),
            PrintPhase::Failed => Some(StatusClass::Failure),
            _ => None,
        }
    }
}

impl fmt::Display for PrintPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrintPhase::Idle => "idle",
            PrintPhase::Preparing => "preparing",
            PrintPhase::Generating => "generating",
            PrintPhase::Dispatching => "dispatching",
            PrintPhase::Completed => "completed",
            PrintPhase::PartialSuccess => "partial_success",
            PrintPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Semantic class of a finished run, for styling the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    /// All labels printed.
    Success,
    /// Some labels printed.
    Partial,
    /// Nothing printed.
    Failure,
}

// ── Status ──────────────────────────────────────────────────────────────

/// Label counts reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrintCounts {
    /// Labels in the batch.
    pub total: u32,
    /// Labels printed.
    pub successful: u32,
    /// Labels not printed.
    pub failed: u32,
}

impl From<&PrintJobResult> for PrintCounts {
    fn from(r: &PrintJobResult) -> Self {
        Self {
            total: r.total_labels,
            successful: r.successful_prints,
            failed: r.failed_prints,
        }
    }
}

/// Observable orchestrator snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PrintStatus {
    /// Current phase.
    pub phase: PrintPhase,
    /// Human-readable status line; empty when idle.
    pub message: String,
    /// Gateway counts, once a result is known.
    pub counts: Option<PrintCounts>,
    /// Run counter; increments with every accepted print request.
    pub run: u64,
}

/// Final outcome of one [`Orchestrator::print_batch`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintReport {
    /// Terminal phase reached.
    pub phase: PrintPhase,
    /// Semantic class of `phase`.
    pub class: StatusClass,
    /// Status line shown to the operator.
    pub message: String,
    /// Gateway counts; absent when the run failed before a result arrived.
    pub counts: Option<PrintCounts>,
    /// Unique numbers the gateway reported as not printed.
    pub failed_labels: Vec<String>,
}

/// Print requests refused without starting a run.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrintRejected {
    /// The request carried no labels.
    #[error("no labels to print")]
    EmptyBatch,
    /// Another run is in progress.
    #[error("a print job is already in progress")]
    Busy,
}

// ── Preview ─────────────────────────────────────────────────────────────

/// Receives the printed labels for rendering a human-viewable copy.
///
/// Invoked after a dispatch that returned a result; failures are logged and
/// never change the outcome.
#[async_trait]
pub trait PreviewSink: Send + Sync {
    /// Render `records` laid out with `geometry`.
    async fn render(
        &self,
        records: &[LabelRecord],
        geometry: &GeometrySpec,
    ) -> Result<(), PreviewError>;
}

// ── Orchestrator ────────────────────────────────────────────────────────

/// Coordinates a print run and publishes its status.
pub struct Orchestrator<D> {
    dispatcher: D,
    config: OrchestratorConfig,
    preview: Option<Arc<dyn PreviewSink>>,
    status: Arc<watch::Sender<PrintStatus>>,
}

impl<D: BatchDispatcher> Orchestrator<D> {
    /// Orchestrator sending batches through `dispatcher`.
    pub fn new(dispatcher: D, config: OrchestratorConfig) -> Self {
        let (status, _) = watch::channel(PrintStatus::default());
        Self {
            dispatcher,
            config,
            preview: None,
            status: Arc::new(status),
        }
    }

    /// Render a preview after each dispatched batch.
    pub fn with_preview(mut self, sink: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(sink);
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Current status snapshot.
    pub fn status(&self) -> PrintStatus {
        self.status.borrow().clone()
    }

    /// Watch status changes.
    pub fn subscribe(&self) -> watch::Receiver<PrintStatus> {
        self.status.subscribe()
    }

    /// Clear a displayed terminal status. Returns `true` if one was cleared.
    pub fn dismiss(&self) -> bool {
        dismiss_run(&self.status, None)
    }

    /// Print `records` as batch `batch_id`.
    pub async fn print_batch(
        &self,
        batch_id: u64,
        records: &[LabelRecord],
    ) -> Result<PrintReport, PrintRejected> {
        self.print_batch_with_cancel(batch_id, records, &CancellationToken::new())
            .await
    }

    /// Print `records`, aborting the dispatch when `cancel` fires.
    ///
    /// A cancelled dispatch ends the run as `Failed`.
    pub async fn print_batch_with_cancel(
        &self,
        batch_id: u64,
        records: &[LabelRecord],
        cancel: &CancellationToken,
    ) -> Result<PrintReport, PrintRejected> {
        if records.is_empty() {
            return Err(PrintRejected::EmptyBatch);
        }
        let total = records.len();
        let run = self.claim(format!("Preparing {total} labels for printing..."))?;
        let _guard = RunGuard {
            status: Arc::clone(&self.status),
            run,
            failure_display: self.config.failure_display,
        };
        info!(run, batch_id, labels = total, "print run started");

        if let Err(e) = self.check_input(records) {
            return Ok(self.fail(run, &e));
        }

        self.advance(run, PrintPhase::Generating, "Generating ZPL codes...".into(), None);
        let request = match assemble(batch_id, records, &self.config.geometry, self.config.dpi) {
            Ok(request) => request,
            Err(e) => return Ok(self.fail(run, &e)),
        };

        self.advance(
            run,
            PrintPhase::Dispatching,
            format!("Printing {total} labels to barcode printer..."),
            None,
        );
        let result = match self.dispatcher.dispatch(&request, cancel).await {
            Ok(result) => result,
            Err(e) => return Ok(self.fail(run, &e)),
        };

        let report = self.finish(run, &result);
        self.render_preview(records).await;
        Ok(report)
    }

    fn check_input(&self, records: &[LabelRecord]) -> Result<(), LabelError> {
        validate_records(records)?;
        if records.len() > self.config.max_batch_size {
            return Err(LabelError::BatchTooLarge {
                count: records.len(),
                max: self.config.max_batch_size,
            });
        }
        Ok(())
    }

    /// Atomically move to `Preparing` unless a run is in progress. A
    /// displayed terminal status is dismissed to `Idle` first.
    fn claim(&self, message: String) -> Result<u64, PrintRejected> {
        if dismiss_run(&self.status, None) {
            debug!("dismissed previous status");
        }
        let mut claimed = None;
        self.status.send_if_modified(|s| {
            if !s.phase.can_transition_to(PrintPhase::Preparing) {
                return false;
            }
            let run = s.run + 1;
            *s = PrintStatus {
                phase: PrintPhase::Preparing,
                message: message.clone(),
                counts: None,
                run,
            };
            claimed = Some(run);
            true
        });
        claimed.ok_or(PrintRejected::Busy)
    }

    fn advance(
        &self,
        run: u64,
        next: PrintPhase,
        message: String,
        counts: Option<PrintCounts>,
    ) -> bool {
        let moved = self.status.send_if_modified(|s| {
            if s.run != run || !s.phase.can_transition_to(next) {
                return false;
            }
            s.phase = next;
            s.message = message.clone();
            s.counts = counts;
            true
        });
        if moved {
            debug!(run, phase = %next, "phase changed");
        } else {
            warn!(run, phase = %next, "ignored illegal phase change");
        }
        moved
    }

    fn fail(&self, run: u64, error: &dyn std::error::Error) -> PrintReport {
        warn!(run, error = %error, "print run failed");
        let message = format!("Printing failed: {error}");
        self.advance(run, PrintPhase::Failed, message.clone(), None);
        schedule_dismiss(&self.status, run, self.config.failure_display);
        PrintReport {
            phase: PrintPhase::Failed,
            class: StatusClass::Failure,
            message,
            counts: None,
            failed_labels: Vec::new(),
        }
    }

    fn finish(&self, run: u64, result: &PrintJobResult) -> PrintReport {
        let counts = PrintCounts::from(result);
        let (phase, message) = match result.outcome() {
            JobOutcome::AllPrinted => (
                PrintPhase::Completed,
                format!("Successfully printed all {} labels!", counts.total),
            ),
            JobOutcome::Partial => (
                PrintPhase::PartialSuccess,
                format!("Printed {} out of {} labels", counts.successful, counts.total),
            ),
            JobOutcome::NonePrinted => (
                PrintPhase::Failed,
                "No labels were printed successfully".to_string(),
            ),
        };
        info!(
            run,
            phase = %phase,
            total = counts.total,
            successful = counts.successful,
            failed = counts.failed,
            "print run finished"
        );
        self.advance(run, phase, message.clone(), Some(counts));
        let display = if phase == PrintPhase::Failed {
            self.config.failure_display
        } else {
            self.config.success_display
        };
        schedule_dismiss(&self.status, run, display);
        PrintReport {
            phase,
            class: phase.class().unwrap_or(StatusClass::Failure),
            message,
            counts: Some(counts),
            failed_labels: result.failed_labels().map(str::to_string).collect(),
        }
    }

    async fn render_preview(&self, records: &[LabelRecord]) {
        let Some(sink) = &self.preview else {
            return;
        };
        if let Err(e) = sink.render(records, &self.config.geometry).await {
            warn!(error = %e, "preview rendering failed");
        }
    }
}

/// Fails a run whose future was dropped before it reached a terminal phase,
/// so the busy status cannot outlive the caller.
struct RunGuard {
    status: Arc<watch::Sender<PrintStatus>>,
    run: u64,
    failure_display: Duration,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let run = self.run;
        let abandoned = self.status.send_if_modified(|s| {
            if s.run != run || !s.phase.can_transition_to(PrintPhase::Failed) {
                return false;
            }
            s.phase = PrintPhase::Failed;
            s.message = "Printing failed: run abandoned".to_string();
            s.counts = None;
            true
        });
        if abandoned {
            warn!(run, "print run abandoned");
            schedule_dismiss(&self.status, run, self.failure_display);
        }
    }
}

/// Return to `Idle` after `after`, unless a newer run has started.
fn schedule_dismiss(status: &Arc<watch::Sender<PrintStatus>>, run: u64, after: Duration) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        warn!(run, "no runtime to expire the status display");
        return;
    };
    let status = Arc::clone(status);
    handle.spawn(async move {
        tokio::time::sleep(after).await;
        if dismiss_run(&status, Some(run)) {
            debug!(run, "status display expired");
        }
    });
}

/// Move a terminal status back to `Idle`. With `run`, only that run's status
/// is cleared.
fn dismiss_run(status: &watch::Sender<PrintStatus>, run: Option<u64>) -> bool {
    status.send_if_modified(|s| {
        if !s.phase.can_transition_to(PrintPhase::Idle) || run.is_some_and(|r| r != s.run) {
            return false;
        }
        s.phase = PrintPhase::Idle;
        s.message.clear();
        s.counts = None;
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -- Mock dispatcher --------------------------------------------------

    /// Returns pre-loaded results in order; counts calls.
    struct MockDispatcher {
        results: Mutex<Vec<Result<PrintJobResult, DispatchError>>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl MockDispatcher {
        fn new(results: Vec<Result<PrintJobResult, DispatchError>>) -> Self {
            Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl BatchDispatcher for MockDispatcher {
        async fn dispatch(
            &self,
            request: &zpl_labels_core::BatchPrintRequest,
            _cancel: &CancellationToken,
        ) -> Result<PrintJobResult, DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut results = self.results.lock().unwrap();
            if results.is_empty() {
                Ok(job(request.batch_id, request.len() as u32, request.len() as u32))
            } else {
                results.remove(0)
            }
        }
    }

    struct FailingPreview(AtomicUsize);

    #[async_trait]
    impl PreviewSink for FailingPreview {
        async fn render(
            &self,
            _records: &[LabelRecord],
            _geometry: &GeometrySpec,
        ) -> Result<(), PreviewError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err("disk full".into())
        }
    }

    fn job(batch_id: u64, total: u32, ok: u32) -> PrintJobResult {
        PrintJobResult {
            batch_id,
            total_labels: total,
            successful_prints: ok,
            failed_prints: total - ok,
            simulated: true,
            details: Vec::new(),
        }
    }

    fn records(n: usize) -> Vec<LabelRecord> {
        (1..=n)
            .map(|i| LabelRecord {
                id: format!("QA{i:04}"),
                product: "Castrol GTX".into(),
                part_no: "GTX-1L".into(),
                grade: "15W-40".into(),
                size: "1L".into(),
                net_qty: "1 pcs".into(),
                pkd: "2024-01-01".into(),
                mrp: "450".into(),
                amount: "100".into(),
                letter: Some("C".into()),
            })
            .collect()
    }

    // -- Transition table -------------------------------------------------

    #[test]
    fn transition_table() {
        use PrintPhase::*;
        assert!(Idle.can_transition_to(Preparing));
        assert!(Dispatching.can_transition_to(PartialSuccess));
        assert!(Failed.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(Dispatching));
        assert!(!Preparing.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Preparing));
        assert!(!Dispatching.can_transition_to(Idle));
        for p in [Completed, PartialSuccess, Failed] {
            assert!(p.is_terminal());
            assert!(p.class().is_some());
        }
        assert_eq!(Idle.class(), None);
    }

    // -- Runs ---------------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn all_printed_completes() {
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default());
        let report = orch.print_batch(1, &records(3)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Completed);
        assert_eq!(report.class, StatusClass::Success);
        assert_eq!(report.message, "Successfully printed all 3 labels!");
        assert_eq!(orch.status().phase, PrintPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_printed_fails_with_counts() {
        let orch = Orchestrator::new(
            MockDispatcher::new(vec![Ok(job(1, 2, 0))]),
            OrchestratorConfig::default(),
        );
        let report = orch.print_batch(1, &records(2)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Failed);
        assert_eq!(report.message, "No labels were printed successfully");
        assert_eq!(report.counts.map(|c| c.failed), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_batch_fails_before_dispatch() {
        let mut config = OrchestratorConfig::default();
        config.max_batch_size = 2;
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), config);
        let report = orch.print_batch(1, &records(3)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Failed);
        assert!(report.message.starts_with("Printing failed:"), "{}", report.message);
        assert_eq!(orch.dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_id_fails_before_dispatch() {
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default());
        let mut input = records(2);
        input[1].id = String::new();
        let report = orch.print_batch(1, &input).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Failed);
        assert!(report.message.contains("label #2"), "{}", report.message);
        assert_eq!(orch.dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_while_dispatching() {
        let mut mock = MockDispatcher::new(vec![]);
        mock.delay = Duration::from_secs(10);
        let orch = Arc::new(Orchestrator::new(mock, OrchestratorConfig::default()));

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.print_batch(1, &records(2)).await })
        };
        let mut rx = orch.subscribe();
        rx.wait_for(|s| s.phase == PrintPhase::Dispatching)
            .await
            .unwrap();

        assert_eq!(
            orch.print_batch(2, &records(1)).await,
            Err(PrintRejected::Busy)
        );
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.phase, PrintPhase::Completed);
        assert_eq!(orch.dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_status_is_replaced_by_new_run() {
        let orch = Orchestrator::new(
            MockDispatcher::new(vec![Ok(job(1, 2, 1))]),
            OrchestratorConfig::default(),
        );
        let first = orch.print_batch(1, &records(2)).await.unwrap();
        assert_eq!(first.phase, PrintPhase::PartialSuccess);
        let second = orch.print_batch(2, &records(2)).await.unwrap();
        assert_eq!(second.phase, PrintPhase::Completed);
        assert_eq!(orch.status().run, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn next_request_dismisses_terminal_status_first() {
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default());
        orch.print_batch(1, &records(1)).await.unwrap();
        assert_eq!(orch.status().phase, PrintPhase::Completed);

        let run = orch.claim("again".into()).unwrap();
        let s = orch.status();
        assert_eq!((s.phase, s.run), (PrintPhase::Preparing, run));
        assert_eq!(run, 2);
        assert!(s.counts.is_none());
        // Preparing is busy: no dismissal, no second claim.
        assert!(!orch.dismiss());
        assert_eq!(orch.claim("third".into()), Err(PrintRejected::Busy));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_releases_the_orchestrator() {
        let mut mock = MockDispatcher::new(vec![]);
        mock.delay = Duration::from_secs(10);
        let orch = Orchestrator::new(mock, OrchestratorConfig::default());

        let dropped =
            tokio::time::timeout(Duration::from_secs(1), orch.print_batch(1, &records(1))).await;
        assert!(dropped.is_err());
        let s = orch.status();
        assert_eq!(s.phase, PrintPhase::Failed);
        assert_eq!(s.message, "Printing failed: run abandoned");

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(orch.status().phase, PrintPhase::Idle);

        let report = orch.print_batch(2, &records(1)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Completed);
        assert_eq!(orch.status().run, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_run_can_be_replaced_immediately() {
        let mut mock = MockDispatcher::new(vec![]);
        mock.delay = Duration::from_secs(10);
        let orch = Orchestrator::new(mock, OrchestratorConfig::default());

        let _ = tokio::time::timeout(Duration::from_secs(1), orch.print_batch(1, &records(1))).await;
        let report = orch.print_batch(2, &records(2)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Completed);
        // The abandoned run's display timer must not clear the new result.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(orch.status().phase, PrintPhase::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn display_timeout_returns_to_idle() {
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default());
        orch.print_batch(1, &records(1)).await.unwrap();
        assert_eq!(orch.status().phase, PrintPhase::Completed);

        tokio::time::sleep(Duration::from_millis(2900)).await;
        assert_eq!(orch.status().phase, PrintPhase::Completed);
        tokio::time::sleep(Duration::from_millis(200)).await;
        let s = orch.status();
        assert_eq!(s.phase, PrintPhase::Idle);
        assert!(s.message.is_empty());
        assert!(s.counts.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_displayed_longer() {
        let orch = Orchestrator::new(
            MockDispatcher::new(vec![Err(DispatchError::Cancelled)]),
            OrchestratorConfig::default(),
        );
        let report = orch.print_batch(1, &records(1)).await.unwrap();
        assert_eq!(report.message, "Printing failed: dispatch cancelled");
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(orch.status().phase, PrintPhase::Failed);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(orch.status().phase, PrintPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_does_not_clear_newer_run() {
        let orch = Orchestrator::new(
            MockDispatcher::new(vec![Err(DispatchError::Cancelled)]),
            OrchestratorConfig::default(),
        );
        orch.print_batch(1, &records(1)).await.unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        // Second run finishes at t=4s; the first run's timer fires at t=5s.
        orch.print_batch(2, &records(1)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(orch.status().phase, PrintPhase::Completed);
        assert_eq!(orch.status().run, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_clears_terminal_only() {
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default());
        assert!(!orch.dismiss());
        orch.print_batch(1, &records(1)).await.unwrap();
        assert!(orch.dismiss());
        assert_eq!(orch.status().phase, PrintPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn preview_failure_does_not_change_outcome() {
        let preview = Arc::new(FailingPreview(AtomicUsize::new(0)));
        let orch = Orchestrator::new(MockDispatcher::new(vec![]), OrchestratorConfig::default())
            .with_preview(Arc::clone(&preview) as Arc<dyn PreviewSink>);
        let report = orch.print_batch(1, &records(2)).await.unwrap();
        assert_eq!(report.phase, PrintPhase::Completed);
        assert_eq!(preview.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn preview_skipped_after_dispatch_error() {
        let preview = Arc::new(FailingPreview(AtomicUsize::new(0)));
        let orch = Orchestrator::new(
            MockDispatcher::new(vec![Err(DispatchError::Cancelled)]),
            OrchestratorConfig::default(),
        )
        .with_preview(Arc::clone(&preview) as Arc<dyn PreviewSink>);
        orch.print_batch(1, &records(2)).await.unwrap();
        assert_eq!(preview.0.load(Ordering::SeqCst), 0);
    }
}
