//! Submission coordinator — sends every staged draft to the audit log and
//! reconciles the outcome.
//!
//! CRITICAL: one failed draft never blocks or cancels the others. All calls are
//! issued together, the batch waits for every one of them to settle, and each
//! outcome is classified on its own. Errors stop at the per-draft boundary.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::analysis::CandidateId;
use crate::models::decision::{PendingDecision, RegisterDecisionRequest};
use crate::review::drafts::DecisionDraftStore;
use crate::review::selection::SelectionSet;
use crate::review::view::ViewState;
use crate::screening_client::ClientError;

/// Remote sink for decisions. `ScreeningClient` is the production backend.
/// `Ok` means the backend accepted the entry.
#[async_trait]
pub trait DecisionRecorder: Send + Sync {
    async fn record(&self, request: &RegisterDecisionRequest) -> Result<(), ClientError>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedSubmission {
    pub candidate_id: CandidateId,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SubmissionReport {
    pub succeeded: Vec<CandidateId>,
    pub failed: Vec<FailedSubmission>,
}

impl SubmissionReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_full_success(&self) -> bool {
        !self.succeeded.is_empty() && self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<CandidateId> {
        self.failed.iter().map(|f| f.candidate_id.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Complete,
    Partial,
    Failed,
}

/// What the caller shows the operator after a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub status: SubmissionStatus,
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub message: String,
    pub report: SubmissionReport,
}

pub struct SubmissionCoordinator {
    recorder: Arc<dyn DecisionRecorder>,
}

impl SubmissionCoordinator {
    pub fn new(recorder: Arc<dyn DecisionRecorder>) -> Self {
        Self { recorder }
    }

    /// Fan-out, wait-all. No ordering between individual calls; the report
    /// lists ids in draft order.
    pub async fn submit(&self, drafts: &[PendingDecision]) -> SubmissionReport {
        let calls = drafts.iter().map(|draft| async move {
            let request = RegisterDecisionRequest::from(draft);
            (draft, self.recorder.record(&request).await)
        });

        let mut report = SubmissionReport::default();
        for (draft, result) in join_all(calls).await {
            match result {
                Ok(_) => report.succeeded.push(draft.candidate_id.clone()),
                Err(e) => {
                    warn!(
                        "Failed to record {} for {}: {e}",
                        draft.status, draft.candidate_id
                    );
                    report.failed.push(FailedSubmission {
                        candidate_id: draft.candidate_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Submission settled: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }
}

/// Applies a settled report to local state.
///
/// - succeeded drafts are settled (their badge stays);
/// - failed drafts stay staged for retry;
/// - a fully successful batch also clears the selection and view state and
///   calls `reset_intake` so the parent workflow can drop its inputs.
pub fn reconcile<F>(
    report: SubmissionReport,
    drafts: &mut DecisionDraftStore,
    selection: &mut SelectionSet,
    view: &mut ViewState,
    reset_intake: F,
) -> SubmissionOutcome
where
    F: FnOnce(),
{
    let succeeded_count = report.succeeded.len();
    let failed_count = report.failed.len();

    let status = if report.is_full_success() {
        drafts.clear_all_drafts();
        selection.clear();
        view.reset();
        reset_intake();
        SubmissionStatus::Complete
    } else {
        for id in &report.succeeded {
            drafts.settle(id);
        }
        view.draft_banner = drafts.has_drafts();
        if succeeded_count > 0 {
            SubmissionStatus::Partial
        } else {
            SubmissionStatus::Failed
        }
    };

    SubmissionOutcome {
        status,
        succeeded_count,
        failed_count,
        message: outcome_message(status, succeeded_count, failed_count),
        report,
    }
}

fn outcome_message(status: SubmissionStatus, succeeded: usize, failed: usize) -> String {
    match status {
        SubmissionStatus::Complete => format!("{succeeded} decisions recorded in the audit log."),
        SubmissionStatus::Partial => format!(
            "{succeeded} succeeded, {failed} failed. Failed decisions remain staged for retry."
        ),
        SubmissionStatus::Failed => format!(
            "0 succeeded, {failed} failed. Nothing was recorded; decisions remain staged for retry."
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use super::*;
    use crate::models::decision::DecisionStatus;
    use crate::review::storage::MemoryStorage;

    /// Records every request; fails the ids listed in `failing`.
    struct FakeRecorder {
        failing: HashSet<String>,
        calls: Mutex<Vec<RegisterDecisionRequest>>,
        barrier: Option<Barrier>,
    }

    impl FakeRecorder {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                barrier: None,
            }
        }
    }

    #[async_trait]
    impl DecisionRecorder for FakeRecorder {
        async fn record(&self, request: &RegisterDecisionRequest) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push(request.clone());
            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            if self.failing.contains(&request.candidate_id) {
                return Err(ClientError::Api {
                    status: 503,
                    message: "audit store unavailable".to_string(),
                });
            }
            Ok(())
        }
    }

    fn staged_store(ids: &[&str]) -> DecisionDraftStore {
        let mut store = DecisionDraftStore::load(Arc::new(MemoryStorage::new()));
        for id in ids {
            store.stage(
                CandidateId::from(*id),
                format!("{id}.pdf"),
                DecisionStatus::OnHold,
                "",
            );
        }
        store
    }

    const FIVE: [&str; 5] = ["c1", "c2", "c3", "c4", "c5"];

    #[tokio::test]
    async fn test_partial_failure_keeps_failed_drafts() {
        let recorder = Arc::new(FakeRecorder::new(&["c2", "c4"]));
        let coordinator = SubmissionCoordinator::new(recorder.clone());
        let mut drafts = staged_store(&FIVE);
        let mut selection = SelectionSet::new();
        let mut view = ViewState::default();
        let mut intake_reset = false;

        let report = coordinator.submit(&drafts.drafts()).await;
        assert_eq!(recorder.calls.lock().unwrap().len(), 5);

        let outcome = reconcile(report, &mut drafts, &mut selection, &mut view, || {
            intake_reset = true
        });

        assert_eq!(outcome.status, SubmissionStatus::Partial);
        assert_eq!((outcome.succeeded_count, outcome.failed_count), (3, 2));
        assert!(!intake_reset);

        let mut remaining: Vec<String> =
            drafts.drafts().iter().map(|d| d.candidate_id.to_string()).collect();
        remaining.sort();
        assert_eq!(remaining, vec!["c2", "c4"]);
        // Submitted decisions keep their badge
        assert!(drafts.visible(&CandidateId::from("c1")).is_some());
        assert!(view.draft_banner);
    }

    #[tokio::test]
    async fn test_full_success_resets_workflow() {
        let coordinator = SubmissionCoordinator::new(Arc::new(FakeRecorder::new(&[])));
        let mut drafts = staged_store(&["c1", "c2"]);
        let mut selection = SelectionSet::new();
        selection.toggle(CandidateId::from("c1"));
        let mut view = ViewState::default();
        view.toggle_expanded(CandidateId::from("c2"));
        view.draft_banner = true;
        let mut intake_reset = false;

        let report = coordinator.submit(&drafts.drafts()).await;
        let outcome = reconcile(report, &mut drafts, &mut selection, &mut view, || {
            intake_reset = true
        });

        assert_eq!(outcome.status, SubmissionStatus::Complete);
        assert!(!drafts.has_drafts());
        assert!(selection.is_empty());
        assert!(view.expanded.is_empty());
        assert!(!view.draft_banner);
        assert!(intake_reset);
        assert_eq!(drafts.visible_decisions().len(), 2);
    }

    #[tokio::test]
    async fn test_all_failed_keeps_everything_staged() {
        let coordinator =
            SubmissionCoordinator::new(Arc::new(FakeRecorder::new(&["c1", "c2"])));
        let mut drafts = staged_store(&["c1", "c2"]);
        let mut selection = SelectionSet::new();
        let mut view = ViewState::default();

        let report = coordinator.submit(&drafts.drafts()).await;
        let outcome = reconcile(report, &mut drafts, &mut selection, &mut view, || {
            panic!("intake must not reset on failure")
        });

        assert_eq!(outcome.status, SubmissionStatus::Failed);
        assert_eq!(drafts.draft_count(), 2);
        assert_eq!(outcome.report.failed[0].error, "API error (status 503): audit store unavailable");
    }

    #[tokio::test]
    async fn test_calls_are_in_flight_concurrently() {
        // Every call waits on a barrier sized to the batch: a sequential
        // coordinator would never get past the first call.
        let recorder = Arc::new(FakeRecorder {
            barrier: Some(Barrier::new(FIVE.len())),
            ..FakeRecorder::new(&["c3"])
        });
        let coordinator = SubmissionCoordinator::new(recorder);
        let drafts = staged_store(&FIVE);

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.submit(&drafts.drafts()),
        )
        .await
        .expect("submission deadlocked");

        assert_eq!(report.succeeded.len(), 4);
        assert_eq!(report.failed_ids(), vec![CandidateId::from("c3")]);
    }

    #[tokio::test]
    async fn test_reason_is_forwarded_only_when_present() {
        let recorder = Arc::new(FakeRecorder::new(&[]));
        let coordinator = SubmissionCoordinator::new(recorder.clone());
        let mut drafts = staged_store(&["c1"]);
        drafts.stage(
            CandidateId::from("c2"),
            "c2.pdf",
            DecisionStatus::Rejected,
            "No cumple con los requisitos técnicos mínimos del puesto",
        );

        coordinator.submit(&drafts.drafts()).await;

        let calls = recorder.calls.lock().unwrap();
        let c1 = calls.iter().find(|c| c.candidate_id == "c1").unwrap();
        let c2 = calls.iter().find(|c| c.candidate_id == "c2").unwrap();
        assert!(c1.reason.is_none());
        assert_eq!(c2.action, DecisionStatus::Rejected);
        assert_eq!(c2.candidate_filename, "c2.pdf");
        assert!(c2.reason.is_some());
    }

    #[test]
    fn test_empty_report_is_not_full_success() {
        assert!(!SubmissionReport::default().is_full_success());
    }
}
