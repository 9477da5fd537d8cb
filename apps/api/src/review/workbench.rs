//! Review workbench — one operator's screening session.
//!
//! Owns the upstream intake, the analysed candidates, the draft store, the
//! bulk selection, the reason dialog and presentation flags. All mutation
//! happens through discrete operator actions or submission completion.
//!
//! CRITICAL: while `is_submitting` is set, every mutating operation is
//! refused. The drafts handed to the coordinator are exactly the drafts
//! reconciled afterwards.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::models::analysis::{AnalysisResult, CandidateDocument, CandidateId};
use crate::models::decision::{DecisionStatus, PendingDecision, VisibleDecision};
use crate::review::card::CandidateCard;
use crate::review::drafts::DecisionDraftStore;
use crate::review::reason::{ReasonCapture, ReasonError, ReasonTarget};
use crate::review::selection::{BulkActionCoordinator, BulkOutcome, SelectionSet};
use crate::review::storage::DraftStorage;
use crate::review::submission::{reconcile, SubmissionOutcome, SubmissionReport};
use crate::review::view::ViewState;

#[derive(Debug, Error)]
pub enum WorkbenchError {
    #[error("Unknown candidate '{0}'")]
    UnknownCandidate(CandidateId),

    #[error("Candidate '{0}' appears more than once in the analysis results")]
    DuplicateCandidate(CandidateId),

    #[error("No staged decision for candidate '{0}'")]
    NoDraft(CandidateId),

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("The selection is waiting on a bulk rejection reason; confirm or cancel it first")]
    SelectionLocked,

    #[error("There are no staged decisions to submit")]
    NothingToSubmit,

    #[error(transparent)]
    Reason(#[from] ReasonError),
}

/// Inputs the analysis was produced from. Cleared when a submission fully succeeds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Intake {
    pub job_description: String,
    pub documents: Vec<CandidateDocument>,
    pub model_id: Option<String>,
}

impl Intake {
    pub fn is_empty(&self) -> bool {
        self.job_description.is_empty() && self.documents.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    #[serde(flatten)]
    pub card: CandidateCard,
    pub selected: bool,
    pub expanded: bool,
    pub staged: bool,
    pub decision: Option<VisibleDecision>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbenchSnapshot {
    pub job_description: String,
    pub candidates: Vec<CandidateView>,
    pub drafts: Vec<PendingDecision>,
    pub visible_decisions: Vec<VisibleDecision>,
    pub selection: SelectionSet,
    pub dialog: ReasonCapture,
    pub draft_banner: bool,
    pub is_submitting: bool,
}

pub struct ReviewWorkbench {
    intake: Intake,
    cards: Vec<CandidateCard>,
    /// candidate id → CV filename for the current result set
    roster: BTreeMap<CandidateId, String>,
    drafts: DecisionDraftStore,
    selection: SelectionSet,
    dialog: ReasonCapture,
    view: ViewState,
    is_submitting: bool,
}

impl ReviewWorkbench {
    pub fn new(storage: Arc<dyn DraftStorage>) -> Self {
        Self {
            intake: Intake::default(),
            cards: Vec::new(),
            roster: BTreeMap::new(),
            drafts: DecisionDraftStore::load(storage),
            selection: SelectionSet::new(),
            dialog: ReasonCapture::new(),
            view: ViewState::default(),
            is_submitting: false,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn drafts(&self) -> &DecisionDraftStore {
        &self.drafts
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn dialog(&self) -> &ReasonCapture {
        &self.dialog
    }

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    // ────────────────────────────────────────────────────────────────────────
    // Intake
    // ────────────────────────────────────────────────────────────────────────

    /// Replaces the analysed candidates. Identities must be unique within the set.
    pub fn load_results(
        &mut self,
        intake: Intake,
        results: Vec<AnalysisResult>,
    ) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;

        let mut seen = HashSet::new();
        for result in &results {
            let id = result.identity();
            if !seen.insert(id.clone()) {
                return Err(WorkbenchError::DuplicateCandidate(id));
            }
        }

        self.cards = results.iter().map(CandidateCard::from_result).collect();
        self.roster = results
            .iter()
            .map(|r| (r.identity(), r.filename.clone()))
            .collect();
        self.intake = intake;
        self.selection.clear();
        self.view.expanded.clear();
        self.dialog.close();

        info!("Loaded {} analysed candidates", self.cards.len());
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Per-candidate actions
    // ────────────────────────────────────────────────────────────────────────

    /// Opens the reason dialog for one candidate.
    pub fn request_action(
        &mut self,
        id: &CandidateId,
        status: DecisionStatus,
    ) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        let filename = self.filename_of(id)?;
        self.dialog.open(
            status,
            ReasonTarget::Candidate {
                candidate_id: id.clone(),
                candidate_filename: filename,
            },
        );
        Ok(())
    }

    pub fn set_dialog_text(&mut self, text: String) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        Ok(self.dialog.set_text(text)?)
    }

    pub fn apply_template(&mut self, index: usize) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        Ok(self.dialog.apply_template(index)?)
    }

    /// Confirms the dialog (with `text`, or the current text when `None`) and
    /// stages the decision for its target.
    pub fn confirm_dialog(&mut self, text: Option<&str>) -> Result<BulkOutcome, WorkbenchError> {
        self.ensure_idle()?;
        let confirmation = match text {
            Some(text) => self.dialog.confirm(text)?,
            None => self.dialog.confirm_current()?,
        };

        let outcome = match confirmation.target {
            ReasonTarget::Candidate {
                candidate_id,
                candidate_filename,
            } => {
                self.drafts.stage(
                    candidate_id.clone(),
                    candidate_filename,
                    confirmation.action,
                    confirmation.reason,
                );
                BulkOutcome::Staged {
                    candidate_ids: vec![candidate_id],
                }
            }
            ReasonTarget::Selection => {
                let roster = &self.roster;
                BulkActionCoordinator::stage_selection(
                    confirmation.action,
                    &confirmation.reason,
                    &mut self.selection,
                    &mut self.drafts,
                    |id| roster.get(id).cloned(),
                )
            }
        };

        self.view.draft_banner = self.drafts.has_drafts();
        Ok(outcome)
    }

    pub fn cancel_dialog(&mut self) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        Ok(self.dialog.cancel()?)
    }

    /// Cancels an unsent draft and removes its badge.
    pub fn discard_draft(&mut self, id: &CandidateId) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        if !self.drafts.discard(id) {
            return Err(WorkbenchError::NoDraft(id.clone()));
        }
        self.view.draft_banner = self.drafts.has_drafts();
        Ok(())
    }

    pub fn toggle_expanded(&mut self, id: &CandidateId) -> Result<bool, WorkbenchError> {
        self.filename_of(id)?;
        Ok(self.view.toggle_expanded(id.clone()))
    }

    // ────────────────────────────────────────────────────────────────────────
    // Selection / bulk
    // ────────────────────────────────────────────────────────────────────────

    pub fn toggle_selection(&mut self, id: &CandidateId) -> Result<bool, WorkbenchError> {
        self.ensure_idle()?;
        self.ensure_selection_unlocked()?;
        self.filename_of(id)?;
        Ok(self.selection.toggle(id.clone()))
    }

    pub fn select_all(&mut self) -> Result<usize, WorkbenchError> {
        self.ensure_idle()?;
        self.ensure_selection_unlocked()?;
        self.selection.select_all(self.roster.keys().cloned());
        Ok(self.selection.len())
    }

    pub fn clear_selection(&mut self) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        self.ensure_selection_unlocked()?;
        self.selection.clear();
        Ok(())
    }

    pub fn apply_bulk(&mut self, status: DecisionStatus) -> Result<BulkOutcome, WorkbenchError> {
        self.ensure_idle()?;
        self.ensure_selection_unlocked()?;
        let roster = &self.roster;
        let outcome = BulkActionCoordinator::apply_bulk(
            status,
            &mut self.selection,
            &mut self.dialog,
            &mut self.drafts,
            |id| roster.get(id).cloned(),
        );
        self.view.draft_banner = self.drafts.has_drafts();
        Ok(outcome)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Submission
    // ────────────────────────────────────────────────────────────────────────

    /// Marks a submission in flight and hands out the drafts to send.
    pub fn begin_submission(&mut self) -> Result<Vec<PendingDecision>, WorkbenchError> {
        self.ensure_idle()?;
        if !self.drafts.has_drafts() {
            return Err(WorkbenchError::NothingToSubmit);
        }
        self.is_submitting = true;
        Ok(self.drafts.drafts())
    }

    /// Reconciles a settled submission and releases the in-flight guard.
    pub fn finish_submission(&mut self, report: SubmissionReport) -> SubmissionOutcome {
        let Self {
            intake,
            cards,
            roster,
            drafts,
            selection,
            view,
            ..
        } = self;

        let outcome = reconcile(report, drafts, selection, view, || {
            *intake = Intake::default();
            cards.clear();
            roster.clear();
        });

        self.is_submitting = false;
        outcome
    }

    /// Releases the in-flight guard when a submission never produced a
    /// report. Drafts stay staged for retry.
    pub fn abort_submission(&mut self) {
        self.is_submitting = false;
    }

    /// Operator "start over": drops intake, candidates, drafts and badges.
    pub fn reset(&mut self) -> Result<(), WorkbenchError> {
        self.ensure_idle()?;
        self.intake = Intake::default();
        self.cards.clear();
        self.roster.clear();
        self.drafts.reset();
        self.selection.clear();
        self.dialog.close();
        self.view.reset();
        info!("Workbench reset");
        Ok(())
    }

    pub fn snapshot(&self) -> WorkbenchSnapshot {
        let candidates = self
            .cards
            .iter()
            .map(|card| CandidateView {
                selected: self.selection.contains(&card.id),
                expanded: self.view.expanded.contains(&card.id),
                staged: self.drafts.pending(&card.id).is_some(),
                decision: self.drafts.visible(&card.id).cloned(),
                card: card.clone(),
            })
            .collect();

        WorkbenchSnapshot {
            job_description: self.intake.job_description.clone(),
            candidates,
            drafts: self.drafts.drafts(),
            visible_decisions: self.drafts.visible_decisions(),
            selection: self.selection.clone(),
            dialog: self.dialog.clone(),
            draft_banner: self.view.draft_banner,
            is_submitting: self.is_submitting,
        }
    }

    fn ensure_idle(&self) -> Result<(), WorkbenchError> {
        if self.is_submitting {
            return Err(WorkbenchError::SubmissionInFlight);
        }
        Ok(())
    }

    /// INVARIANT: while a bulk rejection dialog is open, the selection it will
    /// be applied to does not change.
    fn ensure_selection_unlocked(&self) -> Result<(), WorkbenchError> {
        match self.dialog.dialog() {
            Some(dialog) if dialog.target == ReasonTarget::Selection => {
                Err(WorkbenchError::SelectionLocked)
            }
            _ => Ok(()),
        }
    }

    fn filename_of(&self, id: &CandidateId) -> Result<String, WorkbenchError> {
        self.roster
            .get(id)
            .cloned()
            .ok_or_else(|| WorkbenchError::UnknownCandidate(id.clone()))
    }
}
