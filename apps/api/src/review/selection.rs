//! Bulk selection and the coordinator that applies one decision to all of it.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::analysis::CandidateId;
use crate::models::decision::DecisionStatus;
use crate::review::drafts::DecisionDraftStore;
use crate::review::reason::{ReasonCapture, ReasonTarget};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SelectionSet {
    ids: BTreeSet<CandidateId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: CandidateId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = CandidateId>) {
        self.ids.extend(ids);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateId> {
        self.ids.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BulkOutcome {
    /// Nothing was selected.
    Noop,
    /// Drafts were staged and the selection cleared.
    Staged { candidate_ids: Vec<CandidateId> },
    /// The reason dialog is open for the whole selection.
    AwaitingReason { selected: usize },
}

/// Applies one status to every selected candidate. Holds no state: the
/// selection, dialog and draft store are borrowed per call.
pub struct BulkActionCoordinator;

impl BulkActionCoordinator {
    /// Rejections open the reason dialog once for the whole selection; other
    /// statuses are staged immediately with an empty reason.
    pub fn apply_bulk<F>(
        status: DecisionStatus,
        selection: &mut SelectionSet,
        dialog: &mut ReasonCapture,
        drafts: &mut DecisionDraftStore,
        filename_of: F,
    ) -> BulkOutcome
    where
        F: Fn(&CandidateId) -> Option<String>,
    {
        if selection.is_empty() {
            return BulkOutcome::Noop;
        }

        if status.requires_reason() {
            dialog.open(status, ReasonTarget::Selection);
            return BulkOutcome::AwaitingReason {
                selected: selection.len(),
            };
        }

        Self::stage_selection(status, "", selection, drafts, filename_of)
    }

    /// Stages every selected candidate with `status` and `reason`, then
    /// clears the selection. Ids that no longer resolve to a file are skipped.
    pub fn stage_selection<F>(
        status: DecisionStatus,
        reason: &str,
        selection: &mut SelectionSet,
        drafts: &mut DecisionDraftStore,
        filename_of: F,
    ) -> BulkOutcome
    where
        F: Fn(&CandidateId) -> Option<String>,
    {
        if selection.is_empty() {
            return BulkOutcome::Noop;
        }

        let mut staged = Vec::with_capacity(selection.len());
        for id in selection.iter() {
            let Some(filename) = filename_of(id) else {
                warn!("Skipping bulk {status} for unknown candidate {id}");
                continue;
            };
            drafts.stage(id.clone(), filename, status, reason);
            staged.push(id.clone());
        }
        selection.clear();

        info!("Bulk {status} staged for {} candidates", staged.len());
        BulkOutcome::Staged {
            candidate_ids: staged,
        }
    }
}
