use std::collections::BTreeSet;

use serde::Serialize;

use crate::models::analysis::CandidateId;

/// Presentation flags tied to the current batch of candidates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewState {
    /// Cards showing their detail panel.
    pub expanded: BTreeSet<CandidateId>,
    /// Whether the "unsent decisions" banner is showing.
    pub draft_banner: bool,
}

impl ViewState {
    pub fn toggle_expanded(&mut self, id: CandidateId) -> bool {
        if self.expanded.remove(&id) {
            false
        } else {
            self.expanded.insert(id);
            true
        }
    }

    pub fn reset(&mut self) {
        self.expanded.clear();
        self.draft_banner = false;
    }
}
