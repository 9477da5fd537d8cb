//! Decision draft store — single source of truth for staged (unsent)
//! decisions and for the visible decision badges.
//!
//! Two maps are kept:
//! - `pending`: drafts awaiting submission. Memory only.
//! - `visible`: display projection, persisted under `VISIBLE_DECISIONS_KEY`
//!   and reloaded on mount.
//!
//! INVARIANT: every pending entry has a visible entry with the same status and
//! reason. A visible entry may outlive its pending entry once submitted.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::analysis::CandidateId;
use crate::models::decision::{DecisionStatus, PendingDecision, VisibleDecision};
use crate::review::storage::DraftStorage;

pub const VISIBLE_DECISIONS_KEY: &str = "screening.candidate-decisions";

/// Persisted value shape: `{ "<candidate id>": { "status": ..., "notes": ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredDecision {
    status: DecisionStatus,
    #[serde(default)]
    notes: String,
}

pub struct DecisionDraftStore {
    storage: Arc<dyn DraftStorage>,
    pending: BTreeMap<CandidateId, PendingDecision>,
    visible: BTreeMap<CandidateId, VisibleDecision>,
}

impl DecisionDraftStore {
    /// Mounts the store, loading the persisted visible map once.
    pub fn load(storage: Arc<dyn DraftStorage>) -> Self {
        let visible = read_visible(storage.as_ref());
        debug!("Loaded {} visible decisions", visible.len());
        Self {
            storage,
            pending: BTreeMap::new(),
            visible,
        }
    }

    /// Inserts or overwrites the draft for `candidate_id` and its badge.
    pub fn stage(
        &mut self,
        candidate_id: CandidateId,
        candidate_filename: impl Into<String>,
        status: DecisionStatus,
        reason: impl Into<String>,
    ) {
        let reason = reason.into();
        self.visible.insert(
            candidate_id.clone(),
            VisibleDecision {
                candidate_id: candidate_id.clone(),
                status,
                notes: reason.clone(),
            },
        );
        self.pending.insert(
            candidate_id.clone(),
            PendingDecision {
                candidate_id,
                candidate_filename: candidate_filename.into(),
                status,
                reason,
            },
        );
        self.persist();
    }

    /// Cancels an unsent draft: removes the draft and its badge.
    /// Returns false when there was no draft to cancel.
    pub fn discard(&mut self, candidate_id: &CandidateId) -> bool {
        if self.pending.remove(candidate_id).is_none() {
            return false;
        }
        self.visible.remove(candidate_id);
        self.persist();
        true
    }

    /// Drops the draft of a submitted decision. The badge stays.
    pub fn settle(&mut self, candidate_id: &CandidateId) -> bool {
        self.pending.remove(candidate_id).is_some()
    }

    /// Drops every draft after a fully successful submission. Badges stay.
    pub fn clear_all_drafts(&mut self) {
        self.pending.clear();
    }

    /// Full workflow reset: drafts and badges both go.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.visible.clear();
        self.persist();
    }

    pub fn pending(&self, candidate_id: &CandidateId) -> Option<&PendingDecision> {
        self.pending.get(candidate_id)
    }

    pub fn visible(&self, candidate_id: &CandidateId) -> Option<&VisibleDecision> {
        self.visible.get(candidate_id)
    }

    pub fn drafts(&self) -> Vec<PendingDecision> {
        self.pending.values().cloned().collect()
    }

    pub fn visible_decisions(&self) -> Vec<VisibleDecision> {
        self.visible.values().cloned().collect()
    }

    pub fn draft_count(&self) -> usize {
        self.pending.len()
    }

    pub fn has_drafts(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Rewrites the full visible map, or drops the key once the map is
    /// empty. Storage failures are logged, the in-memory state remains
    /// authoritative.
    fn persist(&self) {
        if self.visible.is_empty() {
            if let Err(e) = self.storage.remove(VISIBLE_DECISIONS_KEY) {
                warn!("Failed to clear visible decisions: {e}");
            }
            return;
        }

        let stored: BTreeMap<&CandidateId, StoredDecision> = self
            .visible
            .iter()
            .map(|(id, decision)| {
                (
                    id,
                    StoredDecision {
                        status: decision.status,
                        notes: decision.notes.clone(),
                    },
                )
            })
            .collect();

        let json = match serde_json::to_string(&stored) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize visible decisions: {e}");
                return;
            }
        };

        if let Err(e) = self.storage.write(VISIBLE_DECISIONS_KEY, &json) {
            warn!("Failed to persist visible decisions: {e}");
        }
    }
}

/// Unreadable or unparsable stored data is treated as empty.
fn read_visible(storage: &dyn DraftStorage) -> BTreeMap<CandidateId, VisibleDecision> {
    let raw = match storage.read(VISIBLE_DECISIONS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return BTreeMap::new(),
        Err(e) => {
            warn!("Failed to read visible decisions, starting empty: {e}");
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<CandidateId, StoredDecision>>(&raw) {
        Ok(stored) => stored
            .into_iter()
            .map(|(id, decision)| {
                (
                    id.clone(),
                    VisibleDecision {
                        candidate_id: id,
                        status: decision.status,
                        notes: decision.notes,
                    },
                )
            })
            .collect(),
        Err(e) => {
            warn!("Discarding corrupt visible decisions: {e}");
            BTreeMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::storage::{MemoryStorage, StorageError};

    fn id(s: &str) -> CandidateId {
        CandidateId::from(s)
    }

    fn make_store() -> (Arc<MemoryStorage>, DecisionDraftStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = DecisionDraftStore::load(storage.clone());
        (storage, store)
    }

    fn assert_shadowed(store: &DecisionDraftStore) {
        for draft in store.drafts() {
            let visible = store
                .visible(&draft.candidate_id)
                .expect("every draft has a badge");
            assert_eq!(visible.status, draft.status);
            assert_eq!(visible.notes, draft.reason);
        }
    }

    #[test]
    fn test_stage_creates_draft_and_badge() {
        let (_, mut store) = make_store();
        store.stage(
            id("cv1.pdf-default"),
            "cv1.pdf",
            DecisionStatus::OnHold,
            "",
        );

        let draft = store.pending(&id("cv1.pdf-default")).unwrap();
        assert_eq!(draft.status, DecisionStatus::OnHold);
        assert_eq!(draft.candidate_filename, "cv1.pdf");
        assert_shadowed(&store);
    }

    #[test]
    fn test_restage_overwrites() {
        let (_, mut store) = make_store();
        let cid = id("cv1.pdf-default");
        store.stage(cid.clone(), "cv1.pdf", DecisionStatus::Interview, "");
        store.stage(
            cid.clone(),
            "cv1.pdf",
            DecisionStatus::Rejected,
            "No cumple con los requisitos técnicos",
        );

        assert_eq!(store.draft_count(), 1);
        assert_eq!(store.pending(&cid).unwrap().status, DecisionStatus::Rejected);
        assert_shadowed(&store);
    }

    #[test]
    fn test_stage_then_discard_leaves_no_trace() {
        let (storage, mut store) = make_store();
        let cid = id("cv1.pdf-default");
        store.stage(cid.clone(), "cv1.pdf", DecisionStatus::Interview, "");

        assert!(store.discard(&cid));
        assert!(store.pending(&cid).is_none());
        assert!(store.visible(&cid).is_none());

        let reloaded = DecisionDraftStore::load(storage);
        assert!(reloaded.visible_decisions().is_empty());
    }

    #[test]
    fn test_discard_unknown_is_noop() {
        let (_, mut store) = make_store();
        assert!(!store.discard(&id("ghost")));
    }

    #[test]
    fn test_settle_keeps_badge() {
        let (_, mut store) = make_store();
        let cid = id("cv1.pdf-default");
        store.stage(cid.clone(), "cv1.pdf", DecisionStatus::Interview, "");

        assert!(store.settle(&cid));
        assert!(store.pending(&cid).is_none());
        assert_eq!(store.visible(&cid).unwrap().status, DecisionStatus::Interview);
    }

    #[test]
    fn test_clear_all_drafts_keeps_badges() {
        let (_, mut store) = make_store();
        store.stage(id("a"), "a.pdf", DecisionStatus::Interview, "");
        store.stage(id("b"), "b.pdf", DecisionStatus::OnHold, "");

        store.clear_all_drafts();
        assert!(!store.has_drafts());
        assert_eq!(store.visible_decisions().len(), 2);
    }

    #[test]
    fn test_reset_clears_everything() {
        let (storage, mut store) = make_store();
        store.stage(id("a"), "a.pdf", DecisionStatus::Interview, "");
        store.reset();
        assert!(!store.has_drafts());
        assert!(store.visible_decisions().is_empty());
        // Nothing left to show: the stored document is dropped, not emptied
        assert!(storage.read(VISIBLE_DECISIONS_KEY).unwrap().is_none());
        assert!(DecisionDraftStore::load(storage).visible_decisions().is_empty());
    }

    #[test]
    fn test_badges_survive_reload_but_drafts_do_not() {
        let (storage, mut store) = make_store();
        store.stage(
            id("a"),
            "a.pdf",
            DecisionStatus::Rejected,
            "Experiencia insuficiente para el nivel requerido",
        );

        let reloaded = DecisionDraftStore::load(storage);
        assert!(!reloaded.has_drafts());
        let badge = reloaded.visible(&id("a")).unwrap();
        assert_eq!(badge.status, DecisionStatus::Rejected);
        assert_eq!(badge.notes, "Experiencia insuficiente para el nivel requerido");
    }

    #[test]
    fn test_persisted_format_is_id_keyed_map() {
        let (storage, mut store) = make_store();
        store.stage(id("cv1.pdf-default"), "cv1.pdf", DecisionStatus::OnHold, "");

        let raw = storage.read(VISIBLE_DECISIONS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "cv1.pdf-default": { "status": "on_hold", "notes": "" } })
        );
    }

    #[test]
    fn test_malformed_json_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.write(VISIBLE_DECISIONS_KEY, "{not json").unwrap();
        let store = DecisionDraftStore::load(storage);
        assert!(store.visible_decisions().is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .write(VISIBLE_DECISIONS_KEY, "{\"a\": {\"status\": \"maybe\"}}")
            .unwrap();
        assert!(DecisionDraftStore::load(storage).visible_decisions().is_empty());
    }

    struct BrokenStorage;

    impl DraftStorage for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("disk gone")))
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failures_do_not_surface() {
        let mut store = DecisionDraftStore::load(Arc::new(BrokenStorage));
        store.stage(id("a"), "a.pdf", DecisionStatus::Interview, "");
        assert_eq!(store.draft_count(), 1);
        assert_shadowed(&store);
    }
}
