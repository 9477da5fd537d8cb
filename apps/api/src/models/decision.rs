use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::models::analysis::CandidateId;

/// Hiring decision an operator records against a candidate.
/// There is no "pending" value: an absent entry means undecided.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Interview,
    Rejected,
    OnHold,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Interview => "interview",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::OnHold => "on_hold",
        }
    }

    /// Only rejections carry a mandatory justification.
    pub fn requires_reason(&self) -> bool {
        matches!(self, DecisionStatus::Rejected)
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision staged locally and not yet sent to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingDecision {
    pub candidate_id: CandidateId,
    pub candidate_filename: String,
    pub status: DecisionStatus,
    /// May be empty for interview / on_hold.
    pub reason: String,
}

/// Display projection of a decision, mirrored into durable storage so a
/// reloaded workbench still shows which candidates carry a mark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibleDecision {
    pub candidate_id: CandidateId,
    pub status: DecisionStatus,
    pub notes: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Audit log wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDecisionRequest {
    pub candidate_id: String,
    pub candidate_filename: String,
    pub action: DecisionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&PendingDecision> for RegisterDecisionRequest {
    fn from(draft: &PendingDecision) -> Self {
        Self {
            candidate_id: draft.candidate_id.to_string(),
            candidate_filename: draft.candidate_filename.clone(),
            action: draft.status,
            reason: (!draft.reason.is_empty()).then(|| draft.reason.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredDecision {
    pub candidate_id: String,
    pub action: DecisionStatus,
    pub username: String,
    #[serde(deserialize_with = "backend_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub candidate_id: String,
    pub candidate_filename: String,
    /// Kept as text: the log predates the current action set.
    pub action: String,
    pub username: String,
    #[serde(deserialize_with = "backend_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Parses a backend timestamp. RFC 3339 with an offset is taken as is; a
/// bare ISO datetime (the audit store's own format) is read as UTC.
pub fn parse_backend_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(with_offset.with_timezone(&Utc));
    }
    raw.parse::<NaiveDateTime>()
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn backend_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_backend_timestamp(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{raw}'")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogPage {
    pub entries: Vec<AuditEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogFilter {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub action: Option<DecisionStatus>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_value(DecisionStatus::OnHold).unwrap(),
            json!("on_hold")
        );
        let status: DecisionStatus = serde_json::from_value(json!("rejected")).unwrap();
        assert_eq!(status, DecisionStatus::Rejected);
    }

    #[test]
    fn test_only_rejection_requires_reason() {
        assert!(DecisionStatus::Rejected.requires_reason());
        assert!(!DecisionStatus::Interview.requires_reason());
        assert!(!DecisionStatus::OnHold.requires_reason());
    }

    #[test]
    fn test_register_request_omits_empty_reason() {
        let draft = PendingDecision {
            candidate_id: CandidateId::from("cv1.pdf-default"),
            candidate_filename: "cv1.pdf".to_string(),
            status: DecisionStatus::Interview,
            reason: String::new(),
        };
        let body = serde_json::to_value(RegisterDecisionRequest::from(&draft)).unwrap();
        assert_eq!(
            body,
            json!({
                "candidate_id": "cv1.pdf-default",
                "candidate_filename": "cv1.pdf",
                "action": "interview"
            })
        );
    }

    #[test]
    fn test_audit_page_parses_backend_timestamps() {
        let page: AuditLogPage = serde_json::from_value(json!({
            "entries": [
                {
                    "candidate_id": "cv1.pdf-default",
                    "candidate_filename": "cv1.pdf",
                    "action": "rejected",
                    "username": "ana",
                    "timestamp": "2026-10-17T09:30:12.482913",
                    "reason": "No cumple con los requisitos técnicos mínimos del puesto"
                },
                {
                    "candidate_id": "cv2.pdf-default",
                    "candidate_filename": "cv2.pdf",
                    "action": "interview",
                    "username": "ana",
                    "timestamp": "2026-10-17T09:30:00"
                }
            ],
            "total": 2
        }))
        .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.entries[0].timestamp > page.entries[1].timestamp);
        assert!(page.entries[1].reason.is_none());
    }

    #[test]
    fn test_backend_timestamp_formats() {
        let naive = parse_backend_timestamp("2026-10-17T09:30:00").unwrap();
        assert_eq!(parse_backend_timestamp("2026-10-17T09:30:00+00:00"), Some(naive));
        assert_eq!(parse_backend_timestamp("2026-10-17T09:30:00Z"), Some(naive));
        assert_eq!(
            parse_backend_timestamp("2026-10-17T11:30:00+02:00"),
            Some(naive)
        );
        assert!(parse_backend_timestamp("ayer").is_none());
    }
}
