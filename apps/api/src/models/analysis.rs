use std::fmt;

use serde::{Deserialize, Serialize};

/// Categorical quality signal the analysis backend attaches to every result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    Insufficient,
    /// Any level this build does not recognise. Scored with the fallback base.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveCriterion {
    pub name: String,
    pub value: String,
    /// 0.0 – 1.0 when present
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Alto,
    Medio,
    Bajo,
    /// A level this build does not recognise. Shown unclassified.
    #[serde(other)]
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Alto => "alto",
            RiskLevel::Medio => "medio",
            RiskLevel::Bajo => "bajo",
            RiskLevel::Unknown => "sin clasificar",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Risk {
    pub category: String,
    pub level: RiskLevel,
    pub description: String,
}

/// One candidate's analysis as produced by the backend. Read-only to the review core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "candidateId", default)]
    pub candidate_id: Option<String>,
    pub filename: String,
    pub recommendation: String,
    #[serde(default)]
    pub objective_criteria: Vec<ObjectiveCriterion>,
    pub confidence_level: ConfidenceLevel,
    #[serde(default)]
    pub confidence_explanation: String,
    #[serde(default)]
    pub ethical_compliance: Option<bool>,
    #[serde(default)]
    pub missing_information: Option<Vec<String>>,
    #[serde(default)]
    pub risks: Option<Vec<Risk>>,
}

impl AnalysisResult {
    pub fn identity(&self) -> CandidateId {
        CandidateId::derive(&self.filename, self.candidate_id.as_deref())
    }

    pub fn has_missing_information(&self) -> bool {
        self.missing_information
            .as_ref()
            .is_some_and(|items| !items.is_empty())
    }
}

/// Session-scoped candidate key: `"<filename>-<candidateId|default>"`.
///
/// Stable for one analysis result set only. It is not a database key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn derive(filename: &str, candidate_id: Option<&str>) -> Self {
        let suffix = match candidate_id {
            Some(id) if !id.is_empty() => id,
            _ => "default",
        };
        Self(format!("{filename}-{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CandidateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CandidateId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CV text handed to the analysis backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateDocument {
    pub filename: String,
    pub content: String,
    #[serde(rename = "candidateId", default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<String>,
}
