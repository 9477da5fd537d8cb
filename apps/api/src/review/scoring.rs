//! Display score for an analysis result. Pure and deterministic: the same
//! result always produces the same score and tone.

use serde::{Deserialize, Serialize};

use crate::models::analysis::{AnalysisResult, ConfidenceLevel};

pub const MIN_SCORE: u8 = 30;
pub const MAX_SCORE: u8 = 100;

const UNKNOWN_LEVEL_BASE: i32 = 70;
const MISSING_INFORMATION_PENALTY: i32 = 10;
const CRITERIA_BONUS: i32 = 5;
const CRITERIA_BONUS_THRESHOLD: usize = 3;

/// Coarse grouping of a score for display.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTone {
    Alto,
    Medio,
    Bajo,
}

pub fn base_score(level: ConfidenceLevel) -> i32 {
    match level {
        ConfidenceLevel::High => 92,
        ConfidenceLevel::Medium => 76,
        ConfidenceLevel::Low => 58,
        ConfidenceLevel::Insufficient => 45,
        ConfidenceLevel::Unknown => UNKNOWN_LEVEL_BASE,
    }
}

/// base(confidence) − 10 if information is missing + 5 if ≥ 3 criteria, clamped to [30, 100].
pub fn score(result: &AnalysisResult) -> u8 {
    let penalty = if result.has_missing_information() {
        MISSING_INFORMATION_PENALTY
    } else {
        0
    };
    let bonus = if result.objective_criteria.len() >= CRITERIA_BONUS_THRESHOLD {
        CRITERIA_BONUS
    } else {
        0
    };

    let raw = base_score(result.confidence_level) - penalty + bonus;
    raw.clamp(MIN_SCORE as i32, MAX_SCORE as i32) as u8
}

pub fn tone(score: u8) -> ScoreTone {
    if score >= 85 {
        ScoreTone::Alto
    } else if score >= 70 {
        ScoreTone::Medio
    } else {
        ScoreTone::Bajo
    }
}
