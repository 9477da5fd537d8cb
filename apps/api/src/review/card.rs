//! Candidate card — read-only display annotation of one analysis result.

use serde::Serialize;

use crate::models::analysis::{AnalysisResult, CandidateId, ConfidenceLevel};
use crate::review::scoring::{score, tone, ScoreTone};

const SUMMARY_LIMIT: usize = 240;
const TOP_STRENGTHS: usize = 3;

const ETHICS_REVIEW_ALERT: &str = "Requiere revisión ética antes de avanzar.";
const NO_ALERTS: &str = "Sin alertas relevantes detectadas.";
const DEFAULT_FOLLOW_UPS: &[&str] = &[
    "Profundiza en motivaciones y expectativas salariales.",
    "Valida referencias laborales y logros cuantificables.",
    "Asegura disponibilidad para los hitos críticos del puesto.",
];

#[derive(Debug, Clone, Serialize)]
pub struct CriterionView {
    pub name: String,
    pub value: String,
    pub weight_pct: Option<u32>,
    /// Share of the total weight across all weighted criteria.
    pub contribution_pct: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateCard {
    pub id: CandidateId,
    pub filename: String,
    pub display_name: String,
    pub score: u8,
    pub tone: ScoreTone,
    pub confidence_level: ConfidenceLevel,
    pub confidence_explanation: String,
    pub ethics_review_required: bool,
    pub summary: String,
    pub recommendation: String,
    pub strengths: Vec<String>,
    pub alerts: Vec<String>,
    pub follow_ups: Vec<String>,
    pub criteria: Vec<CriterionView>,
}

impl CandidateCard {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let score = score(result);
        let ethics_review_required = result.ethical_compliance == Some(false);

        Self {
            id: result.identity(),
            filename: result.filename.clone(),
            display_name: result
                .candidate_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| result.filename.clone()),
            score,
            tone: tone(score),
            confidence_level: result.confidence_level,
            confidence_explanation: result.confidence_explanation.clone(),
            ethics_review_required,
            summary: summarize(&result.recommendation),
            recommendation: result.recommendation.clone(),
            strengths: strengths(result),
            alerts: alerts(result, ethics_review_required),
            follow_ups: follow_ups(result),
            criteria: criteria(result),
        }
    }
}

/// Collapses whitespace and shortens to `SUMMARY_LIMIT` characters, preferring
/// to stop at a full stop when one falls in the last 40 % of the window.
pub fn summarize(text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= SUMMARY_LIMIT {
        return normalized;
    }

    let truncated: String = normalized.chars().take(SUMMARY_LIMIT).collect();
    let last_stop = truncated
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .map(|(byte, _)| byte)
        .next_back();

    if let Some(byte) = last_stop {
        let char_pos = truncated[..byte].chars().count();
        if char_pos * 10 > SUMMARY_LIMIT * 6 {
            return truncated[..=byte].to_string();
        }
    }
    format!("{truncated}…")
}

fn strengths(result: &AnalysisResult) -> Vec<String> {
    let mut ranked: Vec<_> = result.objective_criteria.iter().collect();
    ranked.sort_by(|a, b| {
        let wa = a.weight.unwrap_or(0.0);
        let wb = b.weight.unwrap_or(0.0);
        wb.partial_cmp(&wa).unwrap_or(std::cmp::Ordering::Equal)
    });

    ranked
        .into_iter()
        .take(TOP_STRENGTHS)
        .filter(|c| !c.value.is_empty())
        .map(|c| format!("{}: {}", c.name, c.value))
        .collect()
}

fn alerts(result: &AnalysisResult, ethics_review_required: bool) -> Vec<String> {
    let mut items = Vec::new();
    if ethics_review_required {
        items.push(ETHICS_REVIEW_ALERT.to_string());
    }
    if let Some(risks) = &result.risks {
        items.extend(risks.iter().map(|risk| {
            format!(
                "{} ({}): {}",
                risk.category,
                risk.level.as_str(),
                risk.description
            )
        }));
    }
    if let Some(missing) = &result.missing_information {
        items.extend(missing.iter().cloned());
    }
    if items.is_empty() {
        items.push(NO_ALERTS.to_string());
    }
    items
}

fn follow_ups(result: &AnalysisResult) -> Vec<String> {
    match &result.missing_information {
        Some(missing) if !missing.is_empty() => missing.clone(),
        _ => DEFAULT_FOLLOW_UPS.iter().map(|s| s.to_string()).collect(),
    }
}

fn usable_weight(weight: Option<f64>) -> Option<f64> {
    weight.filter(|w| !w.is_nan()).map(|w| w.max(0.0))
}

fn criteria(result: &AnalysisResult) -> Vec<CriterionView> {
    let total_weight: f64 = result
        .objective_criteria
        .iter()
        .filter_map(|c| usable_weight(c.weight))
        .sum();

    result
        .objective_criteria
        .iter()
        .map(|c| {
            let weight = usable_weight(c.weight);
            CriterionView {
                name: c.name.clone(),
                value: c.value.clone(),
                weight_pct: weight.map(|w| (w * 100.0).round() as u32),
                contribution_pct: weight
                    .filter(|_| total_weight > 0.0)
                    .map(|w| ((w / total_weight) * 100.0).round() as u32),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::{ObjectiveCriterion, Risk, RiskLevel};

    fn criterion(name: &str, value: &str, weight: Option<f64>) -> ObjectiveCriterion {
        ObjectiveCriterion {
            name: name.to_string(),
            value: value.to_string(),
            weight,
        }
    }

    fn make_result() -> AnalysisResult {
        AnalysisResult {
            candidate_id: Some("JuanaPerez".to_string()),
            filename: "CV_JuanaPerez.pdf".to_string(),
            recommendation: "  Cumple   con los\nrequisitos clave. ".to_string(),
            objective_criteria: vec![
                criterion("Experiencia", "5 años", Some(0.35)),
                criterion("Certificaciones", "AMIB", Some(0.25)),
                criterion("Idiomas", "", Some(0.3)),
                criterion("Competencias", "Análisis financiero", Some(0.1)),
            ],
            confidence_level: ConfidenceLevel::High,
            confidence_explanation: "Información completa".to_string(),
            ethical_compliance: Some(true),
            missing_information: None,
            risks: None,
        }
    }

    #[test]
    fn test_short_summary_is_normalized() {
        assert_eq!(summarize("  a   b\n c "), "a b c");
    }

    #[test]
    fn test_long_summary_cuts_at_late_full_stop() {
        let first = "x".repeat(200);
        let text = format!("{first}. {}", "y".repeat(100));
        assert_eq!(summarize(&text), format!("{first}."));
    }

    #[test]
    fn test_long_summary_without_late_stop_gets_ellipsis() {
        let text = format!("abc. {}", "z".repeat(300));
        let summary = summarize(&text);
        assert!(summary.ends_with('…'));
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT + 1);
    }

    #[test]
    fn test_card_identity_and_score() {
        let card = CandidateCard::from_result(&make_result());
        assert_eq!(card.id.as_str(), "CV_JuanaPerez.pdf-JuanaPerez");
        assert_eq!(card.display_name, "JuanaPerez");
        assert_eq!(card.score, 97);
        assert_eq!(card.tone, ScoreTone::Alto);
        assert_eq!(card.summary, "Cumple con los requisitos clave.");
    }

    #[test]
    fn test_strengths_top_three_by_weight_skip_empty_values() {
        let card = CandidateCard::from_result(&make_result());
        // Idiomas ranks second but has no value
        assert_eq!(
            card.strengths,
            vec!["Experiencia: 5 años", "Certificaciones: AMIB"]
        );
    }

    #[test]
    fn test_alerts_collect_ethics_risks_and_missing_information() {
        let mut result = make_result();
        result.ethical_compliance = Some(false);
        result.risks = Some(vec![Risk {
            category: "Estabilidad".to_string(),
            level: RiskLevel::Medio,
            description: "Cambios frecuentes de empleo".to_string(),
        }]);
        result.missing_information = Some(vec!["Referencias laborales".to_string()]);

        let card = CandidateCard::from_result(&result);
        assert!(card.ethics_review_required);
        assert_eq!(
            card.alerts,
            vec![
                ETHICS_REVIEW_ALERT.to_string(),
                "Estabilidad (medio): Cambios frecuentes de empleo".to_string(),
                "Referencias laborales".to_string(),
            ]
        );
        assert_eq!(card.follow_ups, vec!["Referencias laborales"]);
    }

    #[test]
    fn test_no_alerts_and_default_follow_ups() {
        let card = CandidateCard::from_result(&make_result());
        assert_eq!(card.alerts, vec![NO_ALERTS]);
        assert_eq!(card.follow_ups.len(), DEFAULT_FOLLOW_UPS.len());
    }

    #[test]
    fn test_contributions_share_total_weight() {
        let mut result = make_result();
        result.objective_criteria = vec![
            criterion("a", "1", Some(0.5)),
            criterion("b", "2", Some(0.5)),
            criterion("c", "3", None),
        ];
        let card = CandidateCard::from_result(&result);
        assert_eq!(card.criteria[0].contribution_pct, Some(50));
        assert_eq!(card.criteria[0].weight_pct, Some(50));
        assert_eq!(card.criteria[2].contribution_pct, None);
    }

    #[test]
    fn test_zero_total_weight_has_no_contribution() {
        let mut result = make_result();
        result.objective_criteria = vec![criterion("a", "1", Some(0.0))];
        let card = CandidateCard::from_result(&result);
        assert_eq!(card.criteria[0].contribution_pct, None);
        assert_eq!(card.criteria[0].weight_pct, Some(0));
    }
}
