//! Reason capture — dialog protocol collecting the justification for a decision.
//!
//! closed ──open──▶ awaiting input ──confirm (valid)──▶ closed (emits Confirmation)
//!                       │  ▲
//!                       │  └── confirm (invalid): stays open with an error
//!                       └──cancel──▶ closed (refused for a rejection with text)
//!
//! The dialog never touches the draft store. The caller acts on the
//! `Confirmation` it gets back.

use serde::Serialize;
use thiserror::Error;

use crate::models::analysis::CandidateId;
use crate::models::decision::DecisionStatus;

/// Minimum trimmed length of any non-empty reason.
pub const MIN_REASON_CHARS: usize = 20;

const REJECTED_TEMPLATES: &[&str] = &[
    "No cumple con los requisitos técnicos mínimos del puesto",
    "Experiencia insuficiente para el nivel requerido",
    "Falta de certificaciones o credenciales necesarias",
    "Mejor perfil encontrado entre otros candidatos",
    "No alineado con los valores y cultura organizacional",
    "Expectativas salariales fuera del rango presupuestado",
    "Disponibilidad no compatible con los horarios requeridos",
];

const INTERVIEW_TEMPLATES: &[&str] = &[
    "Cumple con todos los criterios objetivos del puesto",
    "Perfil destacado que merece evaluación más profunda",
    "Experiencia relevante y certificaciones en orden",
    "Buen ajuste cultural y profesional",
    "Potencial de crecimiento identificado",
];

const ON_HOLD_TEMPLATES: &[&str] = &[
    "Esperando respuesta de otros candidatos prioritarios",
    "Requiere información adicional antes de decidir",
    "Posición en proceso de redefinición de requisitos",
    "Candidato interesante pero no es el momento adecuado",
    "En espera de aprobación presupuestaria",
];

pub fn templates(action: DecisionStatus) -> &'static [&'static str] {
    match action {
        DecisionStatus::Rejected => REJECTED_TEMPLATES,
        DecisionStatus::Interview => INTERVIEW_TEMPLATES,
        DecisionStatus::OnHold => ON_HOLD_TEMPLATES,
    }
}

/// Whom a confirmed reason applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReasonTarget {
    Candidate {
        candidate_id: CandidateId,
        candidate_filename: String,
    },
    /// Whatever the bulk selection holds when the dialog is confirmed.
    Selection,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReasonError {
    #[error("A rejection reason is required and must be at least {} characters", MIN_REASON_CHARS)]
    RequiredTooShort,

    #[error("If you provide a reason it must be at least {} characters", MIN_REASON_CHARS)]
    OptionalTooShort,

    #[error("Clear the rejection reason before closing the dialog")]
    CancelRefused,

    #[error("No reason dialog is open")]
    NotOpen,

    #[error("No template {index} for action '{action}'")]
    UnknownTemplate { action: DecisionStatus, index: usize },
}

/// Emitted once per successful confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub action: DecisionStatus,
    pub target: ReasonTarget,
    /// Trimmed, possibly empty.
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenDialog {
    pub action: DecisionStatus,
    pub target: ReasonTarget,
    pub text: String,
    pub selected_template: Option<usize>,
    pub error: Option<String>,
    pub required: bool,
    pub templates: &'static [&'static str],
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReasonCapture {
    #[default]
    Closed,
    Open(OpenDialog),
}

impl ReasonCapture {
    pub fn new() -> Self {
        Self::Closed
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ReasonCapture::Open(_))
    }

    pub fn dialog(&self) -> Option<&OpenDialog> {
        match self {
            ReasonCapture::Open(dialog) => Some(dialog),
            ReasonCapture::Closed => None,
        }
    }

    /// Opens (or re-opens) the dialog with a blank text field.
    pub fn open(&mut self, action: DecisionStatus, target: ReasonTarget) {
        *self = ReasonCapture::Open(OpenDialog {
            action,
            target,
            text: String::new(),
            selected_template: None,
            error: None,
            required: action.requires_reason(),
            templates: templates(action),
        });
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), ReasonError> {
        let dialog = self.dialog_mut()?;
        dialog.text = text.into();
        dialog.error = None;
        Ok(())
    }

    /// Pre-fills the text with a template. Validation still runs on confirm.
    pub fn apply_template(&mut self, index: usize) -> Result<(), ReasonError> {
        let dialog = self.dialog_mut()?;
        let templates = dialog.templates;
        let template = templates
            .get(index)
            .ok_or(ReasonError::UnknownTemplate {
                action: dialog.action,
                index,
            })?;
        dialog.text = template.to_string();
        dialog.selected_template = Some(index);
        dialog.error = None;
        Ok(())
    }

    /// Validates `text` for the open action. On failure the dialog stays open
    /// and carries the message; on success it closes.
    pub fn confirm(&mut self, text: &str) -> Result<Confirmation, ReasonError> {
        let dialog = self.dialog_mut()?;
        dialog.text = text.to_string();

        if let Err(e) = validate_reason(dialog.action, text) {
            dialog.error = Some(e.to_string());
            return Err(e);
        }

        let confirmation = Confirmation {
            action: dialog.action,
            target: dialog.target.clone(),
            reason: text.trim().to_string(),
        };
        *self = ReasonCapture::Closed;
        Ok(confirmation)
    }

    /// Confirms with whatever the text field currently holds.
    pub fn confirm_current(&mut self) -> Result<Confirmation, ReasonError> {
        let text = self.dialog().map(|d| d.text.clone()).ok_or(ReasonError::NotOpen)?;
        self.confirm(&text)
    }

    /// Closing is refused while a rejection reason is typed, so a mandatory
    /// justification is never dropped silently.
    pub fn cancel(&mut self) -> Result<(), ReasonError> {
        let dialog = self.dialog_mut()?;
        if dialog.action.requires_reason() && !dialog.text.trim().is_empty() {
            return Err(ReasonError::CancelRefused);
        }
        *self = ReasonCapture::Closed;
        Ok(())
    }

    /// Unconditional close, used by workflow resets.
    pub fn close(&mut self) {
        *self = ReasonCapture::Closed;
    }

    fn dialog_mut(&mut self) -> Result<&mut OpenDialog, ReasonError> {
        match self {
            ReasonCapture::Open(dialog) => Ok(dialog),
            ReasonCapture::Closed => Err(ReasonError::NotOpen),
        }
    }
}

pub fn validate_reason(action: DecisionStatus, text: &str) -> Result<(), ReasonError> {
    let len = text.trim().chars().count();
    if action.requires_reason() {
        if len < MIN_REASON_CHARS {
            return Err(ReasonError::RequiredTooShort);
        }
    } else if len > 0 && len < MIN_REASON_CHARS {
        return Err(ReasonError::OptionalTooShort);
    }
    Ok(())
}
