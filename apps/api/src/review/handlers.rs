use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::analysis::{AnalysisResult, CandidateDocument, CandidateId};
use crate::models::decision::DecisionStatus;
use crate::review::selection::BulkOutcome;
use crate::review::submission::SubmissionOutcome;
use crate::review::workbench::{Intake, ReviewWorkbench, WorkbenchError, WorkbenchSnapshot};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoadResultsRequest {
    #[serde(default, rename = "jobDescription")]
    pub job_description: String,
    #[serde(default)]
    pub documents: Vec<CandidateDocument>,
    pub results: Vec<AnalysisResult>,
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(rename = "jobDescription")]
    pub job_description: String,
    pub candidates: Vec<CandidateDocument>,
    #[serde(default, rename = "modelId")]
    pub model_id: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: DecisionStatus,
}

#[derive(Deserialize)]
pub struct DialogTextRequest {
    pub text: String,
}

#[derive(Deserialize)]
pub struct TemplateRequest {
    pub index: usize,
}

#[derive(Deserialize, Default)]
pub struct ConfirmRequest {
    /// Falls back to the text already in the dialog.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub candidate_id: CandidateId,
    pub on: bool,
}

#[derive(Serialize)]
pub struct StagingResponse {
    #[serde(flatten)]
    pub outcome: BulkOutcome,
    pub workbench: WorkbenchSnapshot,
}

/// Runs `op` against the workbench on the blocking pool: staging and
/// discarding rewrite the persisted badge document.
async fn with_workbench<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&mut ReviewWorkbench) -> Result<T, WorkbenchError> + Send + 'static,
    T: Send + 'static,
{
    let workbench = Arc::clone(&state.workbench);
    let result = tokio::task::spawn_blocking(move || {
        let mut workbench = workbench.blocking_lock();
        op(&mut workbench)
    })
    .await
    .context("Workbench task failed")?;
    Ok(result?)
}

/// GET /api/v1/review
pub async fn handle_get_workbench(State(state): State<AppState>) -> Json<WorkbenchSnapshot> {
    Json(state.workbench.lock().await.snapshot())
}

/// POST /api/v1/review/results
pub async fn handle_load_results(
    State(state): State<AppState>,
    Json(req): Json<LoadResultsRequest>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let intake = Intake {
        job_description: req.job_description,
        documents: req.documents,
        model_id: None,
    };
    let snapshot = with_workbench(&state, move |wb| {
        wb.load_results(intake, req.results)?;
        Ok(wb.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/review/analyze
/// Runs the backend analysis, then loads its results. The workbench is not
/// locked while the backend works.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    if req.job_description.trim().is_empty() || req.candidates.is_empty() {
        return Err(AppError::Validation(
            "A job description and at least one candidate are required".to_string(),
        ));
    }

    info!("Analyzing {} candidates", req.candidates.len());
    let results = state
        .client
        .analyze_candidates(&req.job_description, &req.candidates, req.model_id.as_deref())
        .await?;

    let intake = Intake {
        job_description: req.job_description,
        documents: req.candidates,
        model_id: req.model_id,
    };
    let snapshot = with_workbench(&state, move |wb| {
        wb.load_results(intake, results)?;
        Ok(wb.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/review/reset
pub async fn handle_reset(
    State(state): State<AppState>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let snapshot = with_workbench(&state, |wb| {
        wb.reset()?;
        Ok(wb.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/review/candidates/:id/action
pub async fn handle_request_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let snapshot = with_workbench(&state, move |wb| {
        wb.request_action(&CandidateId::from(id), req.status)?;
        Ok(wb.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/review/candidates/:id/expand
pub async fn handle_toggle_expanded(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let candidate_id = CandidateId::from(id);
    let on = state.workbench.lock().await.toggle_expanded(&candidate_id)?;
    Ok(Json(ToggleResponse { candidate_id, on }))
}

/// DELETE /api/v1/review/drafts/:id
pub async fn handle_discard_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let snapshot = with_workbench(&state, move |wb| {
        wb.discard_draft(&CandidateId::from(id))?;
        Ok(wb.snapshot())
    })
    .await?;
    Ok(Json(snapshot))
}

// ────────────────────────────────────────────────────────────────────────────
// Reason dialog
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/review/dialog/text
pub async fn handle_set_dialog_text(
    State(state): State<AppState>,
    Json(req): Json<DialogTextRequest>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let mut workbench = state.workbench.lock().await;
    workbench.set_dialog_text(req.text)?;
    Ok(Json(workbench.snapshot()))
}

/// POST /api/v1/review/dialog/template
pub async fn handle_apply_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let mut workbench = state.workbench.lock().await;
    workbench.apply_template(req.index)?;
    Ok(Json(workbench.snapshot()))
}

/// POST /api/v1/review/dialog/confirm
pub async fn handle_confirm_dialog(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<StagingResponse>, AppError> {
    let response = with_workbench(&state, move |wb| {
        let outcome = wb.confirm_dialog(req.text.as_deref())?;
        Ok(StagingResponse {
            outcome,
            workbench: wb.snapshot(),
        })
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/review/dialog/cancel
pub async fn handle_cancel_dialog(
    State(state): State<AppState>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let mut workbench = state.workbench.lock().await;
    workbench.cancel_dialog()?;
    Ok(Json(workbench.snapshot()))
}

// ────────────────────────────────────────────────────────────────────────────
// Selection / bulk
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/review/selection/:id
pub async fn handle_toggle_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ToggleResponse>, AppError> {
    let candidate_id = CandidateId::from(id);
    let on = state.workbench.lock().await.toggle_selection(&candidate_id)?;
    Ok(Json(ToggleResponse { candidate_id, on }))
}

/// POST /api/v1/review/selection
pub async fn handle_select_all(
    State(state): State<AppState>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let mut workbench = state.workbench.lock().await;
    workbench.select_all()?;
    Ok(Json(workbench.snapshot()))
}

/// DELETE /api/v1/review/selection
pub async fn handle_clear_selection(
    State(state): State<AppState>,
) -> Result<Json<WorkbenchSnapshot>, AppError> {
    let mut workbench = state.workbench.lock().await;
    workbench.clear_selection()?;
    Ok(Json(workbench.snapshot()))
}

/// POST /api/v1/review/bulk
pub async fn handle_apply_bulk(
    State(state): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StagingResponse>, AppError> {
    let response = with_workbench(&state, move |wb| {
        let outcome = wb.apply_bulk(req.status)?;
        Ok(StagingResponse {
            outcome,
            workbench: wb.snapshot(),
        })
    })
    .await?;
    Ok(Json(response))
}

// ────────────────────────────────────────────────────────────────────────────
// Submission
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/review/submit
///
/// CRITICAL: the fan-out and the reconciliation run in their own task, so a
/// request dropped mid-flight (client gone, timeout) still settles the batch
/// and releases `is_submitting`. The lock is not held while the backend
/// calls are in flight.
pub async fn handle_submit(
    State(state): State<AppState>,
) -> Result<Json<SubmissionOutcome>, AppError> {
    // Guard and snapshot in one step: nothing can cancel between the two
    let drafts = state.workbench.lock().await.begin_submission()?;
    info!("Submitting {} staged decisions", drafts.len());

    let workbench = Arc::clone(&state.workbench);
    let submitter = Arc::clone(&state.submitter);
    let task = tokio::spawn(async move {
        let report = submitter.submit(&drafts).await;
        workbench.lock().await.finish_submission(report)
    });

    match task.await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            error!("Submission task failed: {e}");
            state.workbench.lock().await.abort_submission();
            Err(anyhow::anyhow!("Submission task failed: {e}").into())
        }
    }
}
