use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::decision::{AuditLogFilter, AuditLogPage};
use crate::state::AppState;

/// GET /api/v1/audit
/// Read-only view of the backend audit log.
pub async fn handle_list_audit_log(
    State(state): State<AppState>,
    Query(filter): Query<AuditLogFilter>,
) -> Result<Json<AuditLogPage>, AppError> {
    let page = state.client.list_audit_log(&filter).await?;
    Ok(Json(page))
}

/// GET /api/v1/audit/candidates/:id
pub async fn handle_candidate_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuditLogPage>, AppError> {
    let page = state.client.candidate_history(&id).await?;
    Ok(Json(page))
}
