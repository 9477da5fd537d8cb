use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::assistant::{ChatReply, ChatRequest, ModelList};
use crate::state::AppState;

/// GET /api/v1/models
pub async fn handle_list_models(State(state): State<AppState>) -> Result<Json<ModelList>, AppError> {
    let models = state.client.list_models().await?;
    Ok(Json(ModelList { models }))
}

/// POST /api/v1/chat
/// Forwards a follow-up question about the analysed candidates.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::Validation("Message must not be empty".to_string()));
    }
    if req.model_id.trim().is_empty() {
        return Err(AppError::Validation("A model must be selected".to_string()));
    }

    let reply = state.client.chat(&req).await?;
    Ok(Json(reply))
}
