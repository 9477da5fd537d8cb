pub mod assistant;
pub mod audit;
pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::review::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Review workbench
        .route("/api/v1/review", get(handlers::handle_get_workbench))
        .route("/api/v1/review/results", post(handlers::handle_load_results))
        .route("/api/v1/review/analyze", post(handlers::handle_analyze))
        .route("/api/v1/review/reset", post(handlers::handle_reset))
        .route(
            "/api/v1/review/candidates/:id/action",
            post(handlers::handle_request_action),
        )
        .route(
            "/api/v1/review/candidates/:id/expand",
            post(handlers::handle_toggle_expanded),
        )
        .route(
            "/api/v1/review/drafts/:id",
            delete(handlers::handle_discard_draft),
        )
        .route(
            "/api/v1/review/dialog/text",
            put(handlers::handle_set_dialog_text),
        )
        .route(
            "/api/v1/review/dialog/template",
            post(handlers::handle_apply_template),
        )
        .route(
            "/api/v1/review/dialog/confirm",
            post(handlers::handle_confirm_dialog),
        )
        .route(
            "/api/v1/review/dialog/cancel",
            post(handlers::handle_cancel_dialog),
        )
        .route(
            "/api/v1/review/selection",
            post(handlers::handle_select_all).delete(handlers::handle_clear_selection),
        )
        .route(
            "/api/v1/review/selection/:id",
            post(handlers::handle_toggle_selection),
        )
        .route("/api/v1/review/bulk", post(handlers::handle_apply_bulk))
        .route("/api/v1/review/submit", post(handlers::handle_submit))
        // Audit log (read-only proxy)
        .route("/api/v1/audit", get(audit::handle_list_audit_log))
        .route(
            "/api/v1/audit/candidates/:id",
            get(audit::handle_candidate_history),
        )
        // Assistant (proxied to the backend)
        .route("/api/v1/models", get(assistant::handle_list_models))
        .route("/api/v1/chat", post(assistant::handle_chat))
        .with_state(state)
}
