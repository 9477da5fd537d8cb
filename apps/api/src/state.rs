use std::sync::Arc;

use tokio::sync::Mutex;

use crate::review::submission::SubmissionCoordinator;
use crate::review::workbench::ReviewWorkbench;
use crate::screening_client::ScreeningClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The operator's review session. Never held across a backend call.
    pub workbench: Arc<Mutex<ReviewWorkbench>>,
    pub client: ScreeningClient,
    /// Fans drafts out to the audit log. Backed by `client` in production.
    pub submitter: Arc<SubmissionCoordinator>,
}
