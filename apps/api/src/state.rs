use std::sync::Arc;

use crate::config::Config;
use crate::store::SurveyStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The deployment's one persistence backend, closed by `main` on shutdown.
    pub store: Arc<dyn SurveyStore>,
    pub config: Config,
}
