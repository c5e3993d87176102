use std::sync::Arc;

use crate::{db::HistoryStore, services::auth::AuthService, services::providers::MovieCatalog};

/// Shared application state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MovieCatalog>,
    pub history: Arc<dyn HistoryStore>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        history: Arc<dyn HistoryStore>,
        auth: AuthService,
    ) -> Self {
        Self {
            catalog,
            history,
            auth,
        }
    }
}
