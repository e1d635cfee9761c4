//! Application state for dependency injection.

use std::sync::Arc;

use user_service_lib::{HealthCheck, UserService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserService>,
    pub store: Arc<dyn HealthCheck>,
}

impl AppState {
    /// Create new app state.
    pub fn new(user_service: Arc<dyn UserService>, store: Arc<dyn HealthCheck>) -> Self {
        Self {
            user_service,
            store,
        }
    }
}
