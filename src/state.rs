//! Application state for the Axum web framework.
//!
//! Contains shared services and resources accessible across all request
//! handlers. Cloning is cheap: services and metrics are reference-counted
//! internally.

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Shared metrics registry
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(services: Services, metrics: Arc<Metrics>) -> Self {
        Self { services, metrics }
    }
}
