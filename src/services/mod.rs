//! Business logic services.

mod job_service;

pub use job_service::JobService;

/// Bundle of all services, shared through [`crate::state::AppState`].
#[derive(Clone)]
pub struct Services {
    pub jobs: JobService,
}

impl Services {
    pub fn new(jobs: JobService) -> Self {
        Self { jobs }
    }
}
