//! Registry mapping job types to executors.
//!
//! Populated once at startup and read-only afterwards; workers resolve
//! executors from it on every dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::jobs::executor::Executor;

#[derive(Default)]
pub struct ExecutorRegistry {
    executors: HashMap<String, Arc<dyn Executor>>,
}

impl ExecutorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an executor for a job type, replacing any previous one.
    pub fn register(&mut self, job_type: impl Into<String>, executor: Arc<dyn Executor>) {
        self.executors.insert(job_type.into(), executor);
    }

    /// Resolves the executor for a job type.
    ///
    /// A missing executor is a permanent failure for the job, never a
    /// retryable one: retrying cannot make a type registered.
    pub fn get(&self, job_type: &str) -> AppResult<Arc<dyn Executor>> {
        self.executors
            .get(job_type)
            .cloned()
            .ok_or_else(|| AppError::NotFound {
                entity: "Executor".to_string(),
                field: "type".to_string(),
                value: job_type.to_string(),
            })
    }

    pub fn has(&self, job_type: &str) -> bool {
        self.executors.contains_key(job_type)
    }

    pub fn registered_types(&self) -> Vec<&str> {
        self.executors.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::executor::FailingExecutor;

    #[test]
    fn resolves_registered_type() {
        let mut registry = ExecutorRegistry::new();
        registry.register("failing_job", Arc::new(FailingExecutor));

        assert!(registry.has("failing_job"));
        assert!(registry.get("failing_job").is_ok());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let registry = ExecutorRegistry::new();
        assert!(!registry.has("missing"));

        let err = registry.get("missing").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
