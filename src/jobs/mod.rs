//! Job orchestration core: lifecycle state machine, job entity, executors,
//! the claim scheduler, and the worker pool.

pub mod executor;
pub mod idgen;
pub mod model;
pub mod registry;
pub mod retry;
pub mod scheduler;
pub mod state;
pub mod worker;

pub use executor::{DemoExecutor, ExecutionContext, Executor, FailingExecutor};
pub use model::Job;
pub use registry::ExecutorRegistry;
pub use retry::RetryPolicy;
pub use scheduler::{Scheduler, SchedulerConfig};
pub use state::{JobState, TransitionError};
pub use worker::{WorkerPool, WorkerPoolConfig};
