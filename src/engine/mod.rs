pub mod dispatcher;
pub mod filter;
pub mod orchestrator;

pub use dispatcher::WorkerPool;
pub use filter::{filter_items, FilterCriteria, FilterError};
pub use orchestrator::{Pipeline, PipelineError, RunSummary};
