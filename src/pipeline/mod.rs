//! Batch orchestration: splitting, sequencing, checkpointing.

pub mod batch;
pub mod driver;
pub mod state;

pub use batch::split_into_batches;
pub use driver::{PipelineDriver, PipelineError};
pub use state::{PipelineState, RunSummary};
