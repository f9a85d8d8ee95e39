//! Result accumulation and tabular output.

pub mod accumulator;

pub use accumulator::{CheckpointError, ResultAccumulator};
