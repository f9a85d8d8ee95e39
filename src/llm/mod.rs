//! Model interaction for the title annotation pipeline.
//!
//! This module provides:
//! * [`ModelGateway`] — async trait implemented by all gateway backends.
//! * [`ApiGateway`] — Anthropic-style messages endpoint gateway.
//! * [`PromptBuilder`] — renders the per-batch instruction string.
//! * [`reconcile`] / [`try_reconcile`] — pair the reply with the batch.
//! * [`AnalysisEntry`] / [`LinguisticAnalysis`] — reconciled results.
//! * [`GatewayError`] / [`ReconcileError`] — error variants.

pub mod gateway;
pub mod prompt;
pub mod reconcile;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use gateway::{ApiGateway, GatewayError, ModelGateway};
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};
pub use reconcile::{reconcile, try_reconcile, AnalysisEntry, LinguisticAnalysis, ReconcileError};
