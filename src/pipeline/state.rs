//! Pipeline state machine and run summary.
//!
//! [`PipelineState`] names the phases the driver moves through.  Transitions
//! are strictly sequential with no branching back: per batch the driver
//! cycles Prompting → Calling → Reconciling → Accumulating (→ Checkpointing),
//! then finalizes once.
//!
//! [`RunSummary`] is what a run hands back to the caller — enough for a
//! curator to spot degraded batches and re-submit them without re-running
//! the whole catalog.

use std::fmt;

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Phases of one annotation run.
///
/// ```text
/// Idle ──▶ Loading ──▶ ┌ per batch ───────────────────────────────┐
///                      │ Prompting ─▶ Calling ─▶ Reconciling      │
///                      │     ─▶ Accumulating (─▶ Checkpointing)   │
///                      └──────────────────────────────────────────┘
///                        ──▶ Finalizing ──▶ Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing running yet.
    Idle,
    /// Reading the title catalog.
    Loading,
    /// Rendering the instruction for the current batch.
    Prompting,
    /// Waiting on the model service.
    Calling,
    /// Pairing the reply with the batch.
    Reconciling,
    /// Appending reconciled entries to the result set.
    Accumulating,
    /// Writing an intermediate checkpoint.
    Checkpointing,
    /// Writing the final, unmarked output files.
    Finalizing,
    /// Run complete.
    Done,
}

impl PipelineState {
    /// A short label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Loading => "loading",
            PipelineState::Prompting => "prompting",
            PipelineState::Calling => "calling",
            PipelineState::Reconciling => "reconciling",
            PipelineState::Accumulating => "accumulating",
            PipelineState::Checkpointing => "checkpointing",
            PipelineState::Finalizing => "finalizing",
            PipelineState::Done => "done",
        }
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        PipelineState::Idle
    }
}

// ---------------------------------------------------------------------------
// RunSummary
// ---------------------------------------------------------------------------

/// Outcome of one run: how much of the catalog was covered and how much of
/// it came back degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Records loaded from the catalog (after the record limit).
    pub total: usize,
    /// Records actually processed; lower than `total` after cancellation.
    pub processed: usize,
    /// Stub entries in the result set — titles to re-submit.
    pub stubbed: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} titles processed, {} stubbed",
            self.processed, self.total, self.stubbed
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle() {
        assert_eq!(PipelineState::default(), PipelineState::Idle);
    }

    #[test]
    fn labels_are_distinct() {
        let states = [
            PipelineState::Idle,
            PipelineState::Loading,
            PipelineState::Prompting,
            PipelineState::Calling,
            PipelineState::Reconciling,
            PipelineState::Accumulating,
            PipelineState::Checkpointing,
            PipelineState::Finalizing,
            PipelineState::Done,
        ];
        let mut labels: Vec<&str> = states.iter().map(|s| s.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), states.len());
    }

    #[test]
    fn summary_display_reads_naturally() {
        let summary = RunSummary {
            total: 25,
            processed: 25,
            stubbed: 10,
        };
        assert_eq!(summary.to_string(), "25/25 titles processed, 10 stubbed");
    }
}
