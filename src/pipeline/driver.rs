//! Pipeline driver — sequences load → batch → (prompt → call → reconcile)
//! → accumulate → checkpoint for one annotation run.
//!
//! # Pipeline flow
//!
//! ```text
//! load_titles ──▶ split_into_batches
//!   └─▶ for each batch (strictly sequential):
//!         build prompt ─▶ gateway.send ─▶ reconcile ─▶ accumulate
//!           ├─ gateway error, FailureMode::Abort           → propagate
//!           ├─ gateway error, FailureMode::StubAndContinue → stub batch
//!           └─ every `checkpoint_interval` records         → checkpoint
//!         pacing delay before the next batch
//!   └─▶ finalize (always, also after cancellation)
//! ```
//!
//! Batch N+1 never starts before batch N's entries are accumulated and any
//! checkpoint write has completed, so the result set grows in batch order by
//! construction.  The only suspension point is the model call itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use thiserror::Error;

use crate::config::{AppConfig, FailureMode};
use crate::llm::{
    reconcile, AnalysisEntry, GatewayError, ModelGateway, PromptBuilder, SYSTEM_INSTRUCTION,
};
use crate::output::{CheckpointError, ResultAccumulator};
use crate::source::{load_titles, SourceError, TitleRecord};

use super::batch::split_into_batches;
use super::state::{PipelineState, RunSummary};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can end a run early.
///
/// Reconciliation failures never appear here — they are absorbed at the
/// batch boundary and surface as stub entries instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The title catalog could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A model call failed and the failure mode is [`FailureMode::Abort`].
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A projection file could not be written.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

// ---------------------------------------------------------------------------
// PipelineDriver
// ---------------------------------------------------------------------------

/// Drives one complete annotation run.
///
/// Create with [`PipelineDriver::new`], optionally grab the
/// [`cancel_flag`](Self::cancel_flag), then call [`run_file`](Self::run_file)
/// (or [`run_records`](Self::run_records) with pre-loaded records).
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tibetan_titles::config::AppConfig;
/// use tibetan_titles::llm::ApiGateway;
/// use tibetan_titles::pipeline::PipelineDriver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AppConfig::default();
/// let gateway = Arc::new(ApiGateway::new(&config.llm, "sk-ant-…".into()));
/// let driver = PipelineDriver::new(config, gateway);
/// let summary = driver.run_file("titles.csv".as_ref(), "annotated").await?;
/// println!("{summary}");
/// # Ok(())
/// # }
/// ```
pub struct PipelineDriver {
    config: AppConfig,
    gateway: Arc<dyn ModelGateway>,
    prompts: PromptBuilder,
    accumulator: ResultAccumulator,
    state: PipelineState,
    cancel: Arc<AtomicBool>,
}

impl PipelineDriver {
    /// Create a driver from configuration and a gateway.
    pub fn new(config: AppConfig, gateway: Arc<dyn ModelGateway>) -> Self {
        let prompts = match &config.llm.prompt_template {
            Some(template) => PromptBuilder::with_template(template.clone()),
            None => PromptBuilder::new(),
        };

        Self {
            config,
            gateway,
            prompts,
            accumulator: ResultAccumulator::new(),
            state: PipelineState::Idle,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for requesting cooperative cancellation.
    ///
    /// The flag is checked before each batch; setting it mid-batch lets the
    /// current batch finish, then finalizes with everything accumulated so
    /// far.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Current phase of the run, mainly useful in logs and tests.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Load the catalog at `input` (honouring the configured record limit)
    /// and run the full pipeline.
    pub async fn run_file(
        mut self,
        input: &std::path::Path,
        output_base: &str,
    ) -> Result<RunSummary, PipelineError> {
        self.set_state(PipelineState::Loading);
        let limit = self.config.pipeline.record_limit;
        let records = load_titles(input, &self.config.source, limit)?;
        self.run_records(records, output_base).await
    }

    /// Run the pipeline over already-loaded records.
    pub async fn run_records(
        mut self,
        records: Vec<TitleRecord>,
        output_base: &str,
    ) -> Result<RunSummary, PipelineError> {
        let total = records.len();
        let cfg = self.config.pipeline.clone();

        let batches = split_into_batches(&records, cfg.batch_size);
        let batch_count = batches.len();
        log::info!(
            "starting run: {total} titles in {batch_count} batches of up to {}",
            cfg.batch_size
        );

        let pb = make_progress_bar(total as u64);

        let mut processed = 0usize;
        let mut last_checkpoint = 0usize;

        for (idx, batch) in batches.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                log::warn!(
                    "cancellation requested — stopping before batch {}/{batch_count}",
                    idx + 1
                );
                break;
            }

            self.set_state(PipelineState::Prompting);
            let prompt = self.prompts.build(batch);

            self.set_state(PipelineState::Calling);
            let reply = self.gateway.send(SYSTEM_INSTRUCTION, &prompt).await;

            let entries: Vec<AnalysisEntry> = match reply {
                Ok(raw) => {
                    self.set_state(PipelineState::Reconciling);
                    reconcile(&raw, batch)
                }
                Err(e) => match cfg.failure_mode {
                    FailureMode::Abort => {
                        pb.finish_and_clear();
                        return Err(e.into());
                    }
                    FailureMode::StubAndContinue => {
                        log::warn!(
                            "model call failed for batch {}/{batch_count} ({e}); \
                             stubbing {} records",
                            idx + 1,
                            batch.len()
                        );
                        batch.iter().map(AnalysisEntry::stub).collect()
                    }
                },
            };

            self.set_state(PipelineState::Accumulating);
            self.accumulator.accumulate(entries);
            processed += batch.len();
            pb.inc(batch.len() as u64);
            log::info!("processed {processed}/{total} titles");

            if processed - last_checkpoint >= cfg.checkpoint_interval {
                self.set_state(PipelineState::Checkpointing);
                self.accumulator.checkpoint(output_base, processed)?;
                last_checkpoint = processed;
                log::info!("checkpoint written at {processed} records");
            }

            if idx + 1 < batch_count {
                tokio::time::sleep(Duration::from_secs(cfg.inter_batch_delay_secs)).await;
            }
        }

        // The final unmarked write always happens, even when the last
        // checkpoint coincided with the end of input or the run was
        // cancelled.
        self.set_state(PipelineState::Finalizing);
        self.accumulator.finalize(output_base)?;

        let summary = RunSummary {
            total,
            processed,
            stubbed: self.accumulator.stub_count(),
        };
        pb.finish_with_message(summary.to_string());
        self.set_state(PipelineState::Done);
        log::info!("run complete: {summary}");

        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn set_state(&mut self, state: PipelineState) {
        self.state = state;
        log::debug!("pipeline state → {}", state.label());
    }
}

fn make_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {pos}/{len} titles ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
    pb
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
