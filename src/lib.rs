//! Batch annotation of Tibetan title catalogs via a remote language model.
//!
//! The pipeline reads `(book_id, title)` rows from a CSV catalog, groups
//! them into fixed-size batches, sends each batch to the model with a
//! structured prompt, pairs the JSON reply positionally with the batch, and
//! writes the accumulated results as three CSV projections (translations,
//! corrections, full analysis) with periodic checkpoints.
//!
//! Batches run strictly sequentially; a malformed reply degrades only its
//! own batch to identifier-carrying stub entries and never fails the run.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tibetan_titles::config::AppConfig;
//! use tibetan_titles::llm::ApiGateway;
//! use tibetan_titles::pipeline::PipelineDriver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::default();
//!     let api_key = tibetan_titles::config::load_api_key(
//!         config.llm.api_key_file.as_ref(),
//!     )?;
//!
//!     let gateway = Arc::new(ApiGateway::new(&config.llm, api_key));
//!     let driver = PipelineDriver::new(config, gateway);
//!
//!     let summary = driver.run_file("titles.csv".as_ref(), "annotated").await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod source;
