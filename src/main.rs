//! Command-line entry point for the title annotation pipeline.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the three positional arguments (input catalog, output base,
//!    optional config path).
//! 3. Load [`AppConfig`] from disk (returns default when the file is
//!    missing) and validate it.
//! 4. Load the API key (file, then environment fallback).
//! 5. Build the [`ApiGateway`] and [`PipelineDriver`].
//! 6. Install a Ctrl-C handler that requests cooperative cancellation —
//!    the current batch finishes and the run finalizes what it has.
//! 7. Run the pipeline and print the summary.

use std::path::Path;
use std::process;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::Context;
use tibetan_titles::config::{load_api_key, AppConfig};
use tibetan_titles::llm::ApiGateway;
use tibetan_titles::pipeline::PipelineDriver;

/// Config file consulted when no third argument is given.
const DEFAULT_CONFIG_PATH: &str = "tibetan-titles.toml";

fn print_usage() {
    eprintln!("usage: tibetan-titles <input.csv> <output_base> [config.toml]");
    eprintln!();
    eprintln!("  <input.csv>    catalog with book_id and tibetan_title columns");
    eprintln!("  <output_base>  prefix for the *_translations/_corrections/_analysis files");
    eprintln!("  [config.toml]  optional settings file (default: {DEFAULT_CONFIG_PATH})");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, output_base) = match (args.first(), args.get(1)) {
        (Some(input), Some(output_base)) => (input.clone(), output_base.clone()),
        _ => {
            print_usage();
            process::exit(2);
        }
    };
    let config_path = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = AppConfig::load_from(Path::new(&config_path)).unwrap_or_else(|e| {
        log::warn!("failed to load config {config_path} ({e}); using defaults");
        AppConfig::default()
    });
    config
        .pipeline
        .validate()
        .context("invalid pipeline configuration")?;

    let api_key = load_api_key(Path::new(&config.llm.api_key_file))?;

    log::info!(
        "annotating {input} with model {} (batches of {})",
        config.llm.model,
        config.pipeline.batch_size
    );

    let gateway = Arc::new(ApiGateway::new(&config.llm, api_key));
    let driver = PipelineDriver::new(config, gateway);

    // Ctrl-C requests cooperative cancellation; the run finalizes whatever
    // has been accumulated before exiting.
    let cancel = driver.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received — finishing current batch, then finalizing");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let summary = driver.run_file(Path::new(&input), &output_base).await?;

    println!("{summary}");
    if summary.stubbed > 0 {
        println!(
            "note: {} titles came back degraded; their rows carry the original \
             title text and can be re-submitted as a smaller catalog",
            summary.stubbed
        );
    }

    Ok(())
}
