//! # Batch Runner
//!
//! Runs one batch from a JSON input document and prints the report.
//!
//! ## Usage
//! ```bash
//! # Onboard users from a file
//! cargo run -p batchline-engine --bin batchline -- --input users.json
//!
//! # Read the document from stdin, with an explicit config file
//! cat orders.json | cargo run -p batchline-engine --bin batchline -- --config ./batchline.toml
//!
//! # More logging
//! RUST_LOG=batchline=trace cargo run -p batchline-engine --bin batchline -- -i users.json
//! ```
//!
//! ## Input Document
//! ```json
//! {
//!   "mode": "checkout",
//!   "records": [{"email": "a@b.co", "age": 30, "state": "CA", "product_ids": ["P001"]}],
//!   "catalog": [{"id": "P001", "name": "Desk Lamp", "price_cents": 5000}],
//!   "inventory": {"P001": 10}
//! }
//! ```
//! `catalog` and `inventory` are only read in checkout mode.

use std::collections::HashMap;
use std::env;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use batchline_core::{Catalog, Product};
use batchline_engine::{
    CheckoutPipeline, Collaborators, EngineConfig, EngineError, InMemoryStore, InventoryLedger,
    OnboardingPipeline, Orchestrator, Pipeline, TracingAuditLog, TracingNotifier,
};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    #[default]
    Onboarding,
    Checkout,
}

#[derive(Debug, Deserialize)]
struct InputDocument {
    #[serde(default)]
    mode: Mode,
    records: Vec<Value>,
    #[serde(default)]
    catalog: Vec<Product>,
    #[serde(default)]
    inventory: HashMap<String, u64>,
}

fn print_help() {
    println!("Batchline Batch Runner");
    println!();
    println!("Usage: batchline [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -i, --input <PATH>    Input document (default: stdin)");
    println!("  -c, --config <PATH>   Config file (default: platform config dir)");
    println!("  -h, --help            Show this help message");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,batchline=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: Option<&PathBuf>) -> Result<InputDocument, EngineError> {
    let contents = match path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| EngineError::InvalidInput(format!("{}: {}", path.display(), e)))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
            buffer
        }
    };
    serde_json::from_str(&contents).map_err(|e| EngineError::InvalidInput(e.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    run().await.map_err(Into::into)
}

async fn run() -> Result<(), EngineError> {
    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" | "-i" => {
                if i + 1 < args.len() {
                    input_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_help();
                return Ok(());
            }
        }
        i += 1;
    }

    init_tracing();

    let config = EngineConfig::load(config_path)?;
    let document = read_input(input_path.as_ref())?;

    let pipeline: Arc<dyn Pipeline> = match document.mode {
        Mode::Onboarding => Arc::new(OnboardingPipeline),
        Mode::Checkout => {
            let ledger = Arc::new(InventoryLedger::new(document.inventory));
            let catalog = Arc::new(Catalog::new(document.catalog));
            Arc::new(CheckoutPipeline::new(ledger, catalog))
        }
    };

    let store = Arc::new(InMemoryStore::new());
    let collaborators = Collaborators::noop()
        .with_persistence(store.clone())
        .with_notifier(Arc::new(TracingNotifier))
        .with_audit(Arc::new(TracingAuditLog))
        .with_report_sink(store.clone());

    let orchestrator = Orchestrator::new(config, collaborators)?;
    let result = orchestrator.process_batch(pipeline, document.records).await?;

    info!(
        saved = store.entities().len(),
        successes = result.successes,
        failures = result.failures,
        "Run complete"
    );

    match &result.report {
        Some(report) => println!("{}", report.to_json()?),
        None => {
            for violation in &result.violations {
                println!("{}", violation.message);
            }
        }
    }

    Ok(())
}
