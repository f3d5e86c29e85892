//! # batchline-engine: Batch Orchestration for Batchline
//!
//! Runs batches of raw records through the onboarding or checkout pipeline,
//! reserving inventory, invoking collaborators and producing a report.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  Orchestrator (flow control)                     │  │
//! │  │   chunking • bounded parallelism • pacing • cancellation        │  │
//! │  └────────────────────────────┬─────────────────────────────────────┘  │
//! │                               │                                         │
//! │         ┌─────────────────────┼─────────────────────┐                  │
//! │         ▼                     ▼                     ▼                   │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │   Pipelines    │  │ InventoryLedger│  │    Collaborators       │    │
//! │  │                │  │                │  │                        │    │
//! │  │ Onboarding     │  │ AtomicU64 per  │  │ Persistence, Notifier, │    │
//! │  │ Checkout       │──│ product, all-  │  │ AuditLog, ReportSink   │    │
//! │  │                │  │ or-nothing     │  │ (injected traits)      │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │  EntityCache   │  │ RunningTotals  │  │       Report           │    │
//! │  │  full flush on │  │ merged once per│  │ rates, grades, age     │    │
//! │  │  overflow      │  │ batch (RwLock) │  │ groups, financials     │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use batchline_engine::{Collaborators, EngineConfig, OnboardingPipeline, Orchestrator};
//! use serde_json::json;
//!
//! # async fn run() -> batchline_engine::EngineResult<()> {
//! let orchestrator = Orchestrator::new(EngineConfig::default(), Collaborators::noop())?;
//! let records = vec![json!({"email": "ada@example.com", "age": 36})];
//! let result = orchestrator.process_batch(Arc::new(OnboardingPipeline), records).await?;
//! assert_eq!(result.successes, 1);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cancel;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod inventory;
pub mod orchestrator;
pub mod pipeline;
pub mod report;

// Re-exports for convenience
pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use collaborators::{
    AuditAction, AuditEvent, AuditLog, Collaborators, InMemoryAuditLog, InMemoryStore, NoOp,
    Notifier, Persistence, ReportSink, TracingAuditLog, TracingNotifier,
};
pub use config::{BatchConfig, EngineConfig, EngineSettings};
pub use error::{CollaboratorError, EngineError, EngineResult, Rejection};
pub use inventory::{InventoryLedger, Reservation};
pub use orchestrator::{
    BatchResult, CollaboratorFailure, Orchestrator, RecordFailure, RunningTotals, Violation,
};
pub use pipeline::{CheckoutPipeline, OnboardingPipeline, Pipeline};
pub use report::Report;
