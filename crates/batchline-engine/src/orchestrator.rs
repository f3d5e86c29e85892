//! # Batch Orchestrator
//!
//! The only component with flow control. Drives every record of a batch
//! through a [`Pipeline`], isolates per-record failures, paces chunks and
//! owns the side effects of success.
//!
//! ## Batch Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  records ──► size check ──► chunk 1 ──► pace ──► chunk 2 ──► ... ──►   │
//! │              (max_records)     │          │                             │
//! │                                │          └── cancel? stop dispatching  │
//! │                                ▼                                        │
//! │              ┌──────────────────────────────────┐                       │
//! │              │ one task per record, at most     │                       │
//! │              │ max_concurrency at a time        │                       │
//! │              │ panics → Rejection::Fault        │                       │
//! │              └───────────────┬──────────────────┘                       │
//! │                              ▼ (joined in input order)                  │
//! │              success: cache → save → notify → audit                     │
//! │              failure: violations += messages                            │
//! │                                                                         │
//! │  after the last chunk: merge RunningTotals, build + store Report        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Records inside a chunk run in parallel; chunk boundaries are
//! synchronization points. Counters, the violation list and the cache are
//! touched only by the orchestrator task after a chunk has fully joined, so
//! none of them is ever updated concurrently. The process-wide
//! [`RunningTotals`] are merged once per batch under a single `RwLock`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use batchline_core::{DerivedEntity, Money, ValidationError, ValidationOptions};

use crate::cache::EntityCache;
use crate::cancel::CancelSignal;
use crate::collaborators::{AuditAction, AuditEvent, Collaborators};
use crate::config::EngineConfig;
use crate::error::{CollaboratorError, EngineError, EngineResult, Rejection};
use crate::pipeline::Pipeline;
use crate::report::Report;

// =============================================================================
// Batch Result
// =============================================================================

/// One message in the batch violation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// `None` for batch-level violations.
    pub record_index: Option<usize>,
    pub message: String,
}

impl Violation {
    pub fn record(record_index: usize, message: impl Into<String>) -> Self {
        Violation {
            record_index: Some(record_index),
            message: message.into(),
        }
    }

    pub fn batch(message: impl Into<String>) -> Self {
        Violation {
            record_index: None,
            message: message.into(),
        }
    }
}

/// A record that did not produce an entity, with its typed reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordFailure {
    pub record_index: usize,
    pub rejection: Rejection,
}

/// A collaborator call that failed after its record had succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorFailure {
    /// `None` for the report sink.
    pub record_index: Option<usize>,
    pub collaborator: String,
    pub message: String,
}

impl CollaboratorFailure {
    fn new(record_index: Option<usize>, err: CollaboratorError) -> Self {
        CollaboratorFailure {
            record_index,
            collaborator: err.collaborator.to_string(),
            message: err.message,
        }
    }
}

/// Everything a batch produced.
///
/// Built up by the orchestrator while the batch runs, immutable once
/// returned.
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed: Duration,

    /// Input length, including records never dispatched.
    pub total_records: usize,
    pub successes: usize,
    pub failures: usize,

    /// Produced entities, in input order.
    pub entities: Vec<DerivedEntity>,
    /// Failed records, in input order.
    pub rejections: Vec<RecordFailure>,
    /// Every violation message, in input order.
    pub violations: Vec<Violation>,
    pub collaborator_failures: Vec<CollaboratorFailure>,

    /// Cancellation stopped dispatch before the input was exhausted.
    pub cancelled: bool,
    /// Records never dispatched because of cancellation.
    pub unprocessed: usize,

    pub report: Option<Report>,
}

impl BatchResult {
    pub fn new(batch_id: Uuid, total_records: usize) -> Self {
        let now = Utc::now();
        BatchResult {
            batch_id,
            started_at: now,
            finished_at: now,
            elapsed: Duration::ZERO,
            total_records,
            successes: 0,
            failures: 0,
            entities: Vec::new(),
            rejections: Vec::new(),
            violations: Vec::new(),
            collaborator_failures: Vec::new(),
            cancelled: false,
            unprocessed: 0,
            report: None,
        }
    }

    /// Sum of the totals of every order in this batch.
    pub fn revenue(&self) -> Money {
        self.entities
            .iter()
            .filter_map(DerivedEntity::as_order)
            .map(|o| o.total)
            .sum()
    }

    pub fn order_count(&self) -> usize {
        self.entities.iter().filter(|e| e.as_order().is_some()).count()
    }

    /// Violation messages only.
    pub fn violation_messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    fn record_failure(&mut self, record_index: usize, rejection: Rejection) {
        self.failures += 1;
        self.violations.extend(
            rejection
                .messages()
                .into_iter()
                .map(|message| Violation::record(record_index, message)),
        );
        self.rejections.push(RecordFailure {
            record_index,
            rejection,
        });
    }
}

// =============================================================================
// Running Totals
// =============================================================================

/// Process-wide aggregate across batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningTotals {
    pub batches: u64,
    pub successes: u64,
    pub failures: u64,
    pub orders: u64,
    pub revenue: Money,
}

impl RunningTotals {
    /// Folds one finished batch in. The only way the totals change.
    pub fn merge(&mut self, result: &BatchResult) {
        self.batches += 1;
        self.successes += result.successes as u64;
        self.failures += result.failures as u64;
        self.orders += result.order_count() as u64;
        self.revenue += result.revenue();
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs batches against injected collaborators.
pub struct Orchestrator {
    config: EngineConfig,
    collaborators: Collaborators,
    cache: Mutex<EntityCache>,
    totals: Arc<RwLock<RunningTotals>>,
}

impl Orchestrator {
    /// Creates an orchestrator. Invalid configuration is rejected here,
    /// before any record is seen.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> EngineResult<Self> {
        config.validate()?;
        let cache = EntityCache::new(config.engine.cache_capacity);
        Ok(Orchestrator {
            config,
            collaborators,
            cache: Mutex::new(cache),
            totals: Arc::new(RwLock::new(RunningTotals::default())),
        })
    }

    /// Shares an existing accumulator (several orchestrators, one total).
    pub fn with_totals(mut self, totals: Arc<RwLock<RunningTotals>>) -> Self {
        self.totals = totals;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of the running totals.
    pub async fn totals(&self) -> RunningTotals {
        *self.totals.read().await
    }

    /// Looks up a cached entity by `user_<id>` / `order_<id>` key.
    pub async fn cached(&self, key: &str) -> Option<DerivedEntity> {
        self.cache.lock().await.get(key).cloned()
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Processes a batch to completion.
    pub async fn process_batch(
        &self,
        pipeline: Arc<dyn Pipeline>,
        records: Vec<Value>,
    ) -> EngineResult<BatchResult> {
        self.process_batch_with_cancel(pipeline, records, CancelSignal::never())
            .await
    }

    /// Processes a batch, stopping chunk dispatch when `cancel` fires.
    pub async fn process_batch_with_cancel(
        &self,
        pipeline: Arc<dyn Pipeline>,
        records: Vec<Value>,
        mut cancel: CancelSignal,
    ) -> EngineResult<BatchResult> {
        let batch_id = Uuid::new_v4();
        let total = records.len();

        if total > self.config.engine.max_records {
            warn!(%batch_id, records = total, max = self.config.engine.max_records, "Rejecting oversized batch");
            return Err(EngineError::LimitExceeded {
                records: total,
                max: self.config.engine.max_records,
            });
        }

        let started = Instant::now();
        let mut result = BatchResult::new(batch_id, total);

        if records.is_empty() {
            info!(%batch_id, "Empty batch, nothing to process");
            result
                .violations
                .push(Violation::batch(ValidationError::EmptyBatch.to_string()));
            return Ok(self.finish(result, started).await);
        }

        let chunk_size = self.config.batch.effective_chunk_size();
        let options = ValidationOptions {
            check_email_format: self.config.batch.validate_emails,
        };
        let semaphore = Arc::new(Semaphore::new(self.config.engine.max_concurrency));

        info!(%batch_id, kind = %pipeline.kind(), records = total, chunk_size, "Batch started");
        self.audit(AuditEvent::batch(batch_id, AuditAction::BatchStarted));

        let mut remaining = records.into_iter().enumerate().peekable();
        let mut dispatched = 0usize;
        let mut chunk_number = 0usize;

        while remaining.peek().is_some() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let chunk: Vec<(usize, Value)> = remaining.by_ref().take(chunk_size).collect();
            chunk_number += 1;
            dispatched += chunk.len();
            debug!(%batch_id, chunk = chunk_number, size = chunk.len(), "Dispatching chunk");

            let outcomes = run_chunk(&pipeline, chunk, options, &semaphore).await;
            for (record_index, outcome) in outcomes {
                match outcome {
                    Ok(entity) => self.on_success(&mut result, entity).await,
                    Err(rejection) => {
                        debug!(%batch_id, record_index, %rejection, "Record rejected");
                        result.record_failure(record_index, rejection);
                    }
                }
            }

            if remaining.peek().is_none() {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.engine.pacing()) => {}
                _ = cancel.cancelled() => {
                    info!(%batch_id, chunk = chunk_number, "Batch cancelled during pacing");
                    result.cancelled = true;
                    break;
                }
            }
        }

        result.unprocessed = total - dispatched;
        Ok(self.finish(result, started).await)
    }

    /// Side effects of one successful record, in order.
    async fn on_success(&self, result: &mut BatchResult, entity: DerivedEntity) {
        let batch = &self.config.batch;
        let record_index = entity.record_index();

        if batch.enable_caching {
            self.cache.lock().await.insert(entity.clone());
        }

        if batch.persist {
            if let Err(err) = self.collaborators.persistence.save(&entity).await {
                warn!(batch_id = %result.batch_id, record_index, error = %err, "Persistence failed");
                result
                    .collaborator_failures
                    .push(CollaboratorFailure::new(Some(record_index), err));
            }
        }

        if batch.send_notifications {
            if let Err(err) = self
                .collaborators
                .notifier
                .notify(&entity, &batch.notification_template)
                .await
            {
                warn!(batch_id = %result.batch_id, record_index, error = %err, "Notification failed");
                result
                    .collaborator_failures
                    .push(CollaboratorFailure::new(Some(record_index), err));
            }
        }

        self.audit(AuditEvent::entity(result.batch_id, &entity));

        result.successes += 1;
        result.entities.push(entity);
    }

    fn audit(&self, event: AuditEvent) {
        if self.config.batch.log_activity {
            self.collaborators.audit.record(event);
        }
    }

    /// Timestamps the result, merges the running totals and builds the
    /// report.
    async fn finish(&self, mut result: BatchResult, started: Instant) -> BatchResult {
        result.elapsed = started.elapsed();
        result.finished_at = Utc::now();

        self.totals.write().await.merge(&result);
        self.audit(AuditEvent::batch(result.batch_id, AuditAction::BatchFinished));

        if self.config.batch.generate_report {
            let report = Report::summarize(&result);
            if let Err(err) = self.collaborators.report_sink.store(&report).await {
                warn!(batch_id = %result.batch_id, error = %err, "Report sink failed");
                result
                    .collaborator_failures
                    .push(CollaboratorFailure::new(None, err));
            }
            result.report = Some(report);
        }

        info!(
            batch_id = %result.batch_id,
            successes = result.successes,
            failures = result.failures,
            unprocessed = result.unprocessed,
            cancelled = result.cancelled,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Batch finished"
        );
        result
    }
}

/// Runs one chunk, at most `semaphore` permits at a time, and joins the
/// tasks back in input order.
async fn run_chunk(
    pipeline: &Arc<dyn Pipeline>,
    chunk: Vec<(usize, Value)>,
    options: ValidationOptions,
    semaphore: &Arc<Semaphore>,
) -> Vec<(usize, Result<DerivedEntity, Rejection>)> {
    let tasks: Vec<(usize, JoinHandle<Result<DerivedEntity, Rejection>>)> = chunk
        .into_iter()
        .map(|(record_index, record)| {
            let pipeline = Arc::clone(pipeline);
            let semaphore = Arc::clone(semaphore);
            let handle = tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return Err(Rejection::Fault);
                };
                pipeline.process(record, record_index, options).await
            });
            (record_index, handle)
        })
        .collect();

    let mut outcomes = Vec::with_capacity(tasks.len());
    for (record_index, handle) in tasks {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                warn!(record_index, error = %join_err, "Record task failed");
                Err(Rejection::Fault)
            }
        };
        outcomes.push((record_index, outcome));
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::OnboardingPipeline;
    use serde_json::json;

    fn quiet_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.engine.pacing_ms = 0;
        config
    }

    fn onboarding() -> Arc<dyn Pipeline> {
        Arc::new(OnboardingPipeline)
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let orchestrator = Orchestrator::new(quiet_config(), Collaborators::noop()).unwrap();
        let records: Vec<Value> = (0..25)
            .map(|i| json!({"email": format!("u{i}@example.com"), "age": 20 + i}))
            .collect();

        let result = orchestrator.process_batch(onboarding(), records).await.unwrap();
        let indices: Vec<usize> = result.entities.iter().map(|e| e.record_index()).collect();
        assert_eq!(indices, (0..25).collect::<Vec<_>>());
        assert_eq!(result.successes, 25);
    }

    #[tokio::test]
    async fn test_empty_batch_reports_violation() {
        let orchestrator = Orchestrator::new(quiet_config(), Collaborators::noop()).unwrap();
        let result = orchestrator.process_batch(onboarding(), vec![]).await.unwrap();

        assert_eq!(result.successes, 0);
        assert_eq!(result.failures, 0);
        assert_eq!(result.violation_messages(), vec!["record list cannot be empty"]);
        assert!(result.report.is_some());
    }

    #[tokio::test]
    async fn test_oversized_batch_is_rejected() {
        let mut config = quiet_config();
        config.engine.max_records = 2;
        let orchestrator = Orchestrator::new(config, Collaborators::noop()).unwrap();

        let err = orchestrator
            .process_batch(onboarding(), vec![json!({}), json!({}), json!({})])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::LimitExceeded { records: 3, max: 2 }));
        assert_eq!(orchestrator.totals().await, RunningTotals::default());
    }

    #[test]
    fn test_invalid_config_is_rejected_up_front() {
        let mut config = quiet_config();
        config.engine.max_concurrency = 0;
        assert!(Orchestrator::new(config, Collaborators::noop()).is_err());
    }

    #[tokio::test]
    async fn test_cache_holds_successes() {
        let orchestrator = Orchestrator::new(quiet_config(), Collaborators::noop()).unwrap();
        let result = orchestrator
            .process_batch(onboarding(), vec![json!({"email": "c@d.io", "age": 40})])
            .await
            .unwrap();

        let key = result.entities[0].cache_key();
        assert_eq!(orchestrator.cached(&key).await.as_ref(), Some(&result.entities[0]));
    }

    #[tokio::test]
    async fn test_caching_can_be_disabled() {
        let mut config = quiet_config();
        config.batch.enable_caching = false;
        let orchestrator = Orchestrator::new(config, Collaborators::noop()).unwrap();
        orchestrator
            .process_batch(onboarding(), vec![json!({"email": "c@d.io", "age": 40})])
            .await
            .unwrap();
        assert_eq!(orchestrator.cache_len().await, 0);
    }
}
