//! # Collaborators
//!
//! Side-effecting services the orchestrator calls but does not own.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Collaborators                                  │
//! │                                                                         │
//! │  Persistence::save(entity)          once per success, when `persist`   │
//! │  Notifier::notify(entity, template) once per success, when notifying   │
//! │  AuditLog::record(event)            fire-and-forget, never blocks      │
//! │  ReportSink::store(report)          once per batch, when reporting     │
//! │                                                                         │
//! │  Failures of save/notify/store are recorded as CollaboratorFailure     │
//! │  and logged; they never turn a successful record into a failure.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every collaborator is injected through [`Collaborators`]; the
//! orchestrator holds no service of its own.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use batchline_core::{DerivedEntity, EntityKind};

use crate::error::CollaboratorError;
use crate::report::Report;

// =============================================================================
// Traits
// =============================================================================

/// Stores finalized entities.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn save(&self, entity: &DerivedEntity) -> Result<(), CollaboratorError>;
}

/// Delivers one notification per successful record.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, entity: &DerivedEntity, template: &str) -> Result<(), CollaboratorError>;
}

/// Receives audit events. Must return promptly.
pub trait AuditLog: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Stores the finished batch report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn store(&self, report: &Report) -> Result<(), CollaboratorError>;
}

// =============================================================================
// Audit Events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    BatchStarted,
    EntityProcessed,
    BatchFinished,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub batch_id: Uuid,
    pub action: AuditAction,
    pub record_index: Option<usize>,
    pub entity_kind: Option<EntityKind>,
    pub entity_id: Option<String>,
    pub at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn batch(batch_id: Uuid, action: AuditAction) -> Self {
        AuditEvent {
            batch_id,
            action,
            record_index: None,
            entity_kind: None,
            entity_id: None,
            at: Utc::now(),
        }
    }

    pub fn entity(batch_id: Uuid, entity: &DerivedEntity) -> Self {
        AuditEvent {
            batch_id,
            action: AuditAction::EntityProcessed,
            record_index: Some(entity.record_index()),
            entity_kind: Some(entity.kind()),
            entity_id: Some(entity.id().to_string()),
            at: Utc::now(),
        }
    }
}

// =============================================================================
// Collaborator Set
// =============================================================================

/// The services one orchestrator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn Persistence>,
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<dyn AuditLog>,
    pub report_sink: Arc<dyn ReportSink>,
}

impl Collaborators {
    /// Every collaborator a no-op.
    pub fn noop() -> Self {
        let noop = Arc::new(NoOp);
        Collaborators {
            persistence: noop.clone(),
            notifier: noop.clone(),
            audit: noop.clone(),
            report_sink: noop,
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn Persistence>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_report_sink(mut self, report_sink: Arc<dyn ReportSink>) -> Self {
        self.report_sink = report_sink;
        self
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Self::noop()
    }
}

// =============================================================================
// Implementations
// =============================================================================

/// No-op collaborator for testing and dry runs.
pub struct NoOp;

#[async_trait]
impl Persistence for NoOp {
    async fn save(&self, _entity: &DerivedEntity) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

#[async_trait]
impl Notifier for NoOp {
    async fn notify(&self, _entity: &DerivedEntity, _template: &str) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

impl AuditLog for NoOp {
    fn record(&self, _event: AuditEvent) {}
}

#[async_trait]
impl ReportSink for NoOp {
    async fn store(&self, _report: &Report) -> Result<(), CollaboratorError> {
        Ok(())
    }
}

/// Writes audit events through `tracing`.
pub struct TracingAuditLog;

impl AuditLog for TracingAuditLog {
    fn record(&self, event: AuditEvent) {
        info!(
            target: "batchline::audit",
            batch_id = %event.batch_id,
            action = ?event.action,
            record_index = ?event.record_index,
            entity_id = ?event.entity_id,
            "audit"
        );
    }
}

/// Logs notifications instead of delivering them.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, entity: &DerivedEntity, template: &str) -> Result<(), CollaboratorError> {
        info!(
            target: "batchline::notify",
            kind = %entity.kind(),
            entity_id = entity.id(),
            email = entity.email(),
            template,
            "notification queued"
        );
        Ok(())
    }
}

/// Keeps saved entities and stored reports in memory.
#[derive(Default)]
pub struct InMemoryStore {
    entities: Mutex<Vec<DerivedEntity>>,
    reports: Mutex<Vec<Report>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entities(&self) -> Vec<DerivedEntity> {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Persistence for InMemoryStore {
    async fn save(&self, entity: &DerivedEntity) -> Result<(), CollaboratorError> {
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity.clone());
        Ok(())
    }
}

#[async_trait]
impl ReportSink for InMemoryStore {
    async fn store(&self, report: &Report) -> Result<(), CollaboratorError> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }
}

/// Keeps audit events in memory.
#[derive(Default)]
pub struct InMemoryAuditLog {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditLog for InMemoryAuditLog {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
