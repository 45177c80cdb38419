//! Audit sink implementations.
//!
//! Every admission and settlement a runner performs can be mirrored into an
//! [`AuditSink`]. The in-memory sink keeps a bounded ring of recent events and
//! can be cloned, so a caller may keep a handle for inspection while the
//! runner owns another.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::util::clock::now_ms;

/// Lifecycle step recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Task factory invoked; task joined the in-flight set.
    Admit,
    /// Task settled with a value.
    Succeed,
    /// Task settled with a failure.
    Fail,
    /// Fail-fast run stopped after this task failed.
    Halt,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Admit => "admit",
            Self::Succeed => "succeed",
            Self::Fail => "fail",
            Self::Halt => "halt",
        };
        f.write_str(name)
    }
}

/// Audit event structure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Identifier of the run that produced the event.
    pub run_id: String,
    /// Input index of the task.
    pub task_index: usize,
    /// Action taken.
    pub action: AuditAction,
    /// In-flight count right after the action.
    pub in_flight: usize,
    /// Timestamp milliseconds.
    pub created_at_ms: u128,
    /// Additional context.
    pub detail: Option<String>,
}

/// Audit sink abstraction.
pub trait AuditSink: Send {
    /// Record an audit event.
    fn record(&mut self, event: AuditEvent);
}

/// In-memory audit sink for testing and dev.
#[derive(Debug, Clone)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<VecDeque<AuditEvent>>>,
    max_events: usize,
}

impl InMemoryAuditSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(max_events))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events with the given action, oldest first.
    #[must_use]
    pub fn events_with(&self, action: AuditAction) -> Vec<AuditEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.action == action)
            .cloned()
            .collect()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&mut self, event: AuditEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Audit sink that forwards events to `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&mut self, event: AuditEvent) {
        tracing::debug!(
            run_id = %event.run_id,
            index = event.task_index,
            action = %event.action,
            in_flight = event.in_flight,
            detail = event.detail.as_deref().unwrap_or(""),
            "audit"
        );
    }
}

/// Shared handle to a boxed sink, as held by runners.
pub(crate) type SharedAuditSink = Arc<Mutex<Box<dyn AuditSink>>>;

/// Helper to build an audit event from context.
pub fn build_audit_event(
    run_id: impl Into<String>,
    task_index: usize,
    action: AuditAction,
    in_flight: usize,
    detail: Option<String>,
) -> AuditEvent {
    AuditEvent {
        run_id: run_id.into(),
        task_index,
        action,
        in_flight,
        created_at_ms: now_ms(),
        detail,
    }
}
