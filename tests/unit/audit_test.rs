//! Tests for audit sinks

use bounded_runner::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, TracingAuditSink};

#[test]
fn test_build_audit_event() {
    let event = build_audit_event("run-1", 3, AuditAction::Fail, 2, Some("timed out after 1s".into()));
    assert_eq!(event.run_id, "run-1");
    assert_eq!(event.task_index, 3);
    assert_eq!(event.action, AuditAction::Fail);
    assert_eq!(event.in_flight, 2);
    assert!(event.created_at_ms > 0);
    assert_eq!(event.detail.as_deref(), Some("timed out after 1s"));
}

#[test]
fn test_in_memory_sink_shared_handle() {
    let sink = InMemoryAuditSink::new(10);
    let mut boxed: Box<dyn AuditSink> = Box::new(sink.clone());
    boxed.record(build_audit_event("run-1", 0, AuditAction::Admit, 1, None));
    boxed.record(build_audit_event("run-1", 0, AuditAction::Succeed, 0, None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].action, AuditAction::Succeed);
}

#[test]
fn test_audit_event_serializes() {
    let event = build_audit_event("run-1", 1, AuditAction::Halt, 0, None);
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["action"], "halt");
    assert_eq!(json["task_index"], 1);
}

#[test]
fn test_tracing_sink_accepts_events() {
    let mut sink = TracingAuditSink;
    sink.record(build_audit_event("run-1", 0, AuditAction::Admit, 1, None));
}
