//! Structured audit events emitted by the shift ledger.
//!
//! Discrepancies and integrity faults go through an injected [`AuditSink`]
//! so they are queryable by whoever wires the engine, instead of ending up
//! as free-form log lines.

mod event;
mod sink;

pub use event::AuditEvent;
pub use sink::{AuditSink, RecordingAuditSink, TracingAuditSink};
