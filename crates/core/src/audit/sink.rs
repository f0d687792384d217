//! Audit sink implementations.

use std::sync::{Mutex, PoisonError};

use teller_shared::types::ShiftId;
use tracing::{info, warn};

use super::event::AuditEvent;

/// Receives audit events from the ledger.
pub trait AuditSink: Send + Sync {
    /// Records one event. Must not block for long; the caller may hold a
    /// shift lock.
    fn record(&self, event: AuditEvent);
}

/// Emits audit events as structured `tracing` events on the `teller::audit`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let payload = serde_json::to_string(&event)
            .unwrap_or_else(|e| format!("{{\"serialization_error\":\"{e}\"}}"));

        if event.needs_attention() {
            warn!(
                target: "teller::audit",
                event = event.name(),
                shift_id = %event.shift_id(),
                payload = %payload,
                "Audit event requires attention"
            );
        } else {
            info!(
                target: "teller::audit",
                event = event.name(),
                shift_id = %event.shift_id(),
                payload = %payload,
                "Audit event"
            );
        }
    }
}

/// Keeps every event in memory so it can be queried later.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events about one shift.
    #[must_use]
    pub fn events_for(&self, shift_id: ShiftId) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.shift_id() == shift_id)
            .collect()
    }

    /// Events that need human follow-up.
    #[must_use]
    pub fn attention_required(&self) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(AuditEvent::needs_attention)
            .collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
