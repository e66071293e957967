//! Audit sink boundary.
//!
//! The engine informs the sink after every mutation with before/after
//! snapshots. The sink is fire-and-forget: a failing sink is logged and
//! swallowed, never failing the primary operation.

use serde_json::Value;

use crate::types::{Invoice, InvoiceId};

/// What happened to an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Created,
    Updated,
    Issued,
    Sent,
    Stornoed,
    Deleted,
    PaymentAdded,
}

/// One audit record. Snapshots are JSON so the sink needs no knowledge of
/// the domain types; `before` is absent on create, `after` on delete.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub invoice_id: InvoiceId,
    pub number: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl AuditEvent {
    pub(crate) fn new(
        action: AuditAction,
        invoice_id: InvoiceId,
        number: impl Into<String>,
        before: Option<&Invoice>,
        after: Option<&Invoice>,
    ) -> Self {
        // to_value on our serde types cannot fail in practice; fall back to
        // Null rather than poisoning the audit path.
        let snap = |inv: &Invoice| serde_json::to_value(inv).unwrap_or(Value::Null);
        Self {
            action,
            invoice_id,
            number: number.into(),
            before: before.map(snap),
            after: after.map(snap),
        }
    }
}

/// Receives audit events after each mutation.
pub trait AuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that writes events to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl AuditSink for LogSink {
    fn record(&self, event: AuditEvent) -> Result<(), Box<dyn std::error::Error>> {
        tracing::info!(
            action = ?event.action,
            invoice = %event.invoice_id,
            number = %event.number,
            "audit"
        );
        Ok(())
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl AuditSink for NullSink {
    fn record(&self, _event: AuditEvent) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
