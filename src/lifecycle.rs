//! Lifecycle state machine guards.
//!
//! `Draft → Issued → Sent → Paid`, with `Storno` reachable by cancellation
//! and `Paid` only ever entered by the payment ledger. Each guard either
//! passes or returns [`BillingError::InvalidState`] naming the operation and
//! the states it is legal from; the caller's state is untouched on failure.

use crate::error::BillingError;
use crate::types::InvoiceState;

/// Guard for `mark_issued`: Draft only.
pub fn ensure_can_issue(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Draft => Ok(()),
        _ => Err(BillingError::InvalidState {
            operation: "issue",
            state,
            legal_from: "Draft",
        }),
    }
}

/// Guard for `mark_sent`: Issued only.
pub fn ensure_can_send(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Issued => Ok(()),
        _ => Err(BillingError::InvalidState {
            operation: "send",
            state,
            legal_from: "Issued",
        }),
    }
}

/// Guard for `update` (including full line replacement): Draft or Issued.
pub fn ensure_can_update(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Draft | InvoiceState::Issued => Ok(()),
        _ => Err(BillingError::InvalidState {
            operation: "update",
            state,
            legal_from: "Draft, Issued",
        }),
    }
}

/// Guard for hard delete: Draft only.
pub fn ensure_can_delete(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Draft => Ok(()),
        _ => Err(BillingError::InvalidState {
            operation: "delete",
            state,
            legal_from: "Draft",
        }),
    }
}

/// Guard for storno: any state except already-Storno. Lines and payments are
/// preserved by the operation itself.
pub fn ensure_can_storno(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Storno => Err(BillingError::InvalidState {
            operation: "storno",
            state,
            legal_from: "Draft, Issued, Sent, Paid",
        }),
        _ => Ok(()),
    }
}

/// Guard for posting a payment: any state except Storno.
pub fn ensure_can_pay(state: InvoiceState) -> Result<(), BillingError> {
    match state {
        InvoiceState::Storno => Err(BillingError::InvalidState {
            operation: "add payment to",
            state,
            legal_from: "Draft, Issued, Sent, Paid",
        }),
        _ => Ok(()),
    }
}
