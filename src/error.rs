use crate::types::InvoiceState;

/// Errors returned by billing operations.
///
/// Every operation is a synchronous request/response call; errors are
/// reported to the caller and never retried internally.
///
/// `Display` and `Error` are implemented by hand: the `DuplicateInvoice`
/// variant carries a field named `source` that is a document label, not an
/// underlying error, which thiserror's derive would otherwise treat as the
/// error source.
#[derive(Debug)]
#[non_exhaustive]
pub enum BillingError {
    /// One or more validation rules failed.
    Validation(ValidationError),

    /// The referenced invoice, source document, or account does not exist.
    NotFound { entity: &'static str, id: String },

    /// The source document already has an invoice.
    DuplicateInvoice {
        source: &'static str,
        id: String,
        number: String,
    },

    /// Derivation could not determine a billable party.
    UnresolvedParty { supplier: String },

    /// A delivery note belongs to neither a purchase order nor a sales order.
    UnresolvedSource { id: String },

    /// The operation is not legal in the invoice's current lifecycle state.
    InvalidState {
        operation: &'static str,
        state: InvoiceState,
        legal_from: &'static str,
    },

    /// The payment would exceed the outstanding balance.
    Overpayment {
        number: String,
        amount: rust_decimal::Decimal,
        outstanding: rust_decimal::Decimal,
    },
}

impl std::fmt::Display for BillingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingError::Validation(err) => write!(f, "validation failed: {err}"),
            BillingError::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            BillingError::DuplicateInvoice { source, id, number } => {
                write!(f, "{source} {id} is already invoiced as {number}")
            }
            BillingError::UnresolvedParty { supplier } => {
                write!(f, "no account matches supplier '{supplier}'")
            }
            BillingError::UnresolvedSource { id } => {
                write!(f, "delivery note {id} has no source association")
            }
            BillingError::InvalidState {
                operation,
                state,
                legal_from,
            } => write!(
                f,
                "cannot {operation} invoice in state {state:?} (legal from: {legal_from})"
            ),
            BillingError::Overpayment {
                number,
                amount,
                outstanding,
            } => write!(
                f,
                "payment of {amount} exceeds outstanding balance {outstanding} on invoice {number}"
            ),
        }
    }
}

impl std::error::Error for BillingError {}

/// A single validation error with field path and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "lines[2].quantity").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Validation error for a field of the line at `index`.
    pub fn on_line(index: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            field: format!("lines[{index}].{field}"),
            message: message.into(),
        }
    }
}

impl From<ValidationError> for BillingError {
    fn from(err: ValidationError) -> Self {
        BillingError::Validation(err)
    }
}
