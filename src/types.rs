use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_type!(
    /// Invoice identifier.
    InvoiceId
);
id_type!(
    /// Account (billable party) identifier.
    AccountId
);
id_type!(
    /// Sales order identifier.
    OrderId
);
id_type!(
    /// Purchase order identifier.
    PurchaseOrderId
);
id_type!(
    /// Delivery note identifier.
    DeliveryNoteId
);

/// Invoice document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Regular commercial invoice.
    Normal,
    /// Cancellation document issued for a stornoed invoice.
    Cancellation,
    /// Pro-forma — not a tax document.
    ProForma,
    /// Shipping / freight invoice.
    Shipping,
}

/// Invoice lifecycle state.
///
/// `Draft → Issued → Sent → Paid`, with `Storno` as the cancellation
/// terminal. Transition rules live in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    Draft,
    Issued,
    Sent,
    Paid,
    Storno,
}

/// Payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    Card,
    DirectDebit,
    Other(String),
}

/// Where an invoice came from.
///
/// The reference schema stores three nullable foreign keys; here the origin
/// is one tag so derivation logic stays exhaustive. A delivery note may carry
/// either of the other two references alongside its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvoiceOrigin {
    /// Created directly, not derived from a source document.
    Direct,
    /// Derived from a sales order.
    Order { order_id: OrderId },
    /// Derived from a purchase order.
    PurchaseOrder { purchase_order_id: PurchaseOrderId },
    /// Derived from a delivery note, which itself belongs to a purchase
    /// order or a sales-order shipment.
    DeliveryNote {
        delivery_note_id: DeliveryNoteId,
        order_id: Option<OrderId>,
        purchase_order_id: Option<PurchaseOrderId>,
    },
}

impl InvoiceOrigin {
    /// Sales-order reference, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Self::Order { order_id } => Some(*order_id),
            Self::DeliveryNote { order_id, .. } => *order_id,
            _ => None,
        }
    }

    /// Purchase-order reference, if any.
    pub fn purchase_order_id(&self) -> Option<PurchaseOrderId> {
        match self {
            Self::PurchaseOrder { purchase_order_id } => Some(*purchase_order_id),
            Self::DeliveryNote {
                purchase_order_id, ..
            } => *purchase_order_id,
            _ => None,
        }
    }

    /// Delivery-note reference, if any.
    pub fn delivery_note_id(&self) -> Option<DeliveryNoteId> {
        match self {
            Self::DeliveryNote {
                delivery_note_id, ..
            } => Some(*delivery_note_id),
            _ => None,
        }
    }
}

/// An invoice line as requested by the caller, before computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineInput {
    /// Item name as it appears on the invoice.
    pub name: String,
    /// Catalog item reference (article number), if any.
    pub item_ref: Option<String>,
    /// Invoiced quantity (must be positive).
    pub quantity: Decimal,
    /// Unit of measure (e.g. "pcs", "hour").
    pub unit: String,
    /// Net price per unit.
    pub unit_price: Decimal,
    /// Discount percentage, 0–100.
    pub discount_pct: Decimal,
    /// VAT rate percentage.
    pub vat_rate: Decimal,
}

/// Net, tax, and gross amounts for one line or one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amounts {
    pub net: Decimal,
    pub tax: Decimal,
    pub gross: Decimal,
}

/// A computed invoice line. Owned by exactly one invoice; lines are fully
/// replaced on update, never patched individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub name: String,
    pub item_ref: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
    pub vat_rate: Decimal,
    /// Computed net amount: quantity * unit_price * (1 - discount/100).
    pub net: Decimal,
    /// Computed tax amount: net * vat_rate/100.
    pub tax: Decimal,
    /// net + tax.
    pub gross: Decimal,
    /// Stable display order within the invoice.
    pub ordinal: u32,
}

/// A payment posted against an invoice. Append-only: payments are recorded
/// through the payment ledger and never edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayment {
    pub id: Uuid,
    pub paid_on: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    /// Bank transaction reference, if any.
    pub reference: Option<String>,
    pub note: Option<String>,
}

/// A financial document derived from a sales order, purchase order, or
/// delivery note — or created directly.
///
/// Invariant: `gross_total == net_total + tax_total`, and the totals are the
/// exact sums of the owned lines' amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    /// Generated number, unique and year-scoped (e.g. "INV-2026-000042").
    pub number: String,
    /// The billable party.
    pub account_id: AccountId,
    pub origin: InvoiceOrigin,
    pub kind: InvoiceKind,
    pub state: InvoiceState,
    pub issue_date: NaiveDate,
    /// Performance / fulfillment date.
    pub fulfillment_date: NaiveDate,
    pub due_date: NaiveDate,
    /// Set when the invoice is fully settled.
    pub paid_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    pub net_total: Decimal,
    pub tax_total: Decimal,
    pub gross_total: Decimal,
    pub notes: Vec<String>,
    pub lines: Vec<InvoiceLine>,
    pub payments: Vec<InvoicePayment>,
}

impl Invoice {
    /// Sum of payments posted so far.
    pub fn paid_so_far(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Remaining balance: gross total minus payments.
    pub fn outstanding(&self) -> Decimal {
        self.gross_total - self.paid_so_far()
    }
}

/// Request to create an invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub account_id: AccountId,
    pub origin: InvoiceOrigin,
    pub kind: InvoiceKind,
    pub issue_date: NaiveDate,
    pub fulfillment_date: NaiveDate,
    pub due_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub notes: Vec<String>,
    pub lines: Vec<LineInput>,
}

/// Partial update applied to a Draft or Issued invoice. `None` fields are
/// left untouched; `lines` replaces the full line set and recomputes totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceUpdate {
    pub issue_date: Option<NaiveDate>,
    pub fulfillment_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<Vec<String>>,
    pub lines: Option<Vec<LineInput>>,
}

/// Request to post a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInput {
    pub paid_on: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}
