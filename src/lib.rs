//! # billing-core
//!
//! The billing engine of an ERP: invoice number allocation, derivation from
//! sales orders / purchase orders / delivery notes, line tax and discount
//! computation, the invoice lifecycle state machine, and payment
//! reconciliation.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Every operation is a synchronous request/response call that either fully
//! applies or fully fails; mutation goes through `&mut BillingEngine`, which
//! serializes number allocation, source-exclusivity checks, and overpayment
//! checks.
//!
//! ## Quick start
//!
//! ```rust
//! use billing_core::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let mut directory = MemoryDirectory::new();
//! let account = Account {
//!     id: AccountId::new(),
//!     name: "Kovács Kft.".into(),
//!     email: None,
//! };
//! let account_id = account.id;
//! directory.insert_account(account);
//!
//! let mut engine = BillingEngine::new(BillingConfig::default(), directory);
//! let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//!
//! let draft = InvoiceDraft {
//!     account_id,
//!     origin: InvoiceOrigin::Direct,
//!     kind: InvoiceKind::Normal,
//!     issue_date: today,
//!     fulfillment_date: today,
//!     due_date: today,
//!     payment_method: PaymentMethod::BankTransfer,
//!     notes: vec![],
//!     lines: vec![LineInput {
//!         name: "Consulting".into(),
//!         item_ref: None,
//!         quantity: dec!(10),
//!         unit: "hour".into(),
//!         unit_price: dec!(12000),
//!         discount_pct: dec!(0),
//!         vat_rate: dec!(27),
//!     }],
//! };
//! let id = engine.create(draft).unwrap().id;
//!
//! let invoice = engine.invoice(id).unwrap();
//! assert_eq!(invoice.number, "INV-2026-000001");
//! assert_eq!(invoice.gross_total, dec!(152400));
//! assert_eq!(invoice.gross_total, invoice.net_total + invoice.tax_total);
//! ```

pub mod audit;
pub mod compute;
pub mod derive;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod numbering;
pub mod sources;
pub mod types;

pub use audit::{AuditAction, AuditEvent, AuditSink, LogSink, NullSink};
pub use compute::{compute_lines, line_amounts};
pub use derive::DeriveOverrides;
pub use engine::{BillingConfig, BillingEngine};
pub use error::{BillingError, ValidationError};
pub use numbering::NumberSequence;
pub use sources::{
    Account, DeliveryNote, Directory, MemoryDirectory, Order, OrderItem, PurchaseOrder,
    PurchaseOrderItem,
};
pub use types::{
    AccountId, Amounts, DeliveryNoteId, Invoice, InvoiceDraft, InvoiceId, InvoiceKind,
    InvoiceLine, InvoiceOrigin, InvoicePayment, InvoiceState, InvoiceUpdate, LineInput, OrderId,
    PaymentInput, PaymentMethod, PurchaseOrderId,
};
