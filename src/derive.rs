//! Source Resolver: derive invoices from sales orders, purchase orders, and
//! delivery notes.
//!
//! Each derivation resolves the billable party, copies the source's line
//! items into line inputs, fills the date defaults, and hands the draft to
//! [`BillingEngine::create`], which enforces one-invoice-per-source before
//! anything is persisted. Every failure path reports before an invoice row
//! exists.

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::engine::BillingEngine;
use crate::error::BillingError;
use crate::sources::{Directory, Order, PurchaseOrder};
use crate::types::{
    AccountId, DeliveryNoteId, Invoice, InvoiceDraft, InvoiceKind, InvoiceOrigin, LineInput,
    OrderId, PaymentMethod, PurchaseOrderId,
};

/// Optional overrides for a derivation. Unset fields take the documented
/// defaults (due date = today + configured days, fulfillment = source's
/// fulfillment date or today, method = bank transfer, kind = normal).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeriveOverrides {
    pub due_date: Option<NaiveDate>,
    pub fulfillment_date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub kind: Option<InvoiceKind>,
    pub note: Option<String>,
}

impl<D: Directory> BillingEngine<D> {
    /// Derive an invoice from a sales order. The billable party is the
    /// order's account; lines are copied 1:1 from the order items.
    pub fn derive_from_order(
        &mut self,
        order_id: OrderId,
        overrides: DeriveOverrides,
        today: NaiveDate,
    ) -> Result<&Invoice, BillingError> {
        let origin = InvoiceOrigin::Order { order_id };
        self.ensure_origin_free(&origin)?;
        let order = self.directory.order(order_id).ok_or_else(|| BillingError::NotFound {
            entity: "order",
            id: order_id.to_string(),
        })?;
        debug!(%order_id, lines = order.items.len(), "deriving invoice from order");
        let draft = self.order_draft(&order, origin, overrides, today);
        self.create(draft)
    }

    /// Derive an invoice from a purchase order. The billable party is
    /// resolved by matching the supplier's name or email against the account
    /// directory; no account is ever created implicitly.
    pub fn derive_from_purchase_order(
        &mut self,
        purchase_order_id: PurchaseOrderId,
        overrides: DeriveOverrides,
        today: NaiveDate,
    ) -> Result<&Invoice, BillingError> {
        let origin = InvoiceOrigin::PurchaseOrder { purchase_order_id };
        self.ensure_origin_free(&origin)?;
        let po = self
            .directory
            .purchase_order(purchase_order_id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "purchase order",
                id: purchase_order_id.to_string(),
            })?;
        let account_id = self.resolve_supplier(&po)?;
        debug!(%purchase_order_id, %account_id, "deriving invoice from purchase order");
        let draft = self.purchase_order_draft(&po, account_id, origin, overrides, today);
        self.create(draft)
    }

    /// Derive an invoice from a delivery note by dispatching to whichever
    /// source the note belongs to, carrying the note reference alongside.
    pub fn derive_from_delivery_note(
        &mut self,
        delivery_note_id: DeliveryNoteId,
        overrides: DeriveOverrides,
        today: NaiveDate,
    ) -> Result<&Invoice, BillingError> {
        let note = self
            .directory
            .delivery_note(delivery_note_id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "delivery note",
                id: delivery_note_id.to_string(),
            })?;

        if let Some(purchase_order_id) = note.purchase_order_id {
            let origin = InvoiceOrigin::DeliveryNote {
                delivery_note_id,
                order_id: None,
                purchase_order_id: Some(purchase_order_id),
            };
            self.ensure_origin_free(&origin)?;
            let po = self
                .directory
                .purchase_order(purchase_order_id)
                .ok_or_else(|| BillingError::NotFound {
                    entity: "purchase order",
                    id: purchase_order_id.to_string(),
                })?;
            let account_id = self.resolve_supplier(&po)?;
            let draft = self.purchase_order_draft(&po, account_id, origin, overrides, today);
            self.create(draft)
        } else if let Some(order_id) = note.order_id {
            let origin = InvoiceOrigin::DeliveryNote {
                delivery_note_id,
                order_id: Some(order_id),
                purchase_order_id: None,
            };
            self.ensure_origin_free(&origin)?;
            let order = self.directory.order(order_id).ok_or_else(|| BillingError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })?;
            let draft = self.order_draft(&order, origin, overrides, today);
            self.create(draft)
        } else {
            Err(BillingError::UnresolvedSource {
                id: delivery_note_id.to_string(),
            })
        }
    }

    /// Match the supplier against the account directory, name first, then
    /// email. This stays a string match by design; an unmatched supplier is
    /// surfaced, never guessed or auto-created.
    fn resolve_supplier(&self, po: &PurchaseOrder) -> Result<AccountId, BillingError> {
        self.directory
            .find_account(&po.supplier_name)
            .or_else(|| {
                po.supplier_email
                    .as_deref()
                    .and_then(|email| self.directory.find_account(email))
            })
            .map(|account| account.id)
            .ok_or_else(|| BillingError::UnresolvedParty {
                supplier: po.supplier_name.clone(),
            })
    }

    fn order_draft(
        &self,
        order: &Order,
        origin: InvoiceOrigin,
        overrides: DeriveOverrides,
        today: NaiveDate,
    ) -> InvoiceDraft {
        let lines = order
            .items
            .iter()
            .map(|item| LineInput {
                name: item.name.clone(),
                item_ref: item.item_ref.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                unit_price: item.unit_price,
                discount_pct: item.discount_pct,
                vat_rate: item.vat_rate,
            })
            .collect();
        InvoiceDraft {
            account_id: order.account_id,
            origin,
            kind: overrides.kind.unwrap_or(InvoiceKind::Normal),
            issue_date: today,
            fulfillment_date: overrides
                .fulfillment_date
                .or(order.fulfillment_date)
                .unwrap_or(today),
            due_date: overrides.due_date.unwrap_or_else(|| self.default_due(today)),
            payment_method: overrides
                .payment_method
                .unwrap_or(PaymentMethod::BankTransfer),
            notes: overrides.note.into_iter().collect(),
            lines,
        }
    }

    fn purchase_order_draft(
        &self,
        po: &PurchaseOrder,
        account_id: AccountId,
        origin: InvoiceOrigin,
        overrides: DeriveOverrides,
        today: NaiveDate,
    ) -> InvoiceDraft {
        let default_vat = self.config.default_vat_rate;
        let lines = po
            .items
            .iter()
            .map(|item| LineInput {
                name: item.name.clone(),
                item_ref: item.item_ref.clone(),
                quantity: item.quantity,
                unit: item.unit.clone(),
                unit_price: item.unit_price,
                discount_pct: rust_decimal::Decimal::ZERO,
                vat_rate: item.vat_rate.unwrap_or(default_vat),
            })
            .collect();
        InvoiceDraft {
            account_id,
            origin,
            kind: overrides.kind.unwrap_or(InvoiceKind::Normal),
            issue_date: today,
            fulfillment_date: overrides.fulfillment_date.unwrap_or(today),
            due_date: overrides.due_date.unwrap_or_else(|| self.default_due(today)),
            payment_method: overrides
                .payment_method
                .unwrap_or(PaymentMethod::BankTransfer),
            notes: overrides.note.into_iter().collect(),
            lines,
        }
    }

    fn default_due(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(self.config.payment_due_days))
            .unwrap_or(today)
    }
}
