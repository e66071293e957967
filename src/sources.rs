//! Read models for the external collaborators the billing engine consumes:
//! accounts and the source documents an invoice can be derived from.
//!
//! The engine only ever reads these — their own lifecycle belongs to the
//! surrounding ERP. [`Directory`] is the seam; [`MemoryDirectory`] is the
//! in-memory implementation used by tests and embedders without a backing
//! store of their own.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{AccountId, DeliveryNoteId, OrderId, PurchaseOrderId};

/// A billable party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: Option<String>,
}

/// One item of a sales order. Sales catalog items always carry a VAT rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub item_ref: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub discount_pct: Decimal,
    pub vat_rate: Decimal,
}

/// A sales order. The account is the billable party for derived invoices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub fulfillment_date: Option<NaiveDate>,
    pub items: Vec<OrderItem>,
}

/// One item of a purchase order. No discount on the purchase side; the VAT
/// rate may be missing on the catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrderItem {
    pub name: String,
    pub item_ref: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub vat_rate: Option<Decimal>,
}

/// A purchase order. The supplier is free text; the billable party must be
/// resolved against the account directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub supplier_name: String,
    pub supplier_email: Option<String>,
    pub items: Vec<PurchaseOrderItem>,
}

/// A delivery note. Belongs to exactly one of {purchase order, sales-order
/// shipment}; both absent is a data error surfaced as `UnresolvedSource`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNote {
    pub id: DeliveryNoteId,
    pub order_id: Option<OrderId>,
    pub purchase_order_id: Option<PurchaseOrderId>,
}

/// Read-only access to accounts and source documents.
pub trait Directory {
    fn account(&self, id: AccountId) -> Option<Account>;

    /// Case-insensitive substring match on account name or email. This is
    /// the explicit fallback used to resolve a purchase order's supplier to
    /// an account; it never creates anything.
    fn find_account(&self, needle: &str) -> Option<Account>;

    fn order(&self, id: OrderId) -> Option<Order>;
    fn purchase_order(&self, id: PurchaseOrderId) -> Option<PurchaseOrder>;
    fn delivery_note(&self, id: DeliveryNoteId) -> Option<DeliveryNote>;
}

/// In-memory [`Directory`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    accounts: HashMap<AccountId, Account>,
    orders: HashMap<OrderId, Order>,
    purchase_orders: HashMap<PurchaseOrderId, PurchaseOrder>,
    delivery_notes: HashMap<DeliveryNoteId, DeliveryNote>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_account(&mut self, account: Account) {
        self.accounts.insert(account.id, account);
    }

    pub fn insert_order(&mut self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn insert_purchase_order(&mut self, po: PurchaseOrder) {
        self.purchase_orders.insert(po.id, po);
    }

    pub fn insert_delivery_note(&mut self, note: DeliveryNote) {
        self.delivery_notes.insert(note.id, note);
    }
}

impl Directory for MemoryDirectory {
    fn account(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id).cloned()
    }

    fn find_account(&self, needle: &str) -> Option<Account> {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.accounts
            .values()
            .find(|a| {
                a.name.to_lowercase().contains(&needle)
                    || a.email
                        .as_deref()
                        .is_some_and(|e| e.to_lowercase().contains(&needle))
            })
            .cloned()
    }

    fn order(&self, id: OrderId) -> Option<Order> {
        self.orders.get(&id).cloned()
    }

    fn purchase_order(&self, id: PurchaseOrderId) -> Option<PurchaseOrder> {
        self.purchase_orders.get(&id).cloned()
    }

    fn delivery_note(&self, id: DeliveryNoteId) -> Option<DeliveryNote> {
        self.delivery_notes.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(name: &str, email: Option<&str>) -> Account {
        Account {
            id: AccountId::new(),
            name: name.into(),
            email: email.map(String::from),
        }
    }

    #[test]
    fn find_account_matches_name_substring() {
        let mut dir = MemoryDirectory::new();
        dir.insert_account(account("Steelworks Kft.", None));
        assert!(dir.find_account("steelworks").is_some());
        assert!(dir.find_account("STEEL").is_some());
        assert!(dir.find_account("copper").is_none());
    }

    #[test]
    fn find_account_matches_email() {
        let mut dir = MemoryDirectory::new();
        dir.insert_account(account("Steelworks Kft.", Some("billing@steel.example")));
        assert!(dir.find_account("billing@steel.example").is_some());
    }

    #[test]
    fn find_account_rejects_blank_needle() {
        let mut dir = MemoryDirectory::new();
        dir.insert_account(account("Steelworks Kft.", None));
        assert!(dir.find_account("  ").is_none());
    }
}
