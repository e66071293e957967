//! The billing engine: invoice creation, mutation guards, the lifecycle
//! transitions, and the payment ledger.
//!
//! All mutating operations go through `&mut self`. That is the concurrency
//! model: allocation + insert, exclusivity check + insert, and overpayment
//! check + append each run as one serialized unit, so the storage races of
//! the reference system (duplicate numbers, double derivation, joint
//! overpayment) cannot occur. Embedders wanting shared access wrap the
//! engine in their own lock.

use std::collections::HashMap;

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::{AuditAction, AuditEvent, AuditSink, LogSink};
use crate::compute;
use crate::error::{BillingError, ValidationError};
use crate::lifecycle;
use crate::numbering::NumberSequence;
use crate::sources::Directory;
use crate::types::{
    Invoice, InvoiceDraft, InvoiceId, InvoiceOrigin, InvoiceState, InvoiceUpdate, InvoicePayment,
    PaymentInput,
};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Invoice number prefix, e.g. "INV" for "INV-2026-000001".
    pub number_prefix: String,
    /// Zero-padding width of the sequential part.
    pub sequence_width: usize,
    /// VAT rate applied to purchase-order lines whose catalog item carries
    /// no rate of its own.
    pub default_vat_rate: Decimal,
    /// Days until payment is due when derivation is not given a due date.
    pub payment_due_days: u64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            number_prefix: "INV".into(),
            sequence_width: 6,
            default_vat_rate: dec!(27),
            payment_due_days: 30,
        }
    }
}

/// Creates, numbers, recalculates, transitions, and reconciles payment
/// against invoices. Generic over the [`Directory`] supplying accounts and
/// source documents.
pub struct BillingEngine<D: Directory> {
    pub(crate) config: BillingConfig,
    pub(crate) directory: D,
    audit: Box<dyn AuditSink>,
    invoices: HashMap<InvoiceId, Invoice>,
    sequence: NumberSequence,
}

impl<D: Directory> BillingEngine<D> {
    /// Fresh engine with no invoices; audit events go to the tracing log.
    pub fn new(config: BillingConfig, directory: D) -> Self {
        let sequence = NumberSequence::new(&config.number_prefix, config.sequence_width);
        Self {
            config,
            directory,
            audit: Box::new(LogSink),
            invoices: HashMap::new(),
            sequence,
        }
    }

    /// Engine restored from persisted invoices. The number sequence is
    /// seeded from the existing numbers so allocation continues after the
    /// highest per year.
    pub fn restore(
        config: BillingConfig,
        directory: D,
        invoices: impl IntoIterator<Item = Invoice>,
    ) -> Self {
        let mut engine = Self::new(config, directory);
        let invoices: Vec<Invoice> = invoices.into_iter().collect();
        engine.sequence = NumberSequence::new(
            &engine.config.number_prefix,
            engine.config.sequence_width,
        )
        .seed(invoices.iter().map(|i| i.number.as_str()));
        engine.invoices = invoices.into_iter().map(|i| (i.id, i)).collect();
        engine
    }

    /// Replace the audit sink.
    pub fn with_audit_sink(mut self, sink: Box<dyn AuditSink>) -> Self {
        self.audit = sink;
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Fetch an invoice.
    pub fn invoice(&self, id: InvoiceId) -> Result<&Invoice, BillingError> {
        self.invoices.get(&id).ok_or_else(|| BillingError::NotFound {
            entity: "invoice",
            id: id.to_string(),
        })
    }

    /// All invoices, unordered.
    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices.values()
    }

    /// Remaining balance on an invoice.
    pub fn outstanding(&self, id: InvoiceId) -> Result<Decimal, BillingError> {
        Ok(self.invoice(id)?.outstanding())
    }

    /// Create an invoice in Draft state.
    ///
    /// Requires at least one line and an existing account; rejects any
    /// origin reference that is already invoiced. Totals are computed and
    /// the number allocated here, at creation time.
    pub fn create(&mut self, draft: InvoiceDraft) -> Result<&Invoice, BillingError> {
        if draft.lines.is_empty() {
            return Err(ValidationError::new(
                "lines",
                "at least one line item is required",
            )
            .into());
        }
        if self.directory.account(draft.account_id).is_none() {
            return Err(BillingError::NotFound {
                entity: "account",
                id: draft.account_id.to_string(),
            });
        }
        self.ensure_origin_free(&draft.origin)?;

        let (lines, totals) = compute::compute_lines(&draft.lines)?;
        let number = self.sequence.allocate(draft.issue_date.year());
        let id = InvoiceId::new();

        let invoice = Invoice {
            id,
            number: number.clone(),
            account_id: draft.account_id,
            origin: draft.origin,
            kind: draft.kind,
            state: InvoiceState::Draft,
            issue_date: draft.issue_date,
            fulfillment_date: draft.fulfillment_date,
            due_date: draft.due_date,
            paid_date: None,
            payment_method: draft.payment_method,
            net_total: totals.net,
            tax_total: totals.tax,
            gross_total: totals.gross,
            notes: draft.notes,
            lines,
            payments: Vec::new(),
        };
        info!(%id, %number, gross = %invoice.gross_total, "invoice created");
        self.invoices.insert(id, invoice);

        let created = &self.invoices[&id];
        self.emit(AuditAction::Created, id, &number, None, Some(created));
        Ok(created)
    }

    /// Update date fields, payment method, notes, and optionally replace the
    /// full line set. Legal in Draft and Issued only.
    ///
    /// Line replacement is delete-all-then-recreate: existing lines are
    /// discarded, amounts recomputed, and the totals replaced. The invoice
    /// number is permanent; changing the issue date never renumbers.
    pub fn update(
        &mut self,
        id: InvoiceId,
        patch: InvoiceUpdate,
    ) -> Result<&Invoice, BillingError> {
        let before = self.invoice(id)?.clone();
        lifecycle::ensure_can_update(before.state)?;

        // Validate the replacement lines before touching the stored row, so
        // a failure leaves the invoice fully intact.
        let recomputed = match &patch.lines {
            Some(inputs) => {
                if inputs.is_empty() {
                    return Err(ValidationError::new(
                        "lines",
                        "at least one line item is required",
                    )
                    .into());
                }
                Some(compute::compute_lines(inputs)?)
            }
            None => None,
        };

        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })?;
        if let Some(date) = patch.issue_date {
            invoice.issue_date = date;
        }
        if let Some(date) = patch.fulfillment_date {
            invoice.fulfillment_date = date;
        }
        if let Some(date) = patch.due_date {
            invoice.due_date = date;
        }
        if let Some(method) = patch.payment_method {
            invoice.payment_method = method;
        }
        if let Some(notes) = patch.notes {
            invoice.notes = notes;
        }
        if let Some((lines, totals)) = recomputed {
            invoice.lines = lines;
            invoice.net_total = totals.net;
            invoice.tax_total = totals.tax;
            invoice.gross_total = totals.gross;
        }
        debug!(%id, number = %invoice.number, "invoice updated");

        let after = &self.invoices[&id];
        self.emit(
            AuditAction::Updated,
            id,
            &before.number,
            Some(&before),
            Some(after),
        );
        Ok(after)
    }

    /// Draft → Issued.
    pub fn mark_issued(&mut self, id: InvoiceId) -> Result<&Invoice, BillingError> {
        self.transition(id, AuditAction::Issued, lifecycle::ensure_can_issue, |inv| {
            inv.state = InvoiceState::Issued;
        })
    }

    /// Issued → Sent.
    pub fn mark_sent(&mut self, id: InvoiceId) -> Result<&Invoice, BillingError> {
        self.transition(id, AuditAction::Sent, lifecycle::ensure_can_send, |inv| {
            inv.state = InvoiceState::Sent;
        })
    }

    /// Cancel the invoice. The reason is appended to the notes; lines and
    /// payments stay in place as the audit trail.
    pub fn storno(&mut self, id: InvoiceId, reason: &str) -> Result<&Invoice, BillingError> {
        let reason = reason.to_owned();
        self.transition(id, AuditAction::Stornoed, lifecycle::ensure_can_storno, |inv| {
            inv.state = InvoiceState::Storno;
            inv.notes.push(format!("Storno: {reason}"));
        })
    }

    /// Hard delete, Draft only.
    pub fn delete(&mut self, id: InvoiceId) -> Result<(), BillingError> {
        let invoice = self.invoice(id)?;
        lifecycle::ensure_can_delete(invoice.state)?;
        let removed = self
            .invoices
            .remove(&id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })?;
        info!(%id, number = %removed.number, "draft invoice deleted");
        self.emit(
            AuditAction::Deleted,
            id,
            &removed.number,
            Some(&removed),
            None,
        );
        Ok(())
    }

    /// Post a payment against an invoice.
    ///
    /// Rejected on a stornoed invoice and when the amount exceeds the
    /// outstanding balance; on rejection the invoice is untouched. When the
    /// payment settles the full gross amount the invoice transitions to
    /// Paid and its paid date is set to this payment's date — the one
    /// lifecycle transition triggered as a side effect.
    pub fn add_payment(
        &mut self,
        id: InvoiceId,
        input: PaymentInput,
    ) -> Result<&Invoice, BillingError> {
        let before = self.invoice(id)?.clone();
        lifecycle::ensure_can_pay(before.state)?;
        if input.amount <= Decimal::ZERO {
            return Err(ValidationError::new(
                "payment.amount",
                "payment amount must be positive",
            )
            .into());
        }
        let outstanding = before.outstanding();
        if input.amount > outstanding {
            return Err(BillingError::Overpayment {
                number: before.number.clone(),
                amount: input.amount,
                outstanding,
            });
        }

        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })?;
        invoice.payments.push(InvoicePayment {
            id: Uuid::new_v4(),
            paid_on: input.paid_on,
            amount: input.amount,
            method: input.method,
            reference: input.reference,
            note: input.note,
        });
        if invoice.paid_so_far() >= invoice.gross_total {
            invoice.state = InvoiceState::Paid;
            invoice.paid_date = Some(input.paid_on);
            info!(%id, number = %invoice.number, "invoice fully settled");
        } else {
            debug!(
                %id,
                number = %invoice.number,
                outstanding = %invoice.outstanding(),
                "partial payment recorded"
            );
        }

        let after = &self.invoices[&id];
        self.emit(
            AuditAction::PaymentAdded,
            id,
            &before.number,
            Some(&before),
            Some(after),
        );
        Ok(after)
    }

    /// Fail with `DuplicateInvoice` if any reference in `origin` is already
    /// carried by an existing invoice. At most one invoice per source
    /// document is a hard invariant.
    pub(crate) fn ensure_origin_free(&self, origin: &InvoiceOrigin) -> Result<(), BillingError> {
        for existing in self.invoices.values() {
            if let Some(order_id) = origin.order_id() {
                if existing.origin.order_id() == Some(order_id) {
                    return Err(BillingError::DuplicateInvoice {
                        source: "order",
                        id: order_id.to_string(),
                        number: existing.number.clone(),
                    });
                }
            }
            if let Some(po_id) = origin.purchase_order_id() {
                if existing.origin.purchase_order_id() == Some(po_id) {
                    return Err(BillingError::DuplicateInvoice {
                        source: "purchase order",
                        id: po_id.to_string(),
                        number: existing.number.clone(),
                    });
                }
            }
            if let Some(note_id) = origin.delivery_note_id() {
                if existing.origin.delivery_note_id() == Some(note_id) {
                    return Err(BillingError::DuplicateInvoice {
                        source: "delivery note",
                        id: note_id.to_string(),
                        number: existing.number.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn transition(
        &mut self,
        id: InvoiceId,
        action: AuditAction,
        guard: fn(InvoiceState) -> Result<(), BillingError>,
        apply: impl FnOnce(&mut Invoice),
    ) -> Result<&Invoice, BillingError> {
        let before = self.invoice(id)?.clone();
        guard(before.state)?;
        let invoice = self
            .invoices
            .get_mut(&id)
            .ok_or_else(|| BillingError::NotFound {
                entity: "invoice",
                id: id.to_string(),
            })?;
        apply(invoice);
        info!(%id, number = %invoice.number, from = ?before.state, to = ?invoice.state, "state transition");

        let after = &self.invoices[&id];
        self.emit(action, id, &before.number, Some(&before), Some(after));
        Ok(after)
    }

    /// Inform the audit sink. Sink failures are logged and swallowed — they
    /// never roll back the primary operation.
    fn emit(
        &self,
        action: AuditAction,
        id: InvoiceId,
        number: &str,
        before: Option<&Invoice>,
        after: Option<&Invoice>,
    ) {
        let event = AuditEvent::new(action, id, number, before, after);
        if let Err(err) = self.audit.record(event) {
            warn!(%id, error = %err, "audit sink failed; operation unaffected");
        }
    }
}
