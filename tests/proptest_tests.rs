//! Property-based tests for line computation and the payment ledger.

use billing_core::*;
use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Decimal with 2 fractional digits in [0.01, 10_000.00].
fn money() -> impl Strategy<Value = Decimal> {
    (1i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Quantity with 2 fractional digits in (0, 100].
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn discount() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

fn vat() -> impl Strategy<Value = Decimal> {
    prop_oneof![Just(dec!(0)), Just(dec!(5)), Just(dec!(18)), Just(dec!(27))]
}

fn line_input() -> impl Strategy<Value = LineInput> {
    (quantity(), money(), discount(), vat()).prop_map(|(q, p, d, v)| LineInput {
        name: "Item".into(),
        item_ref: None,
        quantity: q,
        unit: "pcs".into(),
        unit_price: p,
        discount_pct: d,
        vat_rate: v,
    })
}

proptest! {
    /// gross == net + tax for every line, exactly.
    #[test]
    fn line_gross_is_net_plus_tax(q in quantity(), p in money(), d in discount(), v in vat()) {
        let a = line_amounts(q, p, d, v);
        prop_assert_eq!(a.gross, a.net + a.tax);
        prop_assert!(a.net >= dec!(0));
        prop_assert!(a.tax >= dec!(0));
    }

    /// Document totals are the exact sum of the line amounts — no drift,
    /// even across 100+ lines.
    #[test]
    fn document_totals_equal_sum_of_lines(inputs in prop::collection::vec(line_input(), 100..160)) {
        let (lines, totals) = compute_lines(&inputs).unwrap();

        let net: Decimal = lines.iter().map(|l| l.net).sum();
        let tax: Decimal = lines.iter().map(|l| l.tax).sum();
        let gross: Decimal = lines.iter().map(|l| l.gross).sum();

        prop_assert_eq!(totals.net, net);
        prop_assert_eq!(totals.tax, tax);
        prop_assert_eq!(totals.gross, gross);
        prop_assert_eq!(totals.gross, totals.net + totals.tax);
    }

    /// Posting arbitrary payment sequences never pushes the paid amount past
    /// the gross total, and the paid amount never decreases.
    #[test]
    fn payments_never_exceed_gross(amounts in prop::collection::vec(1i64..=5_000_00, 1..20)) {
        let mut directory = MemoryDirectory::new();
        let account_id = AccountId::new();
        directory.insert_account(Account {
            id: account_id,
            name: "Proptest Kft.".into(),
            email: None,
        });
        let mut engine = BillingEngine::new(BillingConfig::default(), directory)
            .with_audit_sink(Box::new(NullSink));

        let today = date(2026, 3, 2);
        let draft = InvoiceDraft {
            account_id,
            origin: InvoiceOrigin::Direct,
            kind: InvoiceKind::Normal,
            issue_date: today,
            fulfillment_date: today,
            due_date: today,
            payment_method: PaymentMethod::BankTransfer,
            notes: vec![],
            lines: vec![LineInput {
                name: "Item".into(),
                item_ref: None,
                quantity: dec!(1),
                unit: "pcs".into(),
                unit_price: dec!(2500.00),
                discount_pct: dec!(0),
                vat_rate: dec!(27),
            }],
        };
        let id = engine.create(draft).unwrap().id;
        let gross = engine.invoice(id).unwrap().gross_total;

        let mut last_paid = dec!(0);
        for cents in amounts {
            let amount = Decimal::new(cents, 2);
            let result = engine.add_payment(id, PaymentInput {
                paid_on: today,
                amount,
                method: PaymentMethod::BankTransfer,
                reference: None,
                note: None,
            });
            // drop the Ok(&Invoice) borrow so the engine can be read below
            let result = result.map(|_| ());

            let inv = engine.invoice(id).unwrap();
            let paid = inv.paid_so_far();
            prop_assert!(paid <= gross);
            prop_assert!(paid >= last_paid);
            match result {
                Ok(_) => prop_assert_eq!(paid, last_paid + amount),
                // over the balance, or the invoice already flipped to Paid
                Err(BillingError::Overpayment { .. }) => prop_assert_eq!(paid, last_paid),
                Err(BillingError::InvalidState { .. }) => prop_assert_eq!(paid, last_paid),
                Err(err) => return Err(TestCaseError::fail(format!("unexpected error: {err}"))),
            }
            last_paid = paid;
            if inv.state == InvoiceState::Paid {
                prop_assert_eq!(paid, gross);
            }
        }
    }
}
