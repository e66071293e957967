//! Line and document amount computation.
//!
//! Pure functions over [`Decimal`] — never floating point, so recomputation
//! on update is exact and totals do not drift across many lines.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::ValidationError;
use crate::types::{Amounts, InvoiceLine, LineInput};

/// Round to `dp` decimal places using half-up (commercial rounding).
fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Compute net/tax/gross for one line.
///
/// `net = quantity * unit_price * (1 - discount/100)`, `tax = net * vat/100`,
/// `gross = net + tax`. Net and tax are rounded to 2 decimal places; gross is
/// their exact sum, so `gross == net + tax` always holds.
pub fn line_amounts(
    quantity: Decimal,
    unit_price: Decimal,
    discount_pct: Decimal,
    vat_rate: Decimal,
) -> Amounts {
    let discounted = unit_price * (dec!(1) - discount_pct / dec!(100));
    let net = round_half_up(quantity * discounted, 2);
    let tax = round_half_up(net * vat_rate / dec!(100), 2);
    Amounts {
        net,
        tax,
        gross: net + tax,
    }
}

/// Validate one line input. The error field path names the line index.
fn validate_line(index: usize, line: &LineInput) -> Result<(), ValidationError> {
    if line.quantity <= Decimal::ZERO {
        return Err(ValidationError::on_line(
            index,
            "quantity",
            "quantity must be positive",
        ));
    }
    if line.discount_pct < Decimal::ZERO || line.discount_pct > dec!(100) {
        return Err(ValidationError::on_line(
            index,
            "discount_pct",
            "discount must be between 0 and 100",
        ));
    }
    if line.vat_rate < Decimal::ZERO {
        return Err(ValidationError::on_line(
            index,
            "vat_rate",
            "VAT rate must not be negative",
        ));
    }
    if line.name.trim().is_empty() {
        return Err(ValidationError::on_line(
            index,
            "name",
            "item name must not be empty",
        ));
    }
    Ok(())
}

/// Validate and compute all lines of a document, assigning ordinals in input
/// order, and sum the document totals.
pub fn compute_lines(
    inputs: &[LineInput],
) -> Result<(Vec<InvoiceLine>, Amounts), ValidationError> {
    let mut lines = Vec::with_capacity(inputs.len());
    let mut totals = Amounts {
        net: Decimal::ZERO,
        tax: Decimal::ZERO,
        gross: Decimal::ZERO,
    };

    for (index, input) in inputs.iter().enumerate() {
        validate_line(index, input)?;
        let amounts = line_amounts(
            input.quantity,
            input.unit_price,
            input.discount_pct,
            input.vat_rate,
        );
        totals.net += amounts.net;
        totals.tax += amounts.tax;
        totals.gross += amounts.gross;
        lines.push(InvoiceLine {
            name: input.name.clone(),
            item_ref: input.item_ref.clone(),
            quantity: input.quantity,
            unit: input.unit.clone(),
            unit_price: input.unit_price,
            discount_pct: input.discount_pct,
            vat_rate: input.vat_rate,
            net: amounts.net,
            tax: amounts.tax,
            gross: amounts.gross,
            ordinal: index as u32,
        });
    }

    Ok((lines, totals))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: Decimal, unit_price: Decimal, discount: Decimal, vat: Decimal) -> LineInput {
        LineInput {
            name: "Widget".into(),
            item_ref: None,
            quantity,
            unit: "pcs".into(),
            unit_price,
            discount_pct: discount,
            vat_rate: vat,
        }
    }

    #[test]
    fn discounted_line_math() {
        // 3 * 1000 * 0.9 = 2700, tax 27% = 729
        let a = line_amounts(dec!(3), dec!(1000), dec!(10), dec!(27));
        assert_eq!(a.net, dec!(2700));
        assert_eq!(a.tax, dec!(729));
        assert_eq!(a.gross, dec!(3429));
    }

    #[test]
    fn undiscounted_line_math() {
        let a = line_amounts(dec!(1), dec!(5000), dec!(0), dec!(27));
        assert_eq!(a.net, dec!(5000));
        assert_eq!(a.tax, dec!(1350));
        assert_eq!(a.gross, dec!(6350));
    }

    #[test]
    fn fractional_amounts_round_half_up() {
        // 1 * 49.90 * 19% = 9.481 → 9.48
        let a = line_amounts(dec!(1), dec!(49.90), dec!(0), dec!(19));
        assert_eq!(a.net, dec!(49.90));
        assert_eq!(a.tax, dec!(9.48));
        assert_eq!(a.gross, dec!(59.38));
    }

    #[test]
    fn document_totals_sum_lines() {
        let (lines, totals) = compute_lines(&[
            line(dec!(3), dec!(1000), dec!(10), dec!(27)),
            line(dec!(1), dec!(5000), dec!(0), dec!(27)),
        ])
        .unwrap();

        assert_eq!(lines[0].net, dec!(2700));
        assert_eq!(lines[0].tax, dec!(729));
        assert_eq!(lines[1].net, dec!(5000));
        assert_eq!(lines[1].tax, dec!(1350));
        assert_eq!(totals.net, dec!(7700));
        assert_eq!(totals.tax, dec!(2079));
        assert_eq!(totals.gross, dec!(9779));
        assert_eq!(lines[0].ordinal, 0);
        assert_eq!(lines[1].ordinal, 1);
    }

    #[test]
    fn zero_quantity_rejected() {
        let err = compute_lines(&[line(dec!(0), dec!(100), dec!(0), dec!(27))]).unwrap_err();
        assert_eq!(err.field, "lines[0].quantity");
    }

    #[test]
    fn negative_quantity_rejected() {
        let err = compute_lines(&[line(dec!(-1), dec!(100), dec!(0), dec!(27))]).unwrap_err();
        assert_eq!(err.field, "lines[0].quantity");
    }

    #[test]
    fn discount_bounds_enforced() {
        assert!(compute_lines(&[line(dec!(1), dec!(100), dec!(100), dec!(27))]).is_ok());
        let err = compute_lines(&[
            line(dec!(1), dec!(100), dec!(0), dec!(27)),
            line(dec!(1), dec!(100), dec!(101), dec!(27)),
        ])
        .unwrap_err();
        assert_eq!(err.field, "lines[1].discount_pct");
    }

    #[test]
    fn negative_vat_rejected() {
        let err = compute_lines(&[line(dec!(1), dec!(100), dec!(0), dec!(-1))]).unwrap_err();
        assert_eq!(err.field, "lines[0].vat_rate");
    }

    #[test]
    fn no_drift_across_many_lines() {
        // 150 lines with awkward cents; Decimal sums must be exact.
        let inputs: Vec<_> = (0..150)
            .map(|_| line(dec!(1), dec!(0.10), dec!(0), dec!(27)))
            .collect();
        let (_, totals) = compute_lines(&inputs).unwrap();
        assert_eq!(totals.net, dec!(15.00));
        // per-line tax: 0.10 * 0.27 = 0.027 → 0.03
        assert_eq!(totals.tax, dec!(4.50));
        assert_eq!(totals.gross, totals.net + totals.tax);
    }
}
