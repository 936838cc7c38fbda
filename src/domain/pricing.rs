//! Turns a decoded point estimate into the displayed result.

use crate::domain::entities::ValuationResult;

/// Half-width of the displayed price band. Fixed policy for unmodeled
/// variance (condition, micro-location, renovation state); it is not derived
/// from the model and must not be presented as a statistical interval.
pub const RANGE_BAND: f64 = 0.10;

/// Build the result from an unrounded estimate and the property size.
/// Callers guarantee `point_estimate` is finite and positive and `size_sqm > 0`.
pub fn compose_result(point_estimate: f64, size_sqm: f64) -> ValuationResult {
    let point = point_estimate.round();
    ValuationResult {
        point_estimate: to_amount(point),
        low: to_amount(point * (1.0 - RANGE_BAND)),
        high: to_amount(point * (1.0 + RANGE_BAND)),
        price_per_sqm: to_amount(point / size_sqm),
    }
}

fn to_amount(value: f64) -> u64 {
    value.round().max(0.0) as u64
}

/// `1234567` -> `"1,234,567"`.
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
