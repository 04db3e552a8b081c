use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// `numerator / denominator`, or `default` whenever the ratio is undefined
/// or not finite.
pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return default;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        default
    }
}

/// [`safe_divide`] with the usual 0 default.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    safe_divide(numerator, denominator, 0.0)
}

pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}
