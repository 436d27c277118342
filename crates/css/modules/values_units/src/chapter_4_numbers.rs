//! CSS Values & Units Level 3: §4 Numbers
//! See <https://www.w3.org/TR/css-values-3/#numeric-types>

/// Decimal places kept when printing computed numbers.
const PRINT_PRECISION: f64 = 1e8;

/// Print a number the way stylesheets expect: no exponent, no trailing zeros,
/// rounded to eight decimals, and `0` instead of `-0`.
pub fn format_number(value: f64) -> String {
    let rounded = (value * PRINT_PRECISION).round() / PRINT_PRECISION;
    if rounded == 0.0 {
        return "0".to_owned();
    }
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        return format!("{rounded:.0}");
    }
    let text = format!("{rounded:.8}");
    text.trim_end_matches('0').trim_end_matches('.').to_owned()
}
