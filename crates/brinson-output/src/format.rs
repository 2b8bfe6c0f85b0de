//! Percentage formatting.

/// Decimals shown for weights and returns.
pub const WEIGHT_DECIMALS: usize = 2;

/// Decimals shown for attribution effects.
pub const EFFECT_DECIMALS: usize = 4;

/// Format a fraction as a percentage, e.g. `0.0123` as `1.23%`.
pub fn percent(value: f64, decimals: usize) -> String {
    // Avoid printing "-0.00%" for values that round to zero.
    let scaled = value * 100.0;
    let factor = 10f64.powi(decimals as i32);
    let scaled = if (scaled * factor).round() == 0.0 {
        0.0
    } else {
        scaled
    };
    format!("{scaled:.decimals$}%")
}

/// Format a weight or return.
pub fn weight_percent(value: f64) -> String {
    percent(value, WEIGHT_DECIMALS)
}

/// Format an attribution effect.
pub fn effect_percent(value: f64) -> String {
    percent(value, EFFECT_DECIMALS)
}
