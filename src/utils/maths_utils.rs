use argminmax::ArgMinMax;
use statrs::statistics::Statistics;

/// Mean of a slice. Empty input yields 0.0 rather than NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

pub fn get_max(vec: &[f64]) -> f64 {
    let max_index: usize = vec.argmax();
    vec[max_index]
}

pub fn get_min(vec: &[f64]) -> f64 {
    let min_index: usize = vec.argmin();
    vec[min_index]
}

pub fn get_min_max(vec: &[f64]) -> (f64, f64) {
    (get_min(vec), get_max(vec))
}

/// `part / whole`, or `fallback` when the denominator is not positive.
pub fn safe_ratio(part: f64, whole: f64, fallback: f64) -> f64 {
    if whole > 0.0 { part / whole } else { fallback }
}

/// Percentage distance of `price` from `reference`.
pub fn pct_distance(price: f64, reference: f64) -> f64 {
    safe_ratio((price - reference).abs(), reference.abs(), f64::INFINITY) * 100.0
}

/// Format a price with roughly five significant digits, dropping decimals for
/// large prices (e.g. `43250`, `1.2345`, `0.00012345`).
pub fn format_price(price: f64) -> String {
    if !price.is_finite() || price == 0.0 {
        return format!("{price}");
    }
    let magnitude = price.abs().log10().floor() as i32;
    let decimals = (4 - magnitude).clamp(0, 8) as usize;
    format!("{price:.decimals$}")
}
