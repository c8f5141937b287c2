//! Compound annual growth rates.

use std::collections::BTreeMap;

/// Compound annual growth from `first` to `last` over `years` years.
///
/// `None` when either endpoint is zero or negative, or `years` is zero.
pub fn cagr(first: f64, last: f64, years: u32) -> Option<f64> {
    if years == 0 || first <= 0.0 || last <= 0.0 {
        return None;
    }
    let rate = (last / first).powf(1.0 / f64::from(years)) - 1.0;
    rate.is_finite().then_some(rate)
}

/// CAGR for `year` against the value reported exactly `years` years earlier.
///
/// `None` if either year is missing from the series.
pub fn windowed_cagr(series: &BTreeMap<i32, f64>, year: i32, years: u32) -> Option<f64> {
    let last = *series.get(&year)?;
    let first = *series.get(&(year - i32::try_from(years).ok()?))?;
    cagr(first, last, years)
}
