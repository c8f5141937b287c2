//! Payback time and ten-cap price.

/// First year (1-based) in which cumulative owner earnings per share,
/// growing at `growth` from `owner_earnings_ps`, reach `basis`.
///
/// `None` if `basis` or the owner earnings are not positive, or if the
/// basis is not reached within `max_years`. Negative growth counts as none.
pub fn payback_years(basis: f64, owner_earnings_ps: f64, growth: f64, max_years: u32) -> Option<u32> {
    if basis <= 0.0 || owner_earnings_ps <= 0.0 {
        return None;
    }
    let growth = growth.max(0.0);
    let mut cumulative = 0.0;
    let mut current = owner_earnings_ps;
    for year in 1..=max_years {
        cumulative += current;
        if cumulative >= basis {
            return Some(year);
        }
        current *= 1.0 + growth;
    }
    None
}

/// Price at which owner earnings per share yield `yield_rate`.
pub fn ten_cap_price(owner_earnings_ps: f64, yield_rate: f64) -> Option<f64> {
    (owner_earnings_ps > 0.0 && yield_rate > 0.0).then(|| owner_earnings_ps / yield_rate)
}
