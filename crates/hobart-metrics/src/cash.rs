//! Owner earnings.

/// Operating cash flow less capital expenditure.
///
/// Capex is a payment; filers disagree on its sign, so its magnitude is
/// used. Missing capex counts as none spent.
pub fn owner_earnings(cfo: Option<f64>, capex: Option<f64>) -> Option<f64> {
    Some(cfo? - capex.map_or(0.0, f64::abs))
}

/// Owner earnings per diluted share; `None` without a positive share count.
pub fn owner_earnings_per_share(owner_earnings: Option<f64>, shares: Option<f64>) -> Option<f64> {
    let shares = shares.filter(|s| *s > 0.0)?;
    Some(owner_earnings? / shares)
}
