//! Leverage, coverage and margins.

/// `ebit / interest_expense`; `None` when interest expense is absent or zero.
pub fn interest_coverage(ebit: Option<f64>, interest_expense: Option<f64>) -> Option<f64> {
    let interest = interest_expense.filter(|i| *i != 0.0)?;
    Some(ebit? / interest)
}

/// `total_debt - cash`, with missing debt as zero.
pub fn net_debt(total_debt: Option<f64>, cash: Option<f64>) -> Option<f64> {
    Some(total_debt.unwrap_or(0.0) - cash?)
}

/// `total_debt / equity`; `None` unless equity is positive.
pub fn debt_to_equity(total_debt: Option<f64>, shareholder_equity: Option<f64>) -> Option<f64> {
    let equity = shareholder_equity.filter(|e| *e > 0.0)?;
    Some(total_debt.unwrap_or(0.0) / equity)
}

/// Gross margin, from gross profit or else from cost of revenue.
pub fn gross_margin(
    revenue: Option<f64>,
    gross_profit: Option<f64>,
    cogs: Option<f64>,
) -> Option<f64> {
    let revenue = revenue.filter(|r| *r > 0.0)?;
    let gross = gross_profit.or_else(|| cogs.map(|c| revenue - c))?;
    Some(gross / revenue)
}

/// Operating margin, `ebit / revenue`.
pub fn operating_margin(ebit: Option<f64>, revenue: Option<f64>) -> Option<f64> {
    let revenue = revenue.filter(|r| *r > 0.0)?;
    Some(ebit? / revenue)
}
