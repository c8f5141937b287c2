//! Return on invested capital and its inputs.

/// Effective cash tax rate, `taxes / |ebit|` clamped to `[0, cap]`.
///
/// Falls back to 0 when either input is absent or ebit is zero.
pub fn cash_tax_rate(taxes: Option<f64>, ebit: Option<f64>, cap: f64) -> f64 {
    match (taxes, ebit) {
        (Some(taxes), Some(ebit)) if ebit != 0.0 => (taxes / ebit.abs()).clamp(0.0, cap),
        _ => 0.0,
    }
}

/// Net operating profit after tax.
pub fn nopat(ebit: Option<f64>, tax_rate: f64) -> Option<f64> {
    ebit.map(|ebit| ebit * (1.0 - tax_rate))
}

/// Invested capital proxy: `total_debt + equity - cash`.
///
/// Missing debt counts as zero; missing equity or cash makes it unknown.
pub fn invested_capital(
    total_debt: Option<f64>,
    shareholder_equity: Option<f64>,
    cash: Option<f64>,
) -> Option<f64> {
    Some(total_debt.unwrap_or(0.0) + shareholder_equity? - cash?)
}

/// Return on invested capital; `None` when invested capital is zero.
pub fn roic(nopat: Option<f64>, invested_capital: Option<f64>) -> Option<f64> {
    let capital = invested_capital.filter(|c| *c != 0.0)?;
    Some(nopat? / capital)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_tax_rate_and_nopat() {
        let rate = cash_tax_rate(Some(300.0), Some(900.0), 0.35);
        assert_relative_eq!(rate, 1.0 / 3.0, epsilon = 1e-12);
        assert_relative_eq!(nopat(Some(900.0), rate).unwrap(), 600.0, epsilon = 1e-9);
    }

    #[rstest]
    #[case(Some(500.0), Some(1000.0), 0.35)]
    #[case(Some(-50.0), Some(1000.0), 0.0)]
    #[case(Some(100.0), Some(0.0), 0.0)]
    #[case(Some(100.0), None, 0.0)]
    #[case(None, Some(1000.0), 0.0)]
    #[case(Some(100.0), Some(-1000.0), 0.1)]
    fn test_tax_rate_clamp(#[case] taxes: Option<f64>, #[case] ebit: Option<f64>, #[case] expected: f64) {
        assert_relative_eq!(cash_tax_rate(taxes, ebit, 0.35), expected);
    }

    #[test]
    fn test_invested_capital() {
        assert_eq!(invested_capital(Some(200.0), Some(1000.0), Some(100.0)), Some(1100.0));
        assert_eq!(invested_capital(None, Some(1000.0), Some(100.0)), Some(900.0));
        assert_eq!(invested_capital(Some(200.0), None, Some(100.0)), None);
        assert_eq!(invested_capital(Some(200.0), Some(1000.0), None), None);
    }

    #[test]
    fn test_roic_zero_capital_is_none() {
        assert!(roic(Some(600.0), Some(0.0)).is_none());
        assert!(roic(Some(600.0), None).is_none());
        assert!(roic(None, Some(100.0)).is_none());
        assert_relative_eq!(roic(Some(600.0), Some(4000.0)).unwrap(), 0.15);
    }
}
