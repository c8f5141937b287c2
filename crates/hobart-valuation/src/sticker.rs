//! Sticker price and margin of safety.

use serde::{Deserialize, Serialize};

/// Lowest terminal PE ever used.
pub const MIN_TERMINAL_PE: f64 = 5.0;

/// Projected and discounted per-share prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StickerPrice {
    /// EPS at the end of the horizon
    pub future_eps: f64,
    /// Future EPS times the terminal PE
    pub future_price: f64,
    /// Future price discounted back to today, `None` when the discount
    /// factor is not positive
    pub sticker: Option<f64>,
    /// Sticker less the margin of safety
    pub safety_price: Option<f64>,
}

/// Terminal PE: twice the growth rate in percent, at least
/// [`MIN_TERMINAL_PE`], at most the cap and the historical PE when positive.
///
/// The cap itself never goes below [`MIN_TERMINAL_PE`].
pub fn terminal_pe(growth: f64, pe_cap: f64, historical_pe: Option<f64>) -> f64 {
    let growth_pe = (2.0 * growth * 100.0).max(MIN_TERMINAL_PE);
    let pe_cap = pe_cap.max(MIN_TERMINAL_PE);
    let cap = historical_pe
        .filter(|pe| *pe > 0.0)
        .map_or(pe_cap, |pe| pe.min(pe_cap));
    cap.min(growth_pe)
}

/// Project `eps0` over `years` at `growth`, price it at `terminal_pe` and
/// discount it back. `None` unless `eps0` is positive.
pub fn sticker_price(
    eps0: f64,
    growth: f64,
    terminal_pe: f64,
    discount_rate: f64,
    safety_margin_pct: f64,
    years: u32,
) -> Option<StickerPrice> {
    if eps0 <= 0.0 {
        return None;
    }
    let years = i32::try_from(years).ok()?;
    let future_eps = eps0 * (1.0 + growth).powi(years);
    let future_price = future_eps * terminal_pe;
    let discount = 1.0 + discount_rate;
    let sticker = (discount > 0.0).then(|| future_price / discount.powi(years));
    Some(StickerPrice {
        future_eps,
        future_price,
        sticker,
        safety_price: sticker.map(|s| s * (1.0 - safety_margin_pct)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_reference_sticker() {
        let pe = terminal_pe(0.10, 20.0, None);
        assert_relative_eq!(pe, 20.0);

        let price = sticker_price(2.0, 0.10, pe, 0.15, 0.5, 10).unwrap();
        assert_relative_eq!(price.future_eps, 5.19, max_relative = 0.01);
        assert_relative_eq!(price.future_price, 103.8, max_relative = 0.01);
        assert_relative_eq!(price.sticker.unwrap(), 25.66, max_relative = 0.01);
        assert_relative_eq!(price.safety_price.unwrap(), 12.83, max_relative = 0.01);
    }

    #[rstest]
    #[case(0.00, 20.0, None, 5.0)]
    #[case(0.02, 20.0, None, 5.0)]
    #[case(0.06, 20.0, None, 12.0)]
    #[case(0.25, 20.0, None, 20.0)]
    #[case(0.10, 20.0, Some(14.0), 14.0)]
    #[case(0.10, 20.0, Some(35.0), 20.0)]
    #[case(0.10, 20.0, Some(-3.0), 20.0)]
    #[case(0.05, 8.0, None, 8.0)]
    #[case(0.10, 0.0, None, 5.0)]
    #[case(0.10, -10.0, Some(12.0), 5.0)]
    fn test_terminal_pe(
        #[case] growth: f64,
        #[case] cap: f64,
        #[case] historical: Option<f64>,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(terminal_pe(growth, cap, historical), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_non_positive_eps() {
        assert!(sticker_price(0.0, 0.1, 20.0, 0.15, 0.5, 10).is_none());
        assert!(sticker_price(-1.5, 0.1, 20.0, 0.15, 0.5, 10).is_none());
    }

    #[rstest]
    #[case(-1.0)]
    #[case(-1.5)]
    fn test_non_positive_discount_factor(#[case] discount_rate: f64) {
        let price = sticker_price(2.0, 0.10, 20.0, discount_rate, 0.5, 10).unwrap();
        assert_relative_eq!(price.future_price, 103.8, max_relative = 0.01);
        assert!(price.sticker.is_none());
        assert!(price.safety_price.is_none());
    }
}
