//! Canonical statement fields.
//!
//! Every value the normalizer produces belongs to exactly one [`FieldName`],
//! which in turn belongs to one [`StatementKind`] and is reported in one
//! [`UnitKind`].

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The three canonical annual statements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Income statement
    #[display("income")]
    Income,
    /// Balance sheet
    #[display("balance_sheet")]
    BalanceSheet,
    /// Cash flow statement
    #[display("cash_flow")]
    CashFlow,
}

/// Unit a canonical field must be reported in.
///
/// Observations in any other unit are ignored by the normalizer; a field
/// reported only in a foreign currency is therefore absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum UnitKind {
    /// Monetary amount in USD
    #[display("USD")]
    Currency,
    /// Per-share amount in USD
    #[display("USD/shares")]
    PerShare,
    /// Share count
    #[display("shares")]
    Shares,
}

impl UnitKind {
    /// Returns true if the feed's unit key is acceptable for this kind.
    pub fn accepts(&self, unit: &str) -> bool {
        match self {
            Self::Currency => unit == "USD",
            Self::PerShare => unit == "USD/shares" || unit == "USD-per-shares",
            Self::Shares => unit == "shares",
        }
    }
}

/// A semantic field of a canonical statement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    // Income statement
    /// Total revenue
    #[display("revenue")]
    Revenue,
    /// Cost of revenue
    #[display("cogs")]
    Cogs,
    /// Gross profit
    #[display("gross_profit")]
    GrossProfit,
    /// Operating income, used as EBIT
    #[display("ebit")]
    Ebit,
    /// Interest expense
    #[display("interest_expense")]
    InterestExpense,
    /// Income tax expense
    #[display("taxes")]
    Taxes,
    /// Net income
    #[display("net_income")]
    NetIncome,
    /// Diluted earnings per share
    #[display("eps_diluted")]
    EpsDiluted,
    /// Weighted average diluted shares outstanding
    #[display("shares_diluted")]
    SharesDiluted,

    // Balance sheet
    /// Cash and cash equivalents
    #[display("cash")]
    Cash,
    /// Receivables
    #[display("receivables")]
    Receivables,
    /// Inventory
    #[display("inventory")]
    Inventory,
    /// Total assets
    #[display("total_assets")]
    TotalAssets,
    /// Total liabilities
    #[display("total_liabilities")]
    TotalLiabilities,
    /// Total debt
    #[display("total_debt")]
    TotalDebt,
    /// Shareholders' equity
    #[display("shareholder_equity")]
    ShareholderEquity,

    // Cash flow
    /// Cash from operations
    #[display("cfo")]
    Cfo,
    /// Capital expenditures
    #[display("capex")]
    Capex,
    /// Share repurchases
    #[display("buybacks")]
    Buybacks,
    /// Dividends paid
    #[display("dividends")]
    Dividends,
    /// Acquisitions, net of cash acquired
    #[display("acquisitions")]
    Acquisitions,
}

impl FieldName {
    /// Every canonical field, in statement order.
    pub const ALL: [Self; 21] = [
        Self::Revenue,
        Self::Cogs,
        Self::GrossProfit,
        Self::Ebit,
        Self::InterestExpense,
        Self::Taxes,
        Self::NetIncome,
        Self::EpsDiluted,
        Self::SharesDiluted,
        Self::Cash,
        Self::Receivables,
        Self::Inventory,
        Self::TotalAssets,
        Self::TotalLiabilities,
        Self::TotalDebt,
        Self::ShareholderEquity,
        Self::Cfo,
        Self::Capex,
        Self::Buybacks,
        Self::Dividends,
        Self::Acquisitions,
    ];

    /// Statement this field belongs to.
    pub const fn statement(&self) -> StatementKind {
        match self {
            Self::Revenue
            | Self::Cogs
            | Self::GrossProfit
            | Self::Ebit
            | Self::InterestExpense
            | Self::Taxes
            | Self::NetIncome
            | Self::EpsDiluted
            | Self::SharesDiluted => StatementKind::Income,
            Self::Cash
            | Self::Receivables
            | Self::Inventory
            | Self::TotalAssets
            | Self::TotalLiabilities
            | Self::TotalDebt
            | Self::ShareholderEquity => StatementKind::BalanceSheet,
            Self::Cfo | Self::Capex | Self::Buybacks | Self::Dividends | Self::Acquisitions => {
                StatementKind::CashFlow
            }
        }
    }

    /// Unit the field is reported in.
    pub const fn unit(&self) -> UnitKind {
        match self {
            Self::EpsDiluted => UnitKind::PerShare,
            Self::SharesDiluted => UnitKind::Shares,
            _ => UnitKind::Currency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statement_has_fields() {
        for kind in [
            StatementKind::Income,
            StatementKind::BalanceSheet,
            StatementKind::CashFlow,
        ] {
            assert!(FieldName::ALL.iter().any(|f| f.statement() == kind));
        }
    }

    #[test]
    fn test_units() {
        assert_eq!(FieldName::EpsDiluted.unit(), UnitKind::PerShare);
        assert_eq!(FieldName::SharesDiluted.unit(), UnitKind::Shares);
        assert_eq!(FieldName::Capex.unit(), UnitKind::Currency);
        assert!(UnitKind::Currency.accepts("USD"));
        assert!(!UnitKind::Currency.accepts("EUR"));
        assert!(!UnitKind::Shares.accepts("USD"));
    }

    #[test]
    fn test_display_matches_serde() {
        let json = serde_json::to_string(&FieldName::ShareholderEquity).unwrap();
        assert_eq!(json, format!("\"{}\"", FieldName::ShareholderEquity));
    }
}
