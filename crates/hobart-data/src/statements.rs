//! Canonical annual statements.
//!
//! Fields absent from the source are `None`, never zero. A statement exists
//! for a year only if at least one of its fields was selected.

use crate::fields::{FieldName, StatementKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Annual income statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Total revenue
    pub revenue: Option<f64>,
    /// Cost of revenue
    pub cogs: Option<f64>,
    /// Gross profit
    pub gross_profit: Option<f64>,
    /// Operating income
    pub ebit: Option<f64>,
    /// Interest expense
    pub interest_expense: Option<f64>,
    /// Income tax expense
    pub taxes: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Diluted EPS
    pub eps_diluted: Option<f64>,
    /// Weighted average diluted shares
    pub shares_diluted: Option<f64>,
}

impl IncomeStatement {
    /// Build from selected values; `None` if no income field is present.
    pub fn from_values(fiscal_year: i32, values: &BTreeMap<FieldName, f64>) -> Option<Self> {
        let get = |field| values.get(&field).copied();
        let statement = Self {
            fiscal_year,
            revenue: get(FieldName::Revenue),
            cogs: get(FieldName::Cogs),
            gross_profit: get(FieldName::GrossProfit),
            ebit: get(FieldName::Ebit),
            interest_expense: get(FieldName::InterestExpense),
            taxes: get(FieldName::Taxes),
            net_income: get(FieldName::NetIncome),
            eps_diluted: get(FieldName::EpsDiluted),
            shares_diluted: get(FieldName::SharesDiluted),
        };
        statement.has_values().then_some(statement)
    }

    /// Value of an income field; `None` for fields of other statements.
    pub const fn get(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::Revenue => self.revenue,
            FieldName::Cogs => self.cogs,
            FieldName::GrossProfit => self.gross_profit,
            FieldName::Ebit => self.ebit,
            FieldName::InterestExpense => self.interest_expense,
            FieldName::Taxes => self.taxes,
            FieldName::NetIncome => self.net_income,
            FieldName::EpsDiluted => self.eps_diluted,
            FieldName::SharesDiluted => self.shares_diluted,
            _ => None,
        }
    }

    fn has_values(&self) -> bool {
        FieldName::ALL
            .iter()
            .filter(|f| f.statement() == StatementKind::Income)
            .any(|f| self.get(*f).is_some())
    }
}

/// Year-end balance sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Cash and equivalents
    pub cash: Option<f64>,
    /// Receivables
    pub receivables: Option<f64>,
    /// Inventory
    pub inventory: Option<f64>,
    /// Total assets
    pub total_assets: Option<f64>,
    /// Total liabilities
    pub total_liabilities: Option<f64>,
    /// Total debt
    pub total_debt: Option<f64>,
    /// Shareholders' equity
    pub shareholder_equity: Option<f64>,
}

impl BalanceSheet {
    /// Build from selected values; `None` if no balance sheet field is present.
    pub fn from_values(fiscal_year: i32, values: &BTreeMap<FieldName, f64>) -> Option<Self> {
        let get = |field| values.get(&field).copied();
        let statement = Self {
            fiscal_year,
            cash: get(FieldName::Cash),
            receivables: get(FieldName::Receivables),
            inventory: get(FieldName::Inventory),
            total_assets: get(FieldName::TotalAssets),
            total_liabilities: get(FieldName::TotalLiabilities),
            total_debt: get(FieldName::TotalDebt),
            shareholder_equity: get(FieldName::ShareholderEquity),
        };
        statement.has_values().then_some(statement)
    }

    /// Value of a balance sheet field; `None` for fields of other statements.
    pub const fn get(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::Cash => self.cash,
            FieldName::Receivables => self.receivables,
            FieldName::Inventory => self.inventory,
            FieldName::TotalAssets => self.total_assets,
            FieldName::TotalLiabilities => self.total_liabilities,
            FieldName::TotalDebt => self.total_debt,
            FieldName::ShareholderEquity => self.shareholder_equity,
            _ => None,
        }
    }

    fn has_values(&self) -> bool {
        FieldName::ALL
            .iter()
            .filter(|f| f.statement() == StatementKind::BalanceSheet)
            .any(|f| self.get(*f).is_some())
    }
}

/// Annual cash flow statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    /// Fiscal year
    pub fiscal_year: i32,
    /// Cash from operations
    pub cfo: Option<f64>,
    /// Capital expenditures (reported as a positive payment)
    pub capex: Option<f64>,
    /// Share repurchases
    pub buybacks: Option<f64>,
    /// Dividends paid
    pub dividends: Option<f64>,
    /// Acquisitions
    pub acquisitions: Option<f64>,
}

impl CashFlowStatement {
    /// Build from selected values; `None` if no cash flow field is present.
    pub fn from_values(fiscal_year: i32, values: &BTreeMap<FieldName, f64>) -> Option<Self> {
        let get = |field| values.get(&field).copied();
        let statement = Self {
            fiscal_year,
            cfo: get(FieldName::Cfo),
            capex: get(FieldName::Capex),
            buybacks: get(FieldName::Buybacks),
            dividends: get(FieldName::Dividends),
            acquisitions: get(FieldName::Acquisitions),
        };
        statement.has_values().then_some(statement)
    }

    /// Value of a cash flow field; `None` for fields of other statements.
    pub const fn get(&self, field: FieldName) -> Option<f64> {
        match field {
            FieldName::Cfo => self.cfo,
            FieldName::Capex => self.capex,
            FieldName::Buybacks => self.buybacks,
            FieldName::Dividends => self.dividends,
            FieldName::Acquisitions => self.acquisitions,
            _ => None,
        }
    }

    fn has_values(&self) -> bool {
        FieldName::ALL
            .iter()
            .filter(|f| f.statement() == StatementKind::CashFlow)
            .any(|f| self.get(*f).is_some())
    }
}

/// Every canonical statement for one company, keyed by fiscal year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    /// CIK, zero-padded to 10 digits
    pub cik: Option<String>,
    /// Company name
    pub entity_name: Option<String>,
    /// Income statements by fiscal year
    pub income: BTreeMap<i32, IncomeStatement>,
    /// Balance sheets by fiscal year
    pub balance_sheet: BTreeMap<i32, BalanceSheet>,
    /// Cash flow statements by fiscal year
    pub cash_flow: BTreeMap<i32, CashFlowStatement>,
}

impl StatementSet {
    /// Empty set for a company.
    pub const fn new(cik: Option<String>, entity_name: Option<String>) -> Self {
        Self {
            cik,
            entity_name,
            income: BTreeMap::new(),
            balance_sheet: BTreeMap::new(),
            cash_flow: BTreeMap::new(),
        }
    }

    /// Insert whichever statements the values populate for a year.
    pub fn insert_year(&mut self, fiscal_year: i32, values: &BTreeMap<FieldName, f64>) {
        if let Some(s) = IncomeStatement::from_values(fiscal_year, values) {
            self.income.insert(fiscal_year, s);
        }
        if let Some(s) = BalanceSheet::from_values(fiscal_year, values) {
            self.balance_sheet.insert(fiscal_year, s);
        }
        if let Some(s) = CashFlowStatement::from_values(fiscal_year, values) {
            self.cash_flow.insert(fiscal_year, s);
        }
    }

    /// Fiscal years with any statement, ascending.
    pub fn fiscal_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .income
            .keys()
            .chain(self.balance_sheet.keys())
            .chain(self.cash_flow.keys())
            .copied()
            .collect();
        years.into_iter().collect()
    }

    /// Value of any field for a year.
    pub fn value(&self, fiscal_year: i32, field: FieldName) -> Option<f64> {
        match field.statement() {
            StatementKind::Income => self.income.get(&fiscal_year)?.get(field),
            StatementKind::BalanceSheet => self.balance_sheet.get(&fiscal_year)?.get(field),
            StatementKind::CashFlow => self.cash_flow.get(&fiscal_year)?.get(field),
        }
    }

    /// Number of statements across all kinds.
    pub fn statement_count(&self) -> usize {
        self.income.len() + self.balance_sheet.len() + self.cash_flow.len()
    }

    /// Returns true if no statement was built.
    pub fn is_empty(&self) -> bool {
        self.statement_count() == 0
    }
}
