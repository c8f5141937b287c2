//! Fact extraction.
//!
//! Different companies, and the same company across years, report the same
//! economic quantity under different XBRL tags. The [`AliasTable`] lists, per
//! canonical field, the acceptable tags in priority order; the
//! [`FactExtractor`] flattens a [`FactFeed`] into [`RawObservation`]s tagged
//! with the alias that matched and its rank. Choosing between candidates is
//! left to the normalizer.

use crate::edgar::facts::{FactFeed, ReportedFact};
use crate::fields::FieldName;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Taxonomy assumed for aliases written without a `taxonomy:` prefix.
pub const DEFAULT_TAXONOMY: &str = "us-gaap";

/// Filing form an observation was reported in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormType {
    /// Domestic annual report (10-K)
    Annual,
    /// Foreign-issuer annual report (20-F, 40-F)
    ForeignAnnual,
    /// Amended annual report (10-K/A, 20-F/A, 40-F/A)
    AnnualAmendment,
    /// Quarterly report (10-Q, 10-Q/A)
    Interim,
    /// Anything else (8-K, S-1, ...)
    Other(String),
}

impl FormType {
    /// Classify a form string from the feed.
    pub fn parse(form: &str) -> Self {
        match form.trim().to_ascii_uppercase().as_str() {
            "10-K" | "10-KT" => Self::Annual,
            "20-F" | "40-F" => Self::ForeignAnnual,
            "10-K/A" | "10-KT/A" | "20-F/A" | "40-F/A" => Self::AnnualAmendment,
            "10-Q" | "10-Q/A" => Self::Interim,
            other => Self::Other(other.to_string()),
        }
    }

    /// Primary annual forms drive fiscal-year discovery.
    pub const fn is_primary_annual(&self) -> bool {
        matches!(self, Self::Annual | Self::ForeignAnnual)
    }

    /// Quarterly forms never supply annual values.
    pub const fn is_interim(&self) -> bool {
        matches!(self, Self::Interim)
    }
}

/// Ordered tag aliases per canonical field.
///
/// Aliases are `taxonomy:Tag` strings; a bare `Tag` means `us-gaap:Tag`.
/// Earlier aliases win over later ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    fields: BTreeMap<FieldName, Vec<String>>,
}

impl AliasTable {
    /// An empty table (no field extracts anything).
    pub const fn empty() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Replace the aliases for a field.
    pub fn with_aliases(mut self, field: FieldName, aliases: &[&str]) -> Self {
        self.fields
            .insert(field, aliases.iter().map(|a| (*a).to_string()).collect());
        self
    }

    /// Aliases for a field, in priority order.
    pub fn aliases(&self, field: FieldName) -> &[String] {
        self.fields.get(&field).map_or(&[], Vec::as_slice)
    }

    /// Fields with at least one alias.
    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.fields
            .iter()
            .filter(|(_, aliases)| !aliases.is_empty())
            .map(|(field, _)| *field)
    }

    /// Standard US-GAAP tags, with IFRS tags as last resort for foreign filers.
    pub fn standard() -> Self {
        use FieldName::*;

        Self::empty()
            .with_aliases(
                Revenue,
                &[
                    "Revenues",
                    "SalesRevenueNet",
                    "RevenueFromContractWithCustomerExcludingAssessedTax",
                    "RevenueFromContractWithCustomerIncludingAssessedTax",
                    "SalesRevenueGoodsNet",
                    "ifrs-full:Revenue",
                ],
            )
            .with_aliases(
                Cogs,
                &[
                    "CostOfRevenue",
                    "CostOfGoodsAndServicesSold",
                    "CostOfGoodsSold",
                    "ifrs-full:CostOfSales",
                ],
            )
            .with_aliases(GrossProfit, &["GrossProfit", "ifrs-full:GrossProfit"])
            .with_aliases(
                Ebit,
                &[
                    "OperatingIncomeLoss",
                    "ifrs-full:ProfitLossFromOperatingActivities",
                ],
            )
            .with_aliases(
                InterestExpense,
                &[
                    "InterestExpense",
                    "InterestExpenseDebt",
                    "InterestExpenseNonoperating",
                    "ifrs-full:FinanceCosts",
                ],
            )
            .with_aliases(
                Taxes,
                &[
                    "IncomeTaxExpenseBenefit",
                    "ifrs-full:IncomeTaxExpenseContinuingOperations",
                ],
            )
            .with_aliases(
                NetIncome,
                &[
                    "NetIncomeLoss",
                    "ProfitLoss",
                    "NetIncomeLossAvailableToCommonStockholdersBasic",
                    "ifrs-full:ProfitLoss",
                ],
            )
            .with_aliases(
                EpsDiluted,
                &[
                    "EarningsPerShareDiluted",
                    "EarningsPerShareBasicAndDiluted",
                    "ifrs-full:DilutedEarningsLossPerShare",
                ],
            )
            .with_aliases(
                SharesDiluted,
                &[
                    "WeightedAverageNumberOfDilutedSharesOutstanding",
                    "ifrs-full:AdjustedWeightedAverageShares",
                ],
            )
            .with_aliases(
                Cash,
                &[
                    "CashAndCashEquivalentsAtCarryingValue",
                    "CashCashEquivalentsRestrictedCashAndRestrictedCashEquivalents",
                    "Cash",
                    "ifrs-full:CashAndCashEquivalents",
                ],
            )
            .with_aliases(
                Receivables,
                &[
                    "ReceivablesNetCurrent",
                    "AccountsReceivableNetCurrent",
                    "ifrs-full:TradeAndOtherCurrentReceivables",
                ],
            )
            .with_aliases(Inventory, &["InventoryNet", "ifrs-full:Inventories"])
            .with_aliases(TotalAssets, &["Assets", "ifrs-full:Assets"])
            .with_aliases(TotalLiabilities, &["Liabilities", "ifrs-full:Liabilities"])
            .with_aliases(
                TotalDebt,
                &[
                    "LongTermDebtNoncurrent",
                    "LongTermDebt",
                    "LongTermDebtCurrent",
                    "DebtCurrent",
                    "ifrs-full:Borrowings",
                ],
            )
            .with_aliases(
                ShareholderEquity,
                &[
                    "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
                    "StockholdersEquity",
                    "ifrs-full:Equity",
                ],
            )
            .with_aliases(
                Cfo,
                &[
                    "NetCashProvidedByUsedInOperatingActivities",
                    "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
                    "ifrs-full:CashFlowsFromUsedInOperatingActivities",
                ],
            )
            .with_aliases(
                Capex,
                &[
                    "PaymentsToAcquirePropertyPlantAndEquipment",
                    "CapitalExpenditures",
                    "PaymentsToAcquireProductiveAssets",
                    "ifrs-full:PurchaseOfPropertyPlantAndEquipmentClassifiedAsInvestingActivities",
                ],
            )
            .with_aliases(
                Buybacks,
                &[
                    "PaymentsForRepurchaseOfCommonStock",
                    "ifrs-full:PaymentsToAcquireOrRedeemEntitysShares",
                ],
            )
            .with_aliases(
                Dividends,
                &[
                    "PaymentsOfDividends",
                    "PaymentsOfDividendsCommonStock",
                    "ifrs-full:DividendsPaidClassifiedAsFinancingActivities",
                ],
            )
            .with_aliases(
                Acquisitions,
                &["PaymentsToAcquireBusinessesNetOfCashAcquired"],
            )
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Split `taxonomy:Tag`, defaulting the taxonomy.
fn split_alias(alias: &str) -> (&str, &str) {
    alias
        .split_once(':')
        .unwrap_or((DEFAULT_TAXONOMY, alias))
}

/// One externally reported fact matched to a canonical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Canonical field the tag maps to
    pub field: FieldName,
    /// The `taxonomy:Tag` alias that matched
    pub tag: String,
    /// Position of the alias in the field's alias list (0 = most preferred)
    pub alias_rank: usize,
    /// Unit key as reported
    pub unit: String,
    /// Reported value
    pub value: f64,
    /// Fiscal year of the filing
    pub fiscal_year: i32,
    /// Fiscal period of the filing ("FY", "Q1", ...)
    pub fiscal_period: Option<String>,
    /// Form the fact was reported in
    pub form: FormType,
    /// Start of the reporting period (None for instants)
    pub period_start: Option<NaiveDate>,
    /// End of the reporting period
    pub period_end: NaiveDate,
    /// Date the filing was accepted
    pub filed: Option<NaiveDate>,
    /// Accession number of the filing
    pub accession: Option<String>,
}

impl RawObservation {
    fn from_reported(
        field: FieldName,
        tag: &str,
        alias_rank: usize,
        unit: &str,
        fact: &ReportedFact,
    ) -> Option<Self> {
        Some(Self {
            field,
            tag: tag.to_string(),
            alias_rank,
            unit: unit.to_string(),
            value: fact.value,
            fiscal_year: fact.fiscal_year?,
            fiscal_period: fact.fiscal_period.clone(),
            form: fact
                .form
                .as_deref()
                .map_or_else(|| FormType::Other(String::new()), FormType::parse),
            period_start: fact.period_start,
            period_end: fact.period_end,
            filed: fact.filed,
            accession: fact.accession.clone(),
        })
    }

    /// Duration of the reporting period in days (None for instants).
    pub fn duration_days(&self) -> Option<i64> {
        self.period_start
            .map(|start| self.period_end.signed_duration_since(start).num_days())
    }
}

/// Flattens a fact feed into ranked candidate observations.
#[derive(Debug, Clone, Default)]
pub struct FactExtractor {
    aliases: AliasTable,
}

impl FactExtractor {
    /// Create an extractor for the given alias table.
    pub const fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    /// The alias table in use.
    pub const fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Every observation in the feed matching any alias of any field.
    ///
    /// Facts without a fiscal year are dropped since they cannot be placed in
    /// a year. Fields with no matching tag are simply absent. All units are
    /// kept; unit compatibility is the normalizer's concern.
    pub fn extract(&self, feed: &FactFeed) -> Vec<RawObservation> {
        let mut observations = Vec::new();
        let mut undated = 0usize;

        for field in self.aliases.fields() {
            for (rank, alias) in self.aliases.aliases(field).iter().enumerate() {
                let (taxonomy, tag) = split_alias(alias);
                let Some(tag_facts) = feed.tag(taxonomy, tag) else {
                    continue;
                };
                let qualified = format!("{}:{}", taxonomy, tag);
                for (unit, facts) in &tag_facts.units {
                    for fact in facts {
                        match RawObservation::from_reported(field, &qualified, rank, unit, fact) {
                            Some(obs) => observations.push(obs),
                            None => undated += 1,
                        }
                    }
                }
            }
        }

        tracing::debug!(
            observations = observations.len(),
            undated,
            "extracted candidate observations"
        );
        observations
    }

    /// The alias that wins for a field in a unit: the first one in the list
    /// with at least one observation. Returns the tag and its rank.
    pub fn preferred_alias<'a>(
        observations: &'a [RawObservation],
        field: FieldName,
        unit: &str,
    ) -> Option<(&'a str, usize)> {
        observations
            .iter()
            .filter(|o| o.field == field && o.unit == unit)
            .min_by_key(|o| o.alias_rank)
            .map(|o| (o.tag.as_str(), o.alias_rank))
    }
}
