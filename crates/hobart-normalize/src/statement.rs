//! Canonical statement vocabulary and payload types.
//!
//! The canonical payload is the pipeline's terminal artifact: a
//! provider-agnostic, modeling-ready snapshot of one financial statement
//! version. Payloads are immutable once constructed; a restated value
//! produces a new payload with an incremented version sequence.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// High-level statement type.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatementType {
    /// Statement of operations / income statement.
    #[display("INCOME_STATEMENT")]
    IncomeStatement,
    /// Statement of financial position / balance sheet.
    #[display("BALANCE_SHEET")]
    BalanceSheet,
    /// Statement of cash flows.
    #[display("CASH_FLOW_STATEMENT")]
    CashFlowStatement,
}

/// Accounting standard under which the statement was prepared.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountingStandard {
    /// United States GAAP.
    #[display("US_GAAP")]
    UsGaap,
    /// International Financial Reporting Standards.
    #[display("IFRS")]
    Ifrs,
    /// Any other or unknown standard.
    #[display("OTHER")]
    Other,
}

/// Fiscal period within a fiscal year.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FiscalPeriod {
    /// Full fiscal year.
    #[display("FY")]
    Fy,
    /// First quarter.
    #[display("Q1")]
    Q1,
    /// Second quarter.
    #[display("Q2")]
    Q2,
    /// Third quarter.
    #[display("Q3")]
    Q3,
    /// Fourth quarter.
    #[display("Q4")]
    Q4,
    /// First half-year (some foreign filers).
    #[display("H1")]
    H1,
    /// Any other period granularity.
    #[display("OTHER")]
    Other,
}

/// Canonical, taxonomy-independent statement metric.
///
/// This is the Tier-1 modeling vocabulary that source concepts from many
/// taxonomies normalize into. Codes are stable and serialized verbatim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum CanonicalMetric {
    // Income statement
    Revenue,
    CostOfRevenue,
    GrossProfit,
    ResearchAndDevelopmentExpense,
    SellingGeneralAndAdministrativeExpense,
    DepreciationAndAmortizationExpense,
    OperatingIncome,
    OperatingExpense,
    InterestIncome,
    InterestExpense,
    OtherNonOperatingIncomeExpense,
    IncomeBeforeTax,
    IncomeTaxExpense,
    NetIncome,
    BasicEps,
    DilutedEps,
    WeightedAverageSharesBasic,
    WeightedAverageSharesDiluted,

    // Balance sheet
    TotalAssets,
    TotalCurrentAssets,
    CashAndCashEquivalents,
    ShortTermInvestments,
    AccountsReceivableNet,
    Inventories,
    OtherCurrentAssets,
    TotalNonCurrentAssets,
    PropertyPlantAndEquipmentNet,
    Goodwill,
    IntangibleAssetsNet,
    OtherNonCurrentAssets,
    TotalLiabilities,
    TotalCurrentLiabilities,
    AccountsPayable,
    ShortTermDebt,
    CurrentPortionOfLongTermDebt,
    OtherCurrentLiabilities,
    TotalNonCurrentLiabilities,
    LongTermDebt,
    OtherNonCurrentLiabilities,
    TotalEquity,
    RetainedEarnings,
    AdditionalPaidInCapital,
    TreasuryStock,
    AccumulatedOtherComprehensiveIncome,

    // Cash flow
    NetCashFromOperatingActivities,
    NetCashFromInvestingActivities,
    NetCashFromFinancingActivities,
    NetIncreaseDecreaseInCash,
    CashPaidForInterest,
    CashPaidForIncomeTaxes,
    CapitalExpenditures,
    FreeCashFlow,

    // Generic buckets
    OtherOperatingIncomeExpense,
    OtherAssets,
    OtherLiabilities,
    OtherEquity,
    OtherCashFlowFromOperations,
    OtherCashFlowFromInvesting,
    OtherCashFlowFromFinancing,
}

impl CanonicalMetric {
    /// Stable string code for the metric (e.g. `"REVENUE"`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Revenue => "REVENUE",
            Self::CostOfRevenue => "COST_OF_REVENUE",
            Self::GrossProfit => "GROSS_PROFIT",
            Self::ResearchAndDevelopmentExpense => "RESEARCH_AND_DEVELOPMENT_EXPENSE",
            Self::SellingGeneralAndAdministrativeExpense => {
                "SELLING_GENERAL_AND_ADMINISTRATIVE_EXPENSE"
            }
            Self::DepreciationAndAmortizationExpense => "DEPRECIATION_AND_AMORTIZATION_EXPENSE",
            Self::OperatingIncome => "OPERATING_INCOME",
            Self::OperatingExpense => "OPERATING_EXPENSE",
            Self::InterestIncome => "INTEREST_INCOME",
            Self::InterestExpense => "INTEREST_EXPENSE",
            Self::OtherNonOperatingIncomeExpense => "OTHER_NON_OPERATING_INCOME_EXPENSE",
            Self::IncomeBeforeTax => "INCOME_BEFORE_TAX",
            Self::IncomeTaxExpense => "INCOME_TAX_EXPENSE",
            Self::NetIncome => "NET_INCOME",
            Self::BasicEps => "BASIC_EPS",
            Self::DilutedEps => "DILUTED_EPS",
            Self::WeightedAverageSharesBasic => "WEIGHTED_AVERAGE_SHARES_BASIC",
            Self::WeightedAverageSharesDiluted => "WEIGHTED_AVERAGE_SHARES_DILUTED",
            Self::TotalAssets => "TOTAL_ASSETS",
            Self::TotalCurrentAssets => "TOTAL_CURRENT_ASSETS",
            Self::CashAndCashEquivalents => "CASH_AND_CASH_EQUIVALENTS",
            Self::ShortTermInvestments => "SHORT_TERM_INVESTMENTS",
            Self::AccountsReceivableNet => "ACCOUNTS_RECEIVABLE_NET",
            Self::Inventories => "INVENTORIES",
            Self::OtherCurrentAssets => "OTHER_CURRENT_ASSETS",
            Self::TotalNonCurrentAssets => "TOTAL_NON_CURRENT_ASSETS",
            Self::PropertyPlantAndEquipmentNet => "PROPERTY_PLANT_AND_EQUIPMENT_NET",
            Self::Goodwill => "GOODWILL",
            Self::IntangibleAssetsNet => "INTANGIBLE_ASSETS_NET",
            Self::OtherNonCurrentAssets => "OTHER_NON_CURRENT_ASSETS",
            Self::TotalLiabilities => "TOTAL_LIABILITIES",
            Self::TotalCurrentLiabilities => "TOTAL_CURRENT_LIABILITIES",
            Self::AccountsPayable => "ACCOUNTS_PAYABLE",
            Self::ShortTermDebt => "SHORT_TERM_DEBT",
            Self::CurrentPortionOfLongTermDebt => "CURRENT_PORTION_OF_LONG_TERM_DEBT",
            Self::OtherCurrentLiabilities => "OTHER_CURRENT_LIABILITIES",
            Self::TotalNonCurrentLiabilities => "TOTAL_NON_CURRENT_LIABILITIES",
            Self::LongTermDebt => "LONG_TERM_DEBT",
            Self::OtherNonCurrentLiabilities => "OTHER_NON_CURRENT_LIABILITIES",
            Self::TotalEquity => "TOTAL_EQUITY",
            Self::RetainedEarnings => "RETAINED_EARNINGS",
            Self::AdditionalPaidInCapital => "ADDITIONAL_PAID_IN_CAPITAL",
            Self::TreasuryStock => "TREASURY_STOCK",
            Self::AccumulatedOtherComprehensiveIncome => "ACCUMULATED_OTHER_COMPREHENSIVE_INCOME",
            Self::NetCashFromOperatingActivities => "NET_CASH_FROM_OPERATING_ACTIVITIES",
            Self::NetCashFromInvestingActivities => "NET_CASH_FROM_INVESTING_ACTIVITIES",
            Self::NetCashFromFinancingActivities => "NET_CASH_FROM_FINANCING_ACTIVITIES",
            Self::NetIncreaseDecreaseInCash => "NET_INCREASE_DECREASE_IN_CASH",
            Self::CashPaidForInterest => "CASH_PAID_FOR_INTEREST",
            Self::CashPaidForIncomeTaxes => "CASH_PAID_FOR_INCOME_TAXES",
            Self::CapitalExpenditures => "CAPITAL_EXPENDITURES",
            Self::FreeCashFlow => "FREE_CASH_FLOW",
            Self::OtherOperatingIncomeExpense => "OTHER_OPERATING_INCOME_EXPENSE",
            Self::OtherAssets => "OTHER_ASSETS",
            Self::OtherLiabilities => "OTHER_LIABILITIES",
            Self::OtherEquity => "OTHER_EQUITY",
            Self::OtherCashFlowFromOperations => "OTHER_CASH_FLOW_FROM_OPERATIONS",
            Self::OtherCashFlowFromInvesting => "OTHER_CASH_FLOW_FROM_INVESTING",
            Self::OtherCashFlowFromFinancing => "OTHER_CASH_FLOW_FROM_FINANCING",
        }
    }
}

impl fmt::Display for CanonicalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity tuple uniquely naming one normalized statement version.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct StatementIdentity {
    /// Central Index Key for the filer.
    pub cik: String,
    /// Statement type.
    pub statement_type: StatementType,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// Fiscal period within the year.
    pub fiscal_period: FiscalPeriod,
    /// Monotonic version sequence for restatements.
    pub version_sequence: i64,
}

/// Canonical normalized financial statement payload.
///
/// Numeric values are exact decimals in full reporting units:
/// `unit_multiplier` is always `0` for payloads produced by the
/// normalizer, so there is no "in thousands" ambiguity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalStatementPayload {
    /// Company CIK associated with this statement.
    pub cik: String,
    /// Statement type.
    pub statement_type: StatementType,
    /// Accounting standard used.
    pub accounting_standard: AccountingStandard,
    /// Reporting period end date.
    pub statement_date: NaiveDate,
    /// Fiscal year associated with the statement.
    pub fiscal_year: i32,
    /// Fiscal period within the year.
    pub fiscal_period: FiscalPeriod,
    /// ISO currency code for reported values.
    pub currency: String,
    /// Scaling factor applied to amounts; 0 means full reporting units.
    pub unit_multiplier: i32,
    /// Core canonical metrics and their normalized values.
    pub core_metrics: BTreeMap<CanonicalMetric, Decimal>,
    /// Long-tail metrics without stable canonical identifiers yet.
    pub extra_metrics: BTreeMap<String, Decimal>,
    /// Dimensional tags describing the statement context
    /// (e.g. `consolidation: CONSOLIDATED`).
    pub dimensions: BTreeMap<String, String>,
    /// Accession id of the filing that produced this payload.
    pub source_accession_id: String,
    /// Taxonomy identifier (e.g. `US_GAAP_2024`).
    pub source_taxonomy: String,
    /// Version sequence of the underlying statement version.
    pub source_version_sequence: i64,
}

impl CanonicalStatementPayload {
    /// The identity tuple for this payload.
    pub fn identity(&self) -> StatementIdentity {
        StatementIdentity {
            cik: self.cik.clone(),
            statement_type: self.statement_type,
            fiscal_year: self.fiscal_year,
            fiscal_period: self.fiscal_period,
            version_sequence: self.source_version_sequence,
        }
    }
}
