//! Canonical Metric Registry
//!
//! Central registry for the Tier-1 canonical metric vocabulary. Each entry
//! carries display metadata, statement affinity, primary/derived flags, and
//! the ordered list of source concepts the normalizer tries when resolving
//! the metric from filing facts. The registry is strictly additive:
//! existing codes and semantics must not change.

use crate::statement::{CanonicalMetric, StatementType};

/// High-level metric categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricCategory {
    /// Top-line revenue metrics.
    Revenue,
    /// Operating and non-operating expenses.
    Expense,
    /// Profitability measures (gross profit, net income, EPS inputs).
    Profitability,
    /// Asset positions.
    Assets,
    /// Liability positions.
    Liabilities,
    /// Equity positions.
    Equity,
    /// Cash flow measures.
    CashFlow,
    /// Debt and capital-structure measures.
    CapitalStructure,
    /// Per-share measures.
    PerShare,
    /// Share-count measures.
    Shares,
    /// Everything else.
    Other,
}

/// Canonical metric metadata.
#[derive(Debug, Clone)]
pub struct MetricInfo {
    /// Canonical metric this entry describes.
    pub metric: CanonicalMetric,
    /// Human-readable label suitable for UIs.
    pub label: &'static str,
    /// High-level modeling category.
    pub category: MetricCategory,
    /// Primary statement affinity.
    pub statement_type: StatementType,
    /// Whether the metric is part of the pinned Tier-1 primary surface.
    pub is_primary: bool,
    /// Whether the metric is derived from other metrics rather than
    /// directly sourced from filings.
    pub is_derived: bool,
    /// Ordered candidate source concepts the normalizer tries, highest
    /// priority first. Empty for metrics with no direct source mapping.
    pub source_concepts: &'static [&'static str],
}

const fn info(
    metric: CanonicalMetric,
    label: &'static str,
    category: MetricCategory,
    statement_type: StatementType,
    is_primary: bool,
    is_derived: bool,
    source_concepts: &'static [&'static str],
) -> MetricInfo {
    MetricInfo {
        metric,
        label,
        category,
        statement_type,
        is_primary,
        is_derived,
        source_concepts,
    }
}

/// Get all canonical metric info in deterministic registry order.
///
/// The order is also the order in which the normalizer resolves metrics.
pub fn canonical_metrics() -> Vec<MetricInfo> {
    use CanonicalMetric as M;
    use MetricCategory as C;
    use StatementType as S;

    vec![
        // Income statement
        info(
            M::Revenue,
            "Revenue",
            C::Revenue,
            S::IncomeStatement,
            true,
            false,
            &[
                "us-gaap:Revenues",
                "us-gaap:SalesRevenueNet",
                "us-gaap:RevenuesNetOfInterestExpense",
            ],
        ),
        info(
            M::CostOfRevenue,
            "Cost of revenue",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &["us-gaap:CostOfRevenue"],
        ),
        info(
            M::GrossProfit,
            "Gross profit",
            C::Profitability,
            S::IncomeStatement,
            true,
            false,
            &["us-gaap:GrossProfit"],
        ),
        info(
            M::ResearchAndDevelopmentExpense,
            "Research and development expense",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::SellingGeneralAndAdministrativeExpense,
            "Selling, general and administrative expense",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::DepreciationAndAmortizationExpense,
            "Depreciation and amortization",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::OperatingIncome,
            "Operating income",
            C::Profitability,
            S::IncomeStatement,
            true,
            true,
            &["us-gaap:OperatingIncomeLoss"],
        ),
        info(
            M::OperatingExpense,
            "Operating expense",
            C::Expense,
            S::IncomeStatement,
            false,
            true,
            &[],
        ),
        info(
            M::InterestIncome,
            "Interest income",
            C::Other,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::InterestExpense,
            "Interest expense",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::OtherNonOperatingIncomeExpense,
            "Other non-operating income (expense)",
            C::Other,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::IncomeBeforeTax,
            "Income before tax",
            C::Profitability,
            S::IncomeStatement,
            false,
            true,
            &[],
        ),
        info(
            M::IncomeTaxExpense,
            "Income tax expense",
            C::Expense,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::NetIncome,
            "Net income",
            C::Profitability,
            S::IncomeStatement,
            true,
            true,
            &["us-gaap:NetIncomeLoss", "us-gaap:ProfitLoss"],
        ),
        info(
            M::BasicEps,
            "Basic earnings per share",
            C::PerShare,
            S::IncomeStatement,
            true,
            true,
            &["us-gaap:EarningsPerShareBasic"],
        ),
        info(
            M::DilutedEps,
            "Diluted earnings per share",
            C::PerShare,
            S::IncomeStatement,
            true,
            true,
            &["us-gaap:EarningsPerShareDiluted"],
        ),
        info(
            M::WeightedAverageSharesBasic,
            "Weighted average shares (basic)",
            C::Shares,
            S::IncomeStatement,
            false,
            false,
            &["us-gaap:WeightedAverageNumberOfSharesOutstandingBasic"],
        ),
        info(
            M::WeightedAverageSharesDiluted,
            "Weighted average shares (diluted)",
            C::Shares,
            S::IncomeStatement,
            false,
            false,
            &["us-gaap:WeightedAverageNumberOfDilutedSharesOutstanding"],
        ),
        // Balance sheet
        info(
            M::TotalAssets,
            "Total assets",
            C::Assets,
            S::BalanceSheet,
            true,
            false,
            &["us-gaap:Assets"],
        ),
        info(
            M::TotalCurrentAssets,
            "Total current assets",
            C::Assets,
            S::BalanceSheet,
            false,
            true,
            &["us-gaap:AssetsCurrent"],
        ),
        info(
            M::CashAndCashEquivalents,
            "Cash and cash equivalents",
            C::Assets,
            S::BalanceSheet,
            true,
            false,
            &[
                "us-gaap:CashAndCashEquivalentsAtCarryingValue",
                "us-gaap:CashCashEquivalentsAndShortTermInvestments",
            ],
        ),
        info(
            M::ShortTermInvestments,
            "Short-term investments",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::AccountsReceivableNet,
            "Accounts receivable, net",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::Inventories,
            "Inventories",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherCurrentAssets,
            "Other current assets",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::TotalNonCurrentAssets,
            "Total non-current assets",
            C::Assets,
            S::BalanceSheet,
            false,
            true,
            &[],
        ),
        info(
            M::PropertyPlantAndEquipmentNet,
            "Property, plant and equipment, net",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::Goodwill,
            "Goodwill",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::IntangibleAssetsNet,
            "Intangible assets, net",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherNonCurrentAssets,
            "Other non-current assets",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::TotalLiabilities,
            "Total liabilities",
            C::Liabilities,
            S::BalanceSheet,
            true,
            false,
            &["us-gaap:Liabilities"],
        ),
        info(
            M::TotalCurrentLiabilities,
            "Total current liabilities",
            C::Liabilities,
            S::BalanceSheet,
            false,
            true,
            &["us-gaap:LiabilitiesCurrent"],
        ),
        info(
            M::AccountsPayable,
            "Accounts payable",
            C::Liabilities,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::ShortTermDebt,
            "Short-term debt",
            C::CapitalStructure,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::CurrentPortionOfLongTermDebt,
            "Current portion of long-term debt",
            C::CapitalStructure,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherCurrentLiabilities,
            "Other current liabilities",
            C::Liabilities,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::TotalNonCurrentLiabilities,
            "Total non-current liabilities",
            C::Liabilities,
            S::BalanceSheet,
            false,
            true,
            &[],
        ),
        info(
            M::LongTermDebt,
            "Long-term debt",
            C::CapitalStructure,
            S::BalanceSheet,
            true,
            false,
            &["us-gaap:LongTermDebtNoncurrent", "us-gaap:LongTermDebt"],
        ),
        info(
            M::OtherNonCurrentLiabilities,
            "Other non-current liabilities",
            C::Liabilities,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::TotalEquity,
            "Total equity",
            C::Equity,
            S::BalanceSheet,
            true,
            true,
            &[
                "us-gaap:StockholdersEquity",
                "us-gaap:StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
                "us-gaap:Equity",
            ],
        ),
        info(
            M::RetainedEarnings,
            "Retained earnings",
            C::Equity,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::AdditionalPaidInCapital,
            "Additional paid-in capital",
            C::Equity,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::TreasuryStock,
            "Treasury stock",
            C::Equity,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::AccumulatedOtherComprehensiveIncome,
            "Accumulated other comprehensive income",
            C::Equity,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        // Cash flow statement
        info(
            M::NetCashFromOperatingActivities,
            "Net cash from operating activities",
            C::CashFlow,
            S::CashFlowStatement,
            true,
            false,
            &[
                "us-gaap:NetCashProvidedByUsedInOperatingActivities",
                "us-gaap:NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            ],
        ),
        info(
            M::NetCashFromInvestingActivities,
            "Net cash from investing activities",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[
                "us-gaap:NetCashProvidedByUsedInInvestingActivities",
                "us-gaap:NetCashProvidedByUsedInInvestingActivitiesContinuingOperations",
            ],
        ),
        info(
            M::NetCashFromFinancingActivities,
            "Net cash from financing activities",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[
                "us-gaap:NetCashProvidedByUsedInFinancingActivities",
                "us-gaap:NetCashProvidedByUsedInFinancingActivitiesContinuingOperations",
            ],
        ),
        info(
            M::NetIncreaseDecreaseInCash,
            "Net change in cash",
            C::CashFlow,
            S::CashFlowStatement,
            true,
            true,
            &["us-gaap:CashAndCashEquivalentsPeriodIncreaseDecrease"],
        ),
        info(
            M::CashPaidForInterest,
            "Cash paid for interest",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[],
        ),
        info(
            M::CashPaidForIncomeTaxes,
            "Cash paid for income taxes",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[],
        ),
        info(
            M::CapitalExpenditures,
            "Capital expenditures",
            C::CashFlow,
            S::CashFlowStatement,
            true,
            false,
            &["us-gaap:PaymentsToAcquirePropertyPlantAndEquipment"],
        ),
        info(
            M::FreeCashFlow,
            "Free cash flow",
            C::CashFlow,
            S::CashFlowStatement,
            true,
            true,
            &[],
        ),
        // Generic buckets
        info(
            M::OtherOperatingIncomeExpense,
            "Other operating income (expense)",
            C::Other,
            S::IncomeStatement,
            false,
            false,
            &[],
        ),
        info(
            M::OtherAssets,
            "Other assets",
            C::Assets,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherLiabilities,
            "Other liabilities",
            C::Liabilities,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherEquity,
            "Other equity",
            C::Equity,
            S::BalanceSheet,
            false,
            false,
            &[],
        ),
        info(
            M::OtherCashFlowFromOperations,
            "Other operating cash flows",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[],
        ),
        info(
            M::OtherCashFlowFromInvesting,
            "Other investing cash flows",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[],
        ),
        info(
            M::OtherCashFlowFromFinancing,
            "Other financing cash flows",
            C::CashFlow,
            S::CashFlowStatement,
            false,
            false,
            &[],
        ),
    ]
}

/// Pinned Tier-1 set: core metrics that must never disappear without an
/// intentional test update.
pub const TIER1_METRICS: &[CanonicalMetric] = &[
    CanonicalMetric::Revenue,
    CanonicalMetric::GrossProfit,
    CanonicalMetric::OperatingIncome,
    CanonicalMetric::NetIncome,
    CanonicalMetric::BasicEps,
    CanonicalMetric::DilutedEps,
    CanonicalMetric::TotalAssets,
    CanonicalMetric::TotalLiabilities,
    CanonicalMetric::TotalEquity,
    CanonicalMetric::CashAndCashEquivalents,
    CanonicalMetric::LongTermDebt,
    CanonicalMetric::NetCashFromOperatingActivities,
    CanonicalMetric::CapitalExpenditures,
    CanonicalMetric::FreeCashFlow,
    CanonicalMetric::NetIncreaseDecreaseInCash,
];

/// Get metric info by canonical metric.
pub fn metric_info(metric: CanonicalMetric) -> Option<MetricInfo> {
    canonical_metrics().into_iter().find(|m| m.metric == metric)
}

/// Get all metrics whose primary statement affinity matches the given type.
pub fn metrics_for_statement(statement_type: StatementType) -> Vec<MetricInfo> {
    canonical_metrics()
        .into_iter()
        .filter(|m| m.statement_type == statement_type)
        .collect()
}

/// Get the pinned Tier-1 metrics restricted to one statement type.
pub fn tier1_metrics_for_statement(statement_type: StatementType) -> Vec<CanonicalMetric> {
    canonical_metrics()
        .into_iter()
        .filter(|m| m.statement_type == statement_type && TIER1_METRICS.contains(&m.metric))
        .map(|m| m.metric)
        .collect()
}
