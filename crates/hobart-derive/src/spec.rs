//! Derived metric specifications.
//!
//! The spec table is the single source of truth for each metric's
//! required statement types, required canonical inputs, history window,
//! category, and formula. It is a process-wide read-only static built
//! once and safe to share across concurrent calls.

use crate::formulas::{self, Formula};
use crate::metric::{DerivedMetric, DerivedMetricCategory};
use hobart_normalize::{CanonicalMetric, StatementType};

/// Specification for a derived metric and its computation formula.
#[derive(Debug, Clone)]
pub struct DerivedMetricSpec {
    /// Derived metric identifier.
    pub metric: DerivedMetric,
    /// Statement types for which this metric is conceptually valid.
    pub required_statement_types: &'static [StatementType],
    /// Canonical inputs that must be present on the current payload.
    pub required_inputs: &'static [CanonicalMetric],
    /// Whether the formula inspects prior-period history.
    pub uses_history: bool,
    /// Minimum number of prior periods required when `uses_history`.
    pub min_history_periods: usize,
    /// High-level category.
    pub category: DerivedMetricCategory,
    /// Short human-readable definition.
    pub description: &'static str,
    /// Whether the metric is assumption-heavy / experimental.
    pub is_experimental: bool,
    /// Pure computation formula.
    pub formula: Formula,
}

const INCOME: &[StatementType] = &[StatementType::IncomeStatement];
const BALANCE: &[StatementType] = &[StatementType::BalanceSheet];
const CASH_FLOW: &[StatementType] = &[StatementType::CashFlowStatement];
const INCOME_OR_BALANCE: &[StatementType] =
    &[StatementType::BalanceSheet, StatementType::IncomeStatement];

static SPECS: &[DerivedMetricSpec] = &[
    DerivedMetricSpec {
        metric: DerivedMetric::GrossMargin,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue, CanonicalMetric::GrossProfit],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Margin,
        description: "Gross profit divided by revenue.",
        is_experimental: false,
        formula: formulas::gross_margin,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::OperatingMargin,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue, CanonicalMetric::OperatingIncome],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Margin,
        description: "Operating income divided by revenue.",
        is_experimental: false,
        formula: formulas::operating_margin,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::NetMargin,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue, CanonicalMetric::NetIncome],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Margin,
        description: "Net income divided by revenue.",
        is_experimental: false,
        formula: formulas::net_margin,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::RevenueGrowthYoy,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue],
        uses_history: true,
        min_history_periods: 1,
        category: DerivedMetricCategory::Growth,
        description: "Year-over-year revenue growth for the same fiscal period.",
        is_experimental: false,
        formula: formulas::revenue_growth_yoy,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::RevenueGrowthQoq,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue],
        uses_history: true,
        min_history_periods: 1,
        category: DerivedMetricCategory::Growth,
        description: "Quarter-over-quarter revenue growth.",
        is_experimental: false,
        formula: formulas::revenue_growth_qoq,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::RevenueGrowthTtm,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::Revenue],
        uses_history: true,
        // 7 prior periods + the current payload = 8 periods total.
        min_history_periods: 7,
        category: DerivedMetricCategory::Growth,
        description: "Trailing-twelve-month revenue growth over two consecutive four-period windows.",
        is_experimental: false,
        formula: formulas::revenue_growth_ttm,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::EpsDilutedGrowth,
        required_statement_types: INCOME,
        required_inputs: &[CanonicalMetric::DilutedEps],
        uses_history: true,
        min_history_periods: 1,
        category: DerivedMetricCategory::Growth,
        description: "Year-over-year growth in diluted EPS.",
        is_experimental: false,
        formula: formulas::eps_diluted_growth,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::Ebitda,
        required_statement_types: INCOME,
        required_inputs: &[
            CanonicalMetric::OperatingIncome,
            CanonicalMetric::DepreciationAndAmortizationExpense,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::CashFlow,
        description: "Earnings before interest, taxes, depreciation, and amortization.",
        is_experimental: false,
        formula: formulas::ebitda,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::Ebit,
        required_statement_types: INCOME,
        required_inputs: &[
            CanonicalMetric::IncomeBeforeTax,
            CanonicalMetric::InterestExpense,
            CanonicalMetric::InterestIncome,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::CashFlow,
        description: "Earnings before interest and taxes.",
        is_experimental: false,
        formula: formulas::ebit,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::LeveredFreeCashFlow,
        required_statement_types: CASH_FLOW,
        required_inputs: &[
            CanonicalMetric::NetCashFromOperatingActivities,
            CanonicalMetric::CapitalExpenditures,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::CashFlow,
        description: "Levered free cash flow; prefers canonical FREE_CASH_FLOW, else CFO + CAPEX.",
        is_experimental: false,
        formula: formulas::levered_free_cash_flow,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::UnleveredFreeCashFlow,
        required_statement_types: INCOME,
        // Interest metrics are deliberately not pre-validated here so a
        // missing one surfaces through the EBIT computation.
        required_inputs: &[
            CanonicalMetric::IncomeBeforeTax,
            CanonicalMetric::IncomeTaxExpense,
            CanonicalMetric::DepreciationAndAmortizationExpense,
            CanonicalMetric::CapitalExpenditures,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::CashFlow,
        description: "Approximate unlevered free cash flow from NOPAT, D&A, and capex.",
        is_experimental: true,
        formula: formulas::unlevered_free_cash_flow,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::WorkingCapital,
        required_statement_types: BALANCE,
        required_inputs: &[
            CanonicalMetric::TotalCurrentAssets,
            CanonicalMetric::TotalCurrentLiabilities,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Leverage,
        description: "Current assets minus current liabilities.",
        is_experimental: false,
        formula: formulas::working_capital,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::DebtToEquity,
        required_statement_types: BALANCE,
        required_inputs: &[
            CanonicalMetric::ShortTermDebt,
            CanonicalMetric::CurrentPortionOfLongTermDebt,
            CanonicalMetric::LongTermDebt,
            CanonicalMetric::CashAndCashEquivalents,
            CanonicalMetric::TotalEquity,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Leverage,
        description: "Net debt divided by total equity.",
        is_experimental: false,
        formula: formulas::debt_to_equity,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::InterestCoverage,
        required_statement_types: INCOME,
        required_inputs: &[
            CanonicalMetric::IncomeBeforeTax,
            CanonicalMetric::InterestExpense,
            CanonicalMetric::InterestIncome,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Leverage,
        description: "EBIT divided by interest expense.",
        is_experimental: false,
        formula: formulas::interest_coverage,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::Roe,
        required_statement_types: INCOME_OR_BALANCE,
        required_inputs: &[CanonicalMetric::NetIncome, CanonicalMetric::TotalEquity],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Return,
        description: "Return on equity: net income divided by total equity.",
        is_experimental: false,
        formula: formulas::roe,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::Roa,
        required_statement_types: INCOME_OR_BALANCE,
        required_inputs: &[CanonicalMetric::NetIncome, CanonicalMetric::TotalAssets],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Return,
        description: "Return on assets: net income divided by total assets.",
        is_experimental: false,
        formula: formulas::roa,
    },
    DerivedMetricSpec {
        metric: DerivedMetric::Roic,
        required_statement_types: INCOME_OR_BALANCE,
        required_inputs: &[
            CanonicalMetric::IncomeBeforeTax,
            CanonicalMetric::IncomeTaxExpense,
            CanonicalMetric::TotalEquity,
            CanonicalMetric::LongTermDebt,
            CanonicalMetric::ShortTermDebt,
            CanonicalMetric::CurrentPortionOfLongTermDebt,
            CanonicalMetric::CashAndCashEquivalents,
            CanonicalMetric::InterestIncome,
            CanonicalMetric::InterestExpense,
        ],
        uses_history: false,
        min_history_periods: 0,
        category: DerivedMetricCategory::Return,
        description: "Return on invested capital: NOPAT over equity plus debt minus cash.",
        is_experimental: false,
        formula: formulas::roic,
    },
];

/// All derived metric specs in deterministic order.
pub fn derived_metric_specs() -> &'static [DerivedMetricSpec] {
    SPECS
}

/// Look up the spec for one derived metric.
pub fn spec_for(metric: DerivedMetric) -> Option<&'static DerivedMetricSpec> {
    SPECS.iter().find(|s| s.metric == metric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_metric_has_a_spec() {
        let all = [
            DerivedMetric::GrossMargin,
            DerivedMetric::OperatingMargin,
            DerivedMetric::NetMargin,
            DerivedMetric::RevenueGrowthYoy,
            DerivedMetric::RevenueGrowthQoq,
            DerivedMetric::RevenueGrowthTtm,
            DerivedMetric::EpsDilutedGrowth,
            DerivedMetric::Ebitda,
            DerivedMetric::Ebit,
            DerivedMetric::LeveredFreeCashFlow,
            DerivedMetric::UnleveredFreeCashFlow,
            DerivedMetric::WorkingCapital,
            DerivedMetric::DebtToEquity,
            DerivedMetric::InterestCoverage,
            DerivedMetric::Roe,
            DerivedMetric::Roa,
            DerivedMetric::Roic,
        ];
        assert_eq!(derived_metric_specs().len(), all.len());
        for metric in all {
            assert!(spec_for(metric).is_some(), "missing spec for {metric}");
        }
    }

    #[test]
    fn test_history_windows() {
        assert_eq!(spec_for(DerivedMetric::RevenueGrowthTtm).unwrap().min_history_periods, 7);
        assert!(spec_for(DerivedMetric::RevenueGrowthYoy).unwrap().uses_history);
        assert!(!spec_for(DerivedMetric::GrossMargin).unwrap().uses_history);
    }
}
