//! Pure formulas for derived metrics.
//!
//! Every formula takes a [`MetricContext`] and either produces an exact
//! decimal or a [`FormulaError`] describing why the metric is undefined
//! for this payload. Formulas never panic: zero and numerically unstable
//! denominators, missing inputs, and short histories are all expressed
//! as errors for the engine to convert into failure records.

use hobart_normalize::{CanonicalMetric, CanonicalStatementPayload};
use rust_decimal::{Decimal, RoundingStrategy};

/// Guard for tiny denominators that would produce exploding ratios.
const DENOMINATOR_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Fractional digits kept on ratio-like outputs.
const RATIO_SCALE: u32 = 6;

/// Why a formula could not produce a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaError {
    /// A required input value is missing.
    MissingInput(String),
    /// Not enough prior periods in the supplied history.
    InsufficientHistory(String),
    /// A denominator was zero or below the stability epsilon.
    ZeroDenominator(String),
    /// A numeric operation overflowed or was otherwise invalid.
    Invalid(String),
}

/// Result type for formula evaluation.
pub type FormulaResult = Result<Decimal, FormulaError>;

/// Formula function signature used by the spec table.
pub type Formula = fn(&MetricContext<'_>) -> FormulaResult;

/// Computation context for a derived metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricContext<'a> {
    /// Canonical payload for the current period.
    pub payload: &'a CanonicalStatementPayload,
    /// Prior payloads for the same company, oldest to newest. May mix
    /// fiscal periods and statement types; formulas select what they need.
    pub history: &'a [CanonicalStatementPayload],
}

fn get(payload: &CanonicalStatementPayload, metric: CanonicalMetric) -> Option<Decimal> {
    payload.core_metrics.get(&metric).copied()
}

/// Quantize ratio-like values to a stable number of fractional digits.
fn quantize_ratio(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATIO_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Divide with explicit undefined-ness instead of panics or infinities.
fn safe_divide(numerator: Option<Decimal>, denominator: Option<Decimal>) -> FormulaResult {
    let (Some(numerator), Some(denominator)) = (numerator, denominator) else {
        return Err(FormulaError::MissingInput(
            "numerator and denominator must be present for division".to_string(),
        ));
    };

    if denominator.is_zero() || denominator.abs() < DENOMINATOR_EPSILON {
        return Err(FormulaError::ZeroDenominator(
            "denominator is zero or too small for a stable ratio".to_string(),
        ));
    }

    numerator
        .checked_div(denominator)
        .ok_or_else(|| FormulaError::Invalid("decimal division overflowed".to_string()))
}

/// Locate the same-period payload `years_back` fiscal years earlier.
fn prior_year_payload<'a>(
    ctx: &MetricContext<'a>,
    years_back: i32,
) -> Option<&'a CanonicalStatementPayload> {
    let target_year = ctx.payload.fiscal_year - years_back;
    ctx.history.iter().rev().find(|p| {
        p.statement_type == ctx.payload.statement_type
            && p.fiscal_year == target_year
            && p.fiscal_period == ctx.payload.fiscal_period
    })
}

/// Locate the nearest strictly-earlier same-type payload by statement date.
fn prior_quarter_payload<'a>(ctx: &MetricContext<'a>) -> Option<&'a CanonicalStatementPayload> {
    let mut previous = None;
    for p in ctx.history {
        if p.statement_type == ctx.payload.statement_type
            && p.statement_date < ctx.payload.statement_date
        {
            previous = Some(p);
        }
    }
    previous
}

// ------------------------------------------------------------------------
// Margins
// ------------------------------------------------------------------------

pub(crate) fn gross_margin(ctx: &MetricContext<'_>) -> FormulaResult {
    let revenue = get(ctx.payload, CanonicalMetric::Revenue);
    let gross_profit = get(ctx.payload, CanonicalMetric::GrossProfit);
    safe_divide(gross_profit, revenue).map(quantize_ratio)
}

pub(crate) fn operating_margin(ctx: &MetricContext<'_>) -> FormulaResult {
    let revenue = get(ctx.payload, CanonicalMetric::Revenue);
    let operating_income = get(ctx.payload, CanonicalMetric::OperatingIncome);
    safe_divide(operating_income, revenue).map(quantize_ratio)
}

pub(crate) fn net_margin(ctx: &MetricContext<'_>) -> FormulaResult {
    let revenue = get(ctx.payload, CanonicalMetric::Revenue);
    let net_income = get(ctx.payload, CanonicalMetric::NetIncome);
    safe_divide(net_income, revenue).map(quantize_ratio)
}

// ------------------------------------------------------------------------
// Growth
// ------------------------------------------------------------------------

fn growth_against_prior(
    metric: CanonicalMetric,
    current: Option<Decimal>,
    prior_payload: Option<&CanonicalStatementPayload>,
    missing_prior: &str,
) -> FormulaResult {
    let prior_payload = prior_payload.ok_or_else(|| {
        FormulaError::InsufficientHistory(missing_prior.to_string())
    })?;
    let prior = get(prior_payload, metric).ok_or_else(|| {
        FormulaError::MissingInput(format!("missing {metric} in prior period"))
    })?;
    let current = current.ok_or_else(|| {
        FormulaError::MissingInput(format!("missing {metric} in current period"))
    })?;

    safe_divide(Some(current - prior), Some(prior)).map(quantize_ratio)
}

pub(crate) fn revenue_growth_yoy(ctx: &MetricContext<'_>) -> FormulaResult {
    growth_against_prior(
        CanonicalMetric::Revenue,
        get(ctx.payload, CanonicalMetric::Revenue),
        prior_year_payload(ctx, 1),
        "no prior payload found for YoY revenue growth",
    )
}

pub(crate) fn revenue_growth_qoq(ctx: &MetricContext<'_>) -> FormulaResult {
    growth_against_prior(
        CanonicalMetric::Revenue,
        get(ctx.payload, CanonicalMetric::Revenue),
        prior_quarter_payload(ctx),
        "no prior payload found for QoQ revenue growth",
    )
}

/// Trailing-twelve-month revenue growth.
///
/// TTM revenue is the sum of the most recent 4 same-type periods; the
/// prior window is the 4 periods immediately preceding it. At least 8
/// comparable periods (including the current payload) are required.
pub(crate) fn revenue_growth_ttm(ctx: &MetricContext<'_>) -> FormulaResult {
    let mut relevant: Vec<&CanonicalStatementPayload> = ctx
        .history
        .iter()
        .filter(|p| p.statement_type == ctx.payload.statement_type)
        .collect();
    relevant.push(ctx.payload);
    relevant.sort_by_key(|p| p.statement_date);

    if relevant.len() < 8 {
        return Err(FormulaError::InsufficientHistory(
            "at least 8 comparable periods are required for TTM growth".to_string(),
        ));
    }

    let window_sum = |window: &[&CanonicalStatementPayload],
                      label: &str|
     -> Result<Decimal, FormulaError> {
        let mut total = Decimal::ZERO;
        for p in window {
            let revenue = get(p, CanonicalMetric::Revenue).ok_or_else(|| {
                FormulaError::MissingInput(format!("missing REVENUE in {label} TTM window"))
            })?;
            total += revenue;
        }
        Ok(total)
    };

    let current_ttm = window_sum(&relevant[relevant.len() - 4..], "current")?;
    let prior_ttm = window_sum(&relevant[relevant.len() - 8..relevant.len() - 4], "prior")?;

    safe_divide(Some(current_ttm - prior_ttm), Some(prior_ttm)).map(quantize_ratio)
}

pub(crate) fn eps_diluted_growth(ctx: &MetricContext<'_>) -> FormulaResult {
    growth_against_prior(
        CanonicalMetric::DilutedEps,
        get(ctx.payload, CanonicalMetric::DilutedEps),
        prior_year_payload(ctx, 1),
        "no prior payload found for diluted EPS growth",
    )
}

// ------------------------------------------------------------------------
// Cash flow
// ------------------------------------------------------------------------

pub(crate) fn ebit(ctx: &MetricContext<'_>) -> FormulaResult {
    let income_before_tax = get(ctx.payload, CanonicalMetric::IncomeBeforeTax);
    let interest_expense = get(ctx.payload, CanonicalMetric::InterestExpense);
    let interest_income = get(ctx.payload, CanonicalMetric::InterestIncome);

    match (income_before_tax, interest_expense, interest_income) {
        (Some(ibt), Some(ie), Some(ii)) => Ok(ibt + ie - ii),
        _ => Err(FormulaError::MissingInput("EBIT".to_string())),
    }
}

pub(crate) fn ebitda(ctx: &MetricContext<'_>) -> FormulaResult {
    let operating_income = get(ctx.payload, CanonicalMetric::OperatingIncome);
    let da = get(
        ctx.payload,
        CanonicalMetric::DepreciationAndAmortizationExpense,
    );
    match (operating_income, da) {
        (Some(oi), Some(da)) => Ok(oi + da),
        _ => Err(FormulaError::MissingInput(
            "OPERATING_INCOME and DEPRECIATION_AND_AMORTIZATION_EXPENSE are required for EBITDA"
                .to_string(),
        )),
    }
}

/// Levered free cash flow: canonical FREE_CASH_FLOW when provided, else
/// CFO + CAPEX (with CAPEX typically negative).
pub(crate) fn levered_free_cash_flow(ctx: &MetricContext<'_>) -> FormulaResult {
    if let Some(fcf) = get(ctx.payload, CanonicalMetric::FreeCashFlow) {
        return Ok(fcf);
    }

    let cfo = get(
        ctx.payload,
        CanonicalMetric::NetCashFromOperatingActivities,
    );
    let capex = get(ctx.payload, CanonicalMetric::CapitalExpenditures);
    match (cfo, capex) {
        (Some(cfo), Some(capex)) => Ok(cfo + capex),
        _ => Err(FormulaError::MissingInput(
            "NET_CASH_FROM_OPERATING_ACTIVITIES and CAPITAL_EXPENDITURES are required for LFCF"
                .to_string(),
        )),
    }
}

/// Approximate unlevered free cash flow: NOPAT + D&A + CAPEX, with the
/// working-capital delta modeled at higher layers (treated as zero).
pub(crate) fn unlevered_free_cash_flow(ctx: &MetricContext<'_>) -> FormulaResult {
    let ebit = ebit(ctx)?;
    let income_tax_expense = get(ctx.payload, CanonicalMetric::IncomeTaxExpense);
    let income_before_tax = get(ctx.payload, CanonicalMetric::IncomeBeforeTax);
    let da = get(
        ctx.payload,
        CanonicalMetric::DepreciationAndAmortizationExpense,
    );
    let capex = get(ctx.payload, CanonicalMetric::CapitalExpenditures);

    let (Some(_), Some(_), Some(da), Some(capex)) =
        (income_tax_expense, income_before_tax, da, capex)
    else {
        return Err(FormulaError::MissingInput(
            "INCOME_TAX_EXPENSE, INCOME_BEFORE_TAX, DEPRECIATION_AND_AMORTIZATION_EXPENSE and \
             CAPITAL_EXPENDITURES are required for UFCF"
                .to_string(),
        ));
    };

    let tax_rate = safe_divide(income_tax_expense, income_before_tax)?;
    let nopat = ebit
        .checked_mul(Decimal::ONE - tax_rate)
        .ok_or_else(|| FormulaError::Invalid("NOPAT computation overflowed".to_string()))?;

    Ok(nopat + da + capex)
}

// ------------------------------------------------------------------------
// Leverage
// ------------------------------------------------------------------------

pub(crate) fn working_capital(ctx: &MetricContext<'_>) -> FormulaResult {
    let current_assets = get(ctx.payload, CanonicalMetric::TotalCurrentAssets);
    let current_liabilities = get(ctx.payload, CanonicalMetric::TotalCurrentLiabilities);
    match (current_assets, current_liabilities) {
        (Some(assets), Some(liabilities)) => Ok(assets - liabilities),
        _ => Err(FormulaError::MissingInput(
            "TOTAL_CURRENT_ASSETS and TOTAL_CURRENT_LIABILITIES are required for WORKING_CAPITAL"
                .to_string(),
        )),
    }
}

fn interest_bearing_debt(payload: &CanonicalStatementPayload) -> Decimal {
    let short_term = get(payload, CanonicalMetric::ShortTermDebt).unwrap_or_default();
    let current_portion =
        get(payload, CanonicalMetric::CurrentPortionOfLongTermDebt).unwrap_or_default();
    let long_term = get(payload, CanonicalMetric::LongTermDebt).unwrap_or_default();
    short_term + current_portion + long_term
}

pub(crate) fn debt_to_equity(ctx: &MetricContext<'_>) -> FormulaResult {
    let total_equity = get(ctx.payload, CanonicalMetric::TotalEquity).ok_or_else(|| {
        FormulaError::MissingInput("TOTAL_EQUITY is required for DEBT_TO_EQUITY".to_string())
    })?;
    let cash = get(ctx.payload, CanonicalMetric::CashAndCashEquivalents).unwrap_or_default();

    let net_debt = interest_bearing_debt(ctx.payload) - cash;
    safe_divide(Some(net_debt), Some(total_equity)).map(quantize_ratio)
}

pub(crate) fn interest_coverage(ctx: &MetricContext<'_>) -> FormulaResult {
    let ebit = ebit(ctx)?;
    let interest_expense = get(ctx.payload, CanonicalMetric::InterestExpense).ok_or_else(|| {
        FormulaError::MissingInput("INTEREST_EXPENSE is required for INTEREST_COVERAGE".to_string())
    })?;

    safe_divide(Some(ebit), Some(interest_expense)).map(quantize_ratio)
}

// ------------------------------------------------------------------------
// Returns
// ------------------------------------------------------------------------

pub(crate) fn roe(ctx: &MetricContext<'_>) -> FormulaResult {
    let net_income = get(ctx.payload, CanonicalMetric::NetIncome);
    let total_equity = get(ctx.payload, CanonicalMetric::TotalEquity);
    if net_income.is_none() || total_equity.is_none() {
        return Err(FormulaError::MissingInput(
            "NET_INCOME and TOTAL_EQUITY are required for ROE".to_string(),
        ));
    }
    safe_divide(net_income, total_equity).map(quantize_ratio)
}

pub(crate) fn roa(ctx: &MetricContext<'_>) -> FormulaResult {
    let net_income = get(ctx.payload, CanonicalMetric::NetIncome);
    let total_assets = get(ctx.payload, CanonicalMetric::TotalAssets);
    if net_income.is_none() || total_assets.is_none() {
        return Err(FormulaError::MissingInput(
            "NET_INCOME and TOTAL_ASSETS are required for ROA".to_string(),
        ));
    }
    safe_divide(net_income, total_assets).map(quantize_ratio)
}

/// Return on invested capital: NOPAT over equity plus interest-bearing
/// debt minus cash.
pub(crate) fn roic(ctx: &MetricContext<'_>) -> FormulaResult {
    let ebit = ebit(ctx)?;
    let income_tax_expense = get(ctx.payload, CanonicalMetric::IncomeTaxExpense);
    let income_before_tax = get(ctx.payload, CanonicalMetric::IncomeBeforeTax);
    let total_equity = get(ctx.payload, CanonicalMetric::TotalEquity);

    let (Some(_), Some(_), Some(total_equity)) =
        (income_tax_expense, income_before_tax, total_equity)
    else {
        return Err(FormulaError::MissingInput(
            "INCOME_TAX_EXPENSE, INCOME_BEFORE_TAX and TOTAL_EQUITY are required for ROIC"
                .to_string(),
        ));
    };

    let tax_rate = safe_divide(income_tax_expense, income_before_tax)?;
    let nopat = ebit
        .checked_mul(Decimal::ONE - tax_rate)
        .ok_or_else(|| FormulaError::Invalid("NOPAT computation overflowed".to_string()))?;

    let cash = get(ctx.payload, CanonicalMetric::CashAndCashEquivalents).unwrap_or_default();
    let invested_capital = total_equity + interest_bearing_debt(ctx.payload) - cash;
    safe_divide(Some(nopat), Some(invested_capital)).map(quantize_ratio)
}
