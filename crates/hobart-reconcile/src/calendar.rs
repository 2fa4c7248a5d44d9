//! Fiscal calendar helpers for reconciliation.
//!
//! Conservative by design: when in doubt these helpers return `None` or
//! mark a calendar as irregular instead of inferring aggressive behavior.

use chrono::{Datelike, NaiveDate};
use hobart_normalize::{
    CanonicalStatementPayload, FiscalPeriod, StatementIdentity, StatementType,
};
use std::collections::BTreeMap;

/// Inferred period information for a single statement.
#[derive(Debug, Clone)]
pub struct StatementPeriod<'a> {
    /// Normalized statement identity.
    pub identity: StatementIdentity,
    /// Reporting period end date.
    pub statement_date: NaiveDate,
    /// Inferred period start date, when available.
    pub period_start: Option<NaiveDate>,
    /// Reporting period end date (same as `statement_date`).
    pub period_end: NaiveDate,
    /// Fiscal year associated with the statement.
    pub fiscal_year: i32,
    /// Fiscal period.
    pub fiscal_period: FiscalPeriod,
    /// Statement type.
    pub statement_type: StatementType,
    /// ISO currency code for the statement.
    pub currency: String,
    /// Canonical payload backing this period.
    pub payload: &'a CanonicalStatementPayload,
}

/// Classification of a company's fiscal calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiscalCalendarClassification {
    /// Inferred fiscal year-end month (1-12).
    pub fye_month: u32,
    /// Whether observed spacing indicates a 53-week year.
    pub is_53_week_year: bool,
    /// Whether the calendar appears irregular.
    pub is_irregular: bool,
    /// Typical spacing in days between consecutive statements, when
    /// inferable.
    pub inferred_period_length_days: Option<i64>,
}

/// Infer a statement period from a canonical payload.
///
/// Period starts are inferred conservatively from the fiscal period on a
/// calendar-quarter grid; unknown granularities get no start date.
pub fn infer_statement_period(payload: &CanonicalStatementPayload) -> StatementPeriod<'_> {
    let fiscal_year = payload.fiscal_year;
    let period_start = match payload.fiscal_period {
        FiscalPeriod::Fy | FiscalPeriod::Q1 => NaiveDate::from_ymd_opt(fiscal_year, 1, 1),
        FiscalPeriod::Q2 => NaiveDate::from_ymd_opt(fiscal_year, 4, 1),
        FiscalPeriod::Q3 => NaiveDate::from_ymd_opt(fiscal_year, 7, 1),
        FiscalPeriod::Q4 => NaiveDate::from_ymd_opt(fiscal_year, 10, 1),
        FiscalPeriod::H1 | FiscalPeriod::Other => None,
    };

    StatementPeriod {
        identity: payload.identity(),
        statement_date: payload.statement_date,
        period_start,
        period_end: payload.statement_date,
        fiscal_year,
        fiscal_period: payload.fiscal_period,
        statement_type: payload.statement_type,
        currency: payload.currency.clone(),
        payload,
    }
}

/// Alignment bucket key: (cik, fiscal year, fiscal period).
pub type AlignmentKey = (String, i32, FiscalPeriod);

/// Align statements across statement types by (cik, fiscal year, period).
///
/// Identities like the balance-sheet equation span statement types, so
/// reconciliation evaluates them over the combined bucket.
pub fn align_statements_across_types<'a>(
    periods: &[StatementPeriod<'a>],
) -> BTreeMap<AlignmentKey, BTreeMap<StatementType, StatementPeriod<'a>>> {
    let mut alignment: BTreeMap<AlignmentKey, BTreeMap<StatementType, StatementPeriod<'a>>> =
        BTreeMap::new();

    for period in periods {
        let key = (
            period.identity.cik.clone(),
            period.fiscal_year,
            period.fiscal_period,
        );
        alignment
            .entry(key)
            .or_default()
            .insert(period.statement_type, period.clone());
    }

    alignment
}

/// Classify a fiscal calendar based on observed statement periods.
///
/// Returns `None` when no periods are supplied. The caller is
/// responsible for supplying periods belonging to a single company.
pub fn classify_fiscal_calendar(
    periods: &[StatementPeriod<'_>],
) -> Option<FiscalCalendarClassification> {
    if periods.is_empty() {
        return None;
    }

    let mut sorted: Vec<&StatementPeriod<'_>> = periods.iter().collect();
    sorted.sort_by_key(|p| p.statement_date);

    let fye_months: Vec<u32> = sorted
        .iter()
        .filter(|p| p.fiscal_period == FiscalPeriod::Fy)
        .map(|p| p.statement_date.month())
        .collect();

    let fye_month = if fye_months.is_empty() {
        sorted[sorted.len() - 1].statement_date.month()
    } else {
        // Most common FY month; ties resolve to the smallest month.
        let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
        for month in &fye_months {
            *counts.entry(*month).or_insert(0) += 1;
        }
        counts
            .iter()
            .max_by_key(|(month, count)| (**count, std::cmp::Reverse(**month)))
            .map_or(12, |(month, _)| *month)
    };

    let mut deltas: Vec<i64> = Vec::new();
    for pair in sorted.windows(2) {
        let days = (pair[1].statement_date - pair[0].statement_date).num_days();
        if days > 0 {
            deltas.push(days);
        }
    }

    let mut inferred_length = None;
    let mut is_53_week = false;
    let mut is_irregular = false;

    if !deltas.is_empty() {
        deltas.sort_unstable();
        let median = deltas[deltas.len() / 2];
        inferred_length = Some(median);
        is_53_week = median >= 370;
        if deltas[0] == 0 || deltas[deltas.len() - 1] - deltas[0] > 40 {
            is_irregular = true;
        }
    }

    Some(FiscalCalendarClassification {
        fye_month,
        is_53_week_year: is_53_week,
        is_irregular,
        inferred_period_length_days: inferred_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hobart_normalize::AccountingStandard;
    use std::collections::BTreeMap as Map;

    fn payload(
        statement_type: StatementType,
        fiscal_year: i32,
        fiscal_period: FiscalPeriod,
        statement_date: (i32, u32, u32),
    ) -> CanonicalStatementPayload {
        CanonicalStatementPayload {
            cik: "0000123456".to_string(),
            statement_type,
            accounting_standard: AccountingStandard::UsGaap,
            statement_date: NaiveDate::from_ymd_opt(
                statement_date.0,
                statement_date.1,
                statement_date.2,
            )
            .unwrap(),
            fiscal_year,
            fiscal_period,
            currency: "USD".to_string(),
            unit_multiplier: 0,
            core_metrics: Map::new(),
            extra_metrics: Map::new(),
            dimensions: Map::new(),
            source_accession_id: "acc-1".to_string(),
            source_taxonomy: "US_GAAP_2024".to_string(),
            source_version_sequence: 1,
        }
    }

    #[test]
    fn test_infer_statement_period_quarter_grid() {
        let q3 = payload(
            StatementType::IncomeStatement,
            2024,
            FiscalPeriod::Q3,
            (2024, 9, 30),
        );
        let period = infer_statement_period(&q3);
        assert_eq!(period.period_start, NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(period.period_end, q3.statement_date);
    }

    #[test]
    fn test_alignment_buckets_by_identity() {
        let income = payload(
            StatementType::IncomeStatement,
            2024,
            FiscalPeriod::Fy,
            (2024, 12, 31),
        );
        let balance = payload(
            StatementType::BalanceSheet,
            2024,
            FiscalPeriod::Fy,
            (2024, 12, 31),
        );
        let prior = payload(
            StatementType::IncomeStatement,
            2023,
            FiscalPeriod::Fy,
            (2023, 12, 31),
        );

        let periods = vec![
            infer_statement_period(&income),
            infer_statement_period(&balance),
            infer_statement_period(&prior),
        ];
        let alignment = align_statements_across_types(&periods);

        assert_eq!(alignment.len(), 2);
        let bucket = &alignment[&("0000123456".to_string(), 2024, FiscalPeriod::Fy)];
        assert_eq!(bucket.len(), 2);
        assert!(bucket.contains_key(&StatementType::IncomeStatement));
        assert!(bucket.contains_key(&StatementType::BalanceSheet));
    }

    #[test]
    fn test_classify_fiscal_calendar_annual() {
        let p1 = payload(
            StatementType::IncomeStatement,
            2022,
            FiscalPeriod::Fy,
            (2022, 12, 31),
        );
        let p2 = payload(
            StatementType::IncomeStatement,
            2023,
            FiscalPeriod::Fy,
            (2023, 12, 30),
        );
        let p3 = payload(
            StatementType::IncomeStatement,
            2024,
            FiscalPeriod::Fy,
            (2024, 12, 28),
        );

        let periods = vec![
            infer_statement_period(&p1),
            infer_statement_period(&p2),
            infer_statement_period(&p3),
        ];
        let classification = classify_fiscal_calendar(&periods).unwrap();
        assert_eq!(classification.fye_month, 12);
        assert!(!classification.is_53_week_year);
        assert!(!classification.is_irregular);
        assert!(classification.inferred_period_length_days.unwrap() >= 363);
    }

    #[test]
    fn test_classify_fiscal_calendar_empty() {
        assert!(classify_fiscal_calendar(&[]).is_none());
    }
}
