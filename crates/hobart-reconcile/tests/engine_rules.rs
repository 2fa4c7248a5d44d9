//! Integration tests for the reconciliation engine

use chrono::NaiveDate;
use hobart_normalize::{
    AccountingStandard, CanonicalMetric, CanonicalStatementPayload, FiscalPeriod, StatementType,
};
use hobart_reconcile::engine::FactsByIdentity;
use hobart_reconcile::{
    CalendarRule, FxRule, IdentityRule, NormalizedFact, ReconciliationEngine, ReconciliationRule,
    ReconciliationStatus, RollforwardRule, SegmentRollupRule, Severity,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn payload(
    statement_type: StatementType,
    metrics: &[(CanonicalMetric, Decimal)],
) -> CanonicalStatementPayload {
    CanonicalStatementPayload {
        cik: "0000123456".to_string(),
        statement_type,
        accounting_standard: AccountingStandard::UsGaap,
        statement_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        fiscal_year: 2024,
        fiscal_period: FiscalPeriod::Fy,
        currency: "USD".to_string(),
        unit_multiplier: 0,
        core_metrics: metrics.iter().copied().collect(),
        extra_metrics: BTreeMap::new(),
        dimensions: BTreeMap::new(),
        source_accession_id: "acc-1".to_string(),
        source_taxonomy: "US_GAAP_2024".to_string(),
        source_version_sequence: 1,
    }
}

fn balance_sheet_identity(tolerance: Decimal) -> ReconciliationRule {
    ReconciliationRule::Identity(IdentityRule {
        rule_id: "bs-equation".to_string(),
        name: "Assets = Liabilities + Equity".to_string(),
        severity: Severity::High,
        lhs_metrics: vec![CanonicalMetric::TotalAssets],
        rhs_metrics: vec![CanonicalMetric::TotalLiabilities, CanonicalMetric::TotalEquity],
        tolerance: Some(tolerance),
        applicable_statement_types: None,
        description: None,
        is_enabled: true,
    })
}

#[test]
fn test_identity_passes_within_tolerance() {
    let statements = vec![payload(
        StatementType::BalanceSheet,
        &[
            (CanonicalMetric::TotalAssets, dec!(100)),
            (CanonicalMetric::TotalLiabilities, dec!(60)),
            (CanonicalMetric::TotalEquity, dec!(40)),
        ],
    )];

    let results = ReconciliationEngine::new().run(
        &[balance_sheet_identity(dec!(1.00))],
        &statements,
        None,
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Pass);
    assert_eq!(results[0].severity, Severity::None);
    assert_eq!(results[0].delta, Some(dec!(0)));
    assert_eq!(results[0].expected_value, Some(dec!(100)));
    assert_eq!(results[0].actual_value, Some(dec!(100)));
}

#[test]
fn test_identity_fails_beyond_tolerance() {
    let statements = vec![payload(
        StatementType::BalanceSheet,
        &[
            (CanonicalMetric::TotalAssets, dec!(100)),
            (CanonicalMetric::TotalLiabilities, dec!(60)),
            (CanonicalMetric::TotalEquity, dec!(30)),
        ],
    )];

    let results = ReconciliationEngine::new().run(
        &[balance_sheet_identity(dec!(1.00))],
        &statements,
        None,
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Fail);
    assert_eq!(results[0].severity, Severity::High);
    assert_eq!(results[0].delta, Some(dec!(-10)));
}

#[test]
fn test_identity_spans_statement_types_in_aligned_bucket() {
    // Assets live on the balance sheet; the "rhs" metric lives on a
    // different statement type in the same fiscal bucket.
    let statements = vec![
        payload(
            StatementType::BalanceSheet,
            &[(CanonicalMetric::TotalAssets, dec!(500))],
        ),
        payload(
            StatementType::IncomeStatement,
            &[(CanonicalMetric::NetIncome, dec!(500))],
        ),
    ];
    let rule = ReconciliationRule::Identity(IdentityRule {
        rule_id: "cross-type".to_string(),
        name: "cross-statement identity".to_string(),
        severity: Severity::Medium,
        lhs_metrics: vec![CanonicalMetric::TotalAssets],
        rhs_metrics: vec![CanonicalMetric::NetIncome],
        tolerance: None,
        applicable_statement_types: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Pass);
}

#[test]
fn test_identity_warns_when_inputs_missing() {
    let statements = vec![payload(
        StatementType::BalanceSheet,
        &[(CanonicalMetric::TotalAssets, dec!(100))],
    )];

    let results = ReconciliationEngine::new().run(
        &[balance_sheet_identity(dec!(1.00))],
        &statements,
        None,
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Warning);
    assert_eq!(results[0].severity, Severity::Low);
    assert_eq!(results[0].delta, None);
}

#[test]
fn test_rollforward_passes() {
    let statements = vec![payload(
        StatementType::CashFlowStatement,
        &[
            (CanonicalMetric::CashAndCashEquivalents, dec!(1000)),
            (CanonicalMetric::NetCashFromOperatingActivities, dec!(200)),
            (CanonicalMetric::NetCashFromInvestingActivities, dec!(-50)),
            (CanonicalMetric::NetIncreaseDecreaseInCash, dec!(1150)),
        ],
    )];
    let rule = ReconciliationRule::Rollforward(RollforwardRule {
        rule_id: "cash-rollforward".to_string(),
        name: "Cash rollforward".to_string(),
        severity: Severity::Medium,
        opening_metric: CanonicalMetric::CashAndCashEquivalents,
        flow_metrics: vec![
            CanonicalMetric::NetCashFromOperatingActivities,
            CanonicalMetric::NetCashFromInvestingActivities,
        ],
        closing_metric: CanonicalMetric::NetIncreaseDecreaseInCash,
        period_granularity: None,
        tolerance: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Pass);
    assert_eq!(results[0].expected_value, Some(dec!(1150)));
    assert_eq!(results[0].actual_value, Some(dec!(1150)));
    assert_eq!(results[0].delta, Some(dec!(0)));
}

#[test]
fn test_rollforward_warns_on_missing_components() {
    let statements = vec![payload(
        StatementType::CashFlowStatement,
        &[(CanonicalMetric::CashAndCashEquivalents, dec!(1000))],
    )];
    let rule = ReconciliationRule::Rollforward(RollforwardRule {
        rule_id: "cash-rollforward".to_string(),
        name: "Cash rollforward".to_string(),
        severity: Severity::Medium,
        opening_metric: CanonicalMetric::CashAndCashEquivalents,
        flow_metrics: vec![CanonicalMetric::NetCashFromOperatingActivities],
        closing_metric: CanonicalMetric::NetIncreaseDecreaseInCash,
        period_granularity: None,
        tolerance: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Warning);
    assert_eq!(results[0].notes["reason"], "MISSING_ROLLFORWARD_COMPONENTS");
}

#[test]
fn test_rollforward_respects_period_granularity() {
    let statements = vec![payload(
        StatementType::CashFlowStatement,
        &[
            (CanonicalMetric::CashAndCashEquivalents, dec!(1)),
            (CanonicalMetric::NetCashFromOperatingActivities, dec!(1)),
            (CanonicalMetric::NetIncreaseDecreaseInCash, dec!(2)),
        ],
    )];
    let rule = ReconciliationRule::Rollforward(RollforwardRule {
        rule_id: "q1-only".to_string(),
        name: "Q1 rollforward".to_string(),
        severity: Severity::Low,
        opening_metric: CanonicalMetric::CashAndCashEquivalents,
        flow_metrics: vec![CanonicalMetric::NetCashFromOperatingActivities],
        closing_metric: CanonicalMetric::NetIncreaseDecreaseInCash,
        period_granularity: Some(FiscalPeriod::Q1),
        tolerance: None,
        description: None,
        is_enabled: true,
    });

    // FY statement does not match the Q1 granularity filter.
    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert!(results.is_empty());
}

#[test]
fn test_fx_rule_always_warns() {
    let statements = vec![payload(
        StatementType::IncomeStatement,
        &[(CanonicalMetric::Revenue, dec!(100))],
    )];
    let rule = ReconciliationRule::Fx(FxRule {
        rule_id: "fx-1".to_string(),
        name: "FX consistency".to_string(),
        severity: Severity::High,
        base_metric: CanonicalMetric::Revenue,
        fx_rate_metric: None,
        local_currency: "EUR".to_string(),
        reporting_currency: "USD".to_string(),
        tolerance_bps: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Warning);
    assert_eq!(results[0].notes["reason"], "FX_RULE_STUB");
    assert_eq!(results[0].notes["base_metric"], "REVENUE");
    assert_eq!(results[0].notes["statement_currency"], "USD");
    assert_eq!(results[0].expected_value, None);
    assert_eq!(results[0].delta, None);
}

#[test]
fn test_calendar_rule_checks_fye_month() {
    let statements = vec![payload(
        StatementType::BalanceSheet,
        &[(CanonicalMetric::TotalAssets, dec!(1))],
    )];
    let rule = |months: Vec<u32>| {
        ReconciliationRule::Calendar(CalendarRule {
            rule_id: "calendar-1".to_string(),
            name: "December year end".to_string(),
            severity: Severity::Medium,
            allowed_fye_months: months,
            allow_53_week: true,
            max_gap_days: 730,
            description: None,
            is_enabled: true,
        })
    };

    let pass = ReconciliationEngine::new().run(&[rule(vec![12])], &statements, None);
    assert_eq!(pass[0].status, ReconciliationStatus::Pass);
    assert_eq!(pass[0].notes["fye_month"], "12");

    let fail = ReconciliationEngine::new().run(&[rule(vec![6, 9])], &statements, None);
    assert_eq!(fail[0].status, ReconciliationStatus::Fail);
    assert_eq!(fail[0].severity, Severity::Medium);
    assert_eq!(fail[0].notes["allowed_fye_months"], "6,9");
}

fn segment_fact(metric_code: &str, value: Decimal, segment: Option<&str>) -> NormalizedFact {
    let mut dimensions = BTreeMap::new();
    if let Some(segment) = segment {
        dimensions.insert("segment".to_string(), segment.to_string());
    }
    let dimension_key = NormalizedFact::dimension_key_for(&dimensions);
    NormalizedFact {
        cik: "0000123456".to_string(),
        statement_type: StatementType::IncomeStatement,
        accounting_standard: AccountingStandard::UsGaap,
        fiscal_year: 2024,
        fiscal_period: FiscalPeriod::Fy,
        statement_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        version_sequence: 1,
        metric_code: metric_code.to_string(),
        metric_label: None,
        unit: "USD".to_string(),
        period_start: NaiveDate::from_ymd_opt(2024, 1, 1),
        period_end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        value,
        dimensions,
        dimension_key,
        source_line_item: None,
    }
}

#[test]
fn test_segment_rollup() {
    let statements = vec![payload(
        StatementType::IncomeStatement,
        &[(CanonicalMetric::Revenue, dec!(100))],
    )];
    let mut facts: FactsByIdentity = BTreeMap::new();
    facts.insert(
        statements[0].identity(),
        vec![
            segment_fact("REVENUE", dec!(100), None),
            segment_fact("REVENUE", dec!(60), Some("US")),
            segment_fact("REVENUE", dec!(40), Some("EU")),
        ],
    );
    let rule = ReconciliationRule::SegmentRollup(SegmentRollupRule {
        rule_id: "segment-rev".to_string(),
        name: "Segment revenue rollup".to_string(),
        severity: Severity::High,
        parent_metric: CanonicalMetric::Revenue,
        child_metric: CanonicalMetric::Revenue,
        rollup_dimension_key: "segment".to_string(),
        tolerance: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule.clone()], &statements, Some(&facts));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Pass);
    assert_eq!(results[0].expected_value, Some(dec!(100)));
    assert_eq!(results[0].actual_value, Some(dec!(100)));
    assert_eq!(results[0].dimension_key.as_deref(), Some("segment"));

    // Without fact detail the rule cannot evaluate and stays silent for
    // identities that have no facts at all.
    let without_facts = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert!(without_facts.is_empty());
}

#[test]
fn test_segment_rollup_warns_when_children_missing() {
    let statements = vec![payload(
        StatementType::IncomeStatement,
        &[(CanonicalMetric::Revenue, dec!(100))],
    )];
    let mut facts: FactsByIdentity = BTreeMap::new();
    facts.insert(
        statements[0].identity(),
        vec![segment_fact("REVENUE", dec!(100), None)],
    );
    let rule = ReconciliationRule::SegmentRollup(SegmentRollupRule {
        rule_id: "segment-rev".to_string(),
        name: "Segment revenue rollup".to_string(),
        severity: Severity::High,
        parent_metric: CanonicalMetric::Revenue,
        child_metric: CanonicalMetric::Revenue,
        rollup_dimension_key: "segment".to_string(),
        tolerance: None,
        description: None,
        is_enabled: true,
    });

    let results = ReconciliationEngine::new().run(&[rule], &statements, Some(&facts));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, ReconciliationStatus::Warning);
    assert_eq!(results[0].notes["reason"], "SEGMENT_PARENT_OR_CHILD_MISSING");
}

#[test]
fn test_disabled_rules_are_skipped() {
    let statements = vec![payload(
        StatementType::BalanceSheet,
        &[
            (CanonicalMetric::TotalAssets, dec!(100)),
            (CanonicalMetric::TotalLiabilities, dec!(60)),
            (CanonicalMetric::TotalEquity, dec!(40)),
        ],
    )];
    let mut rule = balance_sheet_identity(dec!(1.00));
    if let ReconciliationRule::Identity(inner) = &mut rule {
        inner.is_enabled = false;
    }

    let results = ReconciliationEngine::new().run(&[rule], &statements, None);
    assert!(results.is_empty());
}

#[test]
fn test_result_ordering_is_stable_and_reproducible() {
    let statements = vec![
        payload(
            StatementType::BalanceSheet,
            &[
                (CanonicalMetric::TotalAssets, dec!(100)),
                (CanonicalMetric::TotalLiabilities, dec!(60)),
                (CanonicalMetric::TotalEquity, dec!(40)),
            ],
        ),
        payload(
            StatementType::IncomeStatement,
            &[(CanonicalMetric::Revenue, dec!(500))],
        ),
    ];
    let rules = vec![
        ReconciliationRule::Fx(FxRule {
            rule_id: "zz-fx".to_string(),
            name: "FX".to_string(),
            severity: Severity::Low,
            base_metric: CanonicalMetric::Revenue,
            fx_rate_metric: None,
            local_currency: "EUR".to_string(),
            reporting_currency: "USD".to_string(),
            tolerance_bps: None,
            description: None,
            is_enabled: true,
        }),
        balance_sheet_identity(dec!(1.00)),
        ReconciliationRule::Calendar(CalendarRule {
            rule_id: "aa-calendar".to_string(),
            name: "Calendar".to_string(),
            severity: Severity::Low,
            allowed_fye_months: vec![12],
            allow_53_week: true,
            max_gap_days: 730,
            description: None,
            is_enabled: true,
        }),
    ];

    let engine = ReconciliationEngine::new();
    let first = engine.run(&rules, &statements, None);
    let second = engine.run(&rules, &statements, None);
    assert_eq!(first, second);

    // Sorted by identity first, then rule category, then rule id,
    // regardless of input rule order. The identity rule's aligned bucket
    // reports under the first statement type present in the bucket.
    let keys: Vec<(StatementType, &str)> = first
        .iter()
        .map(|r| (r.statement_identity.statement_type, r.rule_id.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (StatementType::IncomeStatement, "bs-equation"),
            (StatementType::IncomeStatement, "zz-fx"),
            (StatementType::IncomeStatement, "aa-calendar"),
            (StatementType::BalanceSheet, "zz-fx"),
            (StatementType::BalanceSheet, "aa-calendar"),
        ]
    );
}
