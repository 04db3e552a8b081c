use chrono::NaiveDate;
use operator_kpi::{
    config::Settings,
    kpi::{compare_values, safe_divide, KpiDerivationEngine},
    models::{KpiFilter, KpiMetric, MetricKind, Period, RawPeriodAggregate, ReportingWindow, ScoreValue, TransactionRow},
    scoring::TierCalculator,
    source::{Dataset, JsonDatasetSource, KpiService, MemorySink},
};
use rust_decimal::Decimal;
use std::sync::Arc;

fn row(date: (i32, u32, u32), currency: &str, line: &str, member: &str, deposit: (i64, u64), withdraw: (i64, u64)) -> TransactionRow {
    TransactionRow {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        currency: currency.to_string(),
        line: line.to_string(),
        member_id: member.to_string(),
        deposit_amount: Decimal::from(deposit.0),
        deposit_cases: deposit.1,
        withdraw_amount: Decimal::from(withdraw.0),
        withdraw_cases: withdraw.1,
    }
}

fn dataset() -> Dataset {
    Dataset {
        rows: vec![
            // April
            row((2024, 4, 3), "MYR", "brand-a", "u1", (1000, 4), (200, 1)),
            row((2024, 4, 10), "MYR", "brand-a", "u2", (100, 1), (0, 0)),
            // May
            row((2024, 5, 2), "MYR", "brand-a", "u1", (2500, 5), (500, 1)),
            row((2024, 5, 20), "MYR", "brand-a", "u1", (500, 1), (0, 0)),
            row((2024, 5, 5), "MYR", "brand-a", "u3", (100, 2), (150, 1)),
            row((2024, 5, 6), "MYR", "brand-a", "u4", (0, 0), (20, 1)),
            row((2024, 5, 7), "SGD", "brand-b", "u5", (400, 2), (0, 0)),
        ],
    }
}

fn service() -> KpiService {
    let source = JsonDatasetSource::new("fixture", dataset()).unwrap();
    KpiService::new(Arc::new(source), &Settings::default()).unwrap()
}

fn myr_brand_a() -> KpiFilter {
    KpiFilter::new(Some("myr".to_string()), Some("brand-a".to_string()))
}

#[tokio::test]
async fn test_month_report_end_to_end() {
    let service = service();
    let window = ReportingWindow::month(2024, 5).unwrap();

    let report = service.period_report(&myr_brand_a(), &window, true).await.unwrap();
    let current = &report.current;

    assert_eq!(current.currency, "MYR");
    assert_eq!(current.line, "brand-a");
    assert_eq!(current.deposit_amount, 3100.0);
    assert_eq!(current.deposit_cases, 8);
    assert_eq!(current.withdraw_amount, 670.0);
    assert_eq!(current.active_members, 2);
    assert_eq!(current.unique_customers, 3);

    assert_eq!(current.ggr, 2430.0);
    assert_eq!(current.net_profit, current.ggr);
    assert_eq!(current.avg_transaction_value, 387.5);
    assert_eq!(current.purchase_frequency, 4.0);
    assert!((current.winrate - 2430.0 / 3100.0).abs() < 1e-12);

    // u1 stayed, u2 left, u3 joined
    assert_eq!(current.retention_rate, 0.5);
    assert_eq!(current.churn_rate, 0.5);
    assert_eq!(current.growth_rate, 0.0);

    // u1, u2 and u3 have deposited by the end of May; u4 never did
    assert!((current.customer_lifetime_value - 3350.0 / 3.0).abs() < 1e-9);
    assert!((current.avg_customer_lifespan - 4.0 / 3.0).abs() < 1e-12);
    assert!(current.customer_maturity_index > 0.0 && current.customer_maturity_index <= 1.0);

    let prior = report.prior.as_ref().unwrap();
    assert_eq!(prior.deposit_amount, 1100.0);
    assert_eq!(prior.active_members, 2);
    // Nothing before April
    assert_eq!(prior.retention_rate, 0.0);
    assert_eq!(prior.churn_rate, 0.0);

    let comparison = report.comparison.as_ref().unwrap();
    let deposits = comparison[&KpiMetric::DepositAmount];
    assert_eq!(deposits.absolute_diff, 2000.0);
    assert!((deposits.percentage_change - 2000.0 / 1100.0 * 100.0).abs() < 1e-9);
    assert!(deposits.is_positive);

    let active = comparison[&KpiMetric::ActiveMembers];
    assert_eq!(active.absolute_diff, 0.0);
    assert_eq!(active.percentage_change, 0.0);
    assert!(!active.is_positive);

    let retention = comparison[&KpiMetric::RetentionRate];
    assert_eq!(retention.prior, 0.0);
    assert_eq!(retention.percentage_change, 100.0);
}

#[tokio::test]
async fn test_date_range_report_end_to_end() {
    let service = service();
    let window = ReportingWindow::range(
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 5, 5).unwrap(),
    )
    .unwrap();

    let report = service.period_report(&myr_brand_a(), &window, true).await.unwrap();
    let current = &report.current;

    // u1 on May 2 and u3 on May 5; u4 and u1's May 20 top-up fall outside
    assert_eq!(current.window, window);
    assert_eq!(current.deposit_amount, 2600.0);
    assert_eq!(current.active_members, 2);

    // April 1..5 had only u1, who stayed
    assert_eq!(current.retention_rate, 1.0);
    assert_eq!(current.churn_rate, 0.0);
    assert_eq!(current.growth_rate, 1.0);

    // History stops at May 5: u1 net 2800, u2 net 100, u3 net -50
    assert!((current.customer_lifetime_value - 950.0).abs() < 1e-9);
    assert!((current.avg_customer_lifespan - 4.0 / 3.0).abs() < 1e-12);

    let prior = report.prior.as_ref().unwrap();
    assert_eq!(
        prior.window,
        ReportingWindow::range(
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
        )
        .unwrap()
    );
    assert_eq!(prior.deposit_amount, 1000.0);
    // u2's April 10 deposit is after the prior range ends
    assert_eq!(prior.customer_lifetime_value, 800.0);
    assert_eq!(prior.avg_customer_lifespan, 1.0);

    let deposits = report.comparison.as_ref().unwrap()[&KpiMetric::DepositAmount];
    assert_eq!(deposits.absolute_diff, 1600.0);
    assert_eq!(deposits.percentage_change, 160.0);
}

#[tokio::test]
async fn test_unfiltered_report_spans_currencies() {
    let service = service();
    let window = ReportingWindow::month(2024, 5).unwrap();

    let report = service
        .period_report(&KpiFilter::default(), &window, false)
        .await
        .unwrap();

    assert_eq!(report.current.currency, "ALL");
    assert_eq!(report.current.deposit_amount, 3500.0);
    assert_eq!(report.current.active_members, 3);
    assert!(report.comparison.is_none());
}

#[tokio::test]
async fn test_empty_period_yields_zeros() {
    let service = service();
    let window = ReportingWindow::month(2023, 1).unwrap();

    let report = service.period_report(&myr_brand_a(), &window, true).await.unwrap();
    let current = &report.current;

    assert_eq!(current.deposit_amount, 0.0);
    assert_eq!(current.avg_transaction_value, 0.0);
    assert_eq!(current.purchase_frequency, 0.0);
    assert_eq!(current.winrate, 0.0);
    assert_eq!(current.retention_rate, 0.0);
    assert_eq!(current.churn_rate, 0.0);
    assert_eq!(current.growth_rate, 0.0);

    for (_, result) in report.comparison.unwrap() {
        assert_eq!(result.percentage_change, 0.0);
        assert!(!result.is_positive);
    }
}

#[tokio::test]
async fn test_assign_tiers_end_to_end() {
    let service = service();
    let sink = MemorySink::new();
    let period = Period::new(2024, 5).unwrap();

    let assignments = service.assign_tiers(&myr_brand_a(), period, &sink).await.unwrap();
    assert_eq!(assignments.len(), 3);

    let u1 = &assignments[0];
    assert_eq!(u1.customer_id, "u1");
    assert_eq!(u1.scores[&MetricKind::Da], ScoreValue::Points(50.0));
    assert_eq!(u1.scores[&MetricKind::Ggr], ScoreValue::Points(50.0));
    assert_eq!(u1.scores[&MetricKind::Pf], ScoreValue::Points(50.0));
    assert_eq!(u1.scores[&MetricKind::Atv], ScoreValue::Points(100.0));
    assert!((u1.total_score - 57.5).abs() < 1e-9);
    assert_eq!(u1.classification.tier_name, "Silver");
    assert!((u1.potential_score - 80.0).abs() < 1e-9);
    assert_eq!(u1.classification.potential_tier, "High_P");

    // Lost money to the house: GGR and winrate fall below every threshold
    let u3 = &assignments[1];
    assert_eq!(u3.customer_id, "u3");
    assert!(u3.scores[&MetricKind::Ggr].is_dash());
    assert!(u3.scores[&MetricKind::WinRate].is_dash());
    assert!((u3.total_score - 9.0).abs() < 1e-9);
    assert_eq!(u3.classification.tier_name, "Regular");
    assert_eq!(u3.classification.potential_tier, "ND_P");

    let u4 = &assignments[2];
    assert_eq!(u4.total_score, 0.0);
    assert_eq!(u4.classification.tier, 7);

    assert_eq!(sink.stored().len(), 3);
}

#[test]
fn test_point_table_lookups() {
    let calculator = TierCalculator::from_settings(&Settings::default().scoring).unwrap();

    assert_eq!(calculator.score_metric(MetricKind::Da, 150.0), ScoreValue::Points(5.0));
    assert_eq!(calculator.score_metric(MetricKind::Da, 700.0), ScoreValue::Points(25.0));
    assert_eq!(calculator.score_metric(MetricKind::Da, 10.0), ScoreValue::Points(0.0));
    assert_eq!(calculator.score_metric(MetricKind::Da, 1_000_000.0), ScoreValue::Points(100.0));
    assert_eq!(calculator.score_metric(MetricKind::Ggr, 10.0), ScoreValue::Dash);
}

#[test]
fn test_classification_boundaries() {
    let calculator = TierCalculator::from_settings(&Settings::default().scoring).unwrap();
    let classifier = calculator.classifier();

    assert_eq!(classifier.classify(96.0, 0.0).tier_name, "Super VIP");
    assert_eq!(classifier.classify(80.0, 0.0).tier_name, "VIP");
    assert_eq!(classifier.classify(79.99, 0.0).tier_name, "Gold");
    assert_eq!(classifier.classify(0.0, 0.0).tier_name, "Regular");
    assert_eq!(classifier.classify(0.0, 40.0).potential_tier, "Mid_P");
}

#[test]
fn test_guarded_arithmetic() {
    assert_eq!(safe_divide(10.0, 0.0, 0.0), 0.0);
    assert_eq!(safe_divide(f64::NAN, 2.0, 0.0), 0.0);

    let zero_prior = compare_values(5.0, 0.0);
    assert_eq!(zero_prior.percentage_change, 100.0);
    assert!(zero_prior.is_positive);

    let decline = compare_values(50.0, 100.0);
    assert_eq!(decline.absolute_diff, -50.0);
    assert_eq!(decline.percentage_change, -50.0);
    assert!(!decline.is_positive);
}

#[test]
fn test_derivation_without_prior_or_lifetime() {
    let engine = KpiDerivationEngine::default();
    let mut current = RawPeriodAggregate::empty("MYR", "brand-a", ReportingWindow::month(2024, 5).unwrap());
    current.deposit_amount = Decimal::from(500);
    current.deposit_cases = 5;
    current.withdraw_amount = Decimal::from(600);
    current.active_members = 5;
    current.adjustments = Decimal::from(25);

    let set = engine.derive(&current, None, None);
    assert_eq!(set.ggr, -100.0);
    assert_eq!(set.net_profit, -125.0);
    assert_eq!(set.winrate, -0.2);
    assert_eq!(set.retention_rate, 0.0);
    assert_eq!(set.churn_rate, 0.0);
    assert_eq!(set.customer_lifetime_value, 0.0);
}
