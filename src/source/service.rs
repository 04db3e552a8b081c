use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{KpiDataSource, TierSink};
use crate::{
    config::Settings,
    kpi::{compare_sets, KpiDerivationEngine},
    models::{
        CustomerMetrics, KpiEngineError, KpiFilter, KpiReport, LifetimeAggregate, Period,
        RawPeriodAggregate, ReportingWindow, Result, TierAssignment,
    },
    scoring::TierCalculator,
};

/// Fetches aggregates from a data source and runs them through the KPI and
/// tier engines.
pub struct KpiService {
    source: Arc<dyn KpiDataSource>,
    engine: KpiDerivationEngine,
    calculator: TierCalculator,
    fetch_timeout: Duration,
}

impl KpiService {
    pub fn new(source: Arc<dyn KpiDataSource>, settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let weight_total = settings.scoring.enabled_weight_total();
        if (weight_total - 1.0).abs() > 1e-6 {
            warn!(
                "Enabled module weights sum to {}, total scores are not a weighted average",
                weight_total
            );
        }

        Ok(Self {
            source,
            engine: KpiDerivationEngine::new(settings.lifetime.clone()),
            calculator: TierCalculator::from_settings(&settings.scoring)?,
            fetch_timeout: Duration::from_secs(settings.source.fetch_timeout_seconds),
        })
    }

    async fn timed<T, F>(&self, what: String, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.fetch_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(KpiEngineError::FetchTimeout {
                what: format!("{} from {}", what, self.source.name()),
            }),
        }
    }

    async fn fetch_period(&self, filter: &KpiFilter, window: &ReportingWindow) -> Result<RawPeriodAggregate> {
        let aggregate = self
            .timed(
                format!("period {} {}/{}", window, filter.currency_label(), filter.line_label()),
                self.source.fetch_period(filter, window),
            )
            .await?;
        aggregate.validate()?;
        Ok(aggregate)
    }

    async fn fetch_optional_period(
        &self,
        filter: &KpiFilter,
        window: Option<&ReportingWindow>,
    ) -> Result<Option<RawPeriodAggregate>> {
        match window {
            Some(window) => self.fetch_period(filter, window).await.map(Some),
            None => Ok(None),
        }
    }

    async fn fetch_optional_lifetime(
        &self,
        filter: &KpiFilter,
        window: Option<&ReportingWindow>,
    ) -> Result<Option<LifetimeAggregate>> {
        match window {
            Some(window) => self
                .timed(
                    format!("lifetime up to end of {}", window),
                    self.source.fetch_lifetime(filter, window),
                )
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Derives the KPI set for `window`. With `compare_prior`, also derives the
    /// previous period (with its own prior and lifetime) and compares the two.
    pub async fn period_report(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
        compare_prior: bool,
    ) -> Result<KpiReport> {
        info!(
            "Building KPI report for {}/{} {}",
            filter.currency_label(),
            filter.line_label(),
            window
        );

        // Retention needs the window before each reported window.
        let prior_window = window.prior();
        let prior_prior_window = if compare_prior {
            prior_window.as_ref().and_then(ReportingWindow::prior)
        } else {
            None
        };

        let (current, lifetime, prior, prior_prior, prior_lifetime) = futures::try_join!(
            self.fetch_period(filter, window),
            self.fetch_optional_lifetime(filter, Some(window)),
            self.fetch_optional_period(filter, prior_window.as_ref()),
            self.fetch_optional_period(filter, prior_prior_window.as_ref()),
            self.fetch_optional_lifetime(
                filter,
                prior_window.as_ref().filter(|_| compare_prior),
            ),
        )?;

        if let Some(prior) = &prior {
            if prior.active_members == 0 {
                warn!("Prior period {} has no active members", prior.window);
            }
        }

        let current_set = self.engine.derive(&current, prior.as_ref(), lifetime.as_ref());
        debug!(
            "Derived {}: ggr={} active={}",
            current_set.window, current_set.ggr, current_set.active_members
        );

        let prior_set = match (compare_prior, &prior) {
            (true, Some(prior)) => Some(self.engine.derive(
                prior,
                prior_prior.as_ref(),
                prior_lifetime.as_ref(),
            )),
            _ => None,
        };

        let comparison = prior_set
            .as_ref()
            .map(|prior_set| compare_sets(&current_set, prior_set));

        Ok(KpiReport {
            current: current_set,
            prior: prior_set,
            comparison,
        })
    }

    /// Scores and classifies every customer active in `period`, then hands
    /// the assignments to `sink`.
    pub async fn assign_tiers(
        &self,
        filter: &KpiFilter,
        period: Period,
        sink: &dyn TierSink,
    ) -> Result<Vec<TierAssignment>> {
        let window = ReportingWindow::Month(period);
        let customers = self
            .timed(
                format!("customers {} {}/{}", period, filter.currency_label(), filter.line_label()),
                self.source.fetch_customer_aggregates(filter, &window),
            )
            .await?;

        let mut metrics: Vec<CustomerMetrics> = Vec::with_capacity(customers.len());
        for (customer_id, aggregate) in &customers {
            aggregate.validate()?;
            metrics.push(self.engine.customer_metrics(customer_id, aggregate));
        }

        let assignments = self.calculator.assign_batch(&metrics, filter, period);
        let written = sink.sync_tiers(&assignments).await?;
        info!(
            "Classified {} customers for {}/{} {}, {} synced",
            assignments.len(),
            filter.currency_label(),
            filter.line_label(),
            period,
            written
        );

        Ok(assignments)
    }

    pub fn calculator(&self) -> &TierCalculator {
        &self.calculator
    }

    pub fn engine(&self) -> &KpiDerivationEngine {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KpiMetric;
    use crate::source::{MemorySink, MockKpiDataSource};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    fn aggregate(window: &ReportingWindow, deposit: i64, members: &[&str]) -> RawPeriodAggregate {
        let mut agg = RawPeriodAggregate::empty("MYR", "brand-a", window.clone());
        agg.deposit_amount = Decimal::from(deposit);
        agg.deposit_cases = members.len() as u64 * 2;
        agg.active_member_ids = members.iter().map(|m| m.to_string()).collect();
        agg.customer_ids = agg.active_member_ids.clone();
        agg.active_members = members.len() as u64;
        agg.unique_customers = members.len() as u64;
        agg
    }

    fn mock_source() -> MockKpiDataSource {
        let mut source = MockKpiDataSource::new();
        source.expect_name().return_const("mock".to_string());
        source.expect_fetch_period().returning(|_, window| {
            let members: &[&str] = match window {
                ReportingWindow::Month(p) if p.month == 5 => &["u1", "u2", "u3"],
                ReportingWindow::Month(p) if p.month == 4 => &["u1", "u2"],
                _ => &["u2"],
            };
            let deposit = match window {
                ReportingWindow::Month(p) if p.month == 5 => 300,
                ReportingWindow::Month(p) if p.month == 4 => 200,
                _ => 50,
            };
            Ok(aggregate(window, deposit, members))
        });
        source
            .expect_fetch_lifetime()
            .returning(|_, window| Ok(LifetimeAggregate::empty(window.end_period())));
        source
    }

    #[tokio::test]
    async fn test_report_with_prior_comparison() {
        let service = KpiService::new(Arc::new(mock_source()), &Settings::default()).unwrap();
        let window = ReportingWindow::month(2024, 5).unwrap();

        let report = service
            .period_report(&KpiFilter::default(), &window, true)
            .await
            .unwrap();

        assert_eq!(report.current.deposit_amount, 300.0);
        assert_eq!(report.current.retention_rate, 1.0);
        assert!((report.current.growth_rate - 0.5).abs() < 1e-12);

        let prior = report.prior.unwrap();
        assert_eq!(prior.deposit_amount, 200.0);
        // March had only u2
        assert!((prior.retention_rate - 1.0).abs() < 1e-12);
        assert!((prior.growth_rate - 1.0).abs() < 1e-12);

        let comparison = report.comparison.unwrap();
        let deposits = comparison[&KpiMetric::DepositAmount];
        assert_eq!(deposits.absolute_diff, 100.0);
        assert_eq!(deposits.percentage_change, 50.0);
        assert!(deposits.is_positive);
    }

    #[tokio::test]
    async fn test_report_without_prior_comparison() {
        let service = KpiService::new(Arc::new(mock_source()), &Settings::default()).unwrap();
        let window = ReportingWindow::month(2024, 5).unwrap();

        let report = service
            .period_report(&KpiFilter::default(), &window, false)
            .await
            .unwrap();

        assert!(report.prior.is_none());
        assert!(report.comparison.is_none());
        // Retention still uses the previous month
        assert_eq!(report.current.retention_rate, 1.0);
    }

    #[tokio::test]
    async fn test_source_error_propagates() {
        let mut source = MockKpiDataSource::new();
        source.expect_name().return_const("broken".to_string());
        source.expect_fetch_period().returning(|_, _| {
            Err(KpiEngineError::DataSource {
                source_name: "broken".to_string(),
                message: "connection refused".to_string(),
            })
        });
        source
            .expect_fetch_lifetime()
            .returning(|_, window| Ok(LifetimeAggregate::empty(window.end_period())));

        let service = KpiService::new(Arc::new(source), &Settings::default()).unwrap();
        let window = ReportingWindow::month(2024, 5).unwrap();
        let err = service
            .period_report(&KpiFilter::default(), &window, true)
            .await
            .unwrap_err();

        assert!(matches!(err, KpiEngineError::DataSource { .. }));
    }

    #[tokio::test]
    async fn test_malformed_aggregate_rejected() {
        let mut source = MockKpiDataSource::new();
        source.expect_name().return_const("bad".to_string());
        source.expect_fetch_period().returning(|_, window| {
            let mut agg = RawPeriodAggregate::empty("MYR", "brand-a", window.clone());
            agg.deposit_amount = Decimal::from(-10);
            Ok(agg)
        });
        source
            .expect_fetch_lifetime()
            .returning(|_, window| Ok(LifetimeAggregate::empty(window.end_period())));

        let service = KpiService::new(Arc::new(source), &Settings::default()).unwrap();
        let window = ReportingWindow::month(2024, 5).unwrap();
        let err = service
            .period_report(&KpiFilter::default(), &window, false)
            .await
            .unwrap_err();

        assert!(matches!(err, KpiEngineError::InvalidInput(_)));
    }

    struct SlowSource;

    #[async_trait]
    impl KpiDataSource for SlowSource {
        fn name(&self) -> String {
            "slow".to_string()
        }

        async fn fetch_period(
            &self,
            _filter: &KpiFilter,
            window: &ReportingWindow,
        ) -> Result<RawPeriodAggregate> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(RawPeriodAggregate::empty("MYR", "brand-a", window.clone()))
        }

        async fn fetch_lifetime(
            &self,
            _filter: &KpiFilter,
            window: &ReportingWindow,
        ) -> Result<LifetimeAggregate> {
            Ok(LifetimeAggregate::empty(window.end_period()))
        }

        async fn fetch_customer_aggregates(
            &self,
            _filter: &KpiFilter,
            _window: &ReportingWindow,
        ) -> Result<Vec<(String, RawPeriodAggregate)>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let mut settings = Settings::default();
        settings.source.fetch_timeout_seconds = 1;
        let service = KpiService::new(Arc::new(SlowSource), &settings).unwrap();
        let window = ReportingWindow::month(2024, 5).unwrap();

        let err = service
            .period_report(&KpiFilter::default(), &window, false)
            .await
            .unwrap_err();

        match err {
            KpiEngineError::FetchTimeout { what } => assert!(what.contains("slow")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_assign_tiers_syncs_to_sink() {
        let mut source = MockKpiDataSource::new();
        source.expect_name().return_const("mock".to_string());
        source.expect_fetch_customer_aggregates().returning(|_, window| {
            let mut whale = RawPeriodAggregate::empty("MYR", "brand-a", window.clone());
            whale.deposit_amount = Decimal::from(12_000);
            whale.deposit_cases = 15;
            whale.withdraw_amount = Decimal::from(3_000);
            whale.active_members = 1;
            whale.unique_customers = 1;

            let idle = RawPeriodAggregate::empty("MYR", "brand-a", window.clone());
            Ok(vec![("whale".to_string(), whale), ("idle".to_string(), idle)])
        });

        let service = KpiService::new(Arc::new(source), &Settings::default()).unwrap();
        let sink = MemorySink::new();
        let period = Period::new(2024, 5).unwrap();

        let assignments = service
            .assign_tiers(&KpiFilter::default(), period, &sink)
            .await
            .unwrap();

        assert_eq!(assignments.len(), 2);
        assert_eq!(assignments[0].classification.tier_name, "Super VIP");
        assert_eq!(assignments[1].classification.tier_name, "Regular");
        assert_eq!(sink.stored().len(), 2);
    }
}
