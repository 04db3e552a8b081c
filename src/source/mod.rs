pub mod dataset;
pub mod service;
pub mod sink;

pub use dataset::{Dataset, JsonDatasetSource};
pub use service::KpiService;
pub use sink::{JsonFileSink, MemorySink, TierSink};

use async_trait::async_trait;

use crate::models::{KpiFilter, LifetimeAggregate, RawPeriodAggregate, ReportingWindow, Result};

/// The warehouse side: supplies already-filtered aggregates to the engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KpiDataSource: Send + Sync {
    /// Name used in logs and error messages
    fn name(&self) -> String;

    /// Totals for the filter within the window
    async fn fetch_period(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<RawPeriodAggregate>;

    /// Per-customer history from the first row up to the last day of `window`
    async fn fetch_lifetime(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<LifetimeAggregate>;

    /// One aggregate per customer within the window
    async fn fetch_customer_aggregates(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<Vec<(String, RawPeriodAggregate)>>;
}
