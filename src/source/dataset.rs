use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::KpiDataSource;
use crate::{
    kpi::aggregation,
    models::{
        KpiFilter, LifetimeAggregate, RawPeriodAggregate, ReportingWindow, Result, TransactionRow,
    },
};

/// A warehouse export: daily per-member transaction rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<TransactionRow>,
}

impl Dataset {
    pub fn validate(&self) -> Result<()> {
        for row in &self.rows {
            row.validate()?;
        }
        Ok(())
    }
}

/// Serves aggregates from a dataset held in memory, typically loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonDatasetSource {
    name: String,
    dataset: Arc<Dataset>,
}

impl JsonDatasetSource {
    pub fn new(name: impl Into<String>, dataset: Dataset) -> Result<Self> {
        dataset.validate()?;
        Ok(Self {
            name: name.into(),
            dataset: Arc::new(dataset),
        })
    }

    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        info!("Loaded {} rows from {}", dataset.rows.len(), path.display());

        Self::new(path.display().to_string(), dataset)
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.dataset.rows
    }
}

#[async_trait]
impl KpiDataSource for JsonDatasetSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn fetch_period(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<RawPeriodAggregate> {
        let aggregate = aggregation::aggregate_total(self.rows(), filter, window);
        debug!(
            "{}: {} active members in {}/{} {}",
            self.name,
            aggregate.active_members,
            aggregate.currency,
            aggregate.line,
            window
        );
        Ok(aggregate)
    }

    async fn fetch_lifetime(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<LifetimeAggregate> {
        Ok(aggregation::build_lifetime(self.rows(), filter, window))
    }

    async fn fetch_customer_aggregates(
        &self,
        filter: &KpiFilter,
        window: &ReportingWindow,
    ) -> Result<Vec<(String, RawPeriodAggregate)>> {
        let customers = aggregation::aggregate_customers(self.rows(), filter, window);
        if customers.is_empty() {
            debug!("{}: no customers for {} in {}", self.name, filter.line_label(), window);
        }
        Ok(customers.into_iter().collect())
    }
}
