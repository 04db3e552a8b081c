use std::collections::BTreeMap;

use crate::{
    config::{tables::validate_metric_configs, MetricConfig, ZeroFallback},
    models::{CustomerMetrics, MetricKind, MetricScores, Result, ScoreValue},
};

/// Maps metric values to points using each metric's piecewise table.
#[derive(Debug, Clone)]
pub struct ScoringTableResolver {
    tables: BTreeMap<MetricKind, MetricConfig>,
}

impl ScoringTableResolver {
    pub fn new(configs: Vec<MetricConfig>) -> Result<Self> {
        validate_metric_configs(&configs)?;

        let tables = configs
            .into_iter()
            .map(|config| (config.metric, config))
            .collect();

        Ok(Self { tables })
    }

    pub fn score(&self, metric: MetricKind, value: f64) -> ScoreValue {
        match self.tables.get(&metric) {
            Some(config) => resolve_points(config, value),
            // Construction guarantees a table for every metric.
            None => ScoreValue::Dash,
        }
    }

    pub fn score_all(&self, metrics: &CustomerMetrics) -> MetricScores {
        MetricKind::ALL
            .iter()
            .map(|kind| (*kind, self.score(*kind, scoring_input(metrics, *kind))))
            .collect()
    }

    pub fn table(&self, metric: MetricKind) -> Option<&MetricConfig> {
        self.tables.get(&metric)
    }
}

/// Score of the highest point whose threshold is at or below `value`.
/// Missing, negative or non-finite input counts as zero.
pub fn resolve_points(config: &MetricConfig, value: f64) -> ScoreValue {
    let value = if value.is_finite() && value > 0.0 { value } else { 0.0 };

    let idx = config.points.partition_point(|p| p.value <= value);
    if idx == 0 {
        return match config.zero_fallback {
            ZeroFallback::Dash => ScoreValue::Dash,
            ZeroFallback::Zero => ScoreValue::Points(0.0),
        };
    }

    ScoreValue::Points(config.points[idx - 1].score)
}

/// The value a metric's point table is keyed on. Winrate tables are in percent.
pub fn scoring_input(metrics: &CustomerMetrics, metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Da => metrics.deposit_amount,
        MetricKind::Ggr => metrics.ggr,
        MetricKind::Pf => metrics.purchase_frequency,
        MetricKind::Atv => metrics.avg_transaction_value,
        MetricKind::WinRate => metrics.winrate * 100.0,
    }
}
