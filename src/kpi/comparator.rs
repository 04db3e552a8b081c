use std::collections::BTreeMap;

use super::math::ratio;
use crate::models::{ComparisonMap, ComparisonResult, DerivedKpiSet, KpiMetric};

/// Compares one metric value against its prior-period value.
pub fn compare_values(current: f64, prior: f64) -> ComparisonResult {
    let current = if current.is_finite() { current } else { 0.0 };
    let prior = if prior.is_finite() { prior } else { 0.0 };
    let absolute_diff = current - prior;
    let absolute_diff = if absolute_diff.is_finite() { absolute_diff } else { 0.0 };

    let percentage_change = if prior == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        ratio(absolute_diff * 100.0, prior)
    };

    ComparisonResult {
        current,
        prior,
        absolute_diff,
        percentage_change,
        // Same as absolute_diff > 0 whenever the difference is representable
        is_positive: current > prior,
    }
}

/// Compares every metric in either map; a metric missing on one side counts as 0.
/// Period adjacency is the caller's concern.
pub fn compare(
    current: &BTreeMap<KpiMetric, f64>,
    prior: &BTreeMap<KpiMetric, f64>,
) -> ComparisonMap {
    current
        .keys()
        .chain(prior.keys())
        .map(|metric| {
            let c = current.get(metric).copied().unwrap_or(0.0);
            let p = prior.get(metric).copied().unwrap_or(0.0);
            (*metric, compare_values(c, p))
        })
        .collect()
}

pub fn compare_sets(current: &DerivedKpiSet, prior: &DerivedKpiSet) -> ComparisonMap {
    compare(&current.metric_values(), &prior.metric_values())
}
