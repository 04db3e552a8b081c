use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{DerivedKpiSet, KpiMetric};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    pub current: f64,
    pub prior: f64,
    pub absolute_diff: f64,
    pub percentage_change: f64,
    pub is_positive: bool,
}

pub type ComparisonMap = BTreeMap<KpiMetric, ComparisonResult>;

/// What a dashboard request gets back: the current period, and the prior
/// period with its comparison when one was requested.
#[derive(Debug, Clone, Serialize)]
pub struct KpiReport {
    pub current: DerivedKpiSet,
    pub prior: Option<DerivedKpiSet>,
    pub comparison: Option<ComparisonMap>,
}
