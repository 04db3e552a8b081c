use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::{KpiEngineError, KpiFilter, Period};

/// Metrics that have a scoring curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetricKind {
    #[serde(rename = "DA")]
    Da,
    #[serde(rename = "GGR")]
    Ggr,
    #[serde(rename = "PF")]
    Pf,
    #[serde(rename = "ATV")]
    Atv,
    #[serde(rename = "WIN_RATE")]
    WinRate,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Da,
        MetricKind::Ggr,
        MetricKind::Pf,
        MetricKind::Atv,
        MetricKind::WinRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Da => "DA",
            MetricKind::Ggr => "GGR",
            MetricKind::Pf => "PF",
            MetricKind::Atv => "ATV",
            MetricKind::WinRate => "WIN_RATE",
        }
    }

}

impl FromStr for MetricKind {
    type Err = KpiEngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "DA" | "DEPOSIT_AMOUNT" => Ok(MetricKind::Da),
            "GGR" => Ok(MetricKind::Ggr),
            "PF" | "PURCHASE_FREQUENCY" => Ok(MetricKind::Pf),
            "ATV" | "AVG_TRANSACTION_VALUE" => Ok(MetricKind::Atv),
            "WIN_RATE" | "WINRATE" => Ok(MetricKind::WinRate),
            _ => Err(KpiEngineError::UnknownMetric(s.to_string())),
        }
    }
}

/// Result of looking a value up in a point table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreValue {
    /// No score. Contributes nothing to weighted sums.
    Dash,
    Points(f64),
}

impl ScoreValue {
    pub fn points(&self) -> Option<f64> {
        match self {
            ScoreValue::Dash => None,
            ScoreValue::Points(p) => Some(*p),
        }
    }

    pub fn is_dash(&self) -> bool {
        matches!(self, ScoreValue::Dash)
    }
}

impl Serialize for ScoreValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ScoreValue::Dash => serializer.serialize_str("-"),
            ScoreValue::Points(p) => serializer.serialize_f64(*p),
        }
    }
}

pub type MetricScores = BTreeMap<MetricKind, ScoreValue>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierDefinition {
    pub tier: u8,
    pub name: String,
    pub group: String,
    pub min_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialTierDefinition {
    pub name: String,
    pub min_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TierClassification {
    pub tier: u8,
    pub tier_name: String,
    pub tier_group: String,
    pub potential_tier: String,
}

/// A scored and classified customer, ready to hand to a persistence sink.
#[derive(Debug, Clone, Serialize)]
pub struct TierAssignment {
    pub customer_id: String,
    pub filter: KpiFilter,
    pub period: Period,
    pub scores: MetricScores,
    pub total_score: f64,
    pub potential_score: f64,
    pub classification: TierClassification,
}
