//! Static scoring tables: point curves, module weights and tier thresholds.
//!
//! These are plain data loaded once with [`Settings`](super::Settings) and
//! validated before any scorer or classifier is built from them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::{KpiEngineError, MetricKind, PotentialTierDefinition, Result, TierDefinition};

/// One knot of a piecewise scoring curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    pub value: f64,
    pub score: f64,
}

impl MetricPoint {
    pub const fn new(value: f64, score: f64) -> Self {
        Self { value, score }
    }
}

/// What a value below the lowest threshold scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZeroFallback {
    Dash,
    Zero,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricConfig {
    pub metric: MetricKind,
    pub points: Vec<MetricPoint>,
    pub zero_fallback: ZeroFallback,
}

impl MetricConfig {
    pub fn validate(&self) -> Result<()> {
        if self.points.is_empty() {
            return Err(KpiEngineError::ConfigError(format!(
                "point table for {} is empty",
                self.metric.as_str()
            )));
        }

        for point in &self.points {
            if !point.value.is_finite() || !point.score.is_finite() {
                return Err(KpiEngineError::ConfigError(format!(
                    "point table for {} contains a non-finite entry",
                    self.metric.as_str()
                )));
            }
        }

        for pair in self.points.windows(2) {
            if pair[1].value <= pair[0].value {
                return Err(KpiEngineError::ConfigError(format!(
                    "point table for {} must have strictly ascending values ({} then {})",
                    self.metric.as_str(),
                    pair[0].value,
                    pair[1].value
                )));
            }
            if pair[1].score < pair[0].score {
                return Err(KpiEngineError::ConfigError(format!(
                    "point table for {} must have non-decreasing scores ({} then {})",
                    self.metric.as_str(),
                    pair[0].score,
                    pair[1].score
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleWeight {
    pub metric: MetricKind,
    pub weight: f64,
    pub enabled: bool,
}

/// Fixed weights for the potential score. Independent of the module enable flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PotentialWeights {
    pub pf: f64,
    pub atv: f64,
    pub win_rate: f64,
}

impl Default for PotentialWeights {
    fn default() -> Self {
        Self {
            pf: 0.4,
            atv: 0.3,
            win_rate: 0.3,
        }
    }
}

impl PotentialWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, weight) in [("PF", self.pf), ("ATV", self.atv), ("WIN_RATE", self.win_rate)] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(KpiEngineError::ConfigError(format!(
                    "potential weight for {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        Ok(())
    }
}

pub fn validate_metric_configs(configs: &[MetricConfig]) -> Result<()> {
    let mut seen = HashSet::new();
    for config in configs {
        if !seen.insert(config.metric) {
            return Err(KpiEngineError::ConfigError(format!(
                "duplicate point table for {}",
                config.metric.as_str()
            )));
        }
        config.validate()?;
    }

    for metric in MetricKind::ALL {
        if !seen.contains(&metric) {
            return Err(KpiEngineError::ConfigError(format!(
                "missing point table for {}",
                metric.as_str()
            )));
        }
    }

    Ok(())
}

pub fn validate_module_weights(weights: &[ModuleWeight]) -> Result<()> {
    let mut seen = HashSet::new();
    for entry in weights {
        if !seen.insert(entry.metric) {
            return Err(KpiEngineError::ConfigError(format!(
                "duplicate weight entry for {}",
                entry.metric.as_str()
            )));
        }
        if !entry.weight.is_finite() || entry.weight < 0.0 {
            return Err(KpiEngineError::ConfigError(format!(
                "weight for {} must be a non-negative number, got {}",
                entry.metric.as_str(),
                entry.weight
            )));
        }
    }
    Ok(())
}

pub fn validate_tiers(tiers: &[TierDefinition]) -> Result<()> {
    if !tiers.iter().any(|t| t.min_score == 0.0) {
        return Err(KpiEngineError::ConfigError(
            "tier table needs a catch-all entry with min_score 0".to_string(),
        ));
    }

    let mut numbers = HashSet::new();
    for tier in tiers {
        if !tier.min_score.is_finite() || tier.min_score < 0.0 {
            return Err(KpiEngineError::ConfigError(format!(
                "tier {} has invalid min_score {}",
                tier.name, tier.min_score
            )));
        }
        if !numbers.insert(tier.tier) {
            return Err(KpiEngineError::ConfigError(format!(
                "tier number {} is used more than once",
                tier.tier
            )));
        }
    }

    // Tier 1 is the highest: numbers rise strictly as min_score falls.
    let mut ordered: Vec<&TierDefinition> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
    for pair in ordered.windows(2) {
        let (higher, lower) = (pair[0], pair[1]);
        if higher.min_score == lower.min_score {
            return Err(KpiEngineError::ConfigError(format!(
                "tiers {} and {} share min_score {}",
                higher.name, lower.name, higher.min_score
            )));
        }
        if higher.tier >= lower.tier {
            return Err(KpiEngineError::ConfigError(format!(
                "tier {} ({}) has a higher min_score than tier {} ({}) but is not ranked above it",
                higher.tier, higher.name, lower.tier, lower.name
            )));
        }
    }
    Ok(())
}

pub fn validate_potential_tiers(tiers: &[PotentialTierDefinition]) -> Result<()> {
    if !tiers.iter().any(|t| t.min_score == 0.0) {
        return Err(KpiEngineError::ConfigError(
            "potential tier table needs a catch-all entry with min_score 0".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for tier in tiers {
        if !tier.min_score.is_finite() || tier.min_score < 0.0 {
            return Err(KpiEngineError::ConfigError(format!(
                "potential tier {} has invalid min_score {}",
                tier.name, tier.min_score
            )));
        }
        if !names.insert(tier.name.as_str()) {
            return Err(KpiEngineError::ConfigError(format!(
                "potential tier {} is defined more than once",
                tier.name
            )));
        }
    }

    let mut ordered: Vec<&PotentialTierDefinition> = tiers.iter().collect();
    ordered.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
    for pair in ordered.windows(2) {
        if pair[0].min_score == pair[1].min_score {
            return Err(KpiEngineError::ConfigError(format!(
                "potential tiers {} and {} share min_score {}",
                pair[0].name, pair[1].name, pair[0].min_score
            )));
        }
    }
    Ok(())
}

fn table(metric: MetricKind, zero_fallback: ZeroFallback, points: &[(f64, f64)]) -> MetricConfig {
    MetricConfig {
        metric,
        points: points
            .iter()
            .map(|(value, score)| MetricPoint::new(*value, *score))
            .collect(),
        zero_fallback,
    }
}

pub fn default_metric_configs() -> Vec<MetricConfig> {
    vec![
        table(
            MetricKind::Da,
            ZeroFallback::Zero,
            &[(65.0, 5.0), (200.0, 10.0), (700.0, 25.0), (2000.0, 50.0), (5000.0, 75.0), (10000.0, 100.0)],
        ),
        table(
            MetricKind::Ggr,
            ZeroFallback::Dash,
            &[(50.0, 5.0), (150.0, 10.0), (500.0, 25.0), (1500.0, 50.0), (4000.0, 75.0), (8000.0, 100.0)],
        ),
        table(
            MetricKind::Pf,
            ZeroFallback::Zero,
            &[(1.0, 10.0), (2.0, 25.0), (4.0, 50.0), (8.0, 75.0), (12.0, 100.0)],
        ),
        table(
            MetricKind::Atv,
            ZeroFallback::Zero,
            &[(10.0, 10.0), (30.0, 25.0), (60.0, 50.0), (100.0, 75.0), (200.0, 100.0)],
        ),
        // Winrate in percent
        table(
            MetricKind::WinRate,
            ZeroFallback::Dash,
            &[(5.0, 10.0), (10.0, 25.0), (20.0, 50.0), (30.0, 75.0), (40.0, 100.0)],
        ),
    ]
}

pub fn default_module_weights() -> Vec<ModuleWeight> {
    vec![
        ModuleWeight { metric: MetricKind::Da, weight: 0.3, enabled: true },
        ModuleWeight { metric: MetricKind::Ggr, weight: 0.4, enabled: true },
        ModuleWeight { metric: MetricKind::Pf, weight: 0.15, enabled: true },
        ModuleWeight { metric: MetricKind::Atv, weight: 0.15, enabled: true },
        ModuleWeight { metric: MetricKind::WinRate, weight: 0.0, enabled: false },
    ]
}

pub fn default_tiers() -> Vec<TierDefinition> {
    [
        (1, "Super VIP", "VIP", 95.0),
        (2, "VIP", "VIP", 80.0),
        (3, "Gold", "Core", 65.0),
        (4, "Silver", "Core", 50.0),
        (5, "Bronze", "Core", 35.0),
        (6, "Casual", "Mass", 20.0),
        (7, "Regular", "Mass", 0.0),
    ]
    .iter()
    .map(|(tier, name, group, min_score)| TierDefinition {
        tier: *tier,
        name: name.to_string(),
        group: group.to_string(),
        min_score: *min_score,
    })
    .collect()
}

pub fn default_potential_tiers() -> Vec<PotentialTierDefinition> {
    [("High_P", 70.0), ("Mid_P", 40.0), ("ND_P", 0.0)]
        .iter()
        .map(|(name, min_score)| PotentialTierDefinition {
            name: name.to_string(),
            min_score: *min_score,
        })
        .collect()
}
