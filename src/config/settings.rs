use serde::{Deserialize, Serialize};
use config::{Config, File};
use std::path::Path;

use super::tables::{
    self, MetricConfig, ModuleWeight, PotentialWeights,
};
use crate::models::{KpiEngineError, PotentialTierDefinition, Result, TierDefinition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub scoring: ScoringSettings,
    pub lifetime: LifetimeSettings,
    pub source: SourceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub metrics: Vec<MetricConfig>,
    pub weights: Vec<ModuleWeight>,
    pub potential_weights: PotentialWeights,
    pub tiers: Vec<TierDefinition>,
    pub potential_tiers: Vec<PotentialTierDefinition>,
}

/// Customer Maturity Index tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifetimeSettings {
    /// Active months at which the lifespan component saturates.
    pub maturity_horizon_months: u32,
    pub lifespan_weight: f64,
    pub consistency_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub fetch_timeout_seconds: u64,
    pub default_currency: Option<String>,
    pub default_line: Option<String>,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            metrics: tables::default_metric_configs(),
            weights: tables::default_module_weights(),
            potential_weights: PotentialWeights::default(),
            tiers: tables::default_tiers(),
            potential_tiers: tables::default_potential_tiers(),
        }
    }
}

impl Default for LifetimeSettings {
    fn default() -> Self {
        Self {
            maturity_horizon_months: 12,
            lifespan_weight: 0.5,
            consistency_weight: 0.5,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Operator KPI Engine".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
                environment: Environment::Development,
            },
            scoring: ScoringSettings::default(),
            lifetime: LifetimeSettings::default(),
            source: SourceSettings {
                fetch_timeout_seconds: 30,
                default_currency: None,
                default_line: None,
            },
        }
    }
}

impl ScoringSettings {
    pub fn validate(&self) -> Result<()> {
        tables::validate_metric_configs(&self.metrics)?;
        tables::validate_module_weights(&self.weights)?;
        self.potential_weights.validate()?;
        tables::validate_tiers(&self.tiers)?;
        tables::validate_potential_tiers(&self.potential_tiers)?;
        Ok(())
    }

    pub fn enabled_weight_total(&self) -> f64 {
        self.weights
            .iter()
            .filter(|w| w.enabled)
            .map(|w| w.weight)
            .sum()
    }
}

impl LifetimeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.maturity_horizon_months == 0 {
            return Err(KpiEngineError::ConfigError(
                "maturity_horizon_months must be greater than 0".to_string(),
            ));
        }
        if self.lifespan_weight < 0.0 || self.consistency_weight < 0.0 {
            return Err(KpiEngineError::ConfigError(
                "maturity index weights must be non-negative".to_string(),
            ));
        }
        if self.lifespan_weight + self.consistency_weight <= 0.0 {
            return Err(KpiEngineError::ConfigError(
                "maturity index weights must not both be 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    pub fn new() -> Result<Self> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("OPERATOR_KPI")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(s.try_deserialize()?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        Ok(s.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.lifetime.validate()?;

        if self.source.fetch_timeout_seconds == 0 {
            return Err(KpiEngineError::ConfigError(
                "fetch_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
