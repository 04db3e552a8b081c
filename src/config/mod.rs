pub mod settings;
pub mod tables;

pub use settings::{AppSettings, Environment, LifetimeSettings, ScoringSettings, Settings, SourceSettings};
pub use tables::{MetricConfig, MetricPoint, ModuleWeight, PotentialWeights, ZeroFallback};
