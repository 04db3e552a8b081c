pub mod models;
pub mod config;
pub mod kpi;
pub mod scoring;
pub mod source;
pub mod telemetry;

pub use models::{DerivedKpiSet, KpiEngineError, KpiFilter, Period, ReportingWindow, Result, TierAssignment};
pub use config::Settings;
pub use kpi::KpiDerivationEngine;
pub use scoring::TierCalculator;
pub use source::KpiService;

// Re-export commonly used types
pub use rust_decimal::Decimal;
