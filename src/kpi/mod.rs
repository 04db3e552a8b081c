pub mod aggregation;
pub mod comparator;
pub mod derivation;
pub mod lifetime;
pub mod math;

pub use comparator::{compare, compare_sets, compare_values};
pub use derivation::KpiDerivationEngine;
pub use lifetime::{lifetime_metrics, LifetimeMetrics};
pub use math::safe_divide;
