pub mod calculator;
pub mod classifier;
pub mod resolver;
pub mod weights;

pub use calculator::{CustomerScore, TierCalculator};
pub use classifier::TierClassifier;
pub use resolver::{resolve_points, scoring_input, ScoringTableResolver};
pub use weights::{compute_potential_score, compute_total_score, WeightedTierScorer};
