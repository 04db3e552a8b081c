use crate::{
    config::{tables::validate_module_weights, ModuleWeight, PotentialWeights},
    models::{MetricKind, MetricScores, Result, ScoreValue},
};

/// Combines per-metric points into the total and potential scores.
#[derive(Debug, Clone)]
pub struct WeightedTierScorer {
    weights: Vec<ModuleWeight>,
    potential_weights: PotentialWeights,
}

impl WeightedTierScorer {
    pub fn new(weights: Vec<ModuleWeight>, potential_weights: PotentialWeights) -> Result<Self> {
        validate_module_weights(&weights)?;
        potential_weights.validate()?;

        Ok(Self {
            weights,
            potential_weights,
        })
    }

    pub fn total_score(&self, scores: &MetricScores) -> f64 {
        compute_total_score(scores, &self.weights)
    }

    pub fn potential_score(&self, scores: &MetricScores) -> f64 {
        let get = |kind| scores.get(&kind).copied().unwrap_or(ScoreValue::Dash);
        compute_potential_score(
            get(MetricKind::Pf),
            get(MetricKind::Atv),
            get(MetricKind::WinRate),
            &self.potential_weights,
        )
    }

    pub fn enabled_weight_total(&self) -> f64 {
        self.weights.iter().filter(|w| w.enabled).map(|w| w.weight).sum()
    }

    pub fn weights(&self) -> &[ModuleWeight] {
        &self.weights
    }
}

/// Sum of weight × points over enabled metrics. Weights are used as given,
/// and dashed or missing scores contribute nothing.
pub fn compute_total_score(scores: &MetricScores, weights: &[ModuleWeight]) -> f64 {
    weights
        .iter()
        .filter(|w| w.enabled)
        .filter_map(|w| {
            scores
                .get(&w.metric)
                .and_then(ScoreValue::points)
                .map(|points| w.weight * points)
        })
        .sum()
}

/// Always PF, ATV and WIN_RATE, whatever the module enable flags say.
pub fn compute_potential_score(
    pf: ScoreValue,
    atv: ScoreValue,
    win_rate: ScoreValue,
    weights: &PotentialWeights,
) -> f64 {
    [(pf, weights.pf), (atv, weights.atv), (win_rate, weights.win_rate)]
        .iter()
        .filter_map(|(score, weight)| score.points().map(|p| p * weight))
        .sum()
}
