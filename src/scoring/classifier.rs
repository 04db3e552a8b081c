use crate::{
    config::tables::{validate_potential_tiers, validate_tiers},
    models::{PotentialTierDefinition, Result, TierClassification, TierDefinition},
};

/// First-match classification over tier tables sorted by descending minimum score.
///
/// Both tables are checked for a zero catch-all when the classifier is built,
/// so `classify` always lands on an entry.
#[derive(Debug, Clone)]
pub struct TierClassifier {
    tiers: Vec<TierDefinition>,
    potential_tiers: Vec<PotentialTierDefinition>,
}

impl TierClassifier {
    pub fn new(
        mut tiers: Vec<TierDefinition>,
        mut potential_tiers: Vec<PotentialTierDefinition>,
    ) -> Result<Self> {
        validate_tiers(&tiers)?;
        validate_potential_tiers(&potential_tiers)?;

        tiers.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        potential_tiers.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));

        Ok(Self {
            tiers,
            potential_tiers,
        })
    }

    pub fn classify(&self, total_score: f64, potential_score: f64) -> TierClassification {
        let tier = self.tier_for(total_score);
        let potential = self.potential_tier_for(potential_score);

        TierClassification {
            tier: tier.tier,
            tier_name: tier.name.clone(),
            tier_group: tier.group.clone(),
            potential_tier: potential.name.clone(),
        }
    }

    pub fn tier_for(&self, score: f64) -> &TierDefinition {
        self.tiers
            .iter()
            .find(|t| t.min_score <= score)
            .unwrap_or(&self.tiers[self.tiers.len() - 1])
    }

    pub fn potential_tier_for(&self, score: f64) -> &PotentialTierDefinition {
        self.potential_tiers
            .iter()
            .find(|t| t.min_score <= score)
            .unwrap_or(&self.potential_tiers[self.potential_tiers.len() - 1])
    }

    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    pub fn potential_tiers(&self) -> &[PotentialTierDefinition] {
        &self.potential_tiers
    }
}
