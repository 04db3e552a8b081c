use crate::{
    config::ScoringSettings,
    models::{
        CustomerMetrics, KpiFilter, MetricKind, MetricScores, Period, Result, TierAssignment,
        TierClassification,
    },
    scoring::{ScoringTableResolver, TierClassifier, WeightedTierScorer},
};

/// Resolver → scorer → classifier, for one customer at a time.
#[derive(Debug, Clone)]
pub struct TierCalculator {
    resolver: ScoringTableResolver,
    scorer: WeightedTierScorer,
    classifier: TierClassifier,
}

/// Intermediate numbers of one customer's classification.
#[derive(Debug, Clone)]
pub struct CustomerScore {
    pub scores: MetricScores,
    pub total_score: f64,
    pub potential_score: f64,
    pub classification: TierClassification,
}

impl TierCalculator {
    pub fn new(
        resolver: ScoringTableResolver,
        scorer: WeightedTierScorer,
        classifier: TierClassifier,
    ) -> Self {
        Self {
            resolver,
            scorer,
            classifier,
        }
    }

    pub fn from_settings(settings: &ScoringSettings) -> Result<Self> {
        let resolver = ScoringTableResolver::new(settings.metrics.clone())?;
        let scorer = WeightedTierScorer::new(
            settings.weights.clone(),
            settings.potential_weights.clone(),
        )?;
        let classifier = TierClassifier::new(
            settings.tiers.clone(),
            settings.potential_tiers.clone(),
        )?;

        Ok(Self::new(resolver, scorer, classifier))
    }

    pub fn score_customer(&self, metrics: &CustomerMetrics) -> CustomerScore {
        let scores = self.resolver.score_all(metrics);
        let total_score = self.scorer.total_score(&scores);
        let potential_score = self.scorer.potential_score(&scores);
        let classification = self.classifier.classify(total_score, potential_score);

        CustomerScore {
            scores,
            total_score,
            potential_score,
            classification,
        }
    }

    pub fn assign(
        &self,
        metrics: &CustomerMetrics,
        filter: &KpiFilter,
        period: Period,
    ) -> TierAssignment {
        let score = self.score_customer(metrics);

        TierAssignment {
            customer_id: metrics.customer_id.clone(),
            filter: filter.clone(),
            period,
            scores: score.scores,
            total_score: score.total_score,
            potential_score: score.potential_score,
            classification: score.classification,
        }
    }

    pub fn assign_batch(
        &self,
        customers: &[CustomerMetrics],
        filter: &KpiFilter,
        period: Period,
    ) -> Vec<TierAssignment> {
        customers
            .iter()
            .map(|metrics| self.assign(metrics, filter, period))
            .collect()
    }

    pub fn score_metric(&self, metric: MetricKind, value: f64) -> crate::models::ScoreValue {
        self.resolver.score(metric, value)
    }

    pub fn resolver(&self) -> &ScoringTableResolver {
        &self.resolver
    }

    pub fn scorer(&self) -> &WeightedTierScorer {
        &self.scorer
    }

    pub fn classifier(&self) -> &TierClassifier {
        &self.classifier
    }
}
