use super::{
    lifetime::{lifetime_metrics, LifetimeMetrics},
    math::{ratio, to_f64},
};
use crate::{
    config::LifetimeSettings,
    models::{CustomerMetrics, DerivedKpiSet, LifetimeAggregate, RawPeriodAggregate},
};

/// Derives KPI sets from raw aggregates. Every ratio is guarded, so no output
/// field is ever NaN or infinite.
#[derive(Debug, Clone, Default)]
pub struct KpiDerivationEngine {
    lifetime: LifetimeSettings,
}

impl KpiDerivationEngine {
    pub fn new(lifetime: LifetimeSettings) -> Self {
        Self { lifetime }
    }

    /// Derives one bucket. `prior` drives retention, churn and growth; without
    /// it those stay 0. `lifetime` must be the unwindowed history for the same
    /// currency/line.
    pub fn derive(
        &self,
        current: &RawPeriodAggregate,
        prior: Option<&RawPeriodAggregate>,
        lifetime: Option<&LifetimeAggregate>,
    ) -> DerivedKpiSet {
        let deposit_amount = to_f64(current.deposit_amount);
        let withdraw_amount = to_f64(current.withdraw_amount);
        let ggr = ggr(deposit_amount, withdraw_amount);

        let (retention_rate, churn_rate, growth_rate) = match prior {
            Some(prior) => {
                let retention = retention_rate(retained_members(current, prior), prior.active_members);
                (
                    retention,
                    churn_rate(retention, prior.active_members),
                    growth_rate(current.active_members, prior.active_members),
                )
            }
            None => (0.0, 0.0, 0.0),
        };

        let life = lifetime
            .map(|agg| lifetime_metrics(agg, &self.lifetime))
            .unwrap_or_default();

        DerivedKpiSet {
            currency: current.currency.clone(),
            line: current.line.clone(),
            window: current.window.clone(),
            deposit_amount,
            deposit_cases: current.deposit_cases,
            withdraw_amount,
            withdraw_cases: current.withdraw_cases,
            active_members: current.active_members,
            unique_customers: current.unique_customers,
            ggr,
            net_profit: net_profit(ggr, to_f64(current.adjustments)),
            avg_transaction_value: average_transaction_value(deposit_amount, current.deposit_cases),
            purchase_frequency: purchase_frequency(current.deposit_cases, current.active_members),
            winrate: winrate(ggr, deposit_amount),
            retention_rate,
            churn_rate,
            growth_rate,
            customer_lifetime_value: life.customer_lifetime_value,
            avg_customer_lifespan: life.avg_customer_lifespan,
            customer_maturity_index: life.customer_maturity_index,
        }
    }

    pub fn lifetime_metrics(&self, lifetime: &LifetimeAggregate) -> LifetimeMetrics {
        lifetime_metrics(lifetime, &self.lifetime)
    }

    /// Scoring inputs for a single customer's aggregate.
    pub fn customer_metrics(&self, customer_id: &str, aggregate: &RawPeriodAggregate) -> CustomerMetrics {
        let deposit_amount = to_f64(aggregate.deposit_amount);
        let ggr = ggr(deposit_amount, to_f64(aggregate.withdraw_amount));

        CustomerMetrics {
            customer_id: customer_id.to_string(),
            deposit_amount,
            ggr,
            purchase_frequency: purchase_frequency(aggregate.deposit_cases, aggregate.active_members),
            avg_transaction_value: average_transaction_value(deposit_amount, aggregate.deposit_cases),
            winrate: winrate(ggr, deposit_amount),
        }
    }
}

pub fn ggr(deposit_amount: f64, withdraw_amount: f64) -> f64 {
    deposit_amount - withdraw_amount
}

/// Equal to GGR unless operating adjustments are supplied.
pub fn net_profit(ggr: f64, adjustments: f64) -> f64 {
    ggr - adjustments
}

pub fn average_transaction_value(deposit_amount: f64, deposit_cases: u64) -> f64 {
    ratio(deposit_amount, deposit_cases as f64)
}

pub fn purchase_frequency(deposit_cases: u64, active_members: u64) -> f64 {
    ratio(deposit_cases as f64, active_members as f64)
}

pub fn winrate(ggr: f64, deposit_amount: f64) -> f64 {
    ratio(ggr, deposit_amount)
}

/// Members of `current` that were also active in `prior`, capped at the prior count.
pub fn retained_members(current: &RawPeriodAggregate, prior: &RawPeriodAggregate) -> u64 {
    let retained = current.retained_members.unwrap_or_else(|| {
        current
            .active_member_ids
            .intersection(&prior.active_member_ids)
            .count() as u64
    });
    retained.min(prior.active_members)
}

pub fn retention_rate(retained: u64, prior_active: u64) -> f64 {
    ratio(retained as f64, prior_active as f64).clamp(0.0, 1.0)
}

/// 1 − retention, bounded to [0, 1].
///
/// An empty prior base gives 0, not 1: with no prior members there is nobody
/// to lose, so the undefined ratio resolves to 0 like every other guard here.
pub fn churn_rate(retention: f64, prior_active: u64) -> f64 {
    if prior_active == 0 {
        return 0.0;
    }
    (1.0 - retention).clamp(0.0, 1.0)
}

pub fn growth_rate(current_active: u64, prior_active: u64) -> f64 {
    ratio(current_active as f64 - prior_active as f64, prior_active as f64)
}
