use serde::{Deserialize, Serialize};

use super::math::{ratio, to_f64};
use crate::{
    config::LifetimeSettings,
    models::{CustomerHistory, LifetimeAggregate, Period},
};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LifetimeMetrics {
    pub customer_lifetime_value: f64,
    pub avg_customer_lifespan: f64,
    pub customer_maturity_index: f64,
}

/// Maturity of one customer in [0, 1]: how long they have been depositing
/// (saturating at the horizon) blended with how consistently they deposited
/// since their first deposit.
pub fn customer_maturity(history: &CustomerHistory, as_of: Period, settings: &LifetimeSettings) -> f64 {
    let active = history.active_months as f64;
    let elapsed = history.first_deposit.months_until(&as_of) as f64;

    let lifespan_factor = ratio(active, settings.maturity_horizon_months as f64).min(1.0);
    let consistency = ratio(active, elapsed).min(1.0);

    ratio(
        settings.lifespan_weight * lifespan_factor + settings.consistency_weight * consistency,
        settings.lifespan_weight + settings.consistency_weight,
    )
}

pub fn lifetime_metrics(aggregate: &LifetimeAggregate, settings: &LifetimeSettings) -> LifetimeMetrics {
    let customers = &aggregate.customers;
    if customers.is_empty() {
        return LifetimeMetrics::default();
    }
    let count = customers.len() as f64;

    let total_profit: f64 = customers.iter().map(|c| to_f64(c.net_profit())).sum();
    let total_months: f64 = customers.iter().map(|c| c.active_months as f64).sum();
    let total_maturity: f64 = customers
        .iter()
        .map(|c| customer_maturity(c, aggregate.as_of, settings))
        .sum();

    LifetimeMetrics {
        customer_lifetime_value: ratio(total_profit, count),
        avg_customer_lifespan: ratio(total_months, count),
        customer_maturity_index: ratio(total_maturity, count),
    }
}
