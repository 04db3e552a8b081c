//! Grouping of warehouse transaction rows into the aggregates the derivation
//! engine consumes.

use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    CustomerHistory, KpiFilter, LifetimeAggregate, Period, RawPeriodAggregate, ReportingWindow,
    TransactionRow,
};

fn add_row(agg: &mut RawPeriodAggregate, row: &TransactionRow) {
    agg.deposit_amount += row.deposit_amount;
    agg.deposit_cases += row.deposit_cases;
    agg.withdraw_amount += row.withdraw_amount;
    agg.withdraw_cases += row.withdraw_cases;

    agg.customer_ids.insert(row.member_id.clone());
    if row.is_depositing() {
        agg.active_member_ids.insert(row.member_id.clone());
    }

    agg.active_members = agg.active_member_ids.len() as u64;
    agg.unique_customers = agg.customer_ids.len() as u64;
}

fn in_scope<'a>(
    rows: &'a [TransactionRow],
    filter: &'a KpiFilter,
    window: &'a ReportingWindow,
) -> impl Iterator<Item = &'a TransactionRow> + 'a {
    rows.iter()
        .filter(move |r| filter.matches(&r.currency, &r.line) && window.contains(r.date))
}

/// One aggregate per (currency, line) seen in the window, ordered by key.
pub fn aggregate_buckets(
    rows: &[TransactionRow],
    filter: &KpiFilter,
    window: &ReportingWindow,
) -> Vec<RawPeriodAggregate> {
    let mut buckets: BTreeMap<(String, String), RawPeriodAggregate> = BTreeMap::new();

    for row in in_scope(rows, filter, window) {
        let key = (row.currency.to_uppercase(), row.line.clone());
        let agg = buckets.entry(key).or_insert_with(|| {
            RawPeriodAggregate::empty(row.currency.to_uppercase(), row.line.clone(), window.clone())
        });
        add_row(agg, row);
    }

    buckets.into_values().collect()
}

/// Everything in the filter and window folded into a single aggregate,
/// labelled with the filter's currency/line (or `ALL`).
pub fn aggregate_total(
    rows: &[TransactionRow],
    filter: &KpiFilter,
    window: &ReportingWindow,
) -> RawPeriodAggregate {
    let mut total = RawPeriodAggregate::empty(
        filter.currency_label(),
        filter.line_label(),
        window.clone(),
    );
    for bucket in aggregate_buckets(rows, filter, window) {
        total.merge(&bucket);
    }
    total
}

/// One aggregate per member, for tier scoring.
pub fn aggregate_customers(
    rows: &[TransactionRow],
    filter: &KpiFilter,
    window: &ReportingWindow,
) -> BTreeMap<String, RawPeriodAggregate> {
    let mut customers: BTreeMap<String, RawPeriodAggregate> = BTreeMap::new();

    for row in in_scope(rows, filter, window) {
        let agg = customers.entry(row.member_id.clone()).or_insert_with(|| {
            RawPeriodAggregate::empty(filter.currency_label(), filter.line_label(), window.clone())
        });
        add_row(agg, row);
    }

    customers
}

#[derive(Default)]
struct HistoryBuilder {
    deposit_months: BTreeSet<Period>,
    total_deposit: Decimal,
    total_withdraw: Decimal,
    deposit_cases: u64,
}

/// Per-customer history from every row up to the last day of `window`,
/// regardless of where the window starts. Members who never deposited are
/// left out.
pub fn build_lifetime(rows: &[TransactionRow], filter: &KpiFilter, window: &ReportingWindow) -> LifetimeAggregate {
    let as_of = window.end_period();
    let cutoff = window.end_date();
    let mut builders: BTreeMap<String, HistoryBuilder> = BTreeMap::new();

    for row in rows.iter().filter(|r| filter.matches(&r.currency, &r.line)) {
        let period = Period::from_date(row.date);
        let after_cutoff = match cutoff {
            Some(end) => row.date > end,
            None => period > as_of,
        };
        if after_cutoff {
            continue;
        }

        let builder = builders.entry(row.member_id.clone()).or_default();
        builder.total_deposit += row.deposit_amount;
        builder.total_withdraw += row.withdraw_amount;
        builder.deposit_cases += row.deposit_cases;
        if row.is_depositing() {
            builder.deposit_months.insert(period);
        }
    }

    let customers = builders
        .into_iter()
        .filter_map(|(customer_id, b)| {
            let first_deposit = *b.deposit_months.iter().next()?;
            Some(CustomerHistory {
                customer_id,
                first_deposit,
                active_months: b.deposit_months.len() as u32,
                total_deposit: b.total_deposit,
                total_withdraw: b.total_withdraw,
                deposit_cases: b.deposit_cases,
            })
        })
        .collect();

    LifetimeAggregate { as_of, customers }
}
