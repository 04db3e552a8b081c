use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{KpiEngineError, Period, ReportingWindow, Result};

/// One member's activity for one day in one currency/line, as exported by the warehouse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRow {
    pub date: NaiveDate,
    pub currency: String,
    pub line: String,
    pub member_id: String,
    #[serde(default)]
    pub deposit_amount: Decimal,
    #[serde(default)]
    pub deposit_cases: u64,
    #[serde(default)]
    pub withdraw_amount: Decimal,
    #[serde(default)]
    pub withdraw_cases: u64,
}

impl TransactionRow {
    pub fn validate(&self) -> Result<()> {
        if self.deposit_amount < Decimal::ZERO || self.withdraw_amount < Decimal::ZERO {
            return Err(KpiEngineError::InvalidInput(format!(
                "negative amount for member {} on {}",
                self.member_id, self.date
            )));
        }
        if self.member_id.trim().is_empty() {
            return Err(KpiEngineError::InvalidInput(format!(
                "row on {} has an empty member id",
                self.date
            )));
        }
        Ok(())
    }

    pub fn is_depositing(&self) -> bool {
        self.deposit_cases > 0
    }
}

/// Totals for one (currency, line, window) bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPeriodAggregate {
    pub currency: String,
    pub line: String,
    pub window: ReportingWindow,
    pub deposit_amount: Decimal,
    pub deposit_cases: u64,
    pub withdraw_amount: Decimal,
    pub withdraw_cases: u64,
    pub active_members: u64,
    pub unique_customers: u64,
    /// Operating adjustments subtracted from GGR to get net profit.
    #[serde(default)]
    pub adjustments: Decimal,
    /// Members active here that were also active in the prior window, when the
    /// fetch layer already knows it.
    #[serde(default)]
    pub retained_members: Option<u64>,
    #[serde(default)]
    pub active_member_ids: BTreeSet<String>,
    #[serde(default)]
    pub customer_ids: BTreeSet<String>,
}

impl RawPeriodAggregate {
    pub fn empty(currency: impl Into<String>, line: impl Into<String>, window: ReportingWindow) -> Self {
        Self {
            currency: currency.into(),
            line: line.into(),
            window,
            deposit_amount: Decimal::ZERO,
            deposit_cases: 0,
            withdraw_amount: Decimal::ZERO,
            withdraw_cases: 0,
            active_members: 0,
            unique_customers: 0,
            adjustments: Decimal::ZERO,
            retained_members: None,
            active_member_ids: BTreeSet::new(),
            customer_ids: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.deposit_amount < Decimal::ZERO {
            return Err(KpiEngineError::InvalidInput(format!(
                "negative deposit amount for {}/{} {}",
                self.currency, self.line, self.window
            )));
        }
        if self.withdraw_amount < Decimal::ZERO {
            return Err(KpiEngineError::InvalidInput(format!(
                "negative withdraw amount for {}/{} {}",
                self.currency, self.line, self.window
            )));
        }
        Ok(())
    }

    fn tracks_active_ids(&self) -> bool {
        self.active_member_ids.len() as u64 == self.active_members
    }

    fn tracks_customer_ids(&self) -> bool {
        self.customer_ids.len() as u64 == self.unique_customers
    }

    /// Adds another bucket into this one. Member counts are de-duplicated when
    /// both sides carry complete id sets, otherwise they are summed.
    pub fn merge(&mut self, other: &RawPeriodAggregate) {
        let dedup_active = self.tracks_active_ids() && other.tracks_active_ids();
        let dedup_customers = self.tracks_customer_ids() && other.tracks_customer_ids();

        self.deposit_amount += other.deposit_amount;
        self.deposit_cases += other.deposit_cases;
        self.withdraw_amount += other.withdraw_amount;
        self.withdraw_cases += other.withdraw_cases;
        self.adjustments += other.adjustments;

        self.retained_members = match (self.retained_members, other.retained_members) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };

        self.active_member_ids
            .extend(other.active_member_ids.iter().cloned());
        self.customer_ids.extend(other.customer_ids.iter().cloned());

        self.active_members = if dedup_active {
            self.active_member_ids.len() as u64
        } else {
            self.active_members + other.active_members
        };
        self.unique_customers = if dedup_customers {
            self.customer_ids.len() as u64
        } else {
            self.unique_customers + other.unique_customers
        };
    }
}

/// Full deposit history of one customer, independent of the report window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerHistory {
    pub customer_id: String,
    pub first_deposit: Period,
    pub active_months: u32,
    pub total_deposit: Decimal,
    pub total_withdraw: Decimal,
    pub deposit_cases: u64,
}

impl CustomerHistory {
    pub fn net_profit(&self) -> Decimal {
        self.total_deposit - self.total_withdraw
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LifetimeAggregate {
    pub as_of: Period,
    pub customers: Vec<CustomerHistory>,
}

impl LifetimeAggregate {
    pub fn empty(as_of: Period) -> Self {
        Self {
            as_of,
            customers: Vec::new(),
        }
    }
}

/// Every number a KPI report can show and compare month over month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum KpiMetric {
    DepositAmount,
    DepositCases,
    WithdrawAmount,
    WithdrawCases,
    ActiveMembers,
    UniqueCustomers,
    Ggr,
    NetProfit,
    AvgTransactionValue,
    PurchaseFrequency,
    Winrate,
    RetentionRate,
    ChurnRate,
    GrowthRate,
    CustomerLifetimeValue,
    AvgCustomerLifespan,
    CustomerMaturityIndex,
}

impl KpiMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            KpiMetric::DepositAmount => "deposit_amount",
            KpiMetric::DepositCases => "deposit_cases",
            KpiMetric::WithdrawAmount => "withdraw_amount",
            KpiMetric::WithdrawCases => "withdraw_cases",
            KpiMetric::ActiveMembers => "active_members",
            KpiMetric::UniqueCustomers => "unique_customers",
            KpiMetric::Ggr => "ggr",
            KpiMetric::NetProfit => "net_profit",
            KpiMetric::AvgTransactionValue => "avg_transaction_value",
            KpiMetric::PurchaseFrequency => "purchase_frequency",
            KpiMetric::Winrate => "winrate",
            KpiMetric::RetentionRate => "retention_rate",
            KpiMetric::ChurnRate => "churn_rate",
            KpiMetric::GrowthRate => "growth_rate",
            KpiMetric::CustomerLifetimeValue => "customer_lifetime_value",
            KpiMetric::AvgCustomerLifespan => "avg_customer_lifespan",
            KpiMetric::CustomerMaturityIndex => "customer_maturity_index",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedKpiSet {
    pub currency: String,
    pub line: String,
    pub window: ReportingWindow,

    // Pass-through totals
    pub deposit_amount: f64,
    pub deposit_cases: u64,
    pub withdraw_amount: f64,
    pub withdraw_cases: u64,
    pub active_members: u64,
    pub unique_customers: u64,

    // Derived
    pub ggr: f64,
    pub net_profit: f64,
    pub avg_transaction_value: f64,
    pub purchase_frequency: f64,
    pub winrate: f64,
    pub retention_rate: f64,
    pub churn_rate: f64,
    pub growth_rate: f64,

    // Lifetime
    pub customer_lifetime_value: f64,
    pub avg_customer_lifespan: f64,
    pub customer_maturity_index: f64,
}

impl DerivedKpiSet {
    pub fn value(&self, metric: KpiMetric) -> f64 {
        match metric {
            KpiMetric::DepositAmount => self.deposit_amount,
            KpiMetric::DepositCases => self.deposit_cases as f64,
            KpiMetric::WithdrawAmount => self.withdraw_amount,
            KpiMetric::WithdrawCases => self.withdraw_cases as f64,
            KpiMetric::ActiveMembers => self.active_members as f64,
            KpiMetric::UniqueCustomers => self.unique_customers as f64,
            KpiMetric::Ggr => self.ggr,
            KpiMetric::NetProfit => self.net_profit,
            KpiMetric::AvgTransactionValue => self.avg_transaction_value,
            KpiMetric::PurchaseFrequency => self.purchase_frequency,
            KpiMetric::Winrate => self.winrate,
            KpiMetric::RetentionRate => self.retention_rate,
            KpiMetric::ChurnRate => self.churn_rate,
            KpiMetric::GrowthRate => self.growth_rate,
            KpiMetric::CustomerLifetimeValue => self.customer_lifetime_value,
            KpiMetric::AvgCustomerLifespan => self.avg_customer_lifespan,
            KpiMetric::CustomerMaturityIndex => self.customer_maturity_index,
        }
    }

    pub fn metric_values(&self) -> BTreeMap<KpiMetric, f64> {
        ALL_KPI_METRICS
            .iter()
            .map(|metric| (*metric, self.value(*metric)))
            .collect()
    }
}

pub const ALL_KPI_METRICS: [KpiMetric; 17] = [
    KpiMetric::DepositAmount,
    KpiMetric::DepositCases,
    KpiMetric::WithdrawAmount,
    KpiMetric::WithdrawCases,
    KpiMetric::ActiveMembers,
    KpiMetric::UniqueCustomers,
    KpiMetric::Ggr,
    KpiMetric::NetProfit,
    KpiMetric::AvgTransactionValue,
    KpiMetric::PurchaseFrequency,
    KpiMetric::Winrate,
    KpiMetric::RetentionRate,
    KpiMetric::ChurnRate,
    KpiMetric::GrowthRate,
    KpiMetric::CustomerLifetimeValue,
    KpiMetric::AvgCustomerLifespan,
    KpiMetric::CustomerMaturityIndex,
];

/// Inputs to the tier scoring curves for one customer in one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomerMetrics {
    pub customer_id: String,
    pub deposit_amount: f64,
    pub ggr: f64,
    pub purchase_frequency: f64,
    pub avg_transaction_value: f64,
    /// Fraction, not percent.
    pub winrate: f64,
}
