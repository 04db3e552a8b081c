use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{KpiEngineError, Result};

/// A calendar month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(KpiEngineError::InvalidInput(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month immediately before this one. January rolls back to December.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Number of months from `self` to `other`, counting both ends.
    /// Returns 0 when `other` is earlier than `self`.
    pub fn months_until(&self, other: &Period) -> u32 {
        let start = self.year as i64 * 12 + (self.month as i64 - 1);
        let end = other.year as i64 * 12 + (other.month as i64 - 1);
        if end < start {
            0
        } else {
            (end - start + 1) as u32
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.first_day()?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The slice of time a report covers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportingWindow {
    Month(Period),
    Range { start: NaiveDate, end: NaiveDate },
}

impl ReportingWindow {
    pub fn month(year: i32, month: u32) -> Result<Self> {
        Ok(ReportingWindow::Month(Period::new(year, month)?))
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(KpiEngineError::InvalidInput(format!(
                "date range end {} is before start {}",
                end, start
            )));
        }
        Ok(ReportingWindow::Range { start, end })
    }

    /// Previous calendar month for a month window; a range is shifted back one calendar month.
    pub fn prior(&self) -> Option<Self> {
        match self {
            ReportingWindow::Month(period) => Some(ReportingWindow::Month(period.previous())),
            ReportingWindow::Range { start, end } => Some(ReportingWindow::Range {
                start: start.checked_sub_months(Months::new(1))?,
                end: end.checked_sub_months(Months::new(1))?,
            }),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        match self {
            ReportingWindow::Month(period) => period.contains(date),
            ReportingWindow::Range { start, end } => date >= *start && date <= *end,
        }
    }

    /// Last day covered by the window. Lifetime history is cut off here.
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            ReportingWindow::Month(period) => period.last_day(),
            ReportingWindow::Range { end, .. } => Some(*end),
        }
    }

    /// Month in which the window ends.
    pub fn end_period(&self) -> Period {
        match self {
            ReportingWindow::Month(period) => *period,
            ReportingWindow::Range { end, .. } => Period::from_date(*end),
        }
    }
}

impl fmt::Display for ReportingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportingWindow::Month(period) => write!(f, "{}", period),
            ReportingWindow::Range { start, end } => write!(f, "{}..{}", start, end),
        }
    }
}

/// Currency and brand line slicing. `None` means all.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KpiFilter {
    pub currency: Option<String>,
    pub line: Option<String>,
}

impl KpiFilter {
    pub fn new(currency: Option<String>, line: Option<String>) -> Self {
        Self {
            currency: currency.map(|c| c.to_uppercase()),
            line,
        }
    }

    pub fn matches(&self, currency: &str, line: &str) -> bool {
        let currency_ok = self
            .currency
            .as_deref()
            .map_or(true, |c| c.eq_ignore_ascii_case(currency));
        let line_ok = self.line.as_deref().map_or(true, |l| l == line);
        currency_ok && line_ok
    }

    pub fn currency_label(&self) -> &str {
        self.currency.as_deref().unwrap_or("ALL")
    }

    pub fn line_label(&self) -> &str {
        self.line.as_deref().unwrap_or("ALL")
    }
}
