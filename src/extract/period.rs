//! Month-level time references in Spanish questions.

use chrono::{Datelike, Duration, Local, NaiveDate};
use serde::Serialize;

const THIS_MONTH: &[&str] = &["este mes", "mes actual", "del mes"];
const LAST_MONTH: &[&str] = &["mes pasado", "último mes", "ultimo mes", "anterior"];

/// Month names in calendar order; the first one found in the question wins.
const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// "Last month" looks back a fixed number of days rather than stepping the
/// calendar month. Near month ends this can land in the current month again.
pub const LAST_MONTH_LOOKBACK_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    Month,
}

/// A resolved calendar month.
///
/// Only constructible from validated year/month numbers, so `value` is always
/// `YYYY-MM` and `filter_predicate` never carries caller text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodDescriptor {
    kind: PeriodKind,
    value: String,
    filter_predicate: String,
}

impl PeriodDescriptor {
    /// Build the descriptor for `year`-`month`. Returns `None` for an invalid month.
    pub fn month(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)?;
        let value = format!("{year:04}-{month:02}");
        let filter_predicate = format!("date(fecha, 'start of month') = '{value}-01'");
        Some(Self {
            kind: PeriodKind::Month,
            value,
            filter_predicate,
        })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let value = format!("{:04}-{:02}", date.year(), date.month());
        let filter_predicate = format!("date(fecha, 'start of month') = '{value}-01'");
        Self {
            kind: PeriodKind::Month,
            value,
            filter_predicate,
        }
    }

    /// Parse a caller-supplied `YYYY-MM` string.
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        Self::month(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn kind(&self) -> PeriodKind {
        self.kind
    }

    /// Canonical `YYYY-MM` value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Human-readable month filter over the transcript date column.
    pub fn filter_predicate(&self) -> &str {
        &self.filter_predicate
    }

    /// First day of the month as `YYYY-MM-01`, the value bound by query builders.
    pub fn month_start(&self) -> String {
        format!("{}-01", self.value)
    }
}

/// Resolve the first time reference in `question` relative to `today`.
///
/// Checked in order: "this month" phrases, "last month" phrases, month names.
pub fn resolve_period(question: &str, today: NaiveDate) -> Option<PeriodDescriptor> {
    let lower = question.to_lowercase();

    if THIS_MONTH.iter().any(|p| lower.contains(p)) {
        return Some(PeriodDescriptor::containing(today));
    }

    if LAST_MONTH.iter().any(|p| lower.contains(p)) {
        let past = today - Duration::days(LAST_MONTH_LOOKBACK_DAYS);
        return Some(PeriodDescriptor::containing(past));
    }

    MONTH_NAMES
        .iter()
        .position(|name| lower.contains(name))
        .and_then(|idx| PeriodDescriptor::month(today.year(), idx as u32 + 1))
}

/// [`resolve_period`] against the local calendar date.
pub fn resolve_period_now(question: &str) -> Option<PeriodDescriptor> {
    resolve_period(question, Local::now().date_naive())
}
