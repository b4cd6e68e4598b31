//! Snapshot container and its read-only projections.

use super::convert::{parse_amount, parse_change, parse_text};
use super::wire::{
    FIELD_CURRENCY, FIELD_DAILY_CHANGE, FIELD_PROFIT, FIELD_TOTAL_VALUE, PORTFOLIO_KEY,
};
use super::{Period, Portfolio};
use crate::error::ProjectionError;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// The last successfully fetched response.
///
/// Holds the parsed body verbatim. Only built through [`Snapshot::try_new`],
/// which checks that every projected field parses, so a snapshot is always
/// complete.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    body: Value,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn try_new(body: Value, fetched_at: DateTime<Utc>) -> Result<Self, ProjectionError> {
        let snapshot = Self { body, fetched_at };
        Portfolio::try_from(&snapshot)?;
        Ok(snapshot)
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Raw field inside the portfolio object.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(PORTFOLIO_KEY).and_then(|p| p.get(key))
    }

    pub fn total_value(&self) -> Result<Option<Decimal>, ProjectionError> {
        parse_amount(FIELD_TOTAL_VALUE, self.field(FIELD_TOTAL_VALUE))
    }

    pub fn currency(&self) -> Option<String> {
        parse_text(self.field(FIELD_CURRENCY))
    }

    pub fn daily_change(&self) -> Result<Option<f64>, ProjectionError> {
        parse_change(FIELD_DAILY_CHANGE, self.field(FIELD_DAILY_CHANGE))
    }

    pub fn profit(&self) -> Result<Option<Decimal>, ProjectionError> {
        parse_amount(FIELD_PROFIT, self.field(FIELD_PROFIT))
    }

    pub fn change(&self, period: Period) -> Result<Option<f64>, ProjectionError> {
        parse_change(period.field_key(), self.field(period.field_key()))
    }

    pub fn portfolio(&self) -> Result<Portfolio, ProjectionError> {
        Portfolio::try_from(self)
    }
}

// ─── Projections over an optional snapshot ───────────────────────────────────
//
// `None` in, `None` out: nothing fetched yet is "unknown", not an error.

pub fn total_value(snapshot: Option<&Snapshot>) -> Result<Option<Decimal>, ProjectionError> {
    snapshot.map_or(Ok(None), Snapshot::total_value)
}

pub fn currency(snapshot: Option<&Snapshot>) -> Option<String> {
    snapshot.and_then(Snapshot::currency)
}

pub fn daily_change(snapshot: Option<&Snapshot>) -> Result<Option<f64>, ProjectionError> {
    snapshot.map_or(Ok(None), Snapshot::daily_change)
}

pub fn profit(snapshot: Option<&Snapshot>) -> Result<Option<Decimal>, ProjectionError> {
    snapshot.map_or(Ok(None), Snapshot::profit)
}

pub fn change(snapshot: Option<&Snapshot>, period: Period) -> Result<Option<f64>, ProjectionError> {
    snapshot.map_or(Ok(None), |s| s.change(period))
}

pub fn portfolio(snapshot: Option<&Snapshot>) -> Result<Option<Portfolio>, ProjectionError> {
    snapshot.map(Snapshot::portfolio).transpose()
}
