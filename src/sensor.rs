//! Sensors — one generic accessor driven by a description table.
//!
//! Each sensor reads the coordinator's published state and never writes to
//! it. Values stay visible after a failed refresh, but `available` drops to
//! false until the next success.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::coordinator::{CoordinatorState, RefreshHandle, RefreshOutcome};
use crate::domain::portfolio::{Period, Portfolio, Snapshot};
use crate::error::ProjectionError;

pub const UNIQUE_ID_PREFIX: &str = "myfund";
pub const MANUFACTURER: &str = "MyFund.pl";
pub const PERCENT_UNIT: &str = "%";

// ─── Description table ───────────────────────────────────────────────────────

/// Which value a sensor reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SensorKind {
    /// Total value as state, everything else as attributes.
    Portfolio,
    TotalValue,
    DailyChange,
    Profit,
    Change(Period),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorUnit {
    /// The snapshot's currency code.
    Currency,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Monetary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorDescription {
    pub kind: SensorKind,
    pub translation_key: &'static str,
    /// Appended to the entry's unique id; `None` for the aggregate sensor.
    pub unique_suffix: Option<&'static str>,
    pub unit: SensorUnit,
    pub device_class: Option<DeviceClass>,
}

const fn change(period: Period, key: &'static str) -> SensorDescription {
    SensorDescription {
        kind: SensorKind::Change(period),
        translation_key: key,
        unique_suffix: Some(key),
        unit: SensorUnit::Percent,
        device_class: None,
    }
}

/// Every sensor an entry exposes.
pub const SENSORS: [SensorDescription; 12] = [
    SensorDescription {
        kind: SensorKind::Portfolio,
        translation_key: "portfolio",
        unique_suffix: None,
        unit: SensorUnit::Currency,
        device_class: Some(DeviceClass::Monetary),
    },
    SensorDescription {
        kind: SensorKind::TotalValue,
        translation_key: "total_value",
        unique_suffix: Some("total_value"),
        unit: SensorUnit::Currency,
        device_class: Some(DeviceClass::Monetary),
    },
    SensorDescription {
        kind: SensorKind::DailyChange,
        translation_key: "daily_change",
        unique_suffix: Some("daily_change"),
        unit: SensorUnit::Percent,
        device_class: None,
    },
    SensorDescription {
        kind: SensorKind::Profit,
        translation_key: "profit",
        unique_suffix: Some("profit"),
        unit: SensorUnit::Currency,
        device_class: Some(DeviceClass::Monetary),
    },
    change(Period::Weekly, "weekly_change"),
    change(Period::TwoWeekly, "2weekly_change"),
    change(Period::Monthly, "monthly_change"),
    change(Period::ThreeMonthly, "3monthly_change"),
    change(Period::SixMonthly, "6monthly_change"),
    change(Period::Yearly, "yearly_change"),
    change(Period::MonthToDate, "mtd_change"),
    change(Period::YearToDate, "ytd_change"),
];

// ─── Readings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Amount(Decimal),
    Percent(f64),
}

impl SensorValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SensorValue::Amount(d) => d.to_f64(),
            SensorValue::Percent(f) => Some(*f),
        }
    }
}

/// What a sensor shows right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: Option<SensorValue>,
    pub unit: Option<String>,
    /// False whenever the last refresh failed or nothing was fetched yet.
    pub available: bool,
    pub attributes: BTreeMap<String, Value>,
}

/// Project one sensor's reading out of a published state.
pub fn read(description: &SensorDescription, state: &CoordinatorState) -> SensorReading {
    let snapshot = state.snapshot();
    let unit = match description.unit {
        SensorUnit::Percent => Some(PERCENT_UNIT.to_string()),
        SensorUnit::Currency => snapshot.and_then(Snapshot::currency),
    };

    let (value, attributes) = match snapshot {
        None => (None, BTreeMap::new()),
        Some(s) => match project(description.kind, s) {
            Ok(projected) => projected,
            Err(e) => {
                tracing::warn!(
                    sensor = description.translation_key,
                    "Cannot project sensor value: {}",
                    e
                );
                (None, BTreeMap::new())
            }
        },
    };

    SensorReading {
        value,
        unit,
        available: state.last_update_success,
        attributes,
    }
}

fn project(
    kind: SensorKind,
    snapshot: &Snapshot,
) -> Result<(Option<SensorValue>, BTreeMap<String, Value>), ProjectionError> {
    let value = match kind {
        SensorKind::Portfolio => {
            let portfolio = snapshot.portfolio()?;
            let value = portfolio.total_value.map(SensorValue::Amount);
            return Ok((value, portfolio_attributes(&portfolio)));
        }
        SensorKind::TotalValue => snapshot.total_value()?.map(SensorValue::Amount),
        SensorKind::DailyChange => snapshot.daily_change()?.map(SensorValue::Percent),
        SensorKind::Profit => snapshot.profit()?.map(SensorValue::Amount),
        SensorKind::Change(period) => snapshot.change(period)?.map(SensorValue::Percent),
    };
    Ok((value, BTreeMap::new()))
}

fn portfolio_attributes(p: &Portfolio) -> BTreeMap<String, Value> {
    let mut attrs = BTreeMap::new();
    attrs.insert("daily_change".to_string(), float_value(p.daily_change));
    attrs.insert(
        "profit".to_string(),
        float_value(p.profit.as_ref().and_then(Decimal::to_f64)),
    );
    for period in Period::ALL {
        attrs.insert(period.attribute_key().to_string(), float_value(p.change(period)));
    }
    attrs.insert(
        "currency".to_string(),
        p.currency.clone().map(Value::String).unwrap_or(Value::Null),
    );
    attrs
}

fn float_value(v: Option<f64>) -> Value {
    v.and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// ─── Sensor ──────────────────────────────────────────────────────────────────

/// Device all sensors of one entry are grouped under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifier: (String, String),
    pub name: String,
    pub manufacturer: String,
}

impl DeviceInfo {
    pub fn for_entry(entry_id: &str, wallet_name: &str) -> Self {
        Self {
            identifier: (UNIQUE_ID_PREFIX.to_string(), entry_id.to_string()),
            name: format!("MyFund {}", wallet_name),
            manufacturer: MANUFACTURER.to_string(),
        }
    }
}

/// One observable value bound to a coordinator.
#[derive(Debug, Clone)]
pub struct Sensor {
    description: SensorDescription,
    entry_id: String,
    device: DeviceInfo,
    handle: RefreshHandle,
    state_rx: watch::Receiver<CoordinatorState>,
}

impl Sensor {
    pub fn new(
        description: SensorDescription,
        entry_id: &str,
        device: DeviceInfo,
        handle: RefreshHandle,
    ) -> Self {
        let state_rx = handle.subscribe();
        Self {
            description,
            entry_id: entry_id.to_string(),
            device,
            handle,
            state_rx,
        }
    }

    pub fn unique_id(&self) -> String {
        match self.description.unique_suffix {
            Some(suffix) => format!("{}_{}_{}", UNIQUE_ID_PREFIX, self.entry_id, suffix),
            None => format!("{}_{}", UNIQUE_ID_PREFIX, self.entry_id),
        }
    }

    pub fn description(&self) -> &SensorDescription {
        &self.description
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn reading(&self) -> SensorReading {
        read(&self.description, &self.state_rx.borrow())
    }

    pub fn available(&self) -> bool {
        self.state_rx.borrow().last_update_success
    }

    /// Wait for the next published refresh. Returns false once the
    /// coordinator is gone.
    pub async fn changed(&mut self) -> bool {
        self.state_rx.changed().await.is_ok()
    }

    /// Ask the coordinator for a refresh now.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        self.handle.refresh().await
    }
}

/// Build the full sensor set for one entry.
pub fn build_sensors(entry_id: &str, wallet_name: &str, handle: &RefreshHandle) -> Vec<Sensor> {
    let device = DeviceInfo::for_entry(entry_id, wallet_name);
    SENSORS
        .iter()
        .map(|d| Sensor::new(*d, entry_id, device.clone(), handle.clone()))
        .collect()
}
