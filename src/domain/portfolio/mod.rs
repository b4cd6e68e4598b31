//! Portfolio domain — snapshot, period changes, typed projections.

pub mod convert;
pub mod state;
pub mod wire;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use state::Snapshot;

// ─── Period ──────────────────────────────────────────────────────────────────

/// Period-over-period percentage change reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Weekly,
    TwoWeekly,
    Monthly,
    ThreeMonthly,
    SixMonthly,
    Yearly,
    MonthToDate,
    YearToDate,
}

impl Period {
    pub const ALL: [Period; 8] = [
        Period::Weekly,
        Period::TwoWeekly,
        Period::Monthly,
        Period::ThreeMonthly,
        Period::SixMonthly,
        Period::Yearly,
        Period::MonthToDate,
        Period::YearToDate,
    ];

    /// Key inside the `portfel` object.
    pub fn field_key(&self) -> &'static str {
        match self {
            Period::Weekly => "zmianaW",
            Period::TwoWeekly => "zmiana2W",
            Period::Monthly => "zmianaM",
            Period::ThreeMonthly => "zmiana3M",
            Period::SixMonthly => "zmiana6M",
            Period::Yearly => "zmianaR",
            Period::MonthToDate => "zmianaMdD",
            Period::YearToDate => "zmianaRdD",
        }
    }

    /// Attribute / translation key, e.g. `weekly_change`.
    pub fn attribute_key(&self) -> &'static str {
        match self {
            Period::Weekly => "weekly_change",
            Period::TwoWeekly => "2weekly_change",
            Period::Monthly => "monthly_change",
            Period::ThreeMonthly => "3monthly_change",
            Period::SixMonthly => "6monthly_change",
            Period::Yearly => "yearly_change",
            Period::MonthToDate => "mtd_change",
            Period::YearToDate => "ytd_change",
        }
    }
}

// ─── Portfolio ───────────────────────────────────────────────────────────────

/// Every projected value of one snapshot.
///
/// Fields are `None` when the server omitted them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub total_value: Option<Decimal>,
    pub currency: Option<String>,
    pub daily_change: Option<f64>,
    pub profit: Option<Decimal>,
    pub weekly_change: Option<f64>,
    pub two_weekly_change: Option<f64>,
    pub monthly_change: Option<f64>,
    pub three_monthly_change: Option<f64>,
    pub six_monthly_change: Option<f64>,
    pub yearly_change: Option<f64>,
    pub month_to_date_change: Option<f64>,
    pub year_to_date_change: Option<f64>,
}

impl Portfolio {
    pub fn change(&self, period: Period) -> Option<f64> {
        match period {
            Period::Weekly => self.weekly_change,
            Period::TwoWeekly => self.two_weekly_change,
            Period::Monthly => self.monthly_change,
            Period::ThreeMonthly => self.three_monthly_change,
            Period::SixMonthly => self.six_monthly_change,
            Period::Yearly => self.yearly_change,
            Period::MonthToDate => self.month_to_date_change,
            Period::YearToDate => self.year_to_date_change,
        }
    }
}
