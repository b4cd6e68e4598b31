//! # MyFund portfolio poller
//!
//! Periodically fetches one MyFund.pl wallet summary, keeps the last good
//! response, and exposes typed sensor readings over it.
//!
//! ## Architecture
//!
//! The crate is organized in layers:
//!
//! 1. **Core** — Config, errors, the portfolio domain slice (wire fields,
//!    conversions, snapshot projections)
//! 2. **HTTP API** — `MyFundHttp`, one request per refresh, no retries
//! 3. **Coordinator** — Background timer, in-flight deduplication, `watch`
//!    publication of the snapshot
//! 4. **Entry** — Activation, reconfiguration, unload, and the sensor set
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use myfund_portfolio::prelude::*;
//!
//! let config = EntryConfig::new("main", Credentials::new("Emerytura", "key"), UpdateInterval::default());
//! let entry = PortfolioEntry::setup(config, MyFundHttp::new()?).await?;
//!
//! for sensor in entry.sensors() {
//!     println!("{} = {:?}", sensor.unique_id(), sensor.reading().value);
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Domain modules (vertical slices): types, wire fields, conversions, state.
pub mod domain;

/// Unified error types.
pub mod error;

/// Endpoint and timing constants.
pub mod network;

/// Credentials, update interval and entry configuration.
pub mod config;

// ── Layer 2: HTTP API ────────────────────────────────────────────────────────

/// HTTP client for the portfolio endpoint.
pub mod http;

// ── Layer 3: Coordinator ─────────────────────────────────────────────────────

/// Scheduled, deduplicated refreshes of the cached snapshot.
pub mod coordinator;

// ── Layer 4: Entry ───────────────────────────────────────────────────────────

/// Sensor descriptions and readings.
pub mod sensor;

/// `PortfolioEntry` — the primary entry point.
pub mod entry;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Config
    pub use crate::config::{Credentials, EntryConfig, EntryOptions, UpdateInterval};

    // Domain types
    pub use crate::domain::portfolio::{Period, Portfolio, Snapshot};

    // Errors
    pub use crate::error::{
        ApiError, ConfigError, FailureKind, ProjectionError, RefreshFailure, SetupError,
    };

    // Network
    pub use crate::network::DEFAULT_API_URL;

    // HTTP client
    pub use crate::http::{MyFundHttp, MyFundHttpBuilder, PortfolioSource};

    // Coordinator
    pub use crate::coordinator::{
        Coordinator, CoordinatorState, RefreshHandle, RefreshOutcome, RefreshState,
    };

    // Sensors + entry
    pub use crate::entry::{validate_credentials, PortfolioEntry};
    pub use crate::sensor::{DeviceInfo, Sensor, SensorReading, SensorValue, SENSORS};
}
