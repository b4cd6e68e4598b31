//! Endpoint and timing constants for the MyFund API.

use std::time::Duration;

/// Portfolio endpoint. Query parameters are appended per request.
pub const DEFAULT_API_URL: &str = "https://myfund.pl/API/v1/getPortfel.php";

/// Output format requested from the server.
pub const RESPONSE_FORMAT: &str = "json";

/// Hard bound on one request, connect through full body read.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shortest refresh cadence the server tolerates, in minutes.
pub const MIN_UPDATE_INTERVAL_MINUTES: u64 = 5;

pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u64 = 5;
