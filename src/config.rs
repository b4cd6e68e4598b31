//! Entry configuration — credentials, refresh interval, data/options merge.

use crate::error::ConfigError;
use crate::network::{DEFAULT_UPDATE_INTERVAL_MINUTES, MIN_UPDATE_INTERVAL_MINUTES};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const KEY_WALLET_NAME: &str = "wallet_name";
pub const KEY_API_KEY: &str = "api_key";
pub const KEY_UPDATE_INTERVAL: &str = "update_interval";

// ─── UpdateInterval ──────────────────────────────────────────────────────────

/// Refresh cadence in whole minutes. Never below five.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct UpdateInterval(u64);

impl UpdateInterval {
    pub fn minutes(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0 * 60)
    }
}

impl Default for UpdateInterval {
    fn default() -> Self {
        Self(DEFAULT_UPDATE_INTERVAL_MINUTES)
    }
}

impl TryFrom<u64> for UpdateInterval {
    type Error = ConfigError;

    fn try_from(minutes: u64) -> Result<Self, Self::Error> {
        if minutes < MIN_UPDATE_INTERVAL_MINUTES {
            return Err(ConfigError::IntervalTooShort {
                min: MIN_UPDATE_INTERVAL_MINUTES,
                got: minutes,
            });
        }
        Ok(Self(minutes))
    }
}

impl From<UpdateInterval> for u64 {
    fn from(interval: UpdateInterval) -> Self {
        interval.0
    }
}

impl std::fmt::Display for UpdateInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}min", self.0)
    }
}

// ─── Credentials ─────────────────────────────────────────────────────────────

/// Wallet name + API key. Fixed for the lifetime of a coordinator.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub wallet_name: String,
    pub api_key: String,
}

impl Credentials {
    pub fn new(wallet_name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            wallet_name: wallet_name.into(),
            api_key: api_key.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wallet_name.trim().is_empty() {
            return Err(ConfigError::EmptyWalletName);
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("wallet_name", &self.wallet_name)
            .field("api_key", &"*".repeat(self.api_key.len()))
            .finish()
    }
}

// ─── EntryConfig ─────────────────────────────────────────────────────────────

/// Everything needed to activate one portfolio entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryConfig {
    pub entry_id: String,
    pub credentials: Credentials,
    pub update_interval: UpdateInterval,
}

/// The reconfigurable part of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    pub update_interval: UpdateInterval,
}

impl EntryConfig {
    pub fn new(
        entry_id: impl Into<String>,
        credentials: Credentials,
        update_interval: UpdateInterval,
    ) -> Self {
        Self {
            entry_id: entry_id.into(),
            credentials,
            update_interval,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.credentials.validate()
    }

    /// Build from stored entry `data` and `options` objects.
    ///
    /// The interval is read from `options`, then `data`, then defaults to five
    /// minutes. Numeric inputs may be floats (`15.0`); fractional minutes are
    /// rejected.
    pub fn from_entry(
        entry_id: impl Into<String>,
        data: &Value,
        options: &Value,
    ) -> Result<Self, ConfigError> {
        let wallet_name = required_str(data, KEY_WALLET_NAME)?;
        let api_key = required_str(data, KEY_API_KEY)?;

        let update_interval = match interval_field(options)? {
            Some(interval) => interval,
            None => interval_field(data)?.unwrap_or_default(),
        };

        let config = Self {
            entry_id: entry_id.into(),
            credentials: Credentials::new(wallet_name, api_key),
            update_interval,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_options(&self, options: EntryOptions) -> Self {
        Self {
            update_interval: options.update_interval,
            ..self.clone()
        }
    }
}

fn required_str(obj: &Value, key: &'static str) -> Result<String, ConfigError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
        }),
        None => Err(ConfigError::Missing(key)),
    }
}

/// `None` when the key is absent, null or zero (an unset number selector).
fn interval_field(obj: &Value) -> Result<Option<UpdateInterval>, ConfigError> {
    let raw = match obj.get(KEY_UPDATE_INTERVAL) {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };

    let invalid = || ConfigError::InvalidValue {
        key: KEY_UPDATE_INTERVAL,
        value: raw.to_string(),
    };

    let minutes = match raw {
        Value::Number(n) => match n.as_u64() {
            Some(m) => m,
            None => {
                let f = n.as_f64().ok_or_else(invalid)?;
                if f < 0.0 || f.fract() != 0.0 {
                    return Err(invalid());
                }
                f as u64
            }
        },
        Value::String(s) => s.trim().parse::<u64>().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if minutes == 0 {
        return Ok(None);
    }
    UpdateInterval::try_from(minutes).map(Some)
}
