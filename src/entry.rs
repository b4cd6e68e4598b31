//! Entry lifecycle — `PortfolioEntry`.
//!
//! One configured wallet: its coordinator plus the sensor set bound to it.
//! Reconfiguring tears the coordinator down and builds a fresh one.

use crate::config::{Credentials, EntryConfig, EntryOptions};
use crate::coordinator::{Coordinator, CoordinatorState, RefreshHandle, RefreshOutcome};
use crate::error::{RefreshFailure, SetupError};
use crate::http::PortfolioSource;
use crate::sensor::{build_sensors, Sensor};

/// Check credentials with one live fetch.
///
/// Every failure is reported as `InvalidAuth`: the server does not tell a
/// bad key apart from an unknown wallet.
pub async fn validate_credentials<S: PortfolioSource>(
    source: &S,
    credentials: &Credentials,
) -> Result<(), SetupError> {
    credentials.validate()?;
    match source.fetch_portfolio(credentials).await {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!(wallet = %credentials.wallet_name, "Credential check failed: {}", e);
            Err(SetupError::InvalidAuth(RefreshFailure::from(e)))
        }
    }
}

/// An activated portfolio entry.
pub struct PortfolioEntry<S: PortfolioSource + Clone> {
    config: EntryConfig,
    source: S,
    coordinator: Coordinator<S>,
    sensors: Vec<Sensor>,
}

impl<S: PortfolioSource + Clone> PortfolioEntry<S> {
    /// Activate an entry: first refresh must succeed before the timer starts.
    pub async fn setup(config: EntryConfig, source: S) -> Result<Self, SetupError> {
        config.validate()?;
        tracing::info!(
            entry = %config.entry_id,
            wallet = %config.credentials.wallet_name,
            "Setting up portfolio entry"
        );

        let (coordinator, sensors) = activate(&config, source.clone()).await?;
        Ok(Self {
            config,
            source,
            coordinator,
            sensors,
        })
    }

    /// Apply new options. The old coordinator is fully stopped before the new
    /// one makes its first request.
    ///
    /// On failure the entry is left stopped, with the new options recorded,
    /// and the existing sensors report unavailable.
    pub async fn update_options(&mut self, options: EntryOptions) -> Result<(), SetupError> {
        tracing::info!(
            entry = %self.config.entry_id,
            interval = %options.update_interval,
            "Reloading portfolio entry"
        );
        self.coordinator.shutdown().await;
        self.config = self.config.with_options(options);

        match activate(&self.config, self.source.clone()).await {
            Ok((coordinator, sensors)) => {
                self.coordinator = coordinator;
                self.sensors = sensors;
                Ok(())
            }
            Err(e) => {
                self.coordinator.mark_failed();
                Err(e)
            }
        }
    }

    pub async fn refresh(&self) -> RefreshOutcome {
        self.coordinator.refresh().await
    }

    pub async fn unload(mut self) {
        tracing::info!(entry = %self.config.entry_id, "Unloading portfolio entry");
        self.coordinator.shutdown().await;
    }

    pub fn config(&self) -> &EntryConfig {
        &self.config
    }

    pub fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }

    pub fn sensor(&self, unique_id: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.unique_id() == unique_id)
    }

    pub fn state(&self) -> CoordinatorState {
        self.coordinator.state()
    }

    pub fn handle(&self) -> RefreshHandle {
        self.coordinator.handle()
    }

    pub fn is_running(&self) -> bool {
        self.coordinator.is_running()
    }
}

async fn activate<S: PortfolioSource>(
    config: &EntryConfig,
    source: S,
) -> Result<(Coordinator<S>, Vec<Sensor>), SetupError> {
    let mut coordinator = Coordinator::new(
        source,
        config.credentials.clone(),
        config.update_interval,
    );

    if let Err(e) = coordinator.first_refresh().await {
        tracing::warn!(entry = %config.entry_id, "Entry not ready: {}", e);
        coordinator.shutdown().await;
        return Err(e);
    }

    coordinator.start();
    let sensors = build_sensors(
        &config.entry_id,
        &config.credentials.wallet_name,
        &coordinator.handle(),
    );
    Ok((coordinator, sensors))
}
