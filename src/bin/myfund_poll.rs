use anyhow::{Context, Result};
use myfund_portfolio::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

fn init_tracing() -> Result<()> {
    // RUST_LOG wins; info otherwise.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(())
}

fn config_from_env() -> Result<EntryConfig> {
    let wallet = std::env::var("MYFUND_WALLET").context("MYFUND_WALLET must be set")?;
    let api_key = std::env::var("MYFUND_API_KEY").context("MYFUND_API_KEY must be set")?;
    let update_interval = match std::env::var("MYFUND_UPDATE_INTERVAL") {
        Ok(raw) => {
            let minutes: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("MYFUND_UPDATE_INTERVAL is not a number: {raw}"))?;
            UpdateInterval::try_from(minutes)?
        }
        Err(_) => UpdateInterval::default(),
    };

    let config = EntryConfig::new("cli", Credentials::new(wallet, api_key), update_interval);
    config.validate()?;
    Ok(config)
}

fn log_readings(entry: &PortfolioEntry<MyFundHttp>) {
    for sensor in entry.sensors() {
        let reading = sensor.reading();
        tracing::info!(
            sensor = %sensor.unique_id(),
            available = reading.available,
            unit = reading.unit.as_deref().unwrap_or(""),
            "{}",
            reading
                .value
                .as_ref()
                .and_then(SensorValue::as_f64)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    let config = config_from_env()?;
    let http = MyFundHttp::new()?;
    let entry = PortfolioEntry::setup(config, http).await?;
    tracing::info!(
        interval = %entry.config().update_interval,
        "polling started; Ctrl-C to stop"
    );
    log_readings(&entry);

    let mut updates = entry.handle().subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                log_readings(&entry);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    entry.unload().await;
    Ok(())
}
