//! Meridian - client network layer demo
//!
//! Loads configuration, wires the application context and runs a scripted
//! session. Without a config source the mock backend answers every call.

use anyhow::Context;
use meridian_domain::Config;
use meridian_lib::utils::init_tracing;
use meridian_lib::{run_demo_session, AppContext};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file before reading config
    let dotenv = dotenvy::dotenv();

    let (config, load_error) = match meridian_infra::config::load() {
        Ok(config) => (config, None),
        Err(err) => {
            let mut config = Config::default();
            config.mock.enabled = true;
            (config, Some(err))
        }
    };

    init_tracing(&config.logging).context("failed to initialise tracing")?;

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(error = %err, "no .env file loaded"),
    }
    if let Some(err) = load_error {
        warn!(error = %err, "no usable configuration found, running against the mock backend");
    }

    let context = AppContext::new(config).await.context("failed to build application context")?;
    let report = run_demo_session(&context).await.context("demo session failed")?;

    info!(
        email = report.email.as_deref().unwrap_or_default(),
        investments = report.investments,
        registered = report.registered_investment.as_deref().unwrap_or_default(),
        unread_before = report.unread_before,
        unread_after = report.unread_after,
        uploaded = report.uploaded,
        refreshed = report.refreshed,
        "Meridian demo complete"
    );

    Ok(())
}
