//! MyStar - vehicle telemetry session
//!
//! Entry point: reads configuration and credentials, authenticates once and
//! logs every published session state until Ctrl-C.
//!
//! ```text
//! mystar [CONFIG_FILE]
//! ```
//!
//! Credentials come from `MYSTAR_EMAIL`, `MYSTAR_PASSWORD` and `MYSTAR_VIN`
//! (a `.env` file in the working directory is honoured).

use std::path::PathBuf;

use anyhow::{Context, Result};
use mystar_domain::{Credentials, SessionState};
use mystar_infra::{config, MyStarSession};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is not set"))
}

fn log_state(state: &SessionState) {
    if let Some(message) = &state.error_message {
        warn!(error = %message, "session error");
    }
    if state.is_loading {
        info!("fetching telemetry");
    }
    if let Some(snapshot) = &state.snapshot {
        info!(
            model = snapshot.model_name.as_deref().unwrap_or("unknown"),
            battery = snapshot.battery_percentage,
            range_km = snapshot.range_km,
            status = snapshot.charging_status.label(),
            remaining_minutes = snapshot.remaining_charge_minutes(),
            updated = %snapshot.last_updated,
            "vehicle status"
        );
    }
}

async fn watch_state(mut rx: watch::Receiver<SessionState>) {
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        log_state(&state);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(error = %err, "no .env file loaded"),
    }

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = config::load(config_path).context("failed to load configuration")?;

    let credentials = Credentials::new(
        required_env("MYSTAR_EMAIL")?,
        required_env("MYSTAR_PASSWORD")?,
        required_env("MYSTAR_VIN")?,
    );

    let session = MyStarSession::new(config);
    let watcher = tokio::spawn(watch_state(session.subscribe()));

    info!(vin = %credentials.vin, "MyStar starting");
    if let Err(err) = session.authenticate(credentials).await {
        error!(error = %err, kind = ?err.kind(), "authentication failed");
        watcher.abort();
        return Err(err).context("could not start the telemetry session");
    }

    tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
    info!("shutting down");
    session.stop().await;
    watcher.abort();
    Ok(())
}
