//! Recurring telemetry poll
//!
//! One task per session. Ticks run inline in the task loop, so a slow
//! telemetry call delays the next tick instead of overlapping with it.

use std::sync::Arc;
use std::time::Duration;

use mystar_common::auth::{OAuthClient, TokenManager};
use mystar_domain::{CarSnapshot, Result, VehicleInfo};
use tokio::sync::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::StatePublisher;
use crate::telemetry::TelemetryClient;

/// VIN being polled and the metadata merged into its snapshots.
#[derive(Debug, Clone)]
pub(crate) struct VehicleTarget {
    pub(crate) vin: String,
    pub(crate) vehicle: VehicleInfo,
}

/// Everything one authenticated session needs to poll.
pub(crate) struct PollContext {
    pub(crate) generation: u64,
    pub(crate) tokens: TokenManager<OAuthClient>,
    pub(crate) telemetry: TelemetryClient,
    /// Held for the duration of a poll; serialises ticks and manual fetches.
    target: Mutex<VehicleTarget>,
}

impl PollContext {
    pub(crate) fn new(
        generation: u64,
        tokens: TokenManager<OAuthClient>,
        telemetry: TelemetryClient,
        target: VehicleTarget,
    ) -> Self {
        Self { generation, tokens, telemetry, target: Mutex::new(target) }
    }

    pub(crate) async fn vin(&self) -> String {
        self.target.lock().await.vin.clone()
    }

    /// Fetch a snapshot of the current target, refreshing the access token
    /// first if it is close to expiry.
    pub(crate) async fn poll(&self) -> Result<CarSnapshot> {
        let target = self.target.lock().await;
        self.fetch(&target).await
    }

    /// Switch the target to `vin` (re-reading its metadata when it differs
    /// from the current one) and fetch a snapshot.
    pub(crate) async fn poll_vin(&self, vin: &str) -> Result<CarSnapshot> {
        let mut target = self.target.lock().await;
        if target.vin != vin {
            let access_token = self.tokens.current_access_token().await?;
            let vehicle = match self.telemetry.fetch_vehicle_info(vin, &access_token).await {
                Ok(vehicle) => vehicle,
                Err(err) => {
                    warn!(error = %err, "vehicle metadata unavailable");
                    VehicleInfo::default()
                }
            };
            info!(from = %target.vin, to = %vin, "session vehicle changed");
            *target = VehicleTarget { vin: vin.to_string(), vehicle };
        }
        self.fetch(&target).await
    }

    async fn fetch(&self, target: &VehicleTarget) -> Result<CarSnapshot> {
        let access_token = self.tokens.current_access_token().await?;
        let snapshot = self.telemetry.fetch_telemetry(&target.vin, &access_token).await?;
        Ok(snapshot.with_vehicle(&target.vehicle))
    }
}

/// Poll `context` every `period` until `cancel` fires.
///
/// The first tick is one full period after start; the snapshot taken during
/// authentication covers the time before that.
pub(crate) async fn run_poll_loop(
    context: Arc<PollContext>,
    publisher: Arc<StatePublisher>,
    cancel: CancellationToken,
    period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let generation = context.generation;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(generation, "poll loop cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        match context.poll().await {
            Ok(snapshot) => {
                let published = publisher.publish_if_current(generation, |state| {
                    state.snapshot = Some(snapshot);
                    state.error_message = None;
                });
                if !published {
                    debug!(generation, "discarding poll result of superseded session");
                }
            }
            Err(err) => {
                warn!(generation, error = %err, "telemetry poll failed");
                publisher.publish_if_current(generation, |state| {
                    state.error_message = Some(err.to_string());
                });
            }
        }
    }
}
