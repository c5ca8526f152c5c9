//! Session lifecycle: authenticate, poll, stop

use std::sync::Arc;
use std::time::Duration;

use mystar_common::auth::{
    AuthorizationAcquirer, DiscoveryClient, OAuthClient, PkceParameters, TokenManager,
};
use mystar_common::SessionClientBuilder;
use mystar_domain::{
    CarSnapshot, Config, Credentials, MyStarError, Result, SessionState, VehicleInfo,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::poll::{run_poll_loop, PollContext, VehicleTarget};
use super::state::StatePublisher;
use crate::telemetry::TelemetryClient;

/// How long `stop` waits for the poll task to wind down.
const JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The telemetry session of one user.
///
/// Construct once at startup and share by cloning; clones refer to the same
/// session. At most one authenticated session is live: `authenticate`
/// replaces the previous one and `stop` ends it. Results are observed through
/// [`MyStarSession::subscribe`] rather than return values.
#[derive(Clone)]
pub struct MyStarSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: Config,
    publisher: Arc<StatePublisher>,
    active: Mutex<Option<ActiveSession>>,
}

/// A running poll task and the context it polls with.
struct ActiveSession {
    context: Arc<PollContext>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ActiveSession {
    fn spawn(context: Arc<PollContext>, publisher: Arc<StatePublisher>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_poll_loop(
            Arc::clone(&context),
            publisher,
            cancel.clone(),
            period,
        ));
        Self { context, cancel, handle: Some(handle) }
    }

    /// Cancel the poll task and drop the session's tokens. With `wait`, also
    /// wait (bounded) for the task to finish.
    async fn shutdown(mut self, wait: bool) {
        self.cancel.cancel();
        self.context.tokens.clear().await;

        let Some(handle) = self.handle.take() else {
            return;
        };
        if !wait {
            return;
        }
        match tokio::time::timeout(JOIN_TIMEOUT, handle).await {
            Ok(Ok(())) => debug!(generation = self.context.generation, "poll task stopped"),
            Ok(Err(err)) => error!(error = %err, "poll task panicked"),
            Err(_) => warn!(timeout = ?JOIN_TIMEOUT, "poll task did not stop in time"),
        }
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            warn!(
                generation = self.context.generation,
                "session dropped without stop(); cancelling poll task"
            );
            self.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for MyStarSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyStarSession")
            .field("generation", &self.inner.publisher.generation())
            .field("state", &self.inner.publisher.current())
            .finish_non_exhaustive()
    }
}

impl MyStarSession {
    /// Idle session; nothing happens until [`MyStarSession::authenticate`].
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                publisher: Arc::new(StatePublisher::new()),
                active: Mutex::new(None),
            }),
        }
    }

    /// Receiver of every published [`SessionState`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.publisher.subscribe()
    }

    /// Copy of the latest published state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.publisher.current()
    }

    /// Whether a session is installed and polling.
    pub async fn is_active(&self) -> bool {
        self.inner.active.lock().await.is_some()
    }

    /// Log in, publish the first snapshot and start the recurring poll.
    ///
    /// Any running session is cancelled first. If another `authenticate` or
    /// `stop` overtakes this call, its result is discarded and `Ok(())` is
    /// returned without installing anything.
    ///
    /// # Errors
    /// The first failure of the flow (discovery, authorization, token
    /// exchange or telemetry). The error is also published as the state's
    /// `error_message`, and no session is installed.
    #[instrument(skip_all, fields(vin = %credentials.vin))]
    pub async fn authenticate(&self, credentials: Credentials) -> Result<()> {
        let publisher = &self.inner.publisher;
        let generation = publisher.advance();
        let previous = self.inner.active.lock().await.take();
        if let Some(previous) = previous {
            info!(previous = previous.context.generation, "superseding running session");
            previous.shutdown(false).await;
        }
        publisher.publish_if_current(generation, |state| {
            state.is_loading = true;
            state.error_message = None;
        });

        let established = match credentials.validate() {
            Ok(()) => self.establish(generation, &credentials).await,
            Err(err) => Err(err),
        };

        let (context, snapshot) = match established {
            Ok(established) => established,
            Err(err) => {
                warn!(error = %err, "authentication failed");
                publisher.publish_if_current(generation, |state| {
                    state.is_loading = false;
                    state.error_message = Some(err.to_string());
                });
                return Err(err);
            }
        };

        let mut active = self.inner.active.lock().await;
        if !publisher.is_current(generation) {
            debug!(generation, "discarding superseded authentication");
            context.tokens.clear().await;
            return Ok(());
        }

        publisher.publish_if_current(generation, |state| {
            *state = SessionState { snapshot: Some(snapshot), is_loading: false, error_message: None };
        });
        let period = self.inner.config.session.poll_interval();
        *active = Some(ActiveSession::spawn(context, Arc::clone(publisher), period));
        info!(generation, interval = ?period, "session established");
        Ok(())
    }

    async fn establish(
        &self,
        generation: u64,
        credentials: &Credentials,
    ) -> Result<(Arc<PollContext>, CarSnapshot)> {
        let provider = &self.inner.config.provider;
        let session = &self.inner.config.session;

        let http = SessionClientBuilder::new(&provider.redirect_uri)
            .timeout(session.http_timeout())
            .user_agent(&provider.user_agent)
            .build()?;

        let oidc = DiscoveryClient::new(http.clone(), provider.discovery_url())
            .configuration()
            .await?;
        let pkce = PkceParameters::generate();
        let code = AuthorizationAcquirer::new(http.clone(), provider.clone())?
            .acquire(&oidc, &pkce, credentials)
            .await?;

        let endpoint = OAuthClient::new(http.clone(), oidc.token_endpoint.clone(), provider);
        let threshold = i64::try_from(session.refresh_threshold_secs).unwrap_or(i64::MAX);
        let tokens = TokenManager::new(Arc::new(endpoint), threshold);
        tokens.exchange_code(&code, &pkce.code_verifier).await?;
        let access_token = tokens.current_access_token().await?;

        let telemetry = TelemetryClient::new(http, provider.api_base_url.clone());
        let vehicle = match telemetry.fetch_vehicle_info(&credentials.vin, &access_token).await {
            Ok(vehicle) => vehicle,
            Err(err) => {
                warn!(error = %err, "vehicle metadata unavailable, continuing without it");
                VehicleInfo::default()
            }
        };
        let snapshot = telemetry
            .fetch_telemetry(&credentials.vin, &access_token)
            .await?
            .with_vehicle(&vehicle);

        let target = VehicleTarget { vin: credentials.vin.clone(), vehicle };
        let context = PollContext::new(generation, tokens, telemetry, target);
        Ok((Arc::new(context), snapshot))
    }

    /// Fetch telemetry now, outside the poll schedule.
    ///
    /// A `vin` different from the session's makes it the session's VIN for
    /// this and all later polls.
    ///
    /// # Errors
    /// `AuthenticationFailed` when no session is running or `vin` is empty,
    /// otherwise the fetch error (also published as `error_message`).
    #[instrument(skip(self))]
    pub async fn fetch_telemetry(&self, vin: &str) -> Result<()> {
        let vin = vin.trim();
        if vin.is_empty() {
            return Err(MyStarError::auth_with_code("missing_credentials", "vin must not be empty"));
        }

        let context = self
            .inner
            .active
            .lock()
            .await
            .as_ref()
            .map(|active| Arc::clone(&active.context))
            .ok_or_else(|| MyStarError::auth("not authenticated"))?;

        let publisher = &self.inner.publisher;
        let generation = context.generation;
        publisher.publish_if_current(generation, |state| state.is_loading = true);

        match context.poll_vin(vin).await {
            Ok(snapshot) => {
                publisher.publish_if_current(generation, |state| {
                    *state =
                        SessionState { snapshot: Some(snapshot), is_loading: false, error_message: None };
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "manual telemetry fetch failed");
                publisher.publish_if_current(generation, |state| {
                    state.is_loading = false;
                    state.error_message = Some(err.to_string());
                });
                Err(err)
            }
        }
    }

    /// VIN currently polled, if a session is running.
    pub async fn vin(&self) -> Option<String> {
        let context = self.inner.active.lock().await.as_ref().map(|a| Arc::clone(&a.context))?;
        Some(context.vin().await)
    }

    /// Stop polling and drop the session's tokens. The last snapshot stays
    /// published.
    ///
    /// An `authenticate` still in flight is abandoned as well: its result is
    /// discarded and no poll is started. Calling it again does nothing.
    #[instrument(skip(self))]
    pub async fn stop(&self) {
        let generation = self.inner.publisher.advance();
        let active = self.inner.active.lock().await.take();
        self.inner.publisher.publish(|state| state.is_loading = false);

        match active {
            Some(active) => {
                active.shutdown(true).await;
                info!(generation, "session stopped");
            }
            None => debug!(generation, "stop requested without a running session"),
        }
    }
}
