use std::sync::Arc;
use std::time::Duration;

use radgate_agui::EventHub;
use radgate_auth::{ApiKeyStore, JwtIssuer, LoginAttemptTracker};
use radgate_dispatch::AdapterRegistry;
use radgate_oauth::OAuthManager;
use radgate_router::ModelRouter;
use radgate_telemetry::{TraceStore, UsageSink};

/// Everything a handler needs, composed once at boot (spec §5's
/// shared-resource policy): one `ArcSwap`-backed router, one API key
/// store, one JWT issuer, one event hub, one usage sink, one trace
/// store, one OAuth manager. Cheap to clone — every field is already
/// an `Arc`/`ArcSwap`/internally-locked handle.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ModelRouter>,
    pub adapters: Arc<AdapterRegistry>,
    pub api_keys: Arc<ApiKeyStore>,
    pub jwt: Arc<JwtIssuer>,
    pub login_attempts: Arc<LoginAttemptTracker>,
    pub event_hub: EventHub,
    pub usage_sink: UsageSink,
    pub trace_store: TraceStore,
    pub oauth: Arc<OAuthManager>,
    pub dispatch_deadline: Duration,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        router: Arc<ModelRouter>,
        adapters: Arc<AdapterRegistry>,
        api_keys: Arc<ApiKeyStore>,
        jwt: Arc<JwtIssuer>,
        login_attempts: Arc<LoginAttemptTracker>,
        event_hub: EventHub,
        usage_sink: UsageSink,
        trace_store: TraceStore,
        oauth: Arc<OAuthManager>,
    ) -> Self {
        Self {
            router,
            adapters,
            api_keys,
            jwt,
            login_attempts,
            event_hub,
            usage_sink,
            trace_store,
            oauth,
            dispatch_deadline: Duration::from_secs(60),
        }
    }

    pub fn with_dispatch_deadline(mut self, deadline: Duration) -> Self {
        self.dispatch_deadline = deadline;
        self
    }
}
