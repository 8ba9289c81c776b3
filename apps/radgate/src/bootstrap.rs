use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use radgate_agui::EventHub;
use radgate_auth::{ApiKeyRecord, ApiKeyStatus, ApiKeyStore, JwtIssuer, KeyRotator, LoginAttemptTracker, hash_token, preview_of};
use radgate_dispatch::AdapterRegistry;
use radgate_oauth::{OAuthManager, StaticProvider};
use radgate_provider_core::{AuthScheme, PricingTable, ProviderAdapter, ProviderConfig};
use radgate_provider_impl::{AnthropicAdapter, GenericCompatAdapter, OpenAiCompatAdapter};
use radgate_router::{ModelRouter, RouterTable};
use radgate_telemetry::{TraceStore, UsageSink};

use crate::cli::CliArgs;

pub struct Bootstrap {
    pub state: radgate_gateway::AppState,
    pub listen_addr: String,
}

const MIN_STRICT_SECRET_LEN: usize = 32;
const DEFAULT_DEV_JWT_SECRET: &str = "radgate-insecure-development-secret!!";
const TRACE_STORE_CAPACITY: usize = 10_000;
const USAGE_SINK_CAPACITY: usize = 10_000;
const USAGE_FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const USAGE_FLUSH_BATCH: usize = 256;

pub fn bootstrap(args: CliArgs) -> anyhow::Result<Bootstrap> {
    let router = build_router(&args)?;
    let adapters = build_adapters(&args)?;
    let api_keys = build_api_key_store(&args);
    let jwt = build_jwt_issuer(&args)?;
    let login_attempts = Arc::new(LoginAttemptTracker::new(Duration::from_secs(15 * 60), 5));
    let event_hub = EventHub::new();
    let usage_sink = UsageSink::spawn(
        USAGE_SINK_CAPACITY,
        USAGE_FLUSH_INTERVAL,
        Arc::new(radgate_telemetry::TracingUsageConsumer),
        USAGE_FLUSH_BATCH,
    );
    let trace_store = TraceStore::new(TRACE_STORE_CAPACITY);
    let oauth = Arc::new(OAuthManager::new(vec![
        Arc::new(StaticProvider::new("openai")),
        Arc::new(StaticProvider::new("anthropic")),
        Arc::new(StaticProvider::new("google")),
    ]));
    oauth.spawn_janitor(Duration::from_secs(60));

    let state = radgate_gateway::AppState::new(
        Arc::new(router),
        Arc::new(adapters),
        Arc::new(api_keys),
        Arc::new(jwt),
        login_attempts,
        event_hub,
        usage_sink,
        trace_store,
        oauth,
    )
    .with_dispatch_deadline(Duration::from_secs(60));

    Ok(Bootstrap { state, listen_addr: normalize_listen_addr(&args.listen_addr) })
}

fn normalize_listen_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}

fn build_router(args: &CliArgs) -> anyhow::Result<ModelRouter> {
    let table = match &args.model_table {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("read model table {path}"))?;
            RouterTable::from_json(&json).with_context(|| format!("parse model table {path}"))?
        }
        None => RouterTable::with_defaults(),
    };
    Ok(ModelRouter::new(table))
}

fn load_pricing(args: &CliArgs) -> anyhow::Result<PricingTable> {
    match &args.pricing_file {
        Some(path) => PricingTable::load_file(path).with_context(|| format!("load pricing file {path}")),
        None => Ok(PricingTable::with_defaults()),
    }
}

fn build_adapters(args: &CliArgs) -> anyhow::Result<AdapterRegistry> {
    let pricing = load_pricing(args)?;
    let mut adapters: AdapterRegistry = HashMap::new();

    if let Some(api_key) = &args.openai_api_key {
        let config = ProviderConfig::new(args.openai_base_url.clone(), api_key.clone())
            .with_timeout(Duration::from_secs(args.openai_timeout_secs))
            .with_max_retries(args.openai_max_retries)
            .with_auth_scheme(AuthScheme::Bearer);
        let adapter = OpenAiCompatAdapter::new("openai", config, pricing.clone()).context("build openai adapter")?;
        adapters.insert("openai".to_string(), Arc::new(adapter) as Arc<dyn ProviderAdapter>);
    }

    if let Some(api_key) = &args.anthropic_api_key {
        let config = ProviderConfig::new(args.anthropic_base_url.clone(), api_key.clone())
            .with_timeout(Duration::from_secs(args.anthropic_timeout_secs))
            .with_max_retries(args.anthropic_max_retries)
            .with_auth_scheme(AuthScheme::ApiKey);
        let adapter = AnthropicAdapter::new("anthropic", config, pricing.clone()).context("build anthropic adapter")?;
        adapters.insert("anthropic".to_string(), Arc::new(adapter) as Arc<dyn ProviderAdapter>);
    }

    if let (Some(base_url), Some(api_key)) = (&args.generic_base_url, &args.generic_api_key) {
        let auth_scheme = match args.generic_auth_type.as_str() {
            "bearer" => AuthScheme::Bearer,
            "api-key" => AuthScheme::ApiKey,
            "custom" => AuthScheme::Custom,
            other => bail!("invalid GENERIC_AUTH_TYPE '{other}' (expected bearer|api-key|custom)"),
        };
        let mut config = ProviderConfig::new(base_url.clone(), api_key.clone())
            .with_timeout(Duration::from_secs(args.generic_timeout_secs))
            .with_max_retries(args.generic_max_retries)
            .with_auth_scheme(auth_scheme);
        if let Some(header) = &args.generic_auth_header {
            let prefix = args.generic_auth_prefix.as_deref().unwrap_or("");
            config = config.with_header(header.clone(), format!("{prefix}{api_key}"));
        }
        if let Some(raw) = &args.generic_custom_headers {
            let headers: HashMap<String, String> =
                serde_json::from_str(raw).context("parse GENERIC_CUSTOM_HEADERS as a JSON object")?;
            for (key, value) in headers {
                config = config.with_header(key, value);
            }
        }
        let adapter = GenericCompatAdapter::new("generic", config, pricing).context("build generic adapter")?;
        adapters.insert("generic".to_string(), Arc::new(adapter) as Arc<dyn ProviderAdapter>);
    }

    Ok(adapters)
}

fn build_api_key_store(args: &CliArgs) -> ApiKeyStore {
    let mut keys = HashMap::new();
    for raw in args.api_keys.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let hash = hash_token(raw);
        keys.insert(
            hash.clone(),
            ApiKeyRecord {
                id: radgate_common::new_request_id(),
                workspace: "default".to_string(),
                name: preview_of(raw),
                hash,
                preview: preview_of(raw),
                status: ApiKeyStatus::Active,
                allowed_models: vec!["*".to_string()],
                allowed_apis: vec!["*".to_string()],
                rate_limit: None,
                expires_at: None,
                last_used_at: None,
            },
        );
    }
    ApiKeyStore::new(keys)
}

fn build_jwt_issuer(args: &CliArgs) -> anyhow::Result<JwtIssuer> {
    let access_secret = resolve_secret(args.jwt_access_secret.as_deref(), "JWT_ACCESS_SECRET", args.strict)?;
    let refresh_secret = resolve_secret(args.jwt_refresh_secret.as_deref(), "JWT_REFRESH_SECRET", args.strict)?;

    let rotator = KeyRotator::new(access_secret);
    for (version, secret) in versioned_secrets_from_env() {
        rotator.preload(version, secret);
    }
    let _ = refresh_secret; // refresh tokens are opaque random strings (spec §4.6); only access tokens are JWT-signed.

    Ok(JwtIssuer::new(rotator, "radgate"))
}

fn resolve_secret(configured: Option<&str>, env_name: &str, strict: bool) -> anyhow::Result<String> {
    match configured {
        Some(secret) if secret.len() >= MIN_STRICT_SECRET_LEN => Ok(secret.to_string()),
        Some(secret) if strict => bail!("{env_name} must be at least {MIN_STRICT_SECRET_LEN} chars in strict mode (got {} chars)", secret.len()),
        Some(secret) => Ok(secret.to_string()),
        None if strict => bail!("{env_name} is required in strict mode"),
        None => Ok(DEFAULT_DEV_JWT_SECRET.to_string()),
    }
}

/// Scans `JWT_ACCESS_SECRET_V{N}` env vars for rotation pre-loading
/// (spec.md §6) — clap can't enumerate an open-ended variable family,
/// so this reads the process environment directly.
fn versioned_secrets_from_env() -> Vec<(u32, String)> {
    let mut found = Vec::new();
    for (key, value) in std::env::vars() {
        if let Some(suffix) = key.strip_prefix("JWT_ACCESS_SECRET_V") {
            if let Ok(version) = suffix.parse::<u32>() {
                found.push((version, value));
            }
        }
    }
    found.sort_by_key(|(version, _)| *version);
    found
}
