use std::collections::HashMap;
use std::time::Duration;

use radgate_common::{ErrorKind, GatewayError};
use radgate_dispatch::{Candidate, DispatchInput, DispatchOutcome};
use radgate_protocol::{ApiType, Attempt, ProviderRequest, ProviderResult, UsageRecord};

use crate::state::AppState;

/// Everything the caller already resolved before dispatch: which
/// credential, which trace, which incoming surface and model name
/// (spec §4.4's `Handle(ctx, api_type, model, payload)`).
pub struct HandleContext {
    pub request_id: String,
    pub trace_id: String,
    pub api_key_name: String,
    pub api_type: ApiType,
    pub incoming_model: String,
}

/// Resolves `ctx.incoming_model` via the router, builds the candidate
/// list (primary then fallbacks in descending-weight order), and runs
/// the dispatcher. Emits exactly one `UsageRecord` and a matching
/// trace-store event pair regardless of outcome (spec §4.4/§4.7).
pub async fn handle(
    state: &AppState,
    ctx: HandleContext,
    request: ProviderRequest,
) -> Result<ProviderResult, GatewayError> {
    let started = std::time::Instant::now();
    state.trace_store.record(
        ctx.trace_id.clone(),
        "request accepted",
        HashMap::from([
            ("api_type".to_string(), ctx.api_type.as_str().to_string()),
            ("model".to_string(), ctx.incoming_model.clone()),
        ]),
    );

    let route = match state.router.resolve(&ctx.incoming_model) {
        Ok(route) => route,
        Err(err) => {
            let gateway_err = route_error(&err, &ctx.incoming_model);
            record_failure(state, &ctx, started.elapsed(), &gateway_err);
            return Err(gateway_err);
        }
    };

    let fallbacks = state.router.fallbacks(&ctx.incoming_model).unwrap_or_default();
    let mut candidates = Vec::with_capacity(1 + fallbacks.len());
    candidates.push(Candidate { provider: route.provider.clone(), provider_model: route.provider_model.clone() });
    candidates.extend(fallbacks.into_iter().map(|f| Candidate { provider: f.provider, provider_model: f.provider_model }));

    let (_cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    let input = DispatchInput {
        request,
        candidates,
        deadline: state.dispatch_deadline,
        cancel: cancel_rx,
    };

    match radgate_dispatch::dispatch(&state.adapters, input).await {
        Ok(DispatchOutcome { result, attempts }) => {
            record_attempts(state, &ctx, &attempts);
            let duration_ms = started.elapsed().as_millis() as u64;
            state.usage_sink.add(UsageRecord::success(
                ctx.request_id.clone(),
                ctx.trace_id.clone(),
                ctx.api_key_name.clone(),
                ctx.api_type.as_str().to_string(),
                ctx.incoming_model.clone(),
                result.model.clone(),
                result.provider.clone(),
                duration_ms,
                result.usage,
            ));
            state.trace_store.record(
                ctx.trace_id.clone(),
                "request completed",
                HashMap::from([("provider".to_string(), result.provider.clone())]),
            );
            Ok(result)
        }
        Err((err, attempts)) => {
            record_attempts(state, &ctx, &attempts);
            record_failure(state, &ctx, started.elapsed(), &err);
            Err(err)
        }
    }
}

/// Persists the dispatcher's per-candidate `Attempt` log into the trace
/// store so it is visible at `/v0/management/usage?trace_id=` alongside
/// the request-level events (spec §4.3/§4.4: the attempt log is an
/// observable side effect of `Handle`, not an internal detail).
fn record_attempts(state: &AppState, ctx: &HandleContext, attempts: &[Attempt]) {
    for attempt in attempts {
        let mut fields = HashMap::from([
            ("provider".to_string(), attempt.provider.clone()),
            ("model".to_string(), attempt.model.clone()),
            ("outcome".to_string(), format!("{:?}", attempt.outcome)),
            ("duration_ms".to_string(), attempt.duration_ms.to_string()),
        ]);
        if let Some(status) = attempt.http_status {
            fields.insert("http_status".to_string(), status.to_string());
        }
        if let Some(kind) = &attempt.error_kind {
            fields.insert("error_kind".to_string(), kind.clone());
        }
        state.trace_store.record(ctx.trace_id.clone(), "dispatch attempt", fields);
    }
}

fn record_failure(state: &AppState, ctx: &HandleContext, elapsed: Duration, err: &GatewayError) {
    state.usage_sink.add(UsageRecord::failure(
        ctx.request_id.clone(),
        ctx.trace_id.clone(),
        ctx.api_key_name.clone(),
        ctx.api_type.as_str().to_string(),
        ctx.incoming_model.clone(),
        elapsed.as_millis() as u64,
        err.kind.to_string(),
        err.message.clone(),
    ));
    state.trace_store.record(
        ctx.trace_id.clone(),
        "request failed",
        HashMap::from([("error_kind".to_string(), err.kind.to_string())]),
    );
}

fn route_error(err: &radgate_router::RouterError, model: &str) -> GatewayError {
    match err {
        radgate_router::RouterError::NotFound(_) => {
            GatewayError::new(ErrorKind::ModelNotFound, format!("unknown model '{model}'"))
        }
        radgate_router::RouterError::Disabled(_) => {
            GatewayError::new(ErrorKind::ModelDisabled, format!("model '{model}' is disabled"))
        }
        radgate_router::RouterError::Collision(name) => {
            GatewayError::new(ErrorKind::Internal, format!("route collision on '{name}'"))
        }
    }
}
