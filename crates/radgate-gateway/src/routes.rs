use std::collections::HashMap;

use axum::Router;
use axum::extract::{Path, Query, RawQuery, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use bytes::Bytes;
use radgate_auth::Role;
use radgate_common::{ErrorKind, GatewayError, new_request_id, new_trace_id};
use radgate_protocol::{ApiType, ProviderResult, ResponseOutput};
use serde_json::{Value, json};

use crate::auth::{Principal, authenticate};
use crate::error::ApiError;
use crate::handle::{HandleContext, handle};
use crate::state::AppState;
use crate::translate;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/responses", post(responses))
        .route("/v1/messages", post(messages))
        .route("/v1/embeddings", post(embeddings))
        .route("/v1/models", get(models))
        .route("/v1/agents/{agent_id}/stream", get(agents_stream))
        .route("/v1/oauth/start", get(oauth_start))
        .route("/v1/oauth/callback/{provider}", get(oauth_callback))
        .route("/v1/oauth/refresh", post(oauth_refresh))
        .route("/v0/management/config", get(management_config))
        .route("/v0/management/usage", get(management_usage))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

fn parse_body(raw: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(raw)
        .map_err(|e| GatewayError::new(ErrorKind::Decode, format!("invalid JSON body: {e}")).into())
}

fn model_hint(body: &Value) -> &str {
    body.get("model").and_then(Value::as_str).unwrap_or("")
}

async fn chat_completions(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery, raw: Bytes) -> Response {
    let body = match parse_body(&raw) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    let principal = match authenticate(&state, &headers, query.as_deref(), ApiType::Chat.as_str(), model_hint(&body)) {
        Ok(p) => p,
        Err(e) => return ApiError(e).into_response(),
    };
    let request = match translate::openai_chat_to_provider_request(&body) {
        Ok(r) => r,
        Err(e) => return ApiError(e).into_response(),
    };
    let is_stream = request.payload.stream;
    let model_for_stream = request.model.clone();
    let ctx = new_ctx(&principal, ApiType::Chat, &request.model);

    match handle(&state, ctx, request).await {
        Ok(result) => render_chat_result(result, is_stream, model_for_stream),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn responses(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery, raw: Bytes) -> Response {
    let body = match parse_body(&raw) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    let principal = match authenticate(&state, &headers, query.as_deref(), ApiType::Responses.as_str(), model_hint(&body)) {
        Ok(p) => p,
        Err(e) => return ApiError(e).into_response(),
    };
    let request = match translate::openai_responses_to_provider_request(&body) {
        Ok(r) => r,
        Err(e) => return ApiError(e).into_response(),
    };
    let is_stream = request.payload.stream;
    let model_for_stream = request.model.clone();
    let ctx = new_ctx(&principal, ApiType::Responses, &request.model);

    match handle(&state, ctx, request).await {
        Ok(result) => render_chat_result(result, is_stream, model_for_stream),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn messages(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery, raw: Bytes) -> Response {
    let body = match parse_body(&raw) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    let principal = match authenticate(&state, &headers, query.as_deref(), ApiType::Messages.as_str(), model_hint(&body)) {
        Ok(p) => p,
        Err(e) => return ApiError(e).into_response(),
    };
    let request = match translate::anthropic_messages_to_provider_request(&body) {
        Ok(r) => r,
        Err(e) => return ApiError(e).into_response(),
    };
    let ctx = new_ctx(&principal, ApiType::Messages, &request.model);

    match handle(&state, ctx, request).await {
        Ok(result) => {
            let ProviderResult { model, output, usage, .. } = result;
            match output {
                ResponseOutput::Streaming(rx) => crate::sse::openai_chat_stream_response(rx, model),
                ResponseOutput::Materialized(choices) => {
                    Json(translate::render_anthropic_messages(&model, &usage, &choices)).into_response()
                }
            }
        }
        Err(e) => ApiError(e).into_response(),
    }
}

async fn embeddings(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery, raw: Bytes) -> Response {
    let body = match parse_body(&raw) {
        Ok(b) => b,
        Err(e) => return e.into_response(),
    };
    let principal = match authenticate(&state, &headers, query.as_deref(), ApiType::Embeddings.as_str(), model_hint(&body)) {
        Ok(p) => p,
        Err(e) => return ApiError(e).into_response(),
    };
    let request = match translate::embeddings_to_provider_request(&body) {
        Ok(r) => r,
        Err(e) => return ApiError(e).into_response(),
    };
    let ctx = new_ctx(&principal, ApiType::Embeddings, &request.model);

    match handle(&state, ctx, request).await {
        Ok(result) => Json(json!({
            "object": "list",
            "model": result.model,
            "usage": {
                "prompt_tokens": result.usage.prompt_tokens,
                "total_tokens": result.usage.total_tokens,
            },
        }))
        .into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn models(State(state): State<AppState>) -> Json<Value> {
    let table = state.router.snapshot();
    let routes: Vec<Value> = table
        .list()
        .into_iter()
        .map(|r| json!({"id": r.canonical, "aliases": r.aliases, "enabled": r.enabled, "cost_tier": r.cost_tier}))
        .collect();
    Json(json!({"object": "list", "data": routes}))
}

#[derive(serde::Deserialize)]
struct StreamQuery {
    #[serde(rename = "threadId", default)]
    thread_id: String,
}

async fn agents_stream(State(state): State<AppState>, Path(agent_id): Path<String>, Query(query): Query<StreamQuery>) -> Response {
    let (client_id, rx) = state.event_hub.subscribe(agent_id, query.thread_id);
    crate::sse::agui_stream_response(state.event_hub.clone(), client_id, rx)
}

#[derive(serde::Deserialize)]
struct OAuthStartQuery {
    provider: String,
    #[serde(rename = "redirectUri")]
    redirect_uri: String,
}

async fn oauth_start(State(state): State<AppState>, Query(query): Query<OAuthStartQuery>) -> Response {
    match state.oauth.start(&query.provider, &query.redirect_uri) {
        Ok(session) => Json(json!({"auth_url": session.auth_url, "session_id": session.id})).into_response(),
        Err(err) => ApiError(GatewayError::new(ErrorKind::BadRequest, err.to_string())).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct OAuthCallbackQuery {
    state: String,
    code: String,
}

async fn oauth_callback(State(state): State<AppState>, Path(provider): Path<String>, Query(query): Query<OAuthCallbackQuery>) -> Response {
    match state.oauth.complete(&provider, &query.state, &query.code).await {
        Ok(session) => Json(json!({"status": session.status, "session_id": session.id})).into_response(),
        Err(err) => ApiError(err.into()).into_response(),
    }
}

#[derive(serde::Deserialize)]
struct OAuthRefreshBody {
    provider: String,
    refresh_token: String,
}

async fn oauth_refresh(State(state): State<AppState>, Json(body): Json<OAuthRefreshBody>) -> Response {
    match state.oauth.refresh(&body.provider, &body.refresh_token).await {
        Ok(session) => Json(json!({"status": session.status, "session_id": session.id})).into_response(),
        Err(err) => ApiError(err.into()).into_response(),
    }
}

fn require_role(state: &AppState, headers: &HeaderMap, query: Option<&str>, min_role: Role) -> Result<Principal, GatewayError> {
    let principal = authenticate(state, headers, query, "management", "*")?;
    let role = principal.role().ok_or_else(|| GatewayError::new(ErrorKind::Forbidden, "management routes require a JWT principal"))?;
    if !role.satisfies(min_role) {
        return Err(GatewayError::new(ErrorKind::Forbidden, "insufficient role"));
    }
    Ok(principal)
}

async fn management_config(State(state): State<AppState>, headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    if let Err(err) = require_role(&state, &headers, query.as_deref(), Role::Operator) {
        return ApiError(err).into_response();
    }
    let table = state.router.snapshot();
    Json(json!({"routes": table.list().len(), "oauth_sessions": state.oauth.session_count()})).into_response()
}

async fn management_usage(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(err) = require_role(&state, &headers, raw_query.as_deref(), Role::Operator) {
        return ApiError(err).into_response();
    }
    if let Some(trace_id) = query.get("trace_id") {
        let events = state.trace_store.get(trace_id);
        return Json(json!({"trace_id": trace_id, "events": events})).into_response();
    }
    Json(json!({
        "usage_queue_depth": state.usage_sink.queued_len(),
        "usage_dropped": state.usage_sink.dropped_count(),
        "trace_events": state.trace_store.len(),
    }))
    .into_response()
}

fn new_ctx(principal: &Principal, api_type: ApiType, incoming_model: &str) -> HandleContext {
    HandleContext {
        request_id: new_request_id(),
        trace_id: new_trace_id(),
        api_key_name: principal.usage_key_name(),
        api_type,
        incoming_model: incoming_model.to_string(),
    }
}

fn render_chat_result(result: ProviderResult, is_stream: bool, model_for_stream: String) -> Response {
    let ProviderResult { model, output, usage, .. } = result;
    if is_stream {
        return match output {
            ResponseOutput::Streaming(rx) => crate::sse::openai_chat_stream_response(rx, model_for_stream),
            ResponseOutput::Materialized(choices) => {
                Json(translate::render_openai_chat(&model, &usage, &choices)).into_response()
            }
        };
    }
    let choices = translate::materialized_choices(&output).to_vec();
    Json(translate::render_openai_chat(&model, &usage, &choices)).into_response()
}
