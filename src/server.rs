//! Relay Server
//!
//! The same-origin bridge untrusted callers post to. Each relayed request is
//! re-issued through a trusted `Dispatcher` with the caller's session, so the
//! bearer credential never leaves this process.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::dispatch::{AuthRequirement, Dispatched, Dispatcher, ExecutionMode, RelayEnvelope, RelayRedirect, RequestDescriptor};
use crate::error::GENERIC_FAILURE;
use crate::graphql::GraphQlRequest;
use crate::session::{Session, SessionStore, StaticSessionProvider};

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_HEADER: &str = "x-session-id";

struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        warn!("Relay error: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "errors": [{ "message": GENERIC_FAILURE }] })),
        )
            .into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub sessions: SessionStore,
    pub sign_in_path: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api", post(relay))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(state: AppState, addr: &str) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind relay on {}", addr))?;
    info!("Relay listening on http://{}", addr);
    axum::serve(listener, app).await.context("Relay server stopped")?;

    Ok(())
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "errors": [{ "message": message, "extensions": { "code": "BAD_REQUEST" } }] })),
    )
        .into_response()
}

/// Session id from the `session` cookie, or the `x-session-id` header.
fn session_id(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    })
}

async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let id = session_id(headers)?;
    state.sessions.get(&id).await
}

async fn relay(State(state): State<AppState>, headers: HeaderMap, body: String) -> Result<Response, ServerError> {
    // the client posts without a content type, so the body is parsed by hand
    let Ok(envelope) = serde_json::from_str::<RelayEnvelope>(&body) else {
        return Ok(bad_request("Invalid relay envelope"));
    };
    let Ok(request) = serde_json::from_str::<GraphQlRequest>(&envelope.body) else {
        return Ok(bad_request("Invalid GraphQL request"));
    };

    let descriptor = RequestDescriptor::from_request(request)
        .mode(ExecutionMode::Trusted)
        .auth(if envelope.protectid {
            AuthRequirement::Required
        } else {
            AuthRequirement::Optional
        })
        .build();

    let session = resolve_session(&state, &headers).await;
    let provider = StaticSessionProvider::new(session, state.sign_in_path.clone());

    match state.dispatcher.dispatch(&descriptor, &provider).await {
        Ok(Dispatched::Response(raw)) => {
            let status = StatusCode::from_u16(raw.status)?;
            Ok((status, [(header::CONTENT_TYPE, "application/json")], raw.body).into_response())
        }
        Ok(Dispatched::AuthRequired { redirect_to }) => {
            Ok((StatusCode::UNAUTHORIZED, Json(RelayRedirect { redirect: redirect_to })).into_response())
        }
        Err(err) => Ok((
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "errors": [{ "message": err.describe(), "extensions": { "code": "UPSTREAM_UNAVAILABLE" } }]
            })),
        )
            .into_response()),
    }
}
