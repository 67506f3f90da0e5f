//! Request Dispatcher
//!
//! Sends one GraphQL request. Trusted dispatches go straight to the backend
//! with the session credential attached; untrusted dispatches are wrapped in
//! a relay envelope and never carry a credential.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cache::ResponseCache;
use super::descriptor::{find_header, set_header, AuthRequirement, CacheDirective, ExecutionMode, RequestDescriptor};
use super::transport::{HttpRequest, RawResponse, RequestBody, Transport};
use crate::config::GatewayConfig;
use crate::error::{TransportCause, TransportError};
use crate::session::SessionProvider;
use crate::utils::truncate::preview;

/// Payload posted to the relay endpoint by untrusted dispatches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    /// The serialized `{query, variables}` request
    pub body: String,
    /// Whether the relay must refuse to forward without a session
    #[serde(default = "protect_by_default")]
    pub protectid: bool,
}

fn protect_by_default() -> bool {
    true
}

/// Relay reply telling an untrusted caller to sign in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRedirect {
    pub redirect: String,
}

/// Result of a dispatch that did not fail at the transport level
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    Response(RawResponse),
    /// Authentication was required and missing; nothing was sent.
    AuthRequired { redirect_to: String },
}

#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    backend_url: String,
    relay_url: String,
    cache: ResponseCache,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, backend_url: impl Into<String>, relay_url: impl Into<String>) -> Self {
        Self {
            transport,
            backend_url: backend_url.into(),
            relay_url: relay_url.into(),
            cache: ResponseCache::new(),
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &GatewayConfig) -> Self {
        Self::new(transport, config.backend_url.clone(), config.relay_url.clone())
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Send one request. At most one network call; never retried.
    #[tracing::instrument(
        skip(self, descriptor, sessions),
        fields(operation = %descriptor.operation_name(), mode = ?descriptor.mode(), request_id = %Uuid::new_v4())
    )]
    pub async fn dispatch(
        &self,
        descriptor: &RequestDescriptor,
        sessions: &dyn SessionProvider,
    ) -> Result<Dispatched, TransportError> {
        match descriptor.mode() {
            ExecutionMode::Trusted => self.dispatch_trusted(descriptor, sessions).await,
            ExecutionMode::Untrusted => self.dispatch_untrusted(descriptor).await,
        }
    }

    async fn dispatch_trusted(
        &self,
        descriptor: &RequestDescriptor,
        sessions: &dyn SessionProvider,
    ) -> Result<Dispatched, TransportError> {
        let session = match descriptor.auth() {
            AuthRequirement::None => None,
            AuthRequirement::Required | AuthRequirement::Optional => sessions.valid_session().await,
        };

        if descriptor.auth() == AuthRequirement::Required && session.is_none() {
            let redirect_to = sessions.sign_in_redirect_target();
            info!("No session for protected operation, redirecting to {}", redirect_to);
            return Ok(Dispatched::AuthRequired { redirect_to });
        }

        let body = serde_json::to_string(descriptor.request())
            .map_err(|e| TransportError::other(format!("Failed to serialize request: {}", e)))?;

        let mut headers = json_headers();
        if let Some(session) = &session {
            set_header(&mut headers, "Authorization", format!("Bearer {}", session.access_token));
        }
        for (name, value) in descriptor.headers() {
            set_header(&mut headers, name.as_str(), value.as_str());
        }

        let cache_key = (descriptor.cache() == CacheDirective::ForceCache)
            .then(|| ResponseCache::key(&self.backend_url, &body, find_header(&headers, "Authorization")));

        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key).await {
                debug!("Response cache hit");
                return Ok(Dispatched::Response(hit));
            }
        }

        let response = self
            .transport
            .send(HttpRequest {
                url: self.backend_url.clone(),
                headers,
                body: RequestBody::Json(body),
            })
            .await
            .inspect_err(|e| warn!("Backend request failed: {}", e))?;

        reject_gateway_page(&response)?;

        if let Some(key) = cache_key {
            self.cache.store(key, &response).await;
        }

        Ok(Dispatched::Response(response))
    }

    async fn dispatch_untrusted(&self, descriptor: &RequestDescriptor) -> Result<Dispatched, TransportError> {
        let inner = serde_json::to_string(descriptor.request())
            .map_err(|e| TransportError::other(format!("Failed to serialize request: {}", e)))?;
        let envelope = RelayEnvelope {
            body: inner,
            protectid: descriptor.auth() == AuthRequirement::Required,
        };
        let body = serde_json::to_string(&envelope)
            .map_err(|e| TransportError::other(format!("Failed to serialize relay envelope: {}", e)))?;

        // the relay attaches credentials itself; anything the caller set stays behind
        if !descriptor.headers().is_empty() {
            debug!("Dropping {} caller header(s) on untrusted dispatch", descriptor.headers().len());
        }

        let response = self
            .transport
            .send(HttpRequest {
                url: self.relay_url.clone(),
                headers: json_headers(),
                body: RequestBody::Json(body),
            })
            .await
            .inspect_err(|e| warn!("Relay request failed: {}", e))?;

        if response.status == 401 {
            if let Ok(RelayRedirect { redirect }) = serde_json::from_str(&response.body) {
                info!("Relay requires a session, redirecting to {}", redirect);
                return Ok(Dispatched::AuthRequired { redirect_to: redirect });
            }
        }

        reject_gateway_page(&response)?;
        Ok(Dispatched::Response(response))
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
    ]
}

/// A failed status with a non-JSON body is an upstream error page, not a GraphQL reply.
fn reject_gateway_page(response: &RawResponse) -> Result<(), TransportError> {
    if response.is_success() || serde_json::from_str::<Value>(&response.body).is_ok() {
        return Ok(());
    }
    warn!(
        "Upstream returned status {} with a non-JSON body: {}",
        response.status,
        preview(&response.body, 120)
    );
    Err(TransportError::new(TransportCause::InvalidJson))
}
