#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use qaree_gateway::actions::Actions;
use qaree_gateway::dispatch::{find_header, Dispatcher, HttpRequest, RawResponse, RequestBody, Transport};
use qaree_gateway::error::{TransportCause, TransportError};
use qaree_gateway::session::{Identity, Session, StaticSessionProvider};

pub const BACKEND_URL: &str = "http://backend.test/graphql";
pub const RELAY_URL: &str = "http://app.test/api";
pub const UPLOAD_URL: &str = "http://backend.test/upload";

/// Scripted transport that records every request it sees
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<VecDeque<Result<RawResponse, TransportError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    events: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reply(&self, status: u16, body: impl Into<String>) -> &Self {
        self.replies.lock().await.push_back(Ok(RawResponse::new(status, body)));
        self
    }

    pub async fn reply_json(&self, body: Value) -> &Self {
        self.reply(200, body.to_string()).await
    }

    pub async fn fail(&self, cause: TransportCause) -> &Self {
        self.replies.lock().await.push_back(Err(TransportError::new(cause)));
        self
    }

    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// `start:<url>` / `end:<url>` markers, in the order they happened
    pub async fn events(&self) -> Vec<String> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let url = request.url.clone();
        self.events.lock().await.push(format!("start:{}", url));
        self.requests.lock().await.push(request);

        // give a concurrent caller the chance to interleave, if there were one
        tokio::task::yield_now().await;

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::other("no scripted reply")));
        self.events.lock().await.push(format!("end:{}", url));
        reply
    }
}

pub fn session(token: &str) -> Session {
    Session::new(
        token,
        Identity {
            id: "user-1".into(),
            email: "author@qaree.test".into(),
            name: Some("Author".into()),
        },
    )
}

pub fn dispatcher(transport: &MockTransport) -> Dispatcher {
    Dispatcher::new(Arc::new(transport.clone()), BACKEND_URL, RELAY_URL)
}

pub fn actions(transport: &MockTransport, session: Option<Session>) -> Actions {
    actions_with_sign_in(transport, session, "/signin")
}

pub fn actions_with_sign_in(transport: &MockTransport, session: Option<Session>, sign_in: &str) -> Actions {
    Actions::new(
        dispatcher(transport),
        Arc::new(StaticSessionProvider::new(session, sign_in)),
        UPLOAD_URL,
    )
}

pub fn json_body(request: &HttpRequest) -> Value {
    match &request.body {
        RequestBody::Json(text) => serde_json::from_str(text).expect("request body is JSON"),
        RequestBody::Multipart(_) => panic!("expected a JSON body"),
    }
}

pub fn authorization(request: &HttpRequest) -> Option<&str> {
    find_header(&request.headers, "Authorization")
}
