//! Action Layer
//!
//! One operation per business capability. Every action follows the same
//! template: validate locally, dispatch, normalize, check the payload, and
//! only then perform side effects. Actions are total: they always return an
//! `ActionReply`, never an error.

mod account;
mod book;
mod validate;

pub use book::{Author, Book, BookDetails, UploadBundle};
pub use validate::{is_email, RegisterData, Validate};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::dispatch::{Dispatcher, RequestDescriptor};
use crate::error::{ActionError, TransportError, GENERIC_FAILURE};
use crate::normalize::{normalize, Outcome};
use crate::session::SessionProvider;

/// Uniform result handed to UI callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ActionResult<T> {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: non_blank(message.into(), "Success"),
            data: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::ok(message)
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: non_blank(message.into(), GENERIC_FAILURE),
            data: None,
        }
    }

    pub fn from_error(err: &ActionError) -> Self {
        Self::failure(err.user_message())
    }
}

fn non_blank(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// A navigation the caller must perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub location: String,
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self { location: location.into() }
    }
}

/// What an action hands back: a result, or a redirect instead of one
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum ActionReply<T = ()> {
    Done(ActionResult<T>),
    Redirect(Redirect),
}

impl<T> ActionReply<T> {
    pub fn result(&self) -> Option<&ActionResult<T>> {
        match self {
            ActionReply::Done(result) => Some(result),
            ActionReply::Redirect(_) => None,
        }
    }

    pub fn into_result(self) -> Option<ActionResult<T>> {
        match self {
            ActionReply::Done(result) => Some(result),
            ActionReply::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            ActionReply::Redirect(redirect) => Some(redirect),
            ActionReply::Done(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ActionReply::Done(result) if result.success)
    }
}

/// Why an action stopped before producing its own result
#[derive(Debug)]
enum Escape {
    Redirect(Redirect),
    Failed(ActionError),
}

impl From<ActionError> for Escape {
    fn from(err: ActionError) -> Self {
        Escape::Failed(err)
    }
}

type Step<T> = Result<T, Escape>;

/// Entry point for every business operation
#[derive(Clone)]
pub struct Actions {
    dispatcher: Dispatcher,
    sessions: Arc<dyn SessionProvider>,
    upload_base_url: String,
}

impl Actions {
    pub fn new(dispatcher: Dispatcher, sessions: Arc<dyn SessionProvider>, upload_base_url: impl Into<String>) -> Self {
        Self {
            dispatcher,
            sessions,
            upload_base_url: upload_base_url.into(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch and normalize; hands back the `data` member on success.
    async fn run(&self, descriptor: RequestDescriptor) -> Step<Value> {
        let dispatched = self.dispatcher.dispatch(&descriptor, self.sessions.as_ref()).await;
        match normalize(dispatched) {
            Outcome::Success { data } => Ok(data),
            Outcome::AuthRequired { redirect_to } => Err(Escape::Redirect(Redirect::to(redirect_to))),
            Outcome::TransportError { cause } => Err(ActionError::Transport(TransportError::new(cause)).into()),
            Outcome::MalformedResponse { cause } => Err(ActionError::Malformed(cause).into()),
            Outcome::ApplicationError { message, code } => Err(ActionError::Application { message, code }.into()),
        }
    }

    /// Collapse a step into the reply the caller sees.
    fn settle<T>(&self, action: &str, step: Step<ActionReply<T>>) -> ActionReply<T> {
        match step {
            Ok(ActionReply::Done(result)) => {
                info!(action, success = result.success, "Action finished: {}", result.message);
                ActionReply::Done(result)
            }
            Ok(ActionReply::Redirect(redirect)) | Err(Escape::Redirect(redirect)) => {
                info!(action, "Action redirected to {}", redirect.location);
                ActionReply::Redirect(redirect)
            }
            Err(Escape::Failed(err)) => {
                warn!(action, "Action failed: {:?}", err);
                ActionReply::Done(ActionResult::from_error(&err))
            }
        }
    }
}

/// The payload object under `field`, or `None` when missing or null.
fn payload<T: DeserializeOwned>(data: &mut Value, field: &str) -> Result<Option<T>, ActionError> {
    match data.get_mut(field).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| ActionError::Malformed(format!("unexpected `{}` payload: {}", field, e))),
    }
}

/// The `{success, message}` shape most account mutations answer with
#[derive(Debug, Clone, Default, Deserialize)]
struct StatusPayload {
    /// GraphQL-nullable; `null` reads as failure
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

impl StatusPayload {
    /// Fail with the server's message, or `fallback`, unless the payload says success.
    fn confirmed(payload: Option<Self>, fallback: &str) -> Result<Self, ActionError> {
        match payload {
            Some(status) if status.success == Some(true) => Ok(status),
            other => Err(ActionError::Business(
                other
                    .and_then(|s| s.message)
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }

    fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
