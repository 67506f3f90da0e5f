//! Response Normalizer
//!
//! Classifies the result of a dispatch into exactly one `Outcome`. The order of
//! the checks matters: transport and parse failures are never reported as
//! application errors.

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatch::Dispatched;
use crate::error::{TransportCause, TransportError, GENERIC_FAILURE};
use crate::utils::truncate::preview;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { data: Value },
    TransportError { cause: TransportCause },
    MalformedResponse { cause: String },
    ApplicationError { message: String, code: Option<String> },
    /// A session was required and missing. The caller must redirect.
    AuthRequired { redirect_to: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

pub fn normalize(dispatched: Result<Dispatched, TransportError>) -> Outcome {
    let response = match dispatched {
        Err(err) => return Outcome::TransportError { cause: err.cause },
        Ok(Dispatched::AuthRequired { redirect_to }) => return Outcome::AuthRequired { redirect_to },
        Ok(Dispatched::Response(response)) => response,
    };

    let body: Value = match serde_json::from_str(&response.body) {
        Ok(body) => body,
        Err(e) => {
            warn!("Response was not valid JSON ({}): {}", e, preview(&response.body, 120));
            return Outcome::MalformedResponse { cause: format!("response was not valid JSON: {}", e) };
        }
    };

    let Value::Object(mut body) = body else {
        return Outcome::MalformedResponse { cause: "response body is not a JSON object".to_string() };
    };

    // any error fails the whole operation; partial data is dropped
    if let Some(errors) = body.get("errors") {
        let first = errors.as_array().and_then(|list| list.first());
        let message = first
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string();
        let code = first
            .and_then(|e| e.pointer("/extensions/code"))
            .and_then(Value::as_str)
            .map(str::to_string);
        if body.get("data").is_some_and(|d| !d.is_null()) {
            debug!("Discarding partial data that accompanied GraphQL errors");
        }
        return Outcome::ApplicationError { message, code };
    }

    match body.remove("data") {
        Some(data) => Outcome::Success { data },
        None => Outcome::MalformedResponse { cause: "response has neither data nor errors".to_string() },
    }
}
