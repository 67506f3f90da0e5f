//! Error Taxonomy
//!
//! Failure kinds produced by the dispatch core. Every kind collapses into an
//! `ActionResult` at the action boundary; none of them escape to UI callers.

use thiserror::Error;

/// Message shown whenever no safer, more specific text is available.
pub const GENERIC_FAILURE: &str = "Something went wrong!";

/// Message used when an upstream gateway answered with a non-JSON page.
pub const INVALID_JSON_FAILURE: &str = "Error occurred while getting data from the server";

/// Why a request never produced a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCause {
    /// Connection refused or reset before a response arrived.
    Connect,
    /// The transport gave up waiting.
    Timeout,
    /// The upstream replied with something that is not JSON (usually an HTML error page).
    InvalidJson,
    /// Anything else the HTTP stack reported.
    Other(String),
}

/// Connectivity-level failure. Raised by transports and the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", self.describe())]
pub struct TransportError {
    pub cause: TransportCause,
}

impl TransportError {
    pub fn new(cause: TransportCause) -> Self {
        Self { cause }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportCause::Other(message.into()))
    }

    /// Human readable text, safe to show to an end user.
    pub fn describe(&self) -> String {
        match &self.cause {
            TransportCause::Connect => "Unable to reach the server. Please try again.".to_string(),
            TransportCause::Timeout => "The server took too long to respond. Please try again.".to_string(),
            TransportCause::InvalidJson => INVALID_JSON_FAILURE.to_string(),
            TransportCause::Other(msg) if msg.trim().is_empty() => GENERIC_FAILURE.to_string(),
            TransportCause::Other(msg) => msg.clone(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let cause = if err.is_timeout() {
            TransportCause::Timeout
        } else if err.is_connect() {
            TransportCause::Connect
        } else if err.is_decode() {
            TransportCause::InvalidJson
        } else {
            TransportCause::Other(err.to_string())
        };
        Self { cause }
    }
}

/// Every way an action can fail. Collapses into `{success: false, message}`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("{message}")]
    Application {
        message: String,
        code: Option<String>,
    },

    /// The payload reported `success: false` even though the request itself went through.
    #[error("{0}")]
    Business(String),

    #[error("{0}")]
    Validation(String),
}

impl ActionError {
    /// The text a failed `ActionResult` carries. Never empty.
    pub fn user_message(&self) -> String {
        let message = match self {
            ActionError::Transport(err) => err.describe(),
            // parse details are not meant for end users
            ActionError::Malformed(_) => GENERIC_FAILURE.to_string(),
            ActionError::Application { message, .. } => message.clone(),
            ActionError::Business(message) => message.clone(),
            ActionError::Validation(message) => message.clone(),
        };
        if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        }
    }
}

/// Invalid or missing gateway configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}
