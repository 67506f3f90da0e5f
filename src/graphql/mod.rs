//! GraphQL Documents
//!
//! Operation documents sent to the Qaree backend and the wire shape of a
//! GraphQL-over-HTTP request.

pub mod mutations;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named GraphQL document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

impl Operation {
    pub const fn new(name: &'static str, document: &'static str) -> Self {
        Self { name, document }
    }
}

/// Body of every backend POST: `{query, variables}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Value,
}

impl GraphQlRequest {
    pub fn new(operation: &Operation, variables: Value) -> Self {
        Self {
            query: operation.document.to_string(),
            variables,
        }
    }

    /// Best-effort operation name, parsed from the document header.
    /// Used for log spans on the relay side where only the text is known.
    pub fn operation_name(&self) -> Option<&str> {
        let rest = self
            .query
            .trim_start()
            .strip_prefix("mutation")
            .or_else(|| self.query.trim_start().strip_prefix("query"))?;
        let rest = rest.trim_start();
        let end = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (end > 0).then(|| &rest[..end])
    }
}
