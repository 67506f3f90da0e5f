//! Request descriptors: everything the dispatcher needs to send one request.

use serde_json::Value;

use crate::graphql::{GraphQlRequest, Operation};

/// Execution context of a dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Server side, with direct access to the session credential
    Trusted,
    /// Client side; forwarded through the relay and never sees the credential
    Untrusted,
}

/// Whether a request needs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// No session means redirect to sign-in, nothing is sent.
    Required,
    /// Attach the session credential when there is one.
    Optional,
    /// Deliberately unauthenticated: the session is never consulted.
    None,
}

/// How a dispatch may reuse earlier responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheDirective {
    /// Always hit the network.
    #[default]
    Default,
    /// Serve an identical earlier successful response if one is stored.
    ForceCache,
}

/// One request, immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    operation_name: String,
    request: GraphQlRequest,
    mode: ExecutionMode,
    auth: AuthRequirement,
    cache: CacheDirective,
    headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    /// Server-side request for a known operation. Requires a session unless told otherwise.
    pub fn trusted(operation: Operation) -> DescriptorBuilder {
        DescriptorBuilder::new(operation.name, GraphQlRequest::new(&operation, Value::Null))
            .mode(ExecutionMode::Trusted)
    }

    /// Client-side request for a known operation, sent through the relay.
    pub fn untrusted(operation: Operation) -> DescriptorBuilder {
        DescriptorBuilder::new(operation.name, GraphQlRequest::new(&operation, Value::Null))
            .mode(ExecutionMode::Untrusted)
    }

    /// Wrap an already-serialized request, as received by the relay.
    pub fn from_request(request: GraphQlRequest) -> DescriptorBuilder {
        let name = request.operation_name().unwrap_or("anonymous").to_string();
        DescriptorBuilder::new(name, request)
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn request(&self) -> &GraphQlRequest {
        &self.request
    }

    pub fn variables(&self) -> &Value {
        &self.request.variables
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn auth(&self) -> AuthRequirement {
        self.auth
    }

    pub fn cache(&self) -> CacheDirective {
        self.cache
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

pub struct DescriptorBuilder {
    operation_name: String,
    request: GraphQlRequest,
    mode: ExecutionMode,
    auth: AuthRequirement,
    cache: CacheDirective,
    headers: Vec<(String, String)>,
}

impl DescriptorBuilder {
    fn new(operation_name: impl Into<String>, request: GraphQlRequest) -> Self {
        Self {
            operation_name: operation_name.into(),
            request,
            mode: ExecutionMode::Trusted,
            auth: AuthRequirement::Required,
            cache: CacheDirective::Default,
            headers: Vec::new(),
        }
    }

    pub fn variables(mut self, variables: Value) -> Self {
        self.request.variables = variables;
        self
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn auth(mut self, auth: AuthRequirement) -> Self {
        self.auth = auth;
        self
    }

    pub fn cache(mut self, cache: CacheDirective) -> Self {
        self.cache = cache;
        self
    }

    /// Extra header. Overrides any default of the same name, including `Authorization`.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            operation_name: self.operation_name,
            request: self.request,
            mode: self.mode,
            auth: self.auth,
            cache: self.cache,
            headers: self.headers,
        }
    }
}

/// Insert or replace a header, matching names case-insensitively.
pub fn set_header(headers: &mut Vec<(String, String)>, name: impl Into<String>, value: impl Into<String>) {
    let name = name.into();
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
    headers.push((name, value.into()));
}

/// Case-insensitive header lookup.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphql::mutations;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let descriptor = RequestDescriptor::trusted(mutations::PUBLISH_BOOK)
            .variables(json!({ "bookId": "42" }))
            .build();

        assert_eq!(descriptor.operation_name(), "publishBook");
        assert_eq!(descriptor.mode(), ExecutionMode::Trusted);
        assert_eq!(descriptor.auth(), AuthRequirement::Required);
        assert_eq!(descriptor.cache(), CacheDirective::Default);
        assert_eq!(descriptor.variables()["bookId"], "42");
        assert!(descriptor.headers().is_empty());
    }

    #[test]
    fn test_header_override_is_case_insensitive() {
        let descriptor = RequestDescriptor::trusted(mutations::RESET_PASSWORD)
            .header("authorization", "Bearer old")
            .bearer("T")
            .build();

        assert_eq!(descriptor.headers().len(), 1);
        assert_eq!(find_header(descriptor.headers(), "AUTHORIZATION"), Some("Bearer T"));
    }

    #[test]
    fn test_from_request_names_operation() {
        let request = GraphQlRequest::new(&mutations::VERIFY_ACCOUNT, json!({}));
        let descriptor = RequestDescriptor::from_request(request).build();
        assert_eq!(descriptor.operation_name(), "verifyAccount");
    }
}
