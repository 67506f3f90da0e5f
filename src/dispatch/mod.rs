//! Dispatch Module
//!
//! The single choke point through which every backend call travels.

mod cache;
mod descriptor;
mod dispatcher;
mod transport;

pub use cache::{CacheKey, ResponseCache};
pub use descriptor::{
    find_header, set_header, AuthRequirement, CacheDirective, DescriptorBuilder, ExecutionMode, RequestDescriptor,
};
pub use dispatcher::{Dispatched, Dispatcher, RelayEnvelope, RelayRedirect};
pub use transport::{HttpRequest, HttpTransport, RawResponse, RequestBody, Transport, UploadPart};
