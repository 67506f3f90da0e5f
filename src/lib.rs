//! Qaree Gateway
//!
//! Authenticated request dispatch core of the Qaree publishing platform:
//! - Trusted and untrusted (relayed) GraphQL dispatch
//! - Session gating with explicit redirect outcomes
//! - One normalized result shape for every business action

pub mod actions;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod graphql;
pub mod normalize;
pub mod server;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use actions::{ActionReply, ActionResult, Actions, Redirect};
pub use config::GatewayConfig;
pub use dispatch::{Dispatcher, RequestDescriptor};
pub use normalize::{normalize, Outcome};
pub use session::{Session, SessionProvider};
