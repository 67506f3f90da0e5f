//! Utils Module
pub mod otel;
pub mod truncate;

pub use truncate::preview;
