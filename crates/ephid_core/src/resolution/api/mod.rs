//! External-facing API of the resolver.
//!
//! Request and response types for the `tower` resolver service.

pub mod types;

// Re-export all types for convenience
pub use types::*;
