//! Resolution module.
//!
//! Turns a username presented to a file-transfer daemon into a synthetic, ephemeral
//! account identity, or into nothing at all. Ephemeral identities are never stored
//! in any account database: they exist exactly as long as an external system keeps a
//! backing entry (a directory, file or symlink) for them under a namespace root.
//!
//! ## Architecture
//!
//! ### API
//! [`api::ResolveRequest`] and [`api::ResolveResponse`] are exchanged with the
//! [`resolver::ResolverService`], a `tower::Service` that runs the blocking
//! filesystem checks on the tokio blocking pool.
//!
//! ### Services
//! - **Registry**: validated, priority-ordered table of namespaces, immutable after startup
//! - **Classifier**: purely structural matching of an identifier against namespaces
//! - **Synthesizer**: builds the passwd-style identity from a validated identifier
//!
//! ### Infrastructure
//! - **Naming**: identifier, rule and identity types
//! - **Decoder**: permissive base64 decoder for namespaces carrying encoded sub-paths
//! - **Validation**: backing path composition and the single existence check
//! - **Error handling**: fatal configuration errors and per-call I/O errors
//!
//! ## Initialization Helpers
//! - `init_resolver()`: validate a configuration and build the service
//! - `init_resolver_with_registry()`: build the service over an existing registry
pub mod api;
pub mod error;
pub mod infrastructure;
pub mod resolver;
pub mod services;

use std::sync::Arc;

use crate::config::ResolverConfig;

/// Standard resolver service stack.
pub type ResolverDefaultStack = resolver::ResolverService;

/// Initialize a resolver service from a configuration.
///
/// All configuration checks happen here, including a `stat` of every backing root,
/// so a returned service never fails because of its configuration.
///
/// # Errors
/// Any [`error::ConfigError`] found while building the namespace registry. The host
/// should refuse to start.
pub fn init_resolver(config: ResolverConfig) -> Result<ResolverDefaultStack, error::ConfigError> {
    let registry = services::registry::NamespaceRegistry::from_config(config)?;
    Ok(init_resolver_with_registry(Arc::new(registry)))
}

/// Initialize a resolver service sharing an already built registry.
pub fn init_resolver_with_registry(
    registry: Arc<services::registry::NamespaceRegistry>,
) -> ResolverDefaultStack {
    resolver::ResolverService::new(resolver::Resolver::new(registry))
}
