//! Identifier resolution.
//!
//! Each call walks the same states and ends in exactly one of them:
//!
//! ```text
//! Received -> Classified -> (Decoded) -> Validated -> Synthesized
//!     \            \             \            \
//!      +------------+-------------+------------+----> Rejected
//! ```
//!
//! An I/O failure other than absence while validating ends the call with a
//! [`ResolutionError`] instead. No state survives the call: the registry is
//! read-only and nothing is cached, so removing a backing entry takes effect on
//! the very next lookup.

use std::{future::Future, pin::Pin, sync::Arc, task::Poll};

use tower::Service;
#[cfg(feature = "ephid_tracing")]
use tracing::{debug, info, warn};

use crate::resolution::{
    api::{ResolveRequest, ResolveResponse},
    error::ResolutionError,
    infrastructure::{
        naming::{Namespace, RawIdentifier, SyntheticIdentity},
        validation::ExistenceValidator,
    },
    services::{
        classifier::{candidates, classify},
        registry::NamespaceRegistry,
        synthesizer::synthesize,
    },
};

/// Terminal state of a resolution that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A live ephemeral identity
    Synthesized(SyntheticIdentity),
    /// No identity, for whatever reason
    Rejected,
}

/// Blocking resolver over a shared namespace registry.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: Arc<NamespaceRegistry>,
    validator: ExistenceValidator,
}

impl Resolver {
    pub fn new(registry: Arc<NamespaceRegistry>) -> Self {
        Self { registry, validator: ExistenceValidator }
    }

    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// First namespace whose structural rules `name` satisfies.
    pub fn classify(&self, name: &str) -> Option<&Namespace> {
        classify(&self.registry, RawIdentifier::from(name)).map(|c| c.namespace())
    }

    /// Resolves `name`, performing blocking filesystem checks.
    ///
    /// Structurally matching namespaces are tried in priority order until one has
    /// a live backing entry. An unexpected I/O error stops the walk.
    pub fn resolve(&self, name: &str) -> Result<Resolution, ResolutionError> {
        for classified in candidates(&self.registry, RawIdentifier::from(name)) {
            match self.validator.validate(&classified) {
                Ok(Some(path)) => {
                    let identity = synthesize(&classified, path);
                    #[cfg(feature = "ephid_tracing")]
                    info!(
                        "[resolver] Synthesized: name: {}, namespace: {}, uid: {}",
                        identity.name, identity.namespace, identity.uid
                    );
                    return Ok(Resolution::Synthesized(identity));
                }
                Ok(None) => continue,
                Err(e) => {
                    #[cfg(feature = "ephid_tracing")]
                    warn!("[resolver] {} (namespace: {})", e, classified.namespace().name());
                    return Err(e);
                }
            }
        }
        #[cfg(feature = "ephid_tracing")]
        debug!("[resolver] Rejected lookup");
        Ok(Resolution::Rejected)
    }
}

/// `tower` front of the [`Resolver`].
///
/// Filesystem checks run on the blocking thread pool of the current tokio runtime.
#[derive(Debug, Clone)]
pub struct ResolverService {
    resolver: Resolver,
}

impl ResolverService {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }
}

impl Service<ResolveRequest> for ResolverService {
    type Response = ResolveResponse;
    type Error = ResolutionError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: ResolveRequest) -> Self::Future {
        let resolver = self.resolver.clone();
        Box::pin(async move {
            match request {
                ResolveRequest::ByName(name) => {
                    let resolution = tokio::task::spawn_blocking(move || resolver.resolve(&name))
                        .await
                        .map_err(|_| ResolutionError::BlockingTaskFailed)??;
                    Ok(match resolution {
                        Resolution::Synthesized(identity) => ResolveResponse::Identity(identity),
                        Resolution::Rejected => ResolveResponse::NotFound,
                    })
                }
                ResolveRequest::Classify(name) => Ok(ResolveResponse::Namespace(
                    resolver.classify(&name).map(|ns| ns.name().to_string()),
                )),
            }
        })
    }
}
