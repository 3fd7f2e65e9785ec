//! Resolver API type definitions.
//!
//! Requests and responses exchanged with the [`ResolverService`], the `tower`
//! front of the resolver. Hosts dispatching name lookups (an SFTP daemon's
//! password backend, an NSS-style shim) send one request per presented username.
//!
//! A lookup either yields an identity or `NotFound`. `NotFound` is deliberately
//! uninformative: it covers malformed identifiers and well-formed identifiers
//! without a live backing entry alike.
//!
//! [`ResolverService`]: crate::resolution::resolver::ResolverService

use crate::resolution::infrastructure::naming::SyntheticIdentity;

/// Resolver request types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveRequest {
    /// Resolve a presented username into a synthetic identity.
    ByName(String),

    /// Report which namespace a username belongs to, by structure alone.
    ///
    /// Does not touch the filesystem; meant for diagnostics.
    Classify(String),
}

/// Resolver response types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveResponse {
    /// The username resolved to a live ephemeral identity.
    Identity(SyntheticIdentity),

    /// No identity: defer to other identity sources.
    NotFound,

    /// Name of the first matching namespace, if any.
    Namespace(Option<String>),
}
