//! Identifier classification.
//!
//! Classification is purely structural: it matches the raw identifier against the
//! length, charset and prefix rules of each namespace, in registry priority order,
//! and never touches the filesystem. An identifier matching no namespace is not an
//! error; the host should defer to its other identity sources.

use crate::resolution::{
    infrastructure::naming::{ClassifiedIdentifier, RawIdentifier},
    services::registry::NamespaceRegistry,
};

/// Returns the first namespace, in priority order, whose structural rules `raw` satisfies.
pub fn classify<'n, 't>(
    registry: &'n NamespaceRegistry,
    raw: RawIdentifier<'t>,
) -> Option<ClassifiedIdentifier<'n, 't>> {
    candidates(registry, raw).next()
}

/// Yields every namespace match for `raw`, in priority order.
///
/// Namespaces may share a format (session ids of different kinds are all hex of
/// the same length), so resolution walks this sequence until a backing entry exists.
pub fn candidates<'n, 't>(
    registry: &'n NamespaceRegistry,
    raw: RawIdentifier<'t>,
) -> impl Iterator<Item = ClassifiedIdentifier<'n, 't>> {
    let text = raw.as_bytes();
    registry
        .iter()
        .filter(move |_| !text.is_empty())
        .filter_map(move |namespace| ClassifiedIdentifier::new(namespace, text))
}
