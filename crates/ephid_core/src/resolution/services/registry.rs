//! Namespace registry.
//!
//! The registry is built once from a [`ResolverConfig`] at startup and shared
//! read-only (behind an `Arc`) by every resolution afterwards. Building it is the
//! only place where configuration problems are fatal: every namespace is checked
//! and every backing root is stat'ed, so that per-call failures can only come from
//! the identifiers themselves or from the filesystem changing underneath.

use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

#[cfg(feature = "ephid_tracing")]
use tracing::info;

use crate::{
    config::{NamespaceConfig, ResolverConfig},
    resolution::{error::ConfigError, infrastructure::naming::Namespace},
};

/// Immutable table of namespaces, stored in matching priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
}

/// Shells and homes are emitted as passwd(5) fields.
fn is_passwd_safe(path: &Path) -> bool {
    path.to_str().is_some_and(|p| !p.chars().any(|c| c == ':' || c.is_control()))
}

impl NamespaceRegistry {
    /// Validates the configuration and builds the registry.
    pub fn from_config(config: ResolverConfig) -> Result<Self, ConfigError> {
        let ResolverConfig { priority, namespaces } = config;
        if namespaces.is_empty() {
            return Err(ConfigError::NoNamespaces);
        }

        let mut seen = HashSet::new();
        for namespace in &namespaces {
            if namespace.name.is_empty() {
                return Err(ConfigError::EmptyNamespaceName);
            }
            if !seen.insert(namespace.name.as_str()) {
                return Err(ConfigError::DuplicateNamespace(namespace.name.clone()));
            }
        }

        let mut listed = HashSet::new();
        for name in &priority {
            if !seen.contains(name.as_str()) {
                return Err(ConfigError::UnknownPriorityEntry(name.clone()));
            }
            if !listed.insert(name.as_str()) {
                return Err(ConfigError::DuplicatePriorityEntry(name.clone()));
            }
        }
        if let Some(missing) = namespaces.iter().find(|ns| !listed.contains(ns.name.as_str())) {
            return Err(ConfigError::UnprioritizedNamespace(missing.name.clone()));
        }

        let mut by_name: HashMap<String, NamespaceConfig> =
            namespaces.into_iter().map(|ns| (ns.name.clone(), ns)).collect();
        let mut ordered = Vec::with_capacity(priority.len());
        for name in &priority {
            // Presence and uniqueness were checked above
            if let Some(config) = by_name.remove(name) {
                ordered.push(Self::build_namespace(config)?);
            }
        }

        #[cfg(feature = "ephid_tracing")]
        info!(
            "[registry] built with {} namespaces: {}",
            ordered.len(),
            ordered.iter().map(Namespace::name).collect::<Vec<_>>().join(", ")
        );

        Ok(Self { namespaces: ordered })
    }

    /// Checks a single namespace entry, including its backing root on disk.
    fn build_namespace(config: NamespaceConfig) -> Result<Namespace, ConfigError> {
        let NamespaceConfig {
            name,
            backing_root,
            length,
            charset,
            decode,
            entry,
            entry_suffix,
            shell,
            identity,
        } = config;

        if !length.is_satisfiable() {
            return Err(ConfigError::InvalidLengthRule(name));
        }
        if !charset.is_well_formed() {
            return Err(ConfigError::InvalidCharsetRule(name));
        }
        if let Some(rule) = &decode {
            if !rule.prefix.is_empty() && !charset.admits(rule.prefix.as_bytes()) {
                return Err(ConfigError::InvalidDecodePrefix(name));
            }
        }
        if let Some(suffix) = &entry_suffix {
            if suffix.is_empty() || suffix.contains(['/', '\0']) {
                return Err(ConfigError::InvalidEntrySuffix(name));
            }
        }
        if !shell.is_absolute() {
            return Err(ConfigError::RelativeShell(name, shell));
        }
        for path in [&shell, &backing_root] {
            if !is_passwd_safe(path) {
                return Err(ConfigError::UnrepresentablePath(name, path.clone()));
            }
        }
        if !identity.is_unprivileged() {
            return Err(ConfigError::PrivilegedId(name));
        }
        if !identity.has_valid_range() {
            return Err(ConfigError::InvalidIdRange(name));
        }
        if !backing_root.is_absolute() {
            return Err(ConfigError::RelativeBackingRoot(name, backing_root));
        }
        match fs::metadata(&backing_root) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => return Err(ConfigError::BackingRootNotDirectory(name, backing_root)),
            Err(e) => return Err(ConfigError::UnreadableBackingRoot(name, backing_root, e.kind())),
        }

        Ok(Namespace::new(
            name,
            backing_root,
            length,
            charset,
            decode,
            entry,
            entry_suffix,
            shell,
            identity,
        ))
    }

    /// Namespaces in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|ns| ns.name() == name)
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }
}
