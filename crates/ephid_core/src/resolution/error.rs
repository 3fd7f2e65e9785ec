use std::{io, path::PathBuf};

use thiserror::Error;

/// Startup-time configuration failures.
///
/// Every variant is fatal: a process that cannot build its namespace registry
/// must refuse to serve lookups rather than answer with a partial table.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Configuration error, unable to read configuration file (path: {0:?}): {1}")]
    UnreadableConfig(PathBuf, io::ErrorKind),

    #[error("Configuration error, malformed configuration: {0}")]
    MalformedConfig(String),

    #[error("Configuration error, no namespace configured")]
    NoNamespaces,

    #[error("Configuration error, namespace name must not be empty")]
    EmptyNamespaceName,

    #[error("Configuration error, duplicate namespace (name: {0})")]
    DuplicateNamespace(String),

    #[error("Configuration error, priority list references unknown namespace (name: {0})")]
    UnknownPriorityEntry(String),

    #[error("Configuration error, namespace listed twice in priority list (name: {0})")]
    DuplicatePriorityEntry(String),

    #[error("Configuration error, namespace missing from priority list (name: {0})")]
    UnprioritizedNamespace(String),

    #[error("Configuration error, backing root is not an absolute path (namespace: {0}, root: {1:?})")]
    RelativeBackingRoot(String, PathBuf),

    #[error("Configuration error, unable to stat backing root (namespace: {0}, root: {1:?}): {2}")]
    UnreadableBackingRoot(String, PathBuf, io::ErrorKind),

    #[error("Configuration error, backing root is not a directory (namespace: {0}, root: {1:?})")]
    BackingRootNotDirectory(String, PathBuf),

    #[error("Configuration error, invalid length rule (namespace: {0})")]
    InvalidLengthRule(String),

    #[error("Configuration error, invalid charset rule (namespace: {0})")]
    InvalidCharsetRule(String),

    #[error("Configuration error, invalid entry suffix (namespace: {0})")]
    InvalidEntrySuffix(String),

    #[error("Configuration error, decode prefix not admitted by charset (namespace: {0})")]
    InvalidDecodePrefix(String),

    #[error("Configuration error, shell is not an absolute path (namespace: {0}, shell: {1:?})")]
    RelativeShell(String, PathBuf),

    #[error("Configuration error, path cannot appear in a passwd entry (namespace: {0}, path: {1:?})")]
    UnrepresentablePath(String, PathBuf),

    #[error("Configuration error, identity policy would assign a privileged id (namespace: {0})")]
    PrivilegedId(String),

    #[error("Configuration error, hashed identity range is empty or overflows (namespace: {0})")]
    InvalidIdRange(String),
}

/// Per-call failures that are neither a match nor a plain rejection.
///
/// An identifier that does not resolve is not an error: it is reported as a
/// rejection value. Only conditions the host may want to retry or escalate
/// land here.
#[derive(Debug, Error, PartialEq)]
pub enum ResolutionError {
    #[error("Resolution error, unable to inspect backing entry (path: {0:?}): {1}")]
    Unexpected(PathBuf, io::ErrorKind),

    #[error("Resolution error, blocking lookup task failed")]
    BlockingTaskFailed,
}
