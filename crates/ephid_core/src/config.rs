//! Resolver configuration.
//!
//! The configuration is a JSON document listing the namespaces and the order in
//! which identifiers are matched against them:
//!
//! ```json
//! {
//!   "priority": ["sharelink", "user"],
//!   "namespaces": [
//!     {
//!       "name": "sharelink",
//!       "backing_root": "/srv/state/sharelink_home",
//!       "length": { "exact": 10 },
//!       "charset": "alphanumeric",
//!       "identity": { "fixed": { "uid": 1001, "gid": 1001 } }
//!     },
//!     {
//!       "name": "user",
//!       "backing_root": "/srv/state/user_home",
//!       "length": { "bounded": { "min": 1, "max": 128 } },
//!       "charset": "username",
//!       "identity": { "hashed": { "base": 200000, "span": 100000, "gid": 1001 } }
//!     }
//!   ]
//! }
//! ```
//!
//! Parsing only checks the shape of the document. Semantic checks (absolute roots,
//! existing directories, priority coverage) happen when the registry is built.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::resolution::{
    error::ConfigError,
    infrastructure::naming::{CharsetRule, DecodeRule, EntryKind, LengthRule},
    services::synthesizer::IdentityPolicy,
};

/// Shell assigned when a namespace does not name one.
pub const DEFAULT_SHELL: &str = "/usr/sbin/nologin";

fn default_shell() -> PathBuf {
    PathBuf::from(DEFAULT_SHELL)
}

/// One namespace entry of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceConfig {
    /// Unique namespace name, also used as GECOS field and hash input
    pub name: String,
    /// Absolute directory holding one entry per live identifier
    pub backing_root: PathBuf,
    /// Identifier length rule
    pub length: LengthRule,
    /// Identifier charset rule
    pub charset: CharsetRule,
    /// Payload decoding, for identifiers embedding an encoded sub-path
    #[serde(default)]
    pub decode: Option<DecodeRule>,
    /// Expected kind of the backing entry
    #[serde(default)]
    pub entry: EntryKind,
    /// Suffix appended to the identifier to form the entry name
    #[serde(default)]
    pub entry_suffix: Option<String>,
    /// Restricted login shell
    #[serde(default = "default_shell")]
    pub shell: PathBuf,
    /// Numeric identity policy
    pub identity: IdentityPolicy,
}

/// Complete resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Namespace names in matching order, first match wins
    pub priority: Vec<String>,
    /// Namespace definitions
    pub namespaces: Vec<NamespaceConfig>,
}

impl ResolverConfig {
    /// Reads and parses a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::UnreadableConfig(path.to_path_buf(), e.kind()))?;
        Self::from_json(&content)
    }

    /// Parses a JSON configuration document.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::MalformedConfig(e.to_string()))
    }

    /// Site layout: job and notebook mount sessions, share links and regular users.
    ///
    /// All four roots live under `state_dir`. Job and notebook session ids are both
    /// 64 lowercase hex characters, so their namespaces overlap and are told apart by
    /// which root holds the entry. Every namespace maps to the same service account.
    pub fn site_defaults(state_dir: impl AsRef<Path>, uid: u32, gid: u32) -> Self {
        let state_dir = state_dir.as_ref();
        let identity = IdentityPolicy::Fixed { uid, gid };
        let session = |name: &str, root: &str, entry: EntryKind, suffix: Option<&str>| {
            NamespaceConfig {
                name: name.to_string(),
                backing_root: state_dir.join(root),
                length: LengthRule::Exact(64),
                charset: CharsetRule::LowerHex,
                decode: None,
                entry,
                entry_suffix: suffix.map(str::to_string),
                shell: default_shell(),
                identity,
            }
        };
        let namespaces = vec![
            session("jobsidmount", "sessid_to_mrsl_link_home", EntryKind::Any, None),
            session(
                "jupytersidmount",
                "sessid_to_jupyter_mount_link_home",
                EntryKind::File,
                Some(".jupyter_mount"),
            ),
            NamespaceConfig {
                name: "sharelink".to_string(),
                backing_root: state_dir.join("sharelink_home"),
                length: LengthRule::Exact(10),
                charset: CharsetRule::Alphanumeric,
                decode: None,
                entry: EntryKind::Directory,
                entry_suffix: None,
                shell: default_shell(),
                identity,
            },
            NamespaceConfig {
                name: "user".to_string(),
                backing_root: state_dir.join("user_home"),
                length: LengthRule::Bounded { min: 1, max: 128 },
                charset: CharsetRule::Username,
                decode: None,
                entry: EntryKind::Directory,
                entry_suffix: None,
                shell: default_shell(),
                identity,
            },
        ];
        Self {
            priority: namespaces.iter().map(|ns| ns.name.clone()).collect(),
            namespaces,
        }
    }
}
