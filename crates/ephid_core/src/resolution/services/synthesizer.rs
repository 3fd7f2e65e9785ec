//! Synthetic identity construction.
//!
//! A resolved identifier gets an identity derived from three inputs only: the
//! classified identifier, its namespace configuration and the backing entry that
//! proved it exists. Nothing is stored between calls, so two resolutions of the same
//! identifier against an unchanged backing entry yield identical records.
//!
//! ## Numeric Id Policies
//!
//! - **Fixed**: every identity of the namespace shares one low-privilege uid/gid.
//!   This is how file ownership works when all sessions map onto a single service
//!   account.
//! - **Hashed**: the uid is `base + H(namespace, identifier) mod span`, with `H` the
//!   first four bytes of a SHA-256 digest read big-endian. The gid stays fixed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::resolution::infrastructure::naming::{ClassifiedIdentifier, SyntheticIdentity};

/// Numeric identity assignment.
pub trait IdPolicy {
    /// Returns the `(uid, gid)` pair for `text` in `namespace`.
    fn assign(&self, namespace: &str, text: &[u8]) -> (u32, u32);
}

/// Configured numeric identity policy of a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Same uid and gid for every identifier
    Fixed { uid: u32, gid: u32 },
    /// Uid hashed into `[base, base + span)`, fixed gid
    Hashed { base: u32, span: u32, gid: u32 },
}

impl IdentityPolicy {
    /// Neither uid nor gid may ever be 0.
    pub(crate) fn is_unprivileged(&self) -> bool {
        match *self {
            IdentityPolicy::Fixed { uid, gid } => uid != 0 && gid != 0,
            IdentityPolicy::Hashed { base, gid, .. } => base != 0 && gid != 0,
        }
    }

    /// The hashed range must be non-empty and fit in a `u32`.
    pub(crate) fn has_valid_range(&self) -> bool {
        match *self {
            IdentityPolicy::Fixed { .. } => true,
            IdentityPolicy::Hashed { base, span, .. } => {
                span > 0 && base.checked_add(span - 1).is_some()
            }
        }
    }
}

impl IdPolicy for IdentityPolicy {
    fn assign(&self, namespace: &str, text: &[u8]) -> (u32, u32) {
        match *self {
            IdentityPolicy::Fixed { uid, gid } => (uid, gid),
            IdentityPolicy::Hashed { base, span, gid } => {
                let mut hasher = Sha256::new();
                hasher.update(namespace.as_bytes());
                hasher.update([0u8]);
                hasher.update(text);
                let digest = hasher.finalize();
                let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
                // Registry-built policies have a valid range; clamp anything else
                (base.saturating_add(prefix % span.max(1)), gid)
            }
        }
    }
}

/// Builds the identity for `classified` using an explicit id policy.
pub fn synthesize_with<P: IdPolicy>(
    policy: &P,
    classified: &ClassifiedIdentifier<'_, '_>,
    backing_path: PathBuf,
) -> SyntheticIdentity {
    let namespace = classified.namespace();
    let (uid, gid) = policy.assign(namespace.name(), classified.text());
    SyntheticIdentity {
        name: classified.name(),
        namespace: namespace.name().to_string(),
        uid,
        gid,
        home: backing_path,
        shell: namespace.shell().to_path_buf(),
    }
}

/// Builds the identity for `classified` using its namespace's configured policy.
pub fn synthesize(classified: &ClassifiedIdentifier<'_, '_>, backing_path: PathBuf) -> SyntheticIdentity {
    synthesize_with(classified.namespace().identity(), classified, backing_path)
}
