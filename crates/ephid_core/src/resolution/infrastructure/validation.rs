//! Backing entry validation.
//!
//! The filesystem is the only source of truth for whether an ephemeral identity
//! exists right now: an external system creates one entry per live session under
//! the namespace root and removes it when the session ends. This module composes
//! the candidate path for a classified identifier and checks it with a single
//! read-only `stat`, following symlinks.
//!
//! ## Outcomes
//!
//! **Absent**: the path cannot be composed (undecodable payload, unsafe path
//! component), does not exist, or has the wrong entry kind. This is the expected
//! result for forged or stale identifiers and is reported as `Ok(None)`.
//!
//! **Present**: the entry exists with the expected kind, reported as `Ok(Some(path))`.
//!
//! **Unexpected**: any other I/O failure, such as permission denied on an
//! intermediate directory. Reported as an error so the host can tell a broken
//! deployment from an unknown identifier.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::resolution::{
    error::ResolutionError,
    infrastructure::{
        decoder::DecodedPayload,
        naming::{ClassifiedIdentifier, EntryKind},
    },
};

/// Existence validator for classified identifiers.
///
/// Stateless: it holds no cache, so every call reflects the filesystem as it is at
/// that moment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExistenceValidator;

impl ExistenceValidator {
    /// Composes the backing path of `classified` without touching the filesystem.
    ///
    /// Plain namespaces use the identifier as a single path component. Decode
    /// namespaces decode the part after the prefix and use it as a relative
    /// sub-path, which must be UTF-8 and free of `.`/`..`/empty components, `:`
    /// and control characters.
    /// The namespace entry suffix, if any, is appended to the last component.
    pub fn backing_path(&self, classified: &ClassifiedIdentifier<'_, '_>) -> Option<PathBuf> {
        let namespace = classified.namespace();
        let mut relative = match (namespace.decode_rule(), classified.encoded_part()) {
            (Some(rule), Some(encoded)) => {
                let payload = DecodedPayload::decode(rule.alphabet, encoded);
                let sub_path = String::from_utf8(payload.into_bytes()).ok()?;
                is_safe_sub_path(&sub_path).then_some(sub_path)?
            }
            _ => {
                let component = std::str::from_utf8(classified.text()).ok()?;
                is_safe_component(component).then(|| component.to_string())?
            }
        };
        if let Some(suffix) = namespace.entry_suffix() {
            relative.push_str(suffix);
        }
        Some(namespace.backing_root().join(relative))
    }

    /// Resolves the backing entry of `classified`, if it exists right now.
    pub fn validate(
        &self,
        classified: &ClassifiedIdentifier<'_, '_>,
    ) -> Result<Option<PathBuf>, ResolutionError> {
        let Some(path) = self.backing_path(classified) else {
            return Ok(None);
        };
        if self.entry_exists(&path, classified.namespace().entry())? {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Single `stat` of `path`; absence and wrong kind both mean `false`.
    pub fn entry_exists(&self, path: &Path, entry: EntryKind) -> Result<bool, ResolutionError> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(entry.matches(&metadata)),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                Ok(false)
            }
            Err(e) => Err(ResolutionError::Unexpected(path.to_path_buf(), e.kind())),
        }
    }
}

/// A component ends up both in a path and in a passwd(5) home field, so it may
/// carry neither a separator of either nor a control character.
fn is_safe_component(component: &str) -> bool {
    !component.is_empty()
        && component != "."
        && component != ".."
        && !component.chars().any(|c| c == '/' || c == ':' || c.is_control())
}

fn is_safe_sub_path(sub_path: &str) -> bool {
    !sub_path.is_empty() && sub_path.split('/').all(is_safe_component)
}
