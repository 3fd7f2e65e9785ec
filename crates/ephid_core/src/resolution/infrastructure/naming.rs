//! Identifier naming and identity types.
//!
//! This module defines the vocabulary shared by every resolution stage: the raw
//! identifier presented as a username, the structural rules a namespace imposes on
//! it, the classified identifier that satisfied those rules, and the synthetic
//! identity handed back to the host.
//!
//! ## Namespaces
//!
//! A namespace is a category of ephemeral identifier (shared link, job mount session,
//! notebook mount session, ...) backed by a directory root that an external system
//! populates as sessions start and removes as they end. Namespaces are built once by
//! the registry and never mutated afterwards.
//!
//! ## Structural Rules
//!
//! Length and charset rules are checked before any filesystem access so that
//! malformed identifiers cost no I/O.

use std::{
    fmt::{self, Display},
    fs::Metadata,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::resolution::{infrastructure::decoder::Alphabet, services::synthesizer::IdentityPolicy};

/// Identifier exactly as presented by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawIdentifier<'a>(&'a [u8]);

impl<'a> RawIdentifier<'a> {
    pub fn new(text: &'a [u8]) -> Self {
        Self(text)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }
}

impl<'a> From<&'a str> for RawIdentifier<'a> {
    fn from(text: &'a str) -> Self {
        Self(text.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for RawIdentifier<'a> {
    fn from(text: &'a [u8]) -> Self {
        Self(text)
    }
}

/// Accepted identifier length, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthRule {
    /// Exactly this many bytes
    Exact(usize),
    /// Between `min` and `max` bytes, both inclusive
    Bounded { min: usize, max: usize },
    /// No length constraint
    Any,
}

impl LengthRule {
    pub fn admits(&self, len: usize) -> bool {
        match *self {
            LengthRule::Exact(expected) => len == expected,
            LengthRule::Bounded { min, max } => (min..=max).contains(&len),
            LengthRule::Any => true,
        }
    }

    /// A rule that no identifier can satisfy is a configuration mistake.
    pub(crate) fn is_satisfiable(&self) -> bool {
        match *self {
            LengthRule::Exact(expected) => expected > 0,
            LengthRule::Bounded { min, max } => min <= max && max > 0,
            LengthRule::Any => true,
        }
    }
}

/// Characters an identifier may contain.
///
/// All rules are ASCII-only so that an admitted identifier is also valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharsetRule {
    /// `[A-Za-z0-9]`
    Alphanumeric,
    /// `[0-9a-f]`, as produced by hex-encoding random session bytes
    LowerHex,
    /// Alphanumerics plus `.@_-`, first character alphanumeric
    Username,
    /// Standard base64 alphabet plus `=`
    Base64,
    /// URL-safe base64 alphabet plus `=`
    Base64Url,
    /// Alphanumerics plus the listed ASCII punctuation
    AlphanumericPlus { extra: String },
}

impl CharsetRule {
    pub fn admits(&self, text: &[u8]) -> bool {
        match self {
            CharsetRule::Alphanumeric => text.iter().all(u8::is_ascii_alphanumeric),
            CharsetRule::LowerHex => text.iter().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
            CharsetRule::Username => {
                text.first().is_some_and(u8::is_ascii_alphanumeric)
                    && text.iter().all(|b| b.is_ascii_alphanumeric() || b".@_-".contains(b))
            }
            CharsetRule::Base64 => text.iter().all(|&b| Alphabet::Standard.is_encoding_byte(b)),
            CharsetRule::Base64Url => text.iter().all(|&b| Alphabet::UrlSafe.is_encoding_byte(b)),
            CharsetRule::AlphanumericPlus { extra } => {
                text.iter().all(|b| b.is_ascii_alphanumeric() || extra.as_bytes().contains(b))
            }
        }
    }

    /// Extra characters must be printable ASCII, never a path separator and never
    /// the passwd(5) field separator.
    pub(crate) fn is_well_formed(&self) -> bool {
        match self {
            CharsetRule::AlphanumericPlus { extra } => {
                extra.bytes().all(|b| b.is_ascii_graphic() && b != b'/' && b != b':')
            }
            _ => true,
        }
    }
}

/// Kind of filesystem entry expected under the backing root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    #[default]
    Directory,
    File,
    Any,
}

impl EntryKind {
    /// Checks metadata of an existing entry, symlinks already followed.
    pub fn matches(&self, metadata: &Metadata) -> bool {
        match self {
            EntryKind::Directory => metadata.is_dir(),
            EntryKind::File => metadata.is_file(),
            EntryKind::Any => true,
        }
    }
}

/// Payload extraction for namespaces whose identifiers embed an encoded sub-path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecodeRule {
    /// Alphabet the payload is encoded with
    pub alphabet: Alphabet,
    /// Literal prefix preceding the payload, stripped before decoding
    #[serde(default)]
    pub prefix: String,
}

/// A registered identifier namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    backing_root: PathBuf,
    length: LengthRule,
    charset: CharsetRule,
    decode: Option<DecodeRule>,
    entry: EntryKind,
    entry_suffix: Option<String>,
    shell: PathBuf,
    identity: IdentityPolicy,
}

impl Namespace {
    /// Assembles a namespace. Only the registry calls this, after validating every field.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        backing_root: PathBuf,
        length: LengthRule,
        charset: CharsetRule,
        decode: Option<DecodeRule>,
        entry: EntryKind,
        entry_suffix: Option<String>,
        shell: PathBuf,
        identity: IdentityPolicy,
    ) -> Self {
        Self { name, backing_root, length, charset, decode, entry, entry_suffix, shell, identity }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backing_root(&self) -> &Path {
        &self.backing_root
    }

    pub fn length(&self) -> LengthRule {
        self.length
    }

    pub fn charset(&self) -> &CharsetRule {
        &self.charset
    }

    pub fn decode_rule(&self) -> Option<&DecodeRule> {
        self.decode.as_ref()
    }

    pub fn requires_decode(&self) -> bool {
        self.decode.is_some()
    }

    pub fn entry(&self) -> EntryKind {
        self.entry
    }

    pub fn entry_suffix(&self) -> Option<&str> {
        self.entry_suffix.as_deref()
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }

    pub fn identity(&self) -> &IdentityPolicy {
        &self.identity
    }

    /// Structural check: length first, then charset, then the decode prefix.
    ///
    /// Never touches the filesystem.
    pub fn admits(&self, text: &[u8]) -> bool {
        if !self.length.admits(text.len()) || !self.charset.admits(text) {
            return false;
        }
        match &self.decode {
            Some(rule) => text.len() > rule.prefix.len() && text.starts_with(rule.prefix.as_bytes()),
            None => true,
        }
    }
}

/// Identifier that passed the structural check of `namespace`.
///
/// The namespace borrow (`'n`, from the registry) outlives the presented text
/// (`'t`), so it is kept separate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedIdentifier<'n, 't> {
    namespace: &'n Namespace,
    text: &'t [u8],
}

impl<'n, 't> ClassifiedIdentifier<'n, 't> {
    /// Returns `None` unless `text` satisfies the namespace rules.
    pub fn new(namespace: &'n Namespace, text: &'t [u8]) -> Option<Self> {
        namespace.admits(text).then_some(Self { namespace, text })
    }

    pub fn namespace(&self) -> &'n Namespace {
        self.namespace
    }

    pub fn text(&self) -> &'t [u8] {
        self.text
    }

    /// Identifier as a string. Charset rules are ASCII-only, so this is lossless.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.text).into_owned()
    }

    /// Part of the identifier carrying the encoded payload, if the namespace decodes.
    pub fn encoded_part(&self) -> Option<&'t [u8]> {
        self.namespace.decode_rule().map(|rule| &self.text[rule.prefix.len()..])
    }
}

/// Transient identity produced for a resolved identifier.
///
/// Never persisted: every resolution derives it again from the identifier, the
/// namespace configuration and the backing entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SyntheticIdentity {
    /// Login name, the identifier itself
    pub name: String,
    /// Namespace the identifier resolved in
    pub namespace: String,
    /// Numeric user id
    pub uid: u32,
    /// Numeric group id
    pub gid: u32,
    /// Home directory, the backing entry
    pub home: PathBuf,
    /// Restricted login shell
    pub shell: PathBuf,
}

/// Renders a passwd(5) line, using the namespace as the GECOS field.
impl Display for SyntheticIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:x:{}:{}:{}:{}:{}",
            self.name,
            self.uid,
            self.gid,
            self.namespace,
            self.home.display(),
            self.shell.display()
        )
    }
}
