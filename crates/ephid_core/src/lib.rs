//! Ephemeral session identity resolution.
//!
//! This library lets a file-transfer daemon (SFTP, WebDAV, FTP) accept usernames
//! that are not accounts at all but short-lived session identifiers: job session
//! ids, notebook mount ids, share links, or base64-encoded sub-paths. A username
//! resolves to a synthetic identity only while the external system keeps a
//! backing entry for it on disk, and to nothing otherwise.
//!
//! Resolution is side-channel free towards the client: malformed identifiers and
//! well-formed identifiers without a live entry produce the same `NotFound`.
//!
//! The resolver is exposed as a [`tower`] service, see
//! [`resolution::init_resolver`].
//!
//! [`tower`]: https://docs.rs/tower

#[cfg(test)]
mod tests;

pub mod config;
pub mod resolution;

#[cfg(feature = "ephid_tracing")]
pub mod ephid_tracing {
    use std::sync::Once;
    use tracing_subscriber::{EnvFilter, fmt};

    static INIT: Once = Once::new();

    /// Initialize tracing for tests.
    ///
    /// Output goes through the test writer and is filtered by `RUST_LOG`, off by default.
    pub fn init() {
        INIT.call_once(|| {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));

            fmt().with_target(false).with_test_writer().with_env_filter(filter).init();
        });
    }

    /// Initialize tracing for a host binary, writing to stderr.
    ///
    /// `default_directive` applies when `RUST_LOG` is unset, e.g. `"warn"`.
    pub fn init_stderr(default_directive: &str) {
        INIT.call_once(|| {
            let filter = EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive));

            fmt()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        });
    }
}
