//! Resolution services.
//!
//! - **Registry**: immutable namespace table built once from configuration
//! - **Classifier**: structural matching of identifiers against namespaces
//! - **Synthesizer**: synthetic identity construction and numeric id policies

pub mod classifier;
pub mod registry;
pub mod synthesizer;
