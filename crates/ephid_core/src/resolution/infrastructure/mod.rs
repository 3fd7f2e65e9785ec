//! Infrastructure primitives for identifier resolution.
//!
//! This module provides the building blocks used by every resolution stage:
//! payload decoding, identifier and identity naming, and backing entry validation.

pub mod decoder;
pub mod naming;
pub mod validation;
