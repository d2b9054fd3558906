//! First-order Markov chain engine.
//!
//! This crate provides a generic weighted Markov chain including:
//! - Payload-generic states with stable, insertion-ordered identities
//! - Incremental transition-frequency learning
//! - Weighted random sampling and bounded walk generation
//!
//! Only the high-level API is exposed publicly. Low-level components
//! are kept internal to ensure consistency and prevent misuse.

/// Core chain model, learning and sampling logic.
///
/// This module exposes the chain interface while keeping internal
/// state representations private.
pub mod model;
