//! Top-level module for the Markov chain engine.
//!
//! This crate provides a first-order weighted Markov chain, including:
//! - An insertion-ordered state database (`Chain`)
//! - Payload-generic states addressed by opaque ids (`StateId`)
//! - A payload contract supplied by the caller (`Payload`)
//! - Error kinds for chain mutation (`ChainError`)

/// The chain itself: intern/observe learning and weighted sampling.
///
/// Exposes state interning, transition observation, uniform start
/// selection, weighted successor selection, and bounded walk
/// generation.
pub mod chain;

/// Error kinds reported by chain mutation.
///
/// All mutation failures leave the chain unchanged.
pub mod error;

/// Contract a payload type must satisfy to be stored in a chain.
///
/// Rendering, equality, copying and release come from standard traits;
/// the terminal predicate is the one domain-specific operation.
pub mod payload;

/// Internal representation of a single chain state.
///
/// Tracks outgoing transitions and supports weighted random sampling.
/// This module is not exposed publicly.
mod state;
