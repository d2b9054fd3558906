use std::fmt::Display;

/// Operations a chain needs from its state payload type.
///
/// A chain is parameterized over an arbitrary domain value (a word, a
/// board cell, ...). The supertraits carry most of the contract:
/// `Display` renders a state for output, `PartialEq` deduplicates on
/// intern, `Clone` takes the owned copy stored in the chain, and `Drop`
/// releases it at teardown.
///
/// # Invariants
/// - Equality is reflexive and transitive
/// - A clone compares equal to its original
/// - `is_terminal` depends only on the payload value
pub trait Payload: Clone + PartialEq + Display {
	/// Returns true if this payload must be the final element of any
	/// sequence containing it.
	fn is_terminal(&self) -> bool;
}
