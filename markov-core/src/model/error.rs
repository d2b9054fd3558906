use thiserror::Error;

use super::chain::StateId;

/// Errors reported by chain mutation.
///
/// Every failure leaves the chain exactly as it was before the call;
/// no operation mutates partially. The engine itself never logs and
/// never terminates the process; callers decide how to surface these.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ChainError {
	/// A container could not grow.
	#[error("Allocation failure: Failed to allocate new memory")]
	OutOfMemory,

	/// The given id does not name a state of this chain.
	#[error("state #{} does not belong to this chain", .0.index())]
	UnknownState(StateId),

	/// The source state is terminal; terminal states may be endpoints
	/// of transitions but never sources.
	#[error("state #{} is terminal and cannot be a transition source", .0.index())]
	TerminalSource(StateId),
}
