use rand::Rng;

use super::chain::StateId;
use super::error::ChainError;

/// One outgoing transition and the number of times it was observed.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Edge {
	/// Index of the successor state in the owning chain.
	pub(crate) to: StateId,
	/// How many times this transition was observed. Always >= 1.
	pub(crate) count: u64,
}

/// Represents one state in a Markov chain.
///
/// A `State` owns its payload and stores all observed transitions
/// toward successor states. Successors are plain indices into the
/// owning chain, so edges own nothing and cannot form ownership
/// cycles.
///
/// ## Responsibilities
/// - Accumulate transition occurrences during learning
/// - Select a successor using weighted random sampling
///
/// ## Invariants
/// - Each successor appears at most once in `edges`
/// - Edges keep their first-observation order
/// - Each occurrence count is strictly positive
#[derive(Clone, Debug)]
pub(crate) struct State<P> {
	/// The domain value this state stands for.
	pub(crate) payload: P,
	/// Outgoing transitions in first-observation order.
	edges: Vec<Edge>,
}

impl<P> State<P> {
	/// Creates a state with no observed successors.
	pub(crate) fn new(payload: P) -> Self {
		Self { payload, edges: Vec::new() }
	}

	pub(crate) fn edges(&self) -> &[Edge] {
		&self.edges
	}

	/// Records one occurrence of a transition toward `to`.
	///
	/// - If the transition already exists, its occurrence count is increased.
	/// - Otherwise, a new transition is appended with an initial count of 1.
	///
	/// # Errors
	/// Returns `ChainError::OutOfMemory` if the table cannot grow; the
	/// table is left unchanged in that case.
	pub(crate) fn record(&mut self, to: StateId) -> Result<(), ChainError> {
		for edge in &mut self.edges {
			if edge.to == to {
				edge.count += 1;
				return Ok(());
			}
		}
		self.edges.try_reserve(1).map_err(|_| ChainError::OutOfMemory)?;
		self.edges.push(Edge { to, count: 1 });
		Ok(())
	}

	/// Total number of observations out of this state.
	pub(crate) fn total(&self) -> u64 {
		self.edges.iter().map(|edge| edge.count).sum()
	}

	/// Selects a successor using weighted random sampling.
	///
	/// The probability of selecting a successor is proportional to its
	/// occurrence count: `count / total`. Draws `r` in `[0, total)` and
	/// walks the table in stored order until the cumulative count
	/// strictly exceeds `r`.
	///
	/// Returns `None` if the state has no transitions; never returns
	/// `None` otherwise.
	pub(crate) fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<StateId> {
		if self.edges.is_empty() {
			return None;
		}

		let total = self.total();
		let r = rng.random_range(0..total);

		let mut cumulative = 0;
		for edge in &self.edges {
			cumulative += edge.count;
			if r < cumulative {
				return Some(edge.to);
			}
		}

		// Fallback: should not happen, but kept for safety.
		self.edges.last().map(|edge| edge.to)
	}
}
