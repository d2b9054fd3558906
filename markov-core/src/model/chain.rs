use std::ops::Index;

use rand::Rng;

use super::error::ChainError;
use super::payload::Payload;
use super::state::State;

/// Identifier of a state inside one `Chain`.
///
/// A `StateId` is a plain index into the chain that produced it. Ids
/// are assigned in intern order and stay valid for the life of the
/// chain; they carry no ownership. Using an id with a chain other than
/// the one that produced it is rejected by mutation (`UnknownState`)
/// and yields `None` from the sampling accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

impl StateId {
	/// Position of the state in intern order.
	pub fn index(self) -> usize {
		self.0
	}
}

/// A first-order Markov chain over payloads of type `P`.
///
/// The chain is an insertion-ordered database of distinct states, each
/// carrying an owned payload and a table of weighted successor edges.
/// Learning is incremental (`intern` + `observe`); sampling draws
/// weighted random walks from the accumulated counts.
///
/// # Responsibilities
/// - Intern payloads into unique, insertion-ordered states
/// - Accumulate transition occurrence counts per state
/// - Sample start states, successors, and bounded walks
///
/// # Invariants
/// - No two states hold equal payloads
/// - States keep their intern-order index; the order is never permuted
/// - Every recorded successor id names a state of the same chain
/// - All occurrence counts are strictly positive
/// - Terminal states never gain successors
///
/// A chain is a single-threaded mutable aggregate; it owns every
/// payload it stores and releases them all on drop.
pub struct Chain<P: Payload> {
	/// States in intern order.
	states: Vec<State<P>>,
	/// Number of states whose payload is not terminal. Kept so start
	/// sampling can refuse an all-terminal chain instead of spinning.
	non_terminal: usize,
}

impl<P: Payload> Chain<P> {
	/// Creates an empty chain.
	pub fn new() -> Self {
		Self { states: Vec::new(), non_terminal: 0 }
	}

	/// Number of distinct states interned so far.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Payload of the given state, or `None` if the id does not belong
	/// to this chain.
	pub fn payload(&self, id: StateId) -> Option<&P> {
		self.states.get(id.0).map(|state| &state.payload)
	}

	/// Finds the state holding a payload equal to `payload`.
	///
	/// Linear scan by payload equality. Domain sizes stay small enough
	/// that equality cost dominates any fancier index.
	pub fn lookup(&self, payload: &P) -> Option<StateId> {
		self.states
			.iter()
			.position(|state| state.payload == *payload)
			.map(StateId)
	}

	/// Returns the unique state for `payload`, interning it if absent.
	///
	/// On first sight the payload is cloned and appended after all
	/// existing states; later interns of an equal payload return the
	/// same id.
	///
	/// # Errors
	/// Returns `ChainError::OutOfMemory` if the database cannot grow;
	/// the chain is left unchanged in that case.
	pub fn intern(&mut self, payload: &P) -> Result<StateId, ChainError> {
		if let Some(id) = self.lookup(payload) {
			return Ok(id);
		}

		self.states.try_reserve(1).map_err(|_| ChainError::OutOfMemory)?;
		let id = StateId(self.states.len());
		if !payload.is_terminal() {
			self.non_terminal += 1;
		}
		self.states.push(State::new(payload.clone()));
		Ok(id)
	}

	/// Records one observation of the transition `src -> dst`.
	///
	/// The first observation of an edge creates it with count 1; later
	/// observations increment the count. New edges are appended in
	/// first-observation order, which fixes the (stable) iteration
	/// order of sampling but not its probabilities.
	///
	/// # Errors
	/// - `ChainError::UnknownState` if either id is not a state of this
	///   chain
	/// - `ChainError::TerminalSource` if `src` is terminal; terminal
	///   states may end sequences but never continue them
	/// - `ChainError::OutOfMemory` if the edge table cannot grow
	///
	/// The chain is unchanged on any error.
	pub fn observe(&mut self, src: StateId, dst: StateId) -> Result<(), ChainError> {
		if src.0 >= self.states.len() {
			return Err(ChainError::UnknownState(src));
		}
		if dst.0 >= self.states.len() {
			return Err(ChainError::UnknownState(dst));
		}
		if self.states[src.0].payload.is_terminal() {
			return Err(ChainError::TerminalSource(src));
		}
		self.states[src.0].record(dst)
	}

	/// Occurrence count recorded for the edge `src -> dst` (0 if the
	/// edge, or either state, does not exist).
	pub fn edge_count(&self, src: StateId, dst: StateId) -> u64 {
		self.successors(src)
			.find(|(to, _)| *to == dst)
			.map_or(0, |(_, count)| count)
	}

	/// Iterates `src`'s successors as `(id, count)` pairs in
	/// first-observation order. Empty if `src` has no successors or is
	/// not a state of this chain.
	pub fn successors(&self, src: StateId) -> impl Iterator<Item = (StateId, u64)> + '_ {
		self.states
			.get(src.0)
			.map(|state| state.edges())
			.unwrap_or_default()
			.iter()
			.map(|edge| (edge.to, edge.count))
	}

	/// Selects a start state uniformly by index, redrawing while the
	/// selected state is terminal.
	///
	/// Returns `None` if the chain is empty or holds no non-terminal
	/// state; the non-terminal count is checked up front so the
	/// rejection loop cannot spin forever.
	pub fn random_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<StateId> {
		if self.non_terminal == 0 {
			return None;
		}
		loop {
			let id = StateId(rng.random_range(0..self.states.len()));
			if !self.states[id.0].payload.is_terminal() {
				return Some(id);
			}
		}
	}

	/// Selects a successor of `id` with probability proportional to
	/// its occurrence count.
	///
	/// Returns `None` if `id` has no successors or is not a state of
	/// this chain; never `None` for a state with a non-empty table.
	pub fn random_successor<R: Rng + ?Sized>(&self, id: StateId, rng: &mut R) -> Option<StateId> {
		self.states.get(id.0)?.pick(rng)
	}

	/// Generates a walk of at most `max_length` states starting with
	/// `start`.
	///
	/// After each emitted state the walk halts if the state is
	/// terminal, then halts if it has no successor; otherwise the next
	/// state is drawn by weighted sampling. A valid `start` with
	/// `max_length >= 1` always yields at least one state. Rendering
	/// is left entirely to the caller.
	pub fn generate<R: Rng + ?Sized>(
		&self,
		start: StateId,
		max_length: usize,
		rng: &mut R,
	) -> Vec<StateId> {
		let mut walk = Vec::new();
		if max_length == 0 || start.0 >= self.states.len() {
			return walk;
		}

		let mut current = start;
		loop {
			walk.push(current);
			if walk.len() >= max_length || self.states[current.0].payload.is_terminal() {
				break;
			}
			match self.random_successor(current, rng) {
				Some(next) => current = next,
				None => break,
			}
		}
		walk
	}
}

impl<P: Payload> Default for Chain<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P: Payload> Index<StateId> for Chain<P> {
	type Output = P;

	/// Panics if `id` does not belong to this chain; use
	/// [`Chain::payload`] for fallible access.
	fn index(&self, id: StateId) -> &P {
		&self.states[id.0].payload
	}
}

#[cfg(test)]
mod tests {
	use std::fmt;

	use proptest::prelude::*;
	use rand::SeedableRng;
	use rand_chacha::ChaCha8Rng;

	use super::*;

	/// Word-like test payload; terminal iff it ends with '.'.
	#[derive(Clone, PartialEq, Eq, Debug)]
	struct Tok(String);

	impl fmt::Display for Tok {
		fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
			f.write_str(&self.0)
		}
	}

	impl Payload for Tok {
		fn is_terminal(&self) -> bool {
			self.0.ends_with('.')
		}
	}

	fn tok(s: &str) -> Tok {
		Tok(s.to_owned())
	}

	#[test]
	fn empty_chain_samples_nothing() {
		let chain: Chain<Tok> = Chain::new();
		let mut rng = ChaCha8Rng::seed_from_u64(0);

		assert!(chain.is_empty());
		assert_eq!(chain.random_start(&mut rng), None);
		assert_eq!(chain.random_successor(StateId(0), &mut rng), None);
		assert!(chain.generate(StateId(0), 10, &mut rng).is_empty());
	}

	#[test]
	fn intern_deduplicates_and_preserves_order() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("alpha")).unwrap();
		let b = chain.intern(&tok("beta")).unwrap();
		let a_again = chain.intern(&tok("alpha")).unwrap();

		assert_eq!(a, a_again);
		assert_ne!(a, b);
		assert_eq!(chain.len(), 2);
		assert_eq!(a.index(), 0);
		assert_eq!(b.index(), 1);
		assert_eq!(chain[a], tok("alpha"));
		assert_eq!(chain[b], tok("beta"));
	}

	#[test]
	fn lookup_finds_interned_payloads_only() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("alpha")).unwrap();

		assert_eq!(chain.lookup(&tok("alpha")), Some(a));
		assert_eq!(chain.lookup(&tok("beta")), None);
	}

	#[test]
	fn observe_accumulates_counts() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let b = chain.intern(&tok("b")).unwrap();
		let c = chain.intern(&tok("c")).unwrap();

		for _ in 0..5 {
			chain.observe(a, b).unwrap();
		}
		chain.observe(a, c).unwrap();

		assert_eq!(chain.edge_count(a, b), 5);
		assert_eq!(chain.edge_count(a, c), 1);
		assert_eq!(chain.edge_count(b, a), 0);
		// First-observation order is kept.
		let order: Vec<StateId> = chain.successors(a).map(|(to, _)| to).collect();
		assert_eq!(order, vec![b, c]);
	}

	#[test]
	fn observe_rejects_terminal_source() {
		let mut chain = Chain::new();
		let end = chain.intern(&tok("end.")).unwrap();
		let a = chain.intern(&tok("a")).unwrap();

		assert_eq!(chain.observe(end, a), Err(ChainError::TerminalSource(end)));
		assert_eq!(chain.successors(end).count(), 0);
		// Terminal states may still be edge endpoints.
		chain.observe(a, end).unwrap();
		assert_eq!(chain.edge_count(a, end), 1);
	}

	#[test]
	fn observe_rejects_foreign_ids() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let ghost = StateId(42);

		assert_eq!(chain.observe(a, ghost), Err(ChainError::UnknownState(ghost)));
		assert_eq!(chain.observe(ghost, a), Err(ChainError::UnknownState(ghost)));
		assert_eq!(chain.successors(a).count(), 0);
	}

	#[test]
	fn single_edge_is_always_chosen() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let b = chain.intern(&tok("b")).unwrap();
		for _ in 0..3 {
			chain.observe(a, b).unwrap();
		}

		let mut rng = ChaCha8Rng::seed_from_u64(7);
		for _ in 0..100 {
			assert_eq!(chain.random_successor(a, &mut rng), Some(b));
		}
	}

	#[test]
	fn weighted_draws_track_counts() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let b = chain.intern(&tok("b")).unwrap();
		let c = chain.intern(&tok("c")).unwrap();
		for _ in 0..3 {
			chain.observe(a, b).unwrap();
		}
		chain.observe(a, c).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(3);
		let mut hits_b = 0u32;
		for _ in 0..10_000 {
			if chain.random_successor(a, &mut rng) == Some(b) {
				hits_b += 1;
			}
		}
		// Expected 7500 out of 10000; allow +-1%.
		assert!((7_400..=7_600).contains(&hits_b), "b drawn {hits_b} times");
	}

	#[test]
	fn random_start_skips_terminal_states() {
		let mut chain = Chain::new();
		let end = chain.intern(&tok("end.")).unwrap();
		let a = chain.intern(&tok("a")).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(11);
		for _ in 0..100 {
			let start = chain.random_start(&mut rng).unwrap();
			assert_eq!(start, a);
			assert_ne!(start, end);
		}
	}

	#[test]
	fn random_start_refuses_all_terminal_chain() {
		let mut chain = Chain::new();
		chain.intern(&tok("one.")).unwrap();
		chain.intern(&tok("two.")).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(0);
		assert_eq!(chain.random_start(&mut rng), None);
	}

	#[test]
	fn generate_halts_on_terminal() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let end = chain.intern(&tok("end.")).unwrap();
		chain.observe(a, end).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(5);
		let walk = chain.generate(a, 20, &mut rng);
		assert_eq!(walk, vec![a, end]);
	}

	#[test]
	fn generate_respects_max_length() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();
		let b = chain.intern(&tok("b")).unwrap();
		chain.observe(a, b).unwrap();
		chain.observe(b, a).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(5);
		let walk = chain.generate(a, 7, &mut rng);
		assert_eq!(walk.len(), 7);
		assert_eq!(walk[0], a);
	}

	#[test]
	fn generate_emits_lone_start_without_successors() {
		let mut chain = Chain::new();
		let a = chain.intern(&tok("a")).unwrap();

		let mut rng = ChaCha8Rng::seed_from_u64(5);
		assert_eq!(chain.generate(a, 20, &mut rng), vec![a]);
		assert!(chain.generate(a, 0, &mut rng).is_empty());
	}

	#[test]
	fn identical_seeds_replay_identical_walks() {
		let mut chain = Chain::new();
		let ids: Vec<StateId> = ["a", "b", "c", "d", "end."]
			.into_iter()
			.map(|s| chain.intern(&tok(s)).unwrap())
			.collect();
		for (i, &src) in ids.iter().enumerate().take(4) {
			for &dst in &ids[i + 1..] {
				chain.observe(src, dst).unwrap();
			}
		}

		let mut first = ChaCha8Rng::seed_from_u64(99);
		let mut second = ChaCha8Rng::seed_from_u64(99);
		for _ in 0..20 {
			let start = chain.random_start(&mut first).unwrap();
			assert_eq!(Some(start), chain.random_start(&mut second));
			assert_eq!(
				chain.generate(start, 10, &mut first),
				chain.generate(start, 10, &mut second)
			);
		}
	}

	proptest! {
		/// Interning any token sequence yields exactly one state per
		/// distinct token.
		#[test]
		fn intern_counts_distinct_payloads(tokens in prop::collection::vec("[a-d]{1,3}", 0..64)) {
			let mut chain = Chain::new();
			let mut distinct: Vec<&String> = Vec::new();
			for t in &tokens {
				chain.intern(&tok(t)).unwrap();
				if !distinct.contains(&t) {
					distinct.push(t);
				}
			}
			prop_assert_eq!(chain.len(), distinct.len());
		}

		/// The edge-count sum out of each state equals the number of
		/// observations made with that state as the source.
		#[test]
		fn edge_sums_match_observations(pairs in prop::collection::vec((0usize..5, 0usize..5), 0..128)) {
			let mut chain = Chain::new();
			let ids: Vec<StateId> = ["v0", "v1", "v2", "v3", "v4"]
				.into_iter()
				.map(|s| chain.intern(&tok(s)).unwrap())
				.collect();

			let mut per_source = [0u64; 5];
			for &(src, dst) in &pairs {
				chain.observe(ids[src], ids[dst]).unwrap();
				per_source[src] += 1;
			}

			for (i, &id) in ids.iter().enumerate() {
				let total: u64 = chain.successors(id).map(|(_, count)| count).sum();
				prop_assert_eq!(total, per_source[i]);
			}
		}

		/// Walks never exceed their length bound and only a terminal
		/// state may appear anywhere but last.
		#[test]
		fn walks_are_bounded_and_terminal_absorbing(
			tokens in prop::collection::vec("[a-c]{1,2}\\.?", 1..32),
			seed in any::<u64>(),
			max_length in 1usize..16,
		) {
			let mut chain = Chain::new();
			let mut prev: Option<StateId> = None;
			for t in &tokens {
				let id = chain.intern(&tok(t)).unwrap();
				if let Some(p) = prev {
					chain.observe(p, id).unwrap();
				}
				prev = if chain[id].is_terminal() { None } else { Some(id) };
			}

			let mut rng = ChaCha8Rng::seed_from_u64(seed);
			if let Some(start) = chain.random_start(&mut rng) {
				let walk = chain.generate(start, max_length, &mut rng);
				prop_assert!(!walk.is_empty());
				prop_assert!(walk.len() <= max_length);
				for &id in &walk[..walk.len() - 1] {
					prop_assert!(!chain[id].is_terminal());
				}
			}
		}
	}
}
