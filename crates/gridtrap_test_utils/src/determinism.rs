//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A game is fully determined by its starting store, its seed and the input
//! sequence. Sources of non-determinism to guard against:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Systems always iterate the store's ordered maps, never a hash set.
//!
//! - **Unseeded randomness**: random walkers draw from the simulation's
//!   own seeded RNG only.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system determinism (movement, timers, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full levels are reproducible
//! 4. **Parallel tests**: Running N simulations on separate threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use gridtrap_core::grid::Direction;
use gridtrap_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of inputs applied per run.
    pub steps: usize,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times over the same inputs and compare the
/// final hashes.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `inputs` - Inputs applied in order on every run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to apply one input
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, I, Setup, Step, HashFn>(
    runs: usize,
    inputs: &[I],
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, &I),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for input in inputs {
            step(&mut state, input);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps: inputs.len(),
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and inputs and checks
/// the final state hashes match exactly.
///
/// ```
/// use gridtrap_test_utils::determinism::verify_simulation_determinism;
/// use gridtrap_test_utils::fixtures::{busy_arena, looping_inputs};
///
/// assert!(verify_simulation_determinism(|| busy_arena(9), &looping_inputs(50)));
/// ```
pub fn verify_simulation_determinism<F>(setup_fn: F, inputs: &[Direction]) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        inputs,
        &setup_fn,
        |sim, dir| {
            sim.step(*dir);
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_simulations<F>(
    setup_fn: F,
    inputs: &[Direction],
    num_sims: usize,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for &dir in inputs {
                        sim.step(dir);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult { hashes, num_sims }
}

/// Compare two simulation runs input-by-input, finding first divergence.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(index)` with the number
/// of inputs applied when they first differ.
pub fn find_first_divergence<F>(setup_fn: F, inputs: &[Direction]) -> Option<usize>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for (i, &dir) in inputs.iter().enumerate() {
        sim1.step(dir);
        sim2.step(dir);

        if sim1.state_hash() != sim2.state_hash() {
            tracing::warn!(input = i + 1, %dir, "Simulations diverged");
            return Some(i + 1);
        }
    }

    None
}

/// Verify that a serialization round-trip mid-game changes nothing.
///
/// The simulation is saved after `split` inputs, restored, and both copies
/// receive the remaining inputs.
pub fn verify_serialization_determinism<F>(setup_fn: F, inputs: &[Direction], split: usize) -> bool
where
    F: Fn() -> Simulation,
{
    let mut sim = setup_fn();
    let (head, tail) = inputs.split_at(split.min(inputs.len()));

    for &dir in head {
        sim.step(dir);
    }

    let Ok(bytes) = sim.serialize() else {
        return false;
    };
    let Ok(mut restored) = Simulation::deserialize(&bytes) else {
        return false;
    };

    for &dir in tail {
        sim.step(dir);
        restored.step(dir);
    }

    sim.state_hash() == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
pub mod strategies {
    use gridtrap_core::grid::{Direction, Extent, GridPos};
    use proptest::prelude::*;

    /// Any of the four directions.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    /// Input sequences of up to `max_len` moves.
    pub fn arb_inputs(max_len: usize) -> impl Strategy<Value = Vec<Direction>> {
        prop::collection::vec(arb_direction(), 0..=max_len)
    }

    /// Grid sizes from 1x1 up to `max` on each side.
    pub fn arb_extent(max: i32) -> impl Strategy<Value = Extent> {
        (1..=max, 1..=max).prop_map(|(w, h)| Extent::new(w, h))
    }

    /// An extent together with two tiles inside it.
    pub fn arb_extent_and_two_tiles(max: i32) -> impl Strategy<Value = (Extent, GridPos, GridPos)> {
        arb_extent(max).prop_flat_map(|extent| {
            let tile = (0..extent.width, 0..extent.height).prop_map(|(x, y)| GridPos::new(x, y));
            (Just(extent), tile.clone(), tile)
        })
    }

    /// Arbitrary seeds.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{busy_arena, looping_inputs};

    #[test]
    fn test_verify_determinism_generic() {
        let result = verify_determinism(
            3,
            &[1u64, 2, 3],
            || 0u64,
            |s, i| *s = s.wrapping_mul(31).wrapping_add(*i),
            |s| *s,
        );
        result.assert_deterministic();
        assert_eq!(result.unique_hashes().len(), 1);
        assert_eq!(result.steps, 3);
    }

    #[test]
    fn test_simulation_determinism() {
        assert!(verify_simulation_determinism(
            || busy_arena(3),
            &looping_inputs(80)
        ));
    }

    #[test]
    fn test_parallel_simulations_match() {
        let inputs = looping_inputs(60);
        run_parallel_simulations(|| busy_arena(11), &inputs, 4).assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| busy_arena(5), &looping_inputs(40)), None);
    }

    #[test]
    fn test_divergence_on_different_seeds() {
        use std::sync::atomic::{AtomicU64, Ordering};
        let next = AtomicU64::new(0);
        // The seed is part of the state hash.
        let found = find_first_divergence(
            || busy_arena(next.fetch_add(1, Ordering::Relaxed)),
            &looping_inputs(40),
        );
        assert!(found.is_some());
    }

    #[test]
    fn test_serialization_determinism() {
        assert!(verify_serialization_determinism(
            || busy_arena(8),
            &looping_inputs(40),
            17
        ));
    }

    #[test]
    fn test_compute_hash_stable() {
        assert_eq!(compute_hash(&"abc"), compute_hash(&"abc"));
    }
}
