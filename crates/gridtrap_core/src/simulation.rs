//! Tick pipeline.
//!
//! One tick is one player input. [`step`] runs the systems in a fixed order
//! and short-circuits the whole tick if the player's move is refused:
//!
//! 1. **Player move** ([`player_move_system`])
//! 2. **Fight** ([`fight_system`]) on the player's new tile
//! 3. **AI movement** ([`ai_movement_system`])
//! 4. **Timed transitions**: trappers, then switchers, then spawners
//!
//! # Determinism
//!
//! Given the same store, direction and RNG state, [`step`] produces the same
//! store. Entities are always visited in ascending id order and the only
//! source of randomness is the RNG passed in. [`Simulation`] owns a seeded
//! [`ChaCha8Rng`] so that a seed plus an input sequence fully determines a
//! game.
//!
//! # Example
//!
//! ```
//! use gridtrap_core::grid::{Direction, Extent, GridPos};
//! use gridtrap_core::prefabs::Prefab;
//! use gridtrap_core::simulation::Simulation;
//! use gridtrap_core::store::Store;
//!
//! let mut store = Store::new();
//! Prefab::Player.spawn(&mut store, GridPos::new(0, 0));
//! Prefab::Coin.spawn(&mut store, GridPos::new(1, 0));
//!
//! let mut sim = Simulation::new(Extent::new(5, 5), store, 42);
//! let outcome = sim.step(Direction::Right);
//!
//! assert!(outcome.is_advanced());
//! assert_eq!(sim.get_tick(), 1);
//! assert_eq!(sim.store().despawned_count(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::components::EntityId;
use crate::error::{GameError, Result};
use crate::grid::{Direction, Extent};
use crate::level::Level;
use crate::store::Store;
use crate::systems::{
    ai_movement_system, fight_system, player_move_system, spawner_system, switcher_system,
    trapper_system, EntityMove, MoveRejection, PlayerMove, SwitcherToggle,
};

/// Everything that happened during one advanced tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// The player's move.
    pub player_move: PlayerMove,
    /// Entities removed by fight resolution.
    pub defeated: Vec<EntityId>,
    /// AI entities that changed tiles.
    pub moves: Vec<EntityMove>,
    /// Entities created by trappers and spawners, in creation order.
    pub spawned: Vec<EntityId>,
    /// Switchers that changed phase.
    pub toggles: Vec<SwitcherToggle>,
}

/// Result of [`step`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// The tick ran to completion.
    Advanced(TickEvents),
    /// The player's move was refused and the store is untouched.
    Rejected(MoveRejection),
}

impl StepOutcome {
    /// Check whether the tick ran.
    #[must_use]
    pub const fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced(_))
    }

    /// Events of an advanced tick.
    #[must_use]
    pub const fn events(&self) -> Option<&TickEvents> {
        match self {
            Self::Advanced(events) => Some(events),
            Self::Rejected(_) => None,
        }
    }
}

/// Advance `store` by one tick.
///
/// If the player's move is refused the store is left exactly as it was and
/// no RNG state is consumed.
pub fn step<R: Rng + ?Sized>(
    extent: Extent,
    direction: Direction,
    store: &mut Store,
    rng: &mut R,
) -> StepOutcome {
    let player_move = match player_move_system(store, extent, direction) {
        Ok(mv) => mv,
        Err(rejection) => {
            tracing::trace!(%direction, ?rejection, "Player move rejected");
            return StepOutcome::Rejected(rejection);
        }
    };

    let defeated = fight_system(store, player_move.to);
    let moves = ai_movement_system(store, extent, rng);

    let mut spawned = trapper_system(store);
    let toggles = switcher_system(store);
    spawned.extend(spawner_system(store));

    StepOutcome::Advanced(TickEvents {
        player_move,
        defeated,
        moves,
        spawned,
        toggles,
    })
}

/// A running game: extent, store, seeded RNG and tick counter.
///
/// The tick counter only advances on ticks that ran, so it counts accepted
/// moves rather than inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    tick: u64,
    extent: Extent,
    seed: u64,
    store: Store,
    rng: ChaCha8Rng,
}

impl Simulation {
    /// Create a simulation over `store` with an RNG seeded from `seed`.
    #[must_use]
    pub fn new(extent: Extent, store: Store, seed: u64) -> Self {
        Self {
            tick: 0,
            extent,
            seed,
            store,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Start a fresh game of `level`.
    #[must_use]
    pub fn from_level(level: &Level, seed: u64) -> Self {
        Self::new(level.extent, level.store.clone(), seed)
    }

    /// Number of advanced ticks so far.
    #[must_use]
    pub const fn get_tick(&self) -> u64 {
        self.tick
    }

    /// Grid size.
    #[must_use]
    pub const fn extent(&self) -> Extent {
        self.extent
    }

    /// Seed the RNG was created from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Current store.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Current store, mutably. Used by tests and level editors.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Run one tick with the player moving in `direction`.
    pub fn step(&mut self, direction: Direction) -> StepOutcome {
        let outcome = step(self.extent, direction, &mut self.store, &mut self.rng);

        if outcome.is_advanced() {
            self.tick += 1;

            #[cfg(debug_assertions)]
            {
                let hash = self.state_hash();
                tracing::debug!(tick = self.tick, state_hash = hash, "Simulation state hash");
            }
        }

        outcome
    }

    /// Hash of the full simulation state, including the RNG position.
    ///
    /// Two simulations with equal hashes will evolve identically under the
    /// same inputs.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.extent.hash(&mut hasher);
        self.seed.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);
        self.store.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the simulation for save games or desync checks.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::Serialization(format!("Failed to serialize simulation: {e}")))
    }

    /// Restore a simulation produced by [`serialize`](Self::serialize).
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| {
            GameError::Serialization(format!("Failed to deserialize simulation: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{
        Control, Fightable, Movement, Position, SpawnRecipe, Spawner, Switcher,
        SWITCHER_CONTROL_TICKS, SWITCHER_IDLE_TICKS,
    };
    use crate::grid::GridPos;
    use crate::prefabs::Prefab;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0)
    }

    fn player_at(x: i32, y: i32) -> Store {
        let mut store = Store::new();
        Prefab::Player.spawn(&mut store, GridPos::new(x, y));
        store
    }

    #[test]
    fn test_step_into_edge_is_noop() {
        let mut store = player_at(0, 0);
        Prefab::Chaser.spawn(&mut store, GridPos::new(4, 4));
        let before = store.clone();

        let outcome = step(Extent::new(5, 5), Direction::Left, &mut store, &mut rng());
        assert_eq!(outcome, StepOutcome::Rejected(MoveRejection::OutOfBounds));
        assert_eq!(store, before);
        assert_eq!(store.player().unwrap().1, Position::at(0, 0));
    }

    #[test]
    fn test_rejected_tick_runs_no_timers() {
        let mut store = player_at(0, 0);
        let spawner = store.create_entity(|id, s| {
            s.set(id, Position::at(3, 3));
            s.set(id, Spawner::new(3, SpawnRecipe::Coin));
        });

        let outcome = step(Extent::new(5, 5), Direction::Up, &mut store, &mut rng());
        assert!(!outcome.is_advanced());
        assert_eq!(store.get::<Spawner>(spawner).unwrap().left, 0);
    }

    #[test]
    fn test_fight_despawns_entity_on_player_tile() {
        let mut store = player_at(1, 2);
        let coin = Prefab::Coin.spawn(&mut store, GridPos::new(2, 2));

        let outcome = step(Extent::new(5, 5), Direction::Right, &mut store, &mut rng());
        let events = outcome.events().unwrap();
        assert_eq!(events.defeated, vec![coin]);
        assert!(!store.live_ids().contains(&coin));
        assert!(store.get::<Position>(coin).is_none());
        assert!(store.get::<Fightable>(coin).is_none());
    }

    #[test]
    fn test_controlled_tile_rejects_move() {
        let mut store = player_at(0, 0);
        Prefab::Archer.spawn(&mut store, GridPos::new(2, 1));

        // The archer's diagonal covers (1, 0).
        let outcome = step(Extent::new(5, 5), Direction::Right, &mut store, &mut rng());
        assert_eq!(outcome, StepOutcome::Rejected(MoveRejection::Controlled));
    }

    #[test]
    fn test_spawner_period() {
        let mut store = player_at(0, 0);
        let spawner = store.create_entity(|id, s| {
            s.set(id, Position::at(4, 4));
            s.set(id, Spawner::new(3, SpawnRecipe::Coin));
        });
        let extent = Extent::new(5, 5);
        let mut rng = rng();
        let inputs = [Direction::Right, Direction::Left];

        // Fires on the first tick, stays quiet for two ticks, fires on the third.
        let mut fired_on = Vec::new();
        for tick in 0..10 {
            let outcome = step(extent, inputs[tick % 2], &mut store, &mut rng);
            let spawned = &outcome.events().unwrap().spawned;
            assert!(spawned.len() <= 1);
            if !spawned.is_empty() {
                assert_eq!(store.get::<Spawner>(spawner).unwrap().left, 3);
                fired_on.push(tick);
            }
        }
        assert_eq!(fired_on, vec![0, 3, 6, 9]);

        let left_after_first: Vec<u32> = {
            let mut store = player_at(0, 0);
            let id = store.create_entity(|id, s| {
                s.set(id, Position::at(4, 4));
                s.set(id, Spawner::new(3, SpawnRecipe::Coin));
            });
            let mut rng = self::rng();
            (0..4)
                .map(|tick| {
                    step(extent, inputs[tick % 2], &mut store, &mut rng);
                    store.get::<Spawner>(id).unwrap().left
                })
                .collect()
        };
        assert_eq!(left_after_first, vec![3, 2, 1, 3]);
    }

    #[test]
    fn test_switcher_cycle() {
        let mut store = player_at(0, 0);
        // Far enough away that the zone never reaches the player.
        let switcher = Prefab::Switcher.spawn(&mut store, GridPos::new(11, 11));
        store.set(switcher, Switcher { left: 0 });
        let extent = Extent::new(12, 12);
        let mut rng = rng();
        let inputs = [Direction::Right, Direction::Left];

        let mut phases = Vec::new();
        for tick in 0..12 {
            let outcome = step(extent, inputs[tick % 2], &mut store, &mut rng);
            for toggle in &outcome.events().unwrap().toggles {
                phases.push((tick, toggle.controlling));
                let left = store.get::<Switcher>(switcher).unwrap().left;
                if toggle.controlling {
                    assert!(store.has::<Control>(switcher));
                    assert!(!store.has::<Movement>(switcher));
                    assert_eq!(left, SWITCHER_CONTROL_TICKS);
                } else {
                    assert!(!store.has::<Control>(switcher));
                    assert_eq!(store.get::<Movement>(switcher), Some(&Movement::Chase));
                    assert_eq!(left, SWITCHER_IDLE_TICKS);
                }
            }
        }

        let control = SWITCHER_CONTROL_TICKS as usize;
        let idle = SWITCHER_IDLE_TICKS as usize;
        assert_eq!(
            phases,
            vec![
                (0, true),
                (control, false),
                (control + idle, true),
                (2 * control + idle, false),
            ]
        );
    }

    #[test]
    fn test_spawned_entity_not_moved_same_tick() {
        let mut store = player_at(0, 0);
        store.create_entity(|id, s| {
            s.set(id, Position::at(4, 4));
            s.set(id, Spawner::new(5, SpawnRecipe::Chaser));
        });

        let outcome = step(Extent::new(5, 5), Direction::Right, &mut store, &mut rng());
        let events = outcome.events().unwrap();
        assert_eq!(events.spawned.len(), 1);
        let child = events.spawned[0];
        assert!(events.moves.iter().all(|mv| mv.id != child));
        assert_eq!(store.get::<Position>(child), Some(&Position::at(4, 4)));
    }

    #[test]
    fn test_spawned_trapper_not_timed_same_tick() {
        let mut store = player_at(0, 0);
        store.create_entity(|id, s| {
            s.set(id, Position::at(4, 4));
            s.set(id, Spawner::new(5, SpawnRecipe::Trapper { interval: 2 }));
        });

        let outcome = step(Extent::new(5, 5), Direction::Right, &mut store, &mut rng());
        let child = outcome.events().unwrap().spawned[0];
        assert_eq!(store.get::<crate::components::Trapper>(child).unwrap().left, 2);
    }

    #[test]
    fn test_tick_counts_only_accepted_moves() {
        let mut sim = Simulation::new(Extent::new(3, 3), player_at(0, 0), 1);
        assert!(!sim.step(Direction::Up).is_advanced());
        assert_eq!(sim.get_tick(), 0);
        assert!(sim.step(Direction::Down).is_advanced());
        assert_eq!(sim.get_tick(), 1);
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut store = player_at(0, 0);
        for x in 2..6 {
            Prefab::Wanderer.spawn(&mut store, GridPos::new(x, 5));
        }
        let extent = Extent::new(8, 8);
        let mut a = Simulation::new(extent, store.clone(), 77);
        let mut b = Simulation::new(extent, store, 77);

        let inputs = [
            Direction::Right,
            Direction::Down,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ];
        for _ in 0..10 {
            for &dir in &inputs {
                assert_eq!(a.step(dir), b.step(dir));
                assert_eq!(a.state_hash(), b.state_hash());
            }
        }
        assert_eq!(a.store(), b.store());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut store = player_at(0, 0);
        Prefab::Wanderer.spawn(&mut store, GridPos::new(3, 3));
        let mut sim = Simulation::new(Extent::new(6, 6), store, 5);
        sim.step(Direction::Right);
        sim.step(Direction::Down);

        let bytes = sim.serialize().unwrap();
        let mut restored = Simulation::deserialize(&bytes).unwrap();
        assert_eq!(sim.get_tick(), restored.get_tick());
        assert_eq!(sim.state_hash(), restored.state_hash());

        // The restored RNG continues the same stream.
        for dir in [Direction::Right, Direction::Down, Direction::Left] {
            assert_eq!(sim.step(dir), restored.step(dir));
        }
        assert_eq!(sim.store(), restored.store());
    }

    #[test]
    fn test_deserialize_garbage_fails() {
        assert!(matches!(
            Simulation::deserialize(&[1, 2, 3]),
            Err(GameError::Serialization(_))
        ));
    }
}
