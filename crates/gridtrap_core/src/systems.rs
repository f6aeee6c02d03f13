//! Simulation systems.
//!
//! Each system is one pass of the tick pipeline in
//! [`crate::simulation::step`]. Systems read and write the store directly
//! and report what they did so the caller can assemble
//! [`crate::simulation::TickEvents`].
//!
//! Every pass that can create entities iterates over an id snapshot taken
//! before the pass starts, so anything spawned during a pass is not visited
//! by that same pass.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::components::{
    Control, ControlShape, EntityId, Fightable, Movement, Obstruction, Position, Spawner,
    Switcher, Trapper, SWITCHER_CONTROL_TICKS, SWITCHER_IDLE_TICKS,
};
use crate::grid::{Direction, Extent, GridPos};
use crate::pathfinding::{find_grid_path, grid_neighbors};
use crate::prefabs::Prefab;
use crate::store::Store;
use crate::zones::is_controlled;

/// Why the player's move was refused. A refused move cancels the whole tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveRejection {
    /// No entity carries both `Player` and `Position`.
    NoPlayer,
    /// The move would leave the grid.
    OutOfBounds,
    /// The destination is inside a control zone.
    Controlled,
}

/// The player's accepted move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMove {
    /// Player entity.
    pub id: EntityId,
    /// Tile before the move.
    pub from: GridPos,
    /// Tile after the move.
    pub to: GridPos,
}

/// An AI entity that changed tiles this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMove {
    /// Mover.
    pub id: EntityId,
    /// Tile before the move.
    pub from: GridPos,
    /// Tile after the move.
    pub to: GridPos,
}

/// A switcher changed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitcherToggle {
    /// Switcher entity.
    pub id: EntityId,
    /// `true` if the switcher just started controlling its area.
    pub controlling: bool,
}

/// Move the player one step in `direction`.
///
/// The raw target is clamped into the grid; if clamping changed it the move
/// is refused rather than truncated. A target inside any control zone is
/// refused as well. Nothing is written unless the move is accepted.
pub fn player_move_system(
    store: &mut Store,
    extent: Extent,
    direction: Direction,
) -> Result<PlayerMove, MoveRejection> {
    let (id, position) = store.player().ok_or(MoveRejection::NoPlayer)?;

    let from = position.value;
    let raw = from + direction.offset();
    let to = extent.clamp(raw);

    if to != raw {
        return Err(MoveRejection::OutOfBounds);
    }
    if is_controlled(store, extent, to) {
        return Err(MoveRejection::Controlled);
    }

    store.set(id, Position::new(to));
    Ok(PlayerMove { id, from, to })
}

/// Despawn every fightable entity standing on `player_pos`.
///
/// Returns the defeated ids.
pub fn fight_system(store: &mut Store, player_pos: GridPos) -> Vec<EntityId> {
    let defeated: Vec<EntityId> = store
        .entries_with_both::<Fightable, Position>()
        .into_iter()
        .filter(|(_, (_, pos))| pos.value == player_pos)
        .map(|(id, _)| id)
        .collect();

    for &id in &defeated {
        store.despawn(id);
        tracing::debug!(entity = id, tile = %player_pos, "Entity defeated");
    }

    defeated
}

/// Blocked tiles for one AI pass, kept current as movers step.
///
/// Several obstructions can share a tile (a trapper standing on its own
/// mine), so each tile carries a count and only leaves the blocked set when
/// the last one moves off.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    counts: HashMap<GridPos, u32>,
    blocked: HashSet<GridPos>,
}

impl Occupancy {
    /// Every positioned obstruction plus the player's tile.
    #[must_use]
    pub fn from_store(store: &Store) -> Self {
        let mut occupancy = Self::default();
        for (_, (_, pos)) in store.entries_with_both::<Obstruction, Position>() {
            occupancy.place(pos.value);
        }
        if let Some((_, player)) = store.player() {
            occupancy.place(player.value);
        }
        occupancy
    }

    /// Add one obstruction on `tile`.
    pub fn place(&mut self, tile: GridPos) {
        *self.counts.entry(tile).or_insert(0) += 1;
        self.blocked.insert(tile);
    }

    /// Remove one obstruction from `tile`.
    pub fn lift(&mut self, tile: GridPos) {
        if let Some(count) = self.counts.get_mut(&tile) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&tile);
                self.blocked.remove(&tile);
            }
        }
    }

    /// Tiles currently blocked.
    #[must_use]
    pub const fn blocked(&self) -> &HashSet<GridPos> {
        &self.blocked
    }
}

/// Tiles an AI mover may not enter: every obstruction except itself, plus
/// the player's tile.
#[must_use]
pub fn obstacles_for(store: &Store, mover: EntityId) -> HashSet<GridPos> {
    let mut occupancy = Occupancy::from_store(store);
    if store.has::<Obstruction>(mover) {
        if let Some(pos) = store.get::<Position>(mover) {
            occupancy.lift(pos.value);
        }
    }
    occupancy.blocked
}

/// Pick the next tile for a chasing entity, or `None` to stay put.
#[must_use]
pub fn chase_step(
    extent: Extent,
    obstacles: &HashSet<GridPos>,
    from: GridPos,
    player: GridPos,
) -> Option<GridPos> {
    let path = find_grid_path(extent, obstacles, from, player)?;
    let candidate = *path.get(1)?;

    if candidate == player || obstacles.contains(&candidate) {
        return None;
    }

    Some(candidate)
}

/// Pick a uniformly random free neighbour, or `None` to stay put.
pub fn random_step<R: Rng + ?Sized>(
    extent: Extent,
    obstacles: &HashSet<GridPos>,
    from: GridPos,
    player: Option<GridPos>,
    rng: &mut R,
) -> Option<GridPos> {
    let legal: Vec<GridPos> = grid_neighbors(extent, obstacles, from).collect();
    if legal.is_empty() {
        return None;
    }

    let choice = legal[rng.gen_range(0..legal.len())];
    if Some(choice) == player {
        return None;
    }

    Some(choice)
}

/// Move every entity that has both `Movement` and `Position` one step.
///
/// Obstacles are collected once and updated as each mover steps, so earlier
/// movers in the same pass block later ones at their new tiles.
pub fn ai_movement_system<R: Rng + ?Sized>(
    store: &mut Store,
    extent: Extent,
    rng: &mut R,
) -> Vec<EntityMove> {
    let player = store.player().map(|(_, pos)| pos.value);
    let mut occupancy = Occupancy::from_store(store);
    let mut moves = Vec::new();

    for id in store.ids_with_both::<Movement, Position>() {
        let (Some(&movement), Some(&position)) =
            (store.get::<Movement>(id), store.get::<Position>(id))
        else {
            continue;
        };

        let from = position.value;
        let obstructs = store.has::<Obstruction>(id);
        if obstructs {
            occupancy.lift(from);
        }

        let obstacles = occupancy.blocked();
        let next = match movement {
            Movement::Chase => player.and_then(|p| chase_step(extent, obstacles, from, p)),
            Movement::Random => random_step(extent, obstacles, from, player, rng),
        };

        if obstructs {
            occupancy.place(next.unwrap_or(from));
        }
        if let Some(to) = next {
            store.set(id, Position::new(to));
            moves.push(EntityMove { id, from, to });
            tracing::trace!(entity = id, %from, %to, ?movement, "AI moved");
        }
    }

    moves
}

/// Count down trappers and drop a mine under each one whose timer expired.
///
/// Returns the ids of the new mines.
pub fn trapper_system(store: &mut Store) -> Vec<EntityId> {
    let mut spawned = Vec::new();

    for id in store.ids_with::<Trapper>() {
        let fired = store.get_mut::<Trapper>(id).is_some_and(Trapper::advance);
        if !fired {
            continue;
        }

        if let Some(pos) = store.get::<Position>(id).map(|p| p.value) {
            let mine = Prefab::Mine.spawn(store, pos);
            tracing::debug!(trapper = id, mine, tile = %pos, "Mine dropped");
            spawned.push(mine);
        }
    }

    spawned
}

/// Count down switchers and flip the phase of each one whose timer expired.
pub fn switcher_system(store: &mut Store) -> Vec<SwitcherToggle> {
    let mut toggles = Vec::new();

    for id in store.ids_with::<Switcher>() {
        let flip = store.get_mut::<Switcher>(id).is_some_and(Switcher::advance);
        if !flip {
            continue;
        }

        let controlling = if store.has::<Control>(id) {
            store.remove::<Control>(id);
            store.set(id, Movement::Chase);
            store.set(id, Fightable);
            store.set(id, Switcher {
                left: SWITCHER_IDLE_TICKS,
            });
            false
        } else {
            store.set(id, Control::new(ControlShape::Switcher));
            store.remove::<Movement>(id);
            store.remove::<Fightable>(id);
            store.set(id, Switcher {
                left: SWITCHER_CONTROL_TICKS,
            });
            true
        };

        tracing::debug!(entity = id, controlling, "Switcher toggled");
        toggles.push(SwitcherToggle { id, controlling });
    }

    toggles
}

/// Count down spawners and run the recipe of each one whose timer expired.
///
/// Returns the ids of the spawned entities.
pub fn spawner_system(store: &mut Store) -> Vec<EntityId> {
    let mut spawned = Vec::new();

    for id in store.ids_with::<Spawner>() {
        let Some(spawner) = store.get_mut::<Spawner>(id) else {
            continue;
        };
        let recipe = spawner.recipe;
        if !spawner.advance() {
            continue;
        }

        if let Some(pos) = store.get::<Position>(id).map(|p| p.value) {
            let child = recipe.spawn(store, pos);
            tracing::debug!(spawner = id, child, ?recipe, tile = %pos, "Entity spawned");
            spawned.push(child);
        }
    }

    spawned
}
