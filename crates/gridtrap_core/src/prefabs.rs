//! Entity recipes.
//!
//! Every entity kind in the game is a fixed bundle of components. Levels and
//! spawn actions both go through [`Prefab::spawn`] so that a chaser created by
//! a spawner is identical to one placed by hand.

use serde::{Deserialize, Serialize};

use crate::components::{
    Control, ControlShape, EntityId, Fightable, Movement, Obstruction, Player, Position,
    SpawnRecipe, Spawner, Sprite, Switcher, Trapper,
};
use crate::grid::GridPos;
use crate::store::Store;

/// A placeable entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefab {
    /// The player token.
    Player,
    /// Impassable wall: obstructs AI and controls its own tile.
    Wall,
    /// Mine: like a wall, normally dropped by trappers.
    Mine,
    /// Switcher, starting idle.
    Switcher,
    /// Random-walking trapper dropping mines every `interval` ticks.
    Trapper {
        /// Mine interval.
        interval: u32,
    },
    /// Random-walking rook controlling its row and column.
    Rook,
    /// Stationary archer controlling both diagonals.
    Archer,
    /// Stationary blocker, defeated on contact.
    Rester,
    /// Spawn point.
    Spawner {
        /// Ticks between spawns.
        interval: u32,
        /// What to spawn.
        recipe: SpawnRecipe,
    },
    /// Enemy that paths towards the player.
    Chaser,
    /// Enemy that walks randomly.
    Wanderer,
    /// Collectible.
    Coin,
}

impl Prefab {
    /// Create this entity at `pos` and return its id.
    pub fn spawn(self, store: &mut Store, pos: GridPos) -> EntityId {
        store.create_entity(|id, store| {
            store.set(id, Position::new(pos));
            match self {
                Self::Player => {
                    store.set(id, Player);
                    store.set(id, Sprite::Player);
                }
                Self::Wall => {
                    store.set(id, Obstruction);
                    store.set(id, Control::new(ControlShape::Mine));
                    store.set(id, Sprite::Wall);
                }
                Self::Mine => {
                    store.set(id, Obstruction);
                    store.set(id, Control::new(ControlShape::Mine));
                    store.set(id, Sprite::Mine);
                }
                Self::Switcher => {
                    store.set(id, Obstruction);
                    store.set(id, Switcher::idle());
                    store.set(id, Movement::Chase);
                    store.set(id, Fightable);
                    store.set(id, Sprite::Switcher);
                }
                Self::Trapper { interval } => {
                    store.set(id, Obstruction);
                    store.set(id, Trapper::new(interval));
                    store.set(id, Movement::Random);
                    store.set(id, Fightable);
                    store.set(id, Sprite::Trapper);
                }
                Self::Rook => {
                    store.set(id, Obstruction);
                    store.set(id, Control::new(ControlShape::Rook));
                    store.set(id, Movement::Random);
                    store.set(id, Sprite::Rook);
                }
                Self::Archer => {
                    store.set(id, Obstruction);
                    store.set(id, Control::new(ControlShape::Archer));
                    store.set(id, Sprite::Archer);
                }
                Self::Rester => {
                    store.set(id, Obstruction);
                    store.set(id, Fightable);
                    store.set(id, Sprite::Rester);
                }
                Self::Spawner { interval, recipe } => {
                    store.set(id, Spawner::new(interval, recipe));
                    store.set(id, Sprite::Spawner);
                }
                Self::Chaser => {
                    store.set(id, Obstruction);
                    store.set(id, Movement::Chase);
                    store.set(id, Fightable);
                    store.set(id, Sprite::Chaser);
                }
                Self::Wanderer => {
                    store.set(id, Obstruction);
                    store.set(id, Movement::Random);
                    store.set(id, Fightable);
                    store.set(id, Sprite::Wanderer);
                }
                Self::Coin => {
                    store.set(id, Fightable);
                    store.set(id, Sprite::Coin);
                }
            }
        })
    }
}

impl From<SpawnRecipe> for Prefab {
    fn from(recipe: SpawnRecipe) -> Self {
        match recipe {
            SpawnRecipe::Chaser => Self::Chaser,
            SpawnRecipe::Wanderer => Self::Wanderer,
            SpawnRecipe::Trapper { interval } => Self::Trapper { interval },
            SpawnRecipe::Switcher => Self::Switcher,
            SpawnRecipe::Coin => Self::Coin,
        }
    }
}

impl SpawnRecipe {
    /// Create the recipe's entity at `pos`.
    pub fn spawn(self, store: &mut Store, pos: GridPos) -> EntityId {
        Prefab::from(self).spawn(store, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_prefab_has_position_and_sprite() {
        let prefabs = [
            Prefab::Player,
            Prefab::Wall,
            Prefab::Mine,
            Prefab::Switcher,
            Prefab::Trapper { interval: 3 },
            Prefab::Rook,
            Prefab::Archer,
            Prefab::Rester,
            Prefab::Spawner {
                interval: 4,
                recipe: SpawnRecipe::Chaser,
            },
            Prefab::Chaser,
            Prefab::Wanderer,
            Prefab::Coin,
        ];
        let mut store = Store::new();
        for (i, prefab) in prefabs.into_iter().enumerate() {
            let pos = GridPos::new(i as i32, 0);
            let id = prefab.spawn(&mut store, pos);
            assert_eq!(store.get::<Position>(id), Some(&Position::new(pos)));
            assert!(store.has::<Sprite>(id), "{prefab:?} has no sprite");
        }
    }

    #[test]
    fn test_mine_recipe() {
        let mut store = Store::new();
        let id = Prefab::Mine.spawn(&mut store, GridPos::new(1, 1));
        assert!(store.has::<Obstruction>(id));
        assert_eq!(
            store.get::<Control>(id),
            Some(&Control::new(ControlShape::Mine))
        );
        assert!(!store.has::<Movement>(id));
        assert!(!store.has::<Fightable>(id));
    }

    #[test]
    fn test_player_does_not_obstruct() {
        let mut store = Store::new();
        let id = Prefab::Player.spawn(&mut store, GridPos::ORIGIN);
        assert!(store.has::<Player>(id));
        assert!(!store.has::<Obstruction>(id));
    }

    #[test]
    fn test_spawn_recipe_matches_prefab() {
        let mut store = Store::new();
        let a = SpawnRecipe::Trapper { interval: 5 }.spawn(&mut store, GridPos::ORIGIN);
        let b = Prefab::Trapper { interval: 5 }.spawn(&mut store, GridPos::ORIGIN);
        assert_eq!(store.get::<Trapper>(a), store.get::<Trapper>(b));
        assert_eq!(store.get::<Movement>(a), Some(&Movement::Random));
    }
}
