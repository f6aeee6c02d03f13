//! Entity/component store.
//!
//! One ordered map per component kind, keyed by [`EntityId`], plus the
//! allocation counter. There is no archetype or query machinery; systems
//! pull id sets or joined entries out of the store and write back by id.
//!
//! Access is type-indexed through the [`Component`] trait, which the
//! `component_store!` macro implements for each kind by binding it to
//! one concrete field of [`Store`].
//!
//! # Example
//!
//! ```
//! use gridtrap_core::components::{Fightable, Position};
//! use gridtrap_core::store::Store;
//!
//! let mut store = Store::new();
//! let id = store.create_entity(|id, store| {
//!     store.set(id, Position::at(2, 3));
//!     store.set(id, Fightable);
//! });
//!
//! assert_eq!(store.get::<Position>(id), Some(&Position::at(2, 3)));
//! assert!(store.ids_with_both::<Fightable, Position>().contains(&id));
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::components::{
    Control, EntityId, Fightable, Movement, Obstruction, Player, Position, Spawner, Sprite,
    Switcher, Trapper,
};

/// Storage for one component kind.
pub type ComponentMap<T> = BTreeMap<EntityId, T>;

/// A component kind with a dedicated map inside [`Store`].
pub trait Component: Sized {
    /// Field name of the backing map, used in logs.
    const NAME: &'static str;

    /// Borrow the backing map.
    fn map(store: &Store) -> &ComponentMap<Self>;

    /// Mutably borrow the backing map.
    fn map_mut(store: &mut Store) -> &mut ComponentMap<Self>;
}

macro_rules! component_store {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// All component maps plus the next entity id to hand out.
        ///
        /// Ids start at 1, grow by exactly one per [`Store::create_entity`]
        /// call and are never reused, even after [`Store::despawn`].
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct Store {
            next_id: EntityId,
            $($field: ComponentMap<$ty>,)*
        }

        impl Store {
            /// Create an empty store.
            #[must_use]
            pub fn new() -> Self {
                Self {
                    next_id: 1,
                    $($field: ComponentMap::new(),)*
                }
            }

            /// Remove every component of `id`.
            ///
            /// Returns `true` if the entity had at least one component.
            pub fn despawn(&mut self, id: EntityId) -> bool {
                let mut removed = false;
                $(removed |= self.$field.remove(&id).is_some();)*
                removed
            }

            /// Ids that currently carry at least one component.
            #[must_use]
            pub fn live_ids(&self) -> BTreeSet<EntityId> {
                let mut ids = BTreeSet::new();
                $(ids.extend(self.$field.keys().copied());)*
                ids
            }
        }

        $(
            impl Component for $ty {
                const NAME: &'static str = stringify!($field);

                fn map(store: &Store) -> &ComponentMap<Self> {
                    &store.$field
                }

                fn map_mut(store: &mut Store) -> &mut ComponentMap<Self> {
                    &mut store.$field
                }
            }
        )*
    };
}

component_store! {
    positions: Position,
    players: Player,
    movements: Movement,
    obstructions: Obstruction,
    controls: Control,
    fightables: Fightable,
    switchers: Switcher,
    trappers: Trapper,
    spawners: Spawner,
    sprites: Sprite,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Allocate the next id, let `init` attach components, and return the id.
    pub fn create_entity<F>(&mut self, init: F) -> EntityId
    where
        F: FnOnce(EntityId, &mut Self),
    {
        let id = self.next_id;
        self.next_id += 1;
        init(id, self);
        id
    }

    /// The id the next [`create_entity`](Self::create_entity) call will use.
    #[must_use]
    pub const fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Number of allocated ids that no longer carry any component.
    #[must_use]
    pub fn despawned_count(&self) -> usize {
        let allocated = (self.next_id - 1) as usize;
        allocated.saturating_sub(self.live_ids().len())
    }

    /// Attach or replace a component.
    pub fn set<C: Component>(&mut self, id: EntityId, value: C) {
        C::map_mut(self).insert(id, value);
    }

    /// Look up a component.
    #[must_use]
    pub fn get<C: Component>(&self, id: EntityId) -> Option<&C> {
        C::map(self).get(&id)
    }

    /// Look up a component mutably.
    pub fn get_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        C::map_mut(self).get_mut(&id)
    }

    /// Detach a component, returning it if it was present.
    pub fn remove<C: Component>(&mut self, id: EntityId) -> Option<C> {
        C::map_mut(self).remove(&id)
    }

    /// Check whether `id` carries component `C`.
    #[must_use]
    pub fn has<C: Component>(&self, id: EntityId) -> bool {
        C::map(self).contains_key(&id)
    }

    /// Number of entities carrying `C`.
    #[must_use]
    pub fn count<C: Component>(&self) -> usize {
        C::map(self).len()
    }

    /// Ids carrying `C`.
    #[must_use]
    pub fn ids_with<C: Component>(&self) -> BTreeSet<EntityId> {
        C::map(self).keys().copied().collect()
    }

    /// Ids carrying both `A` and `B`.
    #[must_use]
    pub fn ids_with_both<A: Component, B: Component>(&self) -> BTreeSet<EntityId> {
        let b = B::map(self);
        A::map(self)
            .keys()
            .filter(|id| b.contains_key(id))
            .copied()
            .collect()
    }

    /// `(id, value)` pairs for every entity carrying `C`, in id order.
    #[must_use]
    pub fn entries_with<C: Component>(&self) -> Vec<(EntityId, &C)> {
        C::map(self).iter().map(|(id, c)| (*id, c)).collect()
    }

    /// Joined `(id, (a, b))` entries for every entity carrying both kinds.
    ///
    /// The join walks `A` and looks each id up in `B`, so an id in the
    /// intersection always yields both values.
    #[must_use]
    pub fn entries_with_both<A: Component, B: Component>(&self) -> Vec<(EntityId, (&A, &B))> {
        let b = B::map(self);
        A::map(self)
            .iter()
            .filter_map(|(id, a)| b.get(id).map(|b| (*id, (a, b))))
            .collect()
    }

    /// The first entity carrying [`Player`] together with its position.
    #[must_use]
    pub fn player(&self) -> Option<(EntityId, Position)> {
        self.entries_with_both::<Player, Position>()
            .first()
            .map(|(id, (_, pos))| (*id, **pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ControlShape;

    #[test]
    fn test_ids_are_sequential_and_never_reused() {
        let mut store = Store::new();
        let a = store.create_entity(|id, s| s.set(id, Position::at(0, 0)));
        let b = store.create_entity(|_, _| {});
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        store.despawn(a);
        let c = store.create_entity(|id, s| s.set(id, Player));
        assert_eq!(c, 3);
        assert_eq!(store.next_id(), 4);
    }

    #[test]
    fn test_set_get_remove_touch_one_kind() {
        let mut store = Store::new();
        let id = store.create_entity(|id, s| {
            s.set(id, Position::at(1, 1));
            s.set(id, Movement::Chase);
        });

        assert_eq!(store.remove::<Movement>(id), Some(Movement::Chase));
        assert!(!store.has::<Movement>(id));
        assert_eq!(store.get::<Position>(id), Some(&Position::at(1, 1)));

        // Removing again is a no-op, not an error.
        assert_eq!(store.remove::<Movement>(id), None);
    }

    #[test]
    fn test_missing_lookups_are_absent() {
        let store = Store::new();
        assert!(store.get::<Position>(42).is_none());
        assert!(store.ids_with::<Player>().is_empty());
        assert!(store.entries_with_both::<Player, Position>().is_empty());
        assert!(store.player().is_none());
    }

    #[test]
    fn test_set_replaces_value() {
        let mut store = Store::new();
        let id = store.create_entity(|id, s| s.set(id, Position::at(0, 0)));
        store.set(id, Position::at(3, 4));
        assert_eq!(store.count::<Position>(), 1);
        assert_eq!(store.get::<Position>(id), Some(&Position::at(3, 4)));
    }

    #[test]
    fn test_intersections_and_joins() {
        let mut store = Store::new();
        let both = store.create_entity(|id, s| {
            s.set(id, Fightable);
            s.set(id, Position::at(2, 2));
        });
        let only_pos = store.create_entity(|id, s| s.set(id, Position::at(0, 0)));
        let only_fight = store.create_entity(|id, s| s.set(id, Fightable));

        let ids = store.ids_with_both::<Fightable, Position>();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![both]);

        let joined = store.entries_with_both::<Position, Fightable>();
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].0, both);
        assert_eq!(joined[0].1 .0, &Position::at(2, 2));

        assert_eq!(store.entries_with::<Position>().len(), 2);
        assert!(store.ids_with::<Fightable>().contains(&only_fight));
        assert!(!store.ids_with::<Fightable>().contains(&only_pos));
    }

    #[test]
    fn test_despawn_clears_every_kind() {
        let mut store = Store::new();
        let id = store.create_entity(|id, s| {
            s.set(id, Position::at(1, 2));
            s.set(id, Obstruction);
            s.set(id, Control::new(ControlShape::Mine));
            s.set(id, Sprite::Mine);
        });

        assert!(store.despawn(id));
        assert!(!store.live_ids().contains(&id));
        assert!(store.get::<Control>(id).is_none());
        assert_eq!(store.despawned_count(), 1);
        assert!(!store.despawn(id));
    }

    #[test]
    fn test_player_lookup() {
        let mut store = Store::new();
        store.create_entity(|id, s| s.set(id, Position::at(9, 9)));
        let player = store.create_entity(|id, s| {
            s.set(id, Player);
            s.set(id, Position::at(1, 0));
        });
        assert_eq!(store.player(), Some((player, Position::at(1, 0))));
    }

    #[test]
    fn test_component_names() {
        assert_eq!(<Position as Component>::NAME, "positions");
        assert_eq!(<Spawner as Component>::NAME, "spawners");
    }
}
