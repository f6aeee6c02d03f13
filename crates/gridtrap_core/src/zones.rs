//! Control-zone rasterization.
//!
//! A [`Control`] component covers a set of tiles relative to its owner. The
//! union of all zones is the set of tiles the player may not enter.

use std::collections::HashSet;

use crate::components::{Control, ControlShape, Position};
use crate::grid::{Extent, GridPos};
use crate::store::Store;

impl ControlShape {
    /// Tiles covered by this shape when its owner stands on `origin`.
    ///
    /// Every shape includes `origin` itself. Results are clipped to `extent`.
    #[must_use]
    pub fn tiles(self, origin: GridPos, extent: Extent) -> Vec<GridPos> {
        let mut tiles: Vec<GridPos> = match self {
            Self::Mine => vec![origin],
            Self::Switcher => (-1..=1)
                .flat_map(|dy| (-1..=1).map(move |dx| origin + GridPos::new(dx, dy)))
                .collect(),
            Self::Rook => {
                let row = (0..extent.width).map(|x| GridPos::new(x, origin.y));
                let column = (0..extent.height)
                    .filter(|y| *y != origin.y)
                    .map(|y| GridPos::new(origin.x, y));
                row.chain(column).collect()
            }
            Self::Archer => {
                let reach = extent.width.max(extent.height);
                let mut tiles = vec![origin];
                for d in 1..reach {
                    tiles.extend([
                        origin + GridPos::new(d, d),
                        origin + GridPos::new(-d, d),
                        origin + GridPos::new(d, -d),
                        origin + GridPos::new(-d, -d),
                    ]);
                }
                tiles
            }
        };
        tiles.retain(|t| extent.contains(*t));
        tiles
    }
}

impl ControlShape {
    /// Whether this shape, owned from `origin`, covers `tile`.
    ///
    /// Same answer as checking [`ControlShape::tiles`] without building the
    /// tile list.
    #[must_use]
    pub fn covers(self, origin: GridPos, tile: GridPos, extent: Extent) -> bool {
        if !extent.contains(tile) {
            return false;
        }
        let (dx, dy) = ((tile.x - origin.x).abs(), (tile.y - origin.y).abs());
        match self {
            Self::Mine => dx == 0 && dy == 0,
            Self::Switcher => dx <= 1 && dy <= 1,
            Self::Rook => dx == 0 || dy == 0,
            Self::Archer => dx == dy,
        }
    }
}

/// Union of every control zone in the store.
#[must_use]
pub fn controlled_tiles(store: &Store, extent: Extent) -> HashSet<GridPos> {
    store
        .entries_with_both::<Control, Position>()
        .into_iter()
        .flat_map(|(_, (control, pos))| control.shape.tiles(pos.value, extent))
        .collect()
}

/// Check whether a single tile lies inside any control zone.
#[must_use]
pub fn is_controlled(store: &Store, extent: Extent, tile: GridPos) -> bool {
    store
        .entries_with_both::<Control, Position>()
        .into_iter()
        .any(|(_, (control, pos))| control.shape.covers(pos.value, tile, extent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut tiles: Vec<GridPos>) -> Vec<GridPos> {
        tiles.sort();
        tiles
    }

    #[test]
    fn test_mine_covers_own_tile() {
        let extent = Extent::new(5, 5);
        assert_eq!(
            ControlShape::Mine.tiles(GridPos::new(2, 3), extent),
            vec![GridPos::new(2, 3)]
        );
    }

    #[test]
    fn test_switcher_zone_is_clipped_3x3() {
        let extent = Extent::new(5, 5);
        assert_eq!(ControlShape::Switcher.tiles(GridPos::new(2, 2), extent).len(), 9);

        let corner = sorted(ControlShape::Switcher.tiles(GridPos::new(0, 0), extent));
        assert_eq!(
            corner,
            vec![
                GridPos::new(0, 0),
                GridPos::new(1, 0),
                GridPos::new(0, 1),
                GridPos::new(1, 1)
            ]
        );
    }

    #[test]
    fn test_rook_covers_row_and_column_once() {
        let extent = Extent::new(4, 3);
        let tiles = ControlShape::Rook.tiles(GridPos::new(1, 1), extent);
        // 4 in the row + 2 more in the column.
        assert_eq!(tiles.len(), 6);
        assert!(tiles.contains(&GridPos::new(3, 1)));
        assert!(tiles.contains(&GridPos::new(1, 0)));
        assert!(tiles.contains(&GridPos::new(1, 2)));
        assert!(!tiles.contains(&GridPos::new(2, 2)));
    }

    #[test]
    fn test_archer_covers_diagonals() {
        let extent = Extent::new(5, 5);
        let tiles = ControlShape::Archer.tiles(GridPos::new(2, 2), extent);
        assert_eq!(tiles.len(), 9);
        assert!(tiles.contains(&GridPos::new(0, 0)));
        assert!(tiles.contains(&GridPos::new(4, 0)));
        assert!(tiles.contains(&GridPos::new(0, 4)));
        assert!(!tiles.contains(&GridPos::new(2, 0)));
    }

    #[test]
    fn test_covers_matches_tiles() {
        let extent = Extent::new(6, 5);
        let shapes = [
            ControlShape::Mine,
            ControlShape::Switcher,
            ControlShape::Rook,
            ControlShape::Archer,
        ];
        for shape in shapes {
            for origin in extent.tiles() {
                let tiles = shape.tiles(origin, extent);
                for tile in extent.tiles() {
                    assert_eq!(
                        shape.covers(origin, tile, extent),
                        tiles.contains(&tile),
                        "{shape:?} from {origin} at {tile}"
                    );
                }
                assert!(!shape.covers(origin, GridPos::new(-1, origin.y), extent));
            }
        }
    }

    #[test]
    fn test_controlled_tiles_union() {
        let mut store = Store::new();
        store.create_entity(|id, s| {
            s.set(id, Position::at(0, 0));
            s.set(id, Control::new(ControlShape::Mine));
        });
        store.create_entity(|id, s| {
            s.set(id, Position::at(4, 4));
            s.set(id, Control::new(ControlShape::Mine));
        });
        // Control without a position contributes nothing.
        store.create_entity(|id, s| s.set(id, Control::new(ControlShape::Rook)));

        let extent = Extent::new(5, 5);
        let tiles = controlled_tiles(&store, extent);
        assert_eq!(tiles.len(), 2);
        assert!(is_controlled(&store, extent, GridPos::new(4, 4)));
        assert!(!is_controlled(&store, extent, GridPos::new(2, 2)));
    }
}
