//! Integer grid geometry.
//!
//! Everything in the simulation lives on a bounded rectangular grid of
//! integer tiles. Coordinates grow right (`x`) and down (`y`), so
//! [`Direction::Up`] decreases `y`.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// A tile coordinate.
///
/// Ordering is row-major (`y` first, then `x`) so that sorted collections of
/// positions read top-to-bottom, left-to-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Origin tile (0, 0).
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Squared Euclidean distance (avoids sqrt for comparisons).
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Manhattan distance, the true step count on an open 4-connected grid.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx.abs() + dy.abs()
    }

    /// The four orthogonal neighbours in [`Direction::ALL`] order.
    ///
    /// No bounds checking is done here.
    #[must_use]
    pub fn orthogonal_neighbors(self) -> [Self; 4] {
        Direction::ALL.map(|dir| self + dir.offset())
    }

    /// Check whether `other` is exactly one orthogonal step away.
    #[must_use]
    pub const fn is_orthogonally_adjacent(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }
}

impl Ord for GridPos {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for GridPos {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for GridPos {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridPos {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Width and height of the playing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

impl Extent {
    /// Create a new extent.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Check if a position lies on the grid.
    #[must_use]
    pub const fn contains(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Clamp a position into `[0, dimension - 1]` on both axes.
    #[must_use]
    pub fn clamp(&self, pos: GridPos) -> GridPos {
        GridPos::new(
            pos.x.clamp(0, (self.width - 1).max(0)),
            pos.y.clamp(0, (self.height - 1).max(0)),
        )
    }

    /// Number of tiles on the grid.
    #[must_use]
    pub fn area(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Iterate over every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| GridPos::new(x, y)))
    }
}

/// One of the four movement intents a player can issue per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0.
    Up,
    /// Away from row 0.
    Down,
    /// Towards column 0.
    Left,
    /// Away from column 0.
    Right,
}

impl Direction {
    /// All directions, in the order neighbours are enumerated.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The `(dx, dy)` step for this direction. Exactly one axis is non-zero.
    #[must_use]
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }

    /// The step as a position offset.
    #[must_use]
    pub const fn offset(self) -> GridPos {
        let (dx, dy) = self.delta();
        GridPos::new(dx, dy)
    }

    /// The wire token for this direction.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            other => Err(GameError::UnknownDirection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_squared() {
        let a = GridPos::new(1, 2);
        let b = GridPos::new(4, 6);
        assert_eq!(a.distance_squared(b), 25);
        assert_eq!(b.distance_squared(a), 25);
        assert_eq!(a.distance_squared(a), 0);
    }

    #[test]
    fn test_manhattan_distance() {
        assert_eq!(
            GridPos::new(0, 0).manhattan_distance(GridPos::new(3, -4)),
            7
        );
    }

    #[test]
    fn test_row_major_ordering() {
        let mut tiles = vec![GridPos::new(2, 0), GridPos::new(0, 1), GridPos::new(1, 0)];
        tiles.sort();
        assert_eq!(
            tiles,
            vec![GridPos::new(1, 0), GridPos::new(2, 0), GridPos::new(0, 1)]
        );
    }

    #[test]
    fn test_extent_contains_and_clamp() {
        let extent = Extent::new(5, 4);
        assert!(extent.contains(GridPos::new(0, 0)));
        assert!(extent.contains(GridPos::new(4, 3)));
        assert!(!extent.contains(GridPos::new(5, 0)));
        assert!(!extent.contains(GridPos::new(0, -1)));

        assert_eq!(extent.clamp(GridPos::new(-1, 2)), GridPos::new(0, 2));
        assert_eq!(extent.clamp(GridPos::new(7, 9)), GridPos::new(4, 3));
    }

    #[test]
    fn test_extent_tiles_row_major() {
        let extent = Extent::new(2, 2);
        let tiles: Vec<_> = extent.tiles().collect();
        assert_eq!(
            tiles,
            vec![
                GridPos::new(0, 0),
                GridPos::new(1, 0),
                GridPos::new(0, 1),
                GridPos::new(1, 1)
            ]
        );
        assert_eq!(extent.area(), 4);
    }

    #[test]
    fn test_direction_deltas_are_orthogonal() {
        for dir in Direction::ALL {
            let (dx, dy) = dir.delta();
            assert_eq!(dx.abs() + dy.abs(), 1, "{dir} must move one axis");
        }
    }

    #[test]
    fn test_direction_tokens_parse() {
        for dir in Direction::ALL {
            assert_eq!(dir.token().parse::<Direction>().unwrap(), dir);
        }
        assert_eq!(" left\n".parse::<Direction>().unwrap(), Direction::Left);
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_orthogonal_neighbors() {
        let n = GridPos::new(2, 2).orthogonal_neighbors();
        assert_eq!(
            n,
            [
                GridPos::new(2, 1),
                GridPos::new(2, 3),
                GridPos::new(1, 2),
                GridPos::new(3, 2)
            ]
        );
        assert!(n.iter().all(|p| p.is_orthogonally_adjacent(GridPos::new(2, 2))));
    }
}
