//! Grid-based pathfinding using A* algorithm.
//!
//! [`find_path`] is generic over the node type and takes the heuristic and
//! neighbour enumeration as closures, so it knows nothing about grids,
//! bounds or obstacles. [`find_grid_path`] wires it up for the game grid.
//!
//! Every caller in the simulation uses [`squared_euclidean`] as heuristic.
//! It overestimates on a 4-connected grid, so paths are only guaranteed
//! shortest on open terrain; around obstacles the search behaves like a
//! greedy best-first walk. Movers only ever take the first hop, so that is
//! good enough, and switching heuristics would change which hop they take.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::grid::{Extent, GridPos};

/// Cost of moving between two adjacent nodes.
const STEP_COST: i64 = 1;

/// An entry in the open set.
///
/// Derived ordering compares `f_score` first, then the node itself, so the
/// set's first element is the lowest-cost node with a deterministic
/// tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry<N> {
    f_score: i64,
    node: N,
}

#[derive(Debug, Clone, Copy)]
struct Scores {
    g: i64,
    f: i64,
}

/// Find a path from `start` to `goal` using A*.
///
/// `heuristic(goal, node)` estimates the remaining cost and
/// `neighbors_of(node)` lists the nodes reachable in one step. Step cost is
/// always one. Returns the nodes from `start` to `goal` inclusive, or `None`
/// when the goal cannot be reached.
///
/// # Example
///
/// ```
/// use gridtrap_core::grid::GridPos;
/// use gridtrap_core::pathfinding::{find_path, squared_euclidean};
///
/// let path = find_path(
///     GridPos::new(0, 0),
///     GridPos::new(2, 0),
///     squared_euclidean,
///     |p: &GridPos| p.orthogonal_neighbors(),
/// )
/// .unwrap();
/// assert_eq!(path.len(), 3);
/// ```
pub fn find_path<N, H, F, I>(
    start: N,
    goal: N,
    mut heuristic: H,
    mut neighbors_of: F,
) -> Option<Vec<N>>
where
    N: Clone + Eq + Hash + Ord,
    H: FnMut(&N, &N) -> i64,
    F: FnMut(&N) -> I,
    I: IntoIterator<Item = N>,
{
    let mut open: BTreeSet<OpenEntry<N>> = BTreeSet::new();
    let mut closed: HashSet<N> = HashSet::new();
    let mut scores: HashMap<N, Scores> = HashMap::new();
    let mut came_from: HashMap<N, N> = HashMap::new();

    let start_f = heuristic(&goal, &start);
    scores.insert(start.clone(), Scores { g: 0, f: start_f });
    open.insert(OpenEntry {
        f_score: start_f,
        node: start,
    });

    while let Some(OpenEntry { node: current, .. }) = open.pop_first() {
        if current == goal {
            return Some(reconstruct_path(&came_from, current));
        }

        let current_g = scores.get(&current).map_or(0, |s| s.g);
        closed.insert(current.clone());

        for neighbor in neighbors_of(&current) {
            if closed.contains(&neighbor) {
                continue;
            }

            let tentative_g = current_g + STEP_COST;
            if let Some(existing) = scores.get(&neighbor).copied() {
                if tentative_g >= existing.g {
                    continue;
                }
                // Strictly better route to an open node: re-key it.
                open.remove(&OpenEntry {
                    f_score: existing.f,
                    node: neighbor.clone(),
                });
            }

            let f = tentative_g + heuristic(&goal, &neighbor);
            came_from.insert(neighbor.clone(), current.clone());
            scores.insert(neighbor.clone(), Scores { g: tentative_g, f });
            open.insert(OpenEntry {
                f_score: f,
                node: neighbor,
            });
        }
    }

    None
}

/// Follow back-pointers from `goal` and return the path start..goal.
fn reconstruct_path<N>(came_from: &HashMap<N, N>, goal: N) -> Vec<N>
where
    N: Clone + Eq + Hash,
{
    let mut path = vec![goal];
    while let Some(prev) = path.last().and_then(|n| came_from.get(n)) {
        path.push(prev.clone());
    }
    path.reverse();
    path
}

/// Squared straight-line distance between two tiles.
///
/// This is the heuristic every mover uses. See the module docs for why it is
/// not Manhattan distance.
#[must_use]
pub fn squared_euclidean(a: &GridPos, b: &GridPos) -> i64 {
    a.distance_squared(*b)
}

/// Manhattan distance between two tiles. Admissible on a 4-connected grid.
#[must_use]
pub fn manhattan(a: &GridPos, b: &GridPos) -> i64 {
    a.manhattan_distance(*b)
}

/// Orthogonal neighbours of `pos` that are on the grid and not in `obstacles`.
///
/// Neighbours are yielded in [`crate::grid::Direction::ALL`] order.
pub fn grid_neighbors<'a>(
    extent: Extent,
    obstacles: &'a HashSet<GridPos>,
    pos: GridPos,
) -> impl Iterator<Item = GridPos> + 'a {
    pos.orthogonal_neighbors()
        .into_iter()
        .filter(move |n| extent.contains(*n) && !obstacles.contains(n))
}

/// Find a path across the grid, treating `obstacles` as impassable.
///
/// The goal tile is always enterable even if it is listed as an obstacle,
/// so a mover can path towards an entity that itself blocks movement.
#[must_use]
pub fn find_grid_path(
    extent: Extent,
    obstacles: &HashSet<GridPos>,
    start: GridPos,
    goal: GridPos,
) -> Option<Vec<GridPos>> {
    find_path(start, goal, squared_euclidean, |pos: &GridPos| {
        pos.orthogonal_neighbors()
            .into_iter()
            .filter(|n| extent.contains(*n) && (*n == goal || !obstacles.contains(n)))
            .collect::<Vec<_>>()
    })
}
