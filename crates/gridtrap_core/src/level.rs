//! Level descriptors and finish rules.
//!
//! A [`Level`] bundles a grid extent, an initial store and the rule that
//! decides after every tick whether the game is still running. The
//! simulation itself never looks at the rule; callers evaluate it after each
//! advanced tick.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::components::{Fightable, Movement, Player, Position, SpawnRecipe, Switcher};
use crate::error::{GameError, Result};
use crate::grid::{Extent, GridPos};
use crate::prefabs::Prefab;
use crate::store::Store;
use crate::zones::controlled_tiles;

/// State of a game after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    /// Keep playing.
    Running,
    /// The player lost, with the final score.
    Lost(u32),
    /// The player won, with the final score.
    Won(u32),
}

impl GameStatus {
    /// Check whether the game has ended.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// When the player wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinCondition {
    /// Every fightable entity (enemies and collectibles) is gone.
    NoFightables,
    /// No hostile remains: no switcher in either phase and no entity that
    /// both moves and can be fought. Unbeatable movers such as rooks do not
    /// count.
    NoHostiles,
}

/// When the player loses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoseCondition {
    /// Every on-grid orthogonal neighbour of the player is controlled.
    Trapped,
    /// A moving entity stands orthogonally next to the player.
    Caught,
}

/// Win and lose conditions of a level.
///
/// A missing player always counts as a loss. Otherwise the win condition is
/// checked before the lose conditions, so a move that clears the level wins
/// even if it also leaves the player boxed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinishRule {
    /// Win condition.
    pub win: WinCondition,
    /// Any one of these ends the game as a loss.
    pub lose: Vec<LoseCondition>,
}

impl Default for FinishRule {
    fn default() -> Self {
        Self {
            win: WinCondition::NoFightables,
            lose: vec![LoseCondition::Trapped],
        }
    }
}

impl FinishRule {
    /// Evaluate the rule against a post-tick store.
    ///
    /// The score is the number of entities removed from play so far.
    #[must_use]
    pub fn evaluate(&self, store: &Store, extent: Extent) -> GameStatus {
        let score = store.despawned_count() as u32;

        let Some((player_id, player)) = store.player() else {
            return GameStatus::Lost(score);
        };

        let won = match self.win {
            WinCondition::NoFightables => store.count::<Fightable>() == 0,
            WinCondition::NoHostiles => {
                store.count::<Switcher>() == 0
                    && store.ids_with_both::<Movement, Fightable>().is_empty()
            }
        };
        if won {
            return GameStatus::Won(score);
        }

        let lost = self.lose.iter().any(|condition| match condition {
            LoseCondition::Trapped => is_trapped(store, extent, player.value),
            LoseCondition::Caught => is_caught(store, player_id, player.value),
        });
        if lost {
            return GameStatus::Lost(score);
        }

        GameStatus::Running
    }
}

/// Check whether every on-grid neighbour of `tile` lies in a control zone.
///
/// A tile with no on-grid neighbours at all is not considered trapped.
#[must_use]
pub fn is_trapped(store: &Store, extent: Extent, tile: GridPos) -> bool {
    let controlled: HashSet<GridPos> = controlled_tiles(store, extent);
    let mut neighbors = tile
        .orthogonal_neighbors()
        .into_iter()
        .filter(|n| extent.contains(*n))
        .peekable();

    neighbors.peek().is_some() && neighbors.all(|n| controlled.contains(&n))
}

fn is_caught(store: &Store, player_id: u64, tile: GridPos) -> bool {
    store
        .entries_with_both::<Movement, Position>()
        .into_iter()
        .any(|(id, (_, pos))| id != player_id && pos.value.is_orthogonally_adjacent(tile))
}

/// A playable level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// Display name, also used to look up built-in levels.
    pub name: String,
    /// Grid size.
    pub extent: Extent,
    /// Initial entities.
    pub store: Store,
    /// Short help text shown before the level starts.
    pub info: String,
    /// When the level ends.
    pub finish: FinishRule,
}

impl Level {
    /// Evaluate the level's finish rule.
    #[must_use]
    pub fn is_finished(&self, store: &Store) -> GameStatus {
        self.finish.evaluate(store, self.extent)
    }

    /// Build a level from an ASCII map, one string per row.
    ///
    /// See [`glyph_prefab`] for the legend. All rows must have the same
    /// width.
    pub fn from_ascii(
        name: impl Into<String>,
        info: impl Into<String>,
        finish: FinishRule,
        rows: &[&str],
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |message: String| GameError::InvalidLevel {
            name: name.clone(),
            message,
        };

        let width = rows.first().map_or(0, |r| r.chars().count());
        if width == 0 {
            return Err(invalid("map is empty".into()));
        }

        let mut store = Store::new();
        for (y, row) in rows.iter().enumerate() {
            if row.chars().count() != width {
                return Err(invalid(format!(
                    "row {y} is {} tiles wide, expected {width}",
                    row.chars().count()
                )));
            }
            for (x, glyph) in row.chars().enumerate() {
                let pos = GridPos::new(x as i32, y as i32);
                match glyph_prefab(glyph) {
                    Some(Some(prefab)) => {
                        prefab.spawn(&mut store, pos);
                    }
                    Some(None) => {}
                    None => return Err(invalid(format!("unknown glyph '{glyph}' at {pos}"))),
                }
            }
        }

        if store.count::<Player>() != 1 {
            return Err(invalid(format!(
                "expected exactly one player, found {}",
                store.count::<Player>()
            )));
        }

        Ok(Self {
            extent: Extent::new(width as i32, rows.len() as i32),
            name,
            store,
            info: info.into(),
            finish,
        })
    }
}

/// Map legend used by [`Level::from_ascii`].
///
/// Returns `Some(None)` for empty tiles and `None` for unknown glyphs.
#[must_use]
pub fn glyph_prefab(glyph: char) -> Option<Option<Prefab>> {
    let prefab = match glyph {
        '.' => return Some(None),
        '@' => Prefab::Player,
        '#' => Prefab::Wall,
        '*' => Prefab::Mine,
        'S' => Prefab::Switcher,
        'T' => Prefab::Trapper { interval: 4 },
        'R' => Prefab::Rook,
        'A' => Prefab::Archer,
        'r' => Prefab::Rester,
        'C' => Prefab::Chaser,
        'w' => Prefab::Wanderer,
        '$' => Prefab::Coin,
        'O' => Prefab::Spawner {
            interval: 6,
            recipe: SpawnRecipe::Chaser,
        },
        'o' => Prefab::Spawner {
            interval: 4,
            recipe: SpawnRecipe::Coin,
        },
        _ => return None,
    };
    Some(Some(prefab))
}

/// Built-in levels.
pub mod builtin {
    use super::{FinishRule, Level, LoseCondition, WinCondition};
    use crate::error::{GameError, Result};

    /// Names of all built-in levels, in play order.
    pub const NAMES: [&str; 5] = ["meadow", "switchback", "minefield", "crossfire", "hive"];

    /// Load a built-in level by name.
    pub fn load(name: &str) -> Result<Level> {
        match name {
            "meadow" => Level::from_ascii(
                "meadow",
                "Collect every coin. The wanderers are harmless but get in the way.",
                FinishRule::default(),
                &[
                    "@......",
                    "..$....",
                    "....w..",
                    ".$...$.",
                    "..w....",
                    "......$",
                    "$......",
                ],
            ),
            "switchback" => Level::from_ascii(
                "switchback",
                "Switchers chase you, then lock down the tiles around them. \
                 Strike while they are moving.",
                FinishRule {
                    win: WinCondition::NoHostiles,
                    lose: vec![LoseCondition::Trapped],
                },
                &[
                    "@.......",
                    "........",
                    "..#..#..",
                    "........",
                    "....S...",
                    "..#..#..",
                    "......S.",
                    "........",
                ],
            ),
            "minefield" => Level::from_ascii(
                "minefield",
                "Trappers leave mines behind. Catch them before the field closes.",
                FinishRule {
                    win: WinCondition::NoHostiles,
                    lose: vec![LoseCondition::Trapped],
                },
                &[
                    "@........",
                    ".........",
                    "...T.....",
                    ".........",
                    "......T..",
                    ".........",
                    ".........",
                ],
            ),
            "crossfire" => Level::from_ascii(
                "crossfire",
                "Rooks sweep rows and columns, archers cover the diagonals. \
                 Grab the coins and clear the resters.",
                FinishRule::default(),
                &[
                    "@....$...",
                    "..r......",
                    "........A",
                    ".$.......",
                    ".....R...",
                    ".........",
                    "$..r....$",
                ],
            ),
            "hive" => Level::from_ascii(
                "hive",
                "The hive keeps sending chasers. Pick up every coin, the scattered \
                 ones and the ones it drops, without letting them corner you.",
                FinishRule {
                    win: WinCondition::NoFightables,
                    lose: vec![LoseCondition::Trapped, LoseCondition::Caught],
                },
                &[
                    "@.........",
                    "......$...",
                    "...#..#...",
                    ".$..O.....",
                    "...#..#...",
                    "........o.",
                    "$.......$.",
                ],
            ),
            other => Err(GameError::UnknownLevel(other.to_string())),
        }
    }
}
