//! Level loading from RON files.
//!
//! A level file gives the grid size, the finish rule and the entities,
//! either as an ASCII `map` (same legend as the built-in levels), as a list
//! of explicit `entities`, or both. Explicit entities are placed after the
//! map.
//!
//! ```ron
//! LevelFile(
//!     name: "corridor",
//!     width: 6,
//!     height: 3,
//!     info: "Grab the coin.",
//!     finish: (win: NoFightables, lose: [Trapped]),
//!     map: [
//!         "@.....",
//!         ".####.",
//!         "......",
//!     ],
//!     entities: [
//!         (prefab: Coin, x: 5, y: 2),
//!         (prefab: Spawner(interval: 4, recipe: Chaser), x: 5, y: 0),
//!     ],
//! )
//! ```

use std::path::Path;

use gridtrap_core::components::Player;
use gridtrap_core::error::GameError;
use gridtrap_core::grid::{Extent, GridPos};
use gridtrap_core::level::{builtin, glyph_prefab, FinishRule, Level};
use gridtrap_core::prefabs::Prefab;
use gridtrap_core::store::Store;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for level file operations.
#[derive(Error, Debug)]
pub enum LevelFileError {
    /// File not found.
    #[error("Level file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read level file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse level: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to encode level: {0}")]
    EncodeError(#[from] ron::Error),
    /// Parsed fine but does not describe a playable level.
    #[error("Invalid level '{name}': {message}")]
    Invalid {
        /// Level name.
        name: String,
        /// What is wrong with it.
        message: String,
    },
    /// Built-in level lookup failed.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// One entity placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// What to place.
    pub prefab: Prefab,
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Placement {
    /// Create a placement.
    #[must_use]
    pub const fn new(prefab: Prefab, x: i32, y: i32) -> Self {
        Self { prefab, x, y }
    }
}

/// On-disk level description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFile {
    /// Level name.
    pub name: String,
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Help text.
    #[serde(default)]
    pub info: String,
    /// Win and lose conditions.
    #[serde(default)]
    pub finish: FinishRule,
    /// Optional ASCII map, one string per row.
    #[serde(default)]
    pub map: Vec<String>,
    /// Explicit placements.
    #[serde(default)]
    pub entities: Vec<Placement>,
}

impl LevelFile {
    /// Load a level file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LevelFileError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LevelFileError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, LevelFileError> {
        let file: LevelFile = ron::from_str(ron)?;
        Ok(file)
    }

    /// Write the level as pretty RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), LevelFileError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate and build the playable level.
    pub fn into_level(self) -> Result<Level, LevelFileError> {
        let invalid = |message: String| LevelFileError::Invalid {
            name: self.name.clone(),
            message,
        };

        if self.width < 1 || self.height < 1 {
            return Err(invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        let extent = Extent::new(self.width, self.height);
        let mut store = Store::new();

        if !self.map.is_empty() {
            if self.map.len() != self.height as usize {
                return Err(invalid(format!(
                    "map has {} rows, expected {}",
                    self.map.len(),
                    self.height
                )));
            }
            for (y, row) in self.map.iter().enumerate() {
                if row.chars().count() != self.width as usize {
                    return Err(invalid(format!(
                        "map row {y} is {} tiles wide, expected {}",
                        row.chars().count(),
                        self.width
                    )));
                }
                for (x, glyph) in row.chars().enumerate() {
                    let pos = GridPos::new(x as i32, y as i32);
                    match glyph_prefab(glyph) {
                        Some(Some(prefab)) => {
                            prefab.spawn(&mut store, pos);
                        }
                        Some(None) => {}
                        None => {
                            return Err(invalid(format!("unknown glyph '{glyph}' at {pos}")));
                        }
                    }
                }
            }
        }

        for placement in &self.entities {
            let pos = GridPos::new(placement.x, placement.y);
            if !extent.contains(pos) {
                return Err(invalid(format!(
                    "{:?} at {pos} is outside the {}x{} grid",
                    placement.prefab, self.width, self.height
                )));
            }
            placement.prefab.spawn(&mut store, pos);
        }

        let players = store.count::<Player>();
        if players != 1 {
            return Err(invalid(format!("expected exactly one player, found {players}")));
        }

        tracing::debug!(
            name = %self.name,
            width = self.width,
            height = self.height,
            entities = store.live_ids().len(),
            "Level file loaded"
        );

        Ok(Level {
            name: self.name,
            extent,
            store,
            info: self.info,
            finish: self.finish,
        })
    }
}

/// Resolve a built-in level name or a path to a RON level file.
pub fn resolve_level(name_or_path: &str) -> Result<Level, LevelFileError> {
    if builtin::NAMES.contains(&name_or_path) {
        return Ok(builtin::load(name_or_path)?);
    }
    LevelFile::load(name_or_path)?.into_level()
}
