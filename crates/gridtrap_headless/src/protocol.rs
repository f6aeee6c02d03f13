//! Line protocol for headless play.
//!
//! **Input (stdin):** one direction token per line: `up`, `down`, `left` or
//! `right`. Surrounding whitespace is ignored, blank lines are skipped and
//! `quit` ends the session early.
//!
//! **Output (stdout):** exactly one final line with the [`Outcome`]:
//! `WON`, `LOST` or `FAIL` (input ended before the game did). With
//! `--show` the board is printed after every advanced tick as well.
//!
//! # Example Session
//!
//! ```text
//! -> right
//! -> down
//! -> sideways        (logged to stderr and skipped)
//! -> down
//! <- WON
//! ```

use std::fmt;

use gridtrap_core::error::GameError;
use gridtrap_core::grid::Direction;
use gridtrap_core::level::GameStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking the line protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Line is not a known token.
    #[error("Unknown token: {0:?}")]
    UnknownToken(String),

    /// Reading input or writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The game itself reported an error.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// One parsed input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    /// Move the player.
    Move(Direction),
    /// Stop reading input.
    Quit,
}

impl Input {
    /// Parse one line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, ProtocolError> {
        let token = line.trim();
        if token.is_empty() {
            return Ok(None);
        }
        if token.eq_ignore_ascii_case("quit") {
            return Ok(Some(Self::Quit));
        }
        token
            .to_ascii_lowercase()
            .parse::<Direction>()
            .map(|dir| Some(Self::Move(dir)))
            .map_err(|_| ProtocolError::UnknownToken(token.to_string()))
    }
}

/// Final result of a headless game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The finish rule reported a win.
    Won,
    /// The finish rule reported a loss.
    Lost,
    /// Input ran out while the game was still running.
    Fail,
}

impl Outcome {
    /// The output line for this outcome.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Won => "WON",
            Self::Lost => "LOST",
            Self::Fail => "FAIL",
        }
    }

    /// Map a finished status to an outcome. `Running` has no outcome yet.
    #[must_use]
    pub const fn from_status(status: GameStatus) -> Option<Self> {
        match status {
            GameStatus::Running => None,
            GameStatus::Won(_) => Some(Self::Won),
            GameStatus::Lost(_) => Some(Self::Lost),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directions() {
        assert_eq!(Input::parse("up").unwrap(), Some(Input::Move(Direction::Up)));
        assert_eq!(
            Input::parse("  Right \r").unwrap(),
            Some(Input::Move(Direction::Right))
        );
        assert_eq!(Input::parse("QUIT").unwrap(), Some(Input::Quit));
    }

    #[test]
    fn test_parse_blank_and_unknown() {
        assert_eq!(Input::parse("   ").unwrap(), None);
        assert!(matches!(
            Input::parse("jump"),
            Err(ProtocolError::UnknownToken(t)) if t == "jump"
        ));
    }

    #[test]
    fn test_outcome_tokens() {
        assert_eq!(Outcome::Won.to_string(), "WON");
        assert_eq!(Outcome::Lost.to_string(), "LOST");
        assert_eq!(Outcome::Fail.to_string(), "FAIL");
        assert_eq!(Outcome::from_status(GameStatus::Running), None);
        assert_eq!(Outcome::from_status(GameStatus::Won(3)), Some(Outcome::Won));
    }

    #[test]
    fn test_outcome_json() {
        assert_eq!(serde_json::to_string(&Outcome::Lost).unwrap(), "\"lost\"");
    }
}
