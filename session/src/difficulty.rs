//! Opponent strength that follows the human's results.

use serde::{Deserialize, Serialize};

/// Search strength in `[1, 20]`. Construction always clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub struct DifficultyLevel(u8);

impl DifficultyLevel {
    pub const MIN: DifficultyLevel = DifficultyLevel(1);
    pub const MAX: DifficultyLevel = DifficultyLevel(20);

    pub fn new(level: u8) -> Self {
        Self(level.clamp(Self::MIN.0, Self::MAX.0))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn raised(self) -> Self {
        Self::new(self.0.saturating_add(1))
    }

    pub fn lowered(self) -> Self {
        Self::new(self.0.saturating_sub(1))
    }

    /// Rough Elo equivalent, for display.
    pub fn estimated_rating(self) -> u32 {
        300 + 130 * u32::from(self.0)
    }

    /// Position of the level on a 0..=1 gauge, for display.
    pub fn display_fraction(self) -> f32 {
        f32::from(self.0) / f32::from(Self::MAX.0)
    }
}

impl Default for DifficultyLevel {
    fn default() -> Self {
        Self(10)
    }
}

impl From<u8> for DifficultyLevel {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl From<DifficultyLevel> for u8 {
    fn from(level: DifficultyLevel) -> Self {
        level.0
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished game from the human's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HumanResult {
    Win,
    Loss,
    Draw,
}

/// Owns the session-spanning difficulty level.
#[derive(Debug, Clone, Default)]
pub struct DifficultyController {
    level: DifficultyLevel,
}

impl DifficultyController {
    pub fn new(level: DifficultyLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> DifficultyLevel {
        self.level
    }

    /// Win raises the level by one, loss lowers it by one, draw keeps it.
    pub fn on_game_end(&mut self, result: HumanResult) -> DifficultyLevel {
        let previous = self.level;
        self.level = match result {
            HumanResult::Win => previous.raised(),
            HumanResult::Loss => previous.lowered(),
            HumanResult::Draw => previous,
        };
        tracing::info!(
            ?result,
            from = previous.get(),
            to = self.level.get(),
            rating = self.level.estimated_rating(),
            "Difficulty adjusted"
        );
        self.level
    }
}
