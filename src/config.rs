//! Rule and timing configuration for a game session.
//!
//! Defaults reproduce the shipped game. A page can override any subset by
//! passing JSON to `start_game_with_config`; missing fields fall back to the
//! defaults.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::model::MAX_NUMBER;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Rounds whose index is a multiple of this show two equal numbers.
    pub equal_round_period: u32,
    /// Largest number drawn (inclusive).
    pub max_number: u16,
    /// Consecutive wins that trigger the celebration.
    pub streak_cap: u8,
    /// Delay before the problem is read aloud.
    pub speech_delay_ms: u32,
    /// Delay before the answer buttons accept input. Must exceed `speech_delay_ms`.
    pub input_enable_delay_ms: u32,
    /// Delay between a lost result and the spoken explanation.
    pub explanation_delay_ms: u32,
    pub win_countdown_ticks: u32,
    pub loss_countdown_ticks: u32,
    pub countdown_tick_ms: u32,
    pub celebration_duration_ms: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            equal_round_period: 5,
            max_number: MAX_NUMBER,
            streak_cap: 10,
            speech_delay_ms: 500,
            input_enable_delay_ms: 2000,
            explanation_delay_ms: 1000,
            win_countdown_ticks: 3,
            loss_countdown_ticks: 15,
            countdown_tick_ms: 1000,
            celebration_duration_ms: 12_000,
        }
    }
}

impl GameConfig {
    /// Parse a (possibly partial) JSON object and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig =
            serde_json::from_str(json).map_err(|e| GameError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.equal_round_period == 0 {
            return Err(GameError::Config("equal_round_period must be non-zero".into()));
        }
        if self.max_number == 0 {
            // Distinct pairs need at least two values.
            return Err(GameError::Config("max_number must be at least 1".into()));
        }
        if self.streak_cap == 0 {
            return Err(GameError::Config("streak_cap must be non-zero".into()));
        }
        if self.speech_delay_ms >= self.input_enable_delay_ms {
            return Err(GameError::Config(format!(
                "speech_delay_ms ({}) must be below input_enable_delay_ms ({})",
                self.speech_delay_ms, self.input_enable_delay_ms
            )));
        }
        Ok(())
    }

    pub fn countdown_ticks(&self, won: bool) -> u32 {
        if won {
            self.win_countdown_ticks
        } else {
            self.loss_countdown_ticks
        }
    }
}
