//! Game modes and gameplay rules: Marathon, Relax

use crate::bag::GeneratorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Available game modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    #[default]
    Marathon, // Speeds up every level
    Relax,    // Keeps the starting speed
}

impl GameMode {
    pub fn name(&self) -> &'static str {
        match self {
            GameMode::Marathon => "Marathon",
            GameMode::Relax => "Relax",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GameMode::Marathon => "Pieces fall faster every 10 lines",
            GameMode::Relax => "Pieces keep falling at the starting speed",
        }
    }

    pub fn all() -> &'static [GameMode] {
        &[GameMode::Marathon, GameMode::Relax]
    }
}

/// Tunable gameplay rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub mode: GameMode,
    /// Gravity interval at level 1
    pub base_drop_ms: u64,
    /// Interval reduction per level
    pub drop_step_ms: u64,
    /// Fastest interval
    pub min_drop_ms: u64,
    /// Award points for hard drop distance
    pub hard_drop_bonus: bool,
    /// Points per cell when `hard_drop_bonus` is on
    pub hard_drop_points_per_cell: u64,
    pub generator: GeneratorKind,
    /// Fixed RNG seed, random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            mode: GameMode::Marathon,
            base_drop_ms: 1000,
            drop_step_ms: 50,
            min_drop_ms: 100,
            hard_drop_bonus: false,
            hard_drop_points_per_cell: 2,
            generator: GeneratorKind::Uniform,
            seed: None,
        }
    }
}

impl Rules {
    /// Gravity interval in milliseconds for a level
    pub fn drop_interval_ms(&self, level: u32) -> u64 {
        match self.mode {
            GameMode::Marathon => {
                let reduction = u64::from(level.saturating_sub(1)).saturating_mul(self.drop_step_ms);
                self.base_drop_ms
                    .saturating_sub(reduction)
                    .max(self.min_drop_ms)
            }
            GameMode::Relax => self.base_drop_ms.max(self.min_drop_ms),
        }
    }

    pub fn drop_interval(&self, level: u32) -> Duration {
        Duration::from_millis(self.drop_interval_ms(level))
    }
}
