//! Distance-based scoring

use serde::{Deserialize, Serialize};

use crate::consts::SCORE_PER_METER;
use crate::pixels_to_meters;

/// Tracks the furthest displacement reached and the score derived from it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    /// Best displacement seen this run (meters)
    pub max_displacement_m: f32,
    /// Last computed score
    pub score: u32,
}

impl ScoreTracker {
    /// Sample the player's x; the score only ever grows
    pub fn update(&mut self, player_x: f32) -> u32 {
        let displacement = pixels_to_meters(player_x);
        if displacement > self.max_displacement_m {
            self.max_displacement_m = displacement;
        }
        self.score = (SCORE_PER_METER * self.max_displacement_m).floor().max(0.0) as u32;
        self.score
    }
}
