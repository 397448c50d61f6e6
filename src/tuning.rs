//! Game balance tuning
//!
//! Every balance number the simulation reads lives here so a run can be
//! re-tuned from a JSON file without touching code. Missing keys fall back to
//! the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`Tuning`]
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("{field} must be a probability in [0, 1], got {value}")]
    Probability { field: &'static str, value: f32 },

    #[error("{field} must be greater than zero")]
    NonPositive { field: &'static str },

    #[error("spotlight band is empty: min_y {min} > max_y {max}")]
    SpotlightBand { min: f32, max: f32 },

    #[error("beam must reach further left than right (left {left}, right {right})")]
    BeamShape { left: f32, right: f32 },

    #[error("jump_velocity must point up (negative y), got {0}")]
    JumpDirection(f32),

    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tuning JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Balance parameters for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    /// Horizontal speed (pixels/s)
    pub player_speed: f32,
    /// Downward acceleration (pixels/s²)
    pub gravity: f32,
    /// Vertical velocity applied on jump (pixels/s, negative is up)
    pub jump_velocity: f32,
    /// Jumps available before landing again
    pub max_jumps: u8,
    /// Airborne roll (degrees per millisecond)
    pub roll_deg_per_ms: f32,

    // === Terrain ===
    /// Distance ahead of the player that must stay generated
    pub lookahead: f32,
    /// Segments appended per extension
    pub platform_batch: u32,
    /// Gaps and terrain spikes only appear past this x
    pub safe_zone_x: f32,
    /// Chance a segment past the safe zone is skipped
    pub gap_chance: f32,
    /// Chance a new platform past the safe zone carries a spike
    pub terrain_spike_chance: f32,

    // === Hazard scheduler ===
    pub spike_attempt_ms: u64,
    pub spotlight_attempt_ms: u64,
    /// Coin flip applied on every attempt
    pub hazard_spawn_chance: f32,
    /// How far ahead of the player hazards appear
    pub hazard_lead: f32,
    /// Half-width of the window searched for a spike platform
    pub spike_tolerance: f32,
    pub spotlight_min_y: f32,
    pub spotlight_max_y: f32,

    // === Spike cycle (ms) ===
    pub spike_rise_ms: u64,
    pub spike_active_ms: u64,
    pub spike_retract_ms: u64,
    pub spike_idle_ms: u64,

    // === Spotlight ===
    /// Leftward speed (pixels/s)
    pub spotlight_speed: f32,
    pub spotlight_lifetime_ms: u64,
    /// Vertical distance from spotlight to beam base
    pub beam_length: f32,
    /// Beam base reach to the left of the spotlight
    pub beam_left: f32,
    /// Beam base reach to the right of the spotlight
    pub beam_right: f32,
    /// Apex sits this far below the spotlight
    pub beam_apex_offset: f32,

    // === Hiding ===
    pub hide_probe_width: f32,

    // === Lifecycle ===
    /// Entities this far behind the player are removed
    pub cleanup_distance: f32,
    /// Falling this far below the viewport ends the run
    pub fall_buffer: f32,
    /// Delay between game over and the restart affordance
    pub restart_delay_ms: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: 200.0,
            gravity: 1000.0,
            jump_velocity: -450.0,
            max_jumps: 2,
            roll_deg_per_ms: 2.5 / 16.0,

            lookahead: 800.0,
            platform_batch: 3,
            safe_zone_x: 1000.0,
            gap_chance: 0.1,
            terrain_spike_chance: 0.1,

            spike_attempt_ms: 5000,
            spotlight_attempt_ms: 7500,
            hazard_spawn_chance: 0.5,
            hazard_lead: 600.0,
            spike_tolerance: 100.0,
            spotlight_min_y: 60.0,
            spotlight_max_y: 140.0,

            spike_rise_ms: 500,
            spike_active_ms: 5000,
            spike_retract_ms: 500,
            spike_idle_ms: 2000,

            spotlight_speed: 60.0,
            spotlight_lifetime_ms: 10_000,
            beam_length: 450.0,
            beam_left: 160.0,
            beam_right: 60.0,
            beam_apex_offset: 10.0,

            hide_probe_width: 5.0,

            cleanup_distance: 800.0,
            fall_buffer: 100.0,
            restart_delay_ms: 1000,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Check that every value is usable by the simulation
    pub fn validate(&self) -> Result<(), TuningError> {
        for (field, value) in [
            ("gap_chance", self.gap_chance),
            ("terrain_spike_chance", self.terrain_spike_chance),
            ("hazard_spawn_chance", self.hazard_spawn_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::Probability { field, value });
            }
        }

        for (field, positive) in [
            ("player_speed", self.player_speed > 0.0),
            ("gravity", self.gravity > 0.0),
            ("max_jumps", self.max_jumps > 0),
            ("lookahead", self.lookahead > 0.0),
            ("platform_batch", self.platform_batch > 0),
            ("spike_attempt_ms", self.spike_attempt_ms > 0),
            ("spotlight_attempt_ms", self.spotlight_attempt_ms > 0),
            ("spike_rise_ms", self.spike_rise_ms > 0),
            ("spike_active_ms", self.spike_active_ms > 0),
            ("spike_retract_ms", self.spike_retract_ms > 0),
            ("spike_idle_ms", self.spike_idle_ms > 0),
            ("spotlight_speed", self.spotlight_speed > 0.0),
            ("spotlight_lifetime_ms", self.spotlight_lifetime_ms > 0),
            ("beam_length", self.beam_length > 0.0),
            ("hide_probe_width", self.hide_probe_width > 0.0),
            ("cleanup_distance", self.cleanup_distance > 0.0),
        ] {
            if !positive {
                return Err(TuningError::NonPositive { field });
            }
        }

        if self.jump_velocity >= 0.0 {
            return Err(TuningError::JumpDirection(self.jump_velocity));
        }
        if self.spotlight_min_y > self.spotlight_max_y {
            return Err(TuningError::SpotlightBand {
                min: self.spotlight_min_y,
                max: self.spotlight_max_y,
            });
        }
        if self.beam_left <= self.beam_right {
            return Err(TuningError::BeamShape {
                left: self.beam_left,
                right: self.beam_right,
            });
        }
        Ok(())
    }

    /// Length of one full spike cycle (rise through idle)
    pub fn spike_cycle_ms(&self) -> u64 {
        self.spike_rise_ms + self.spike_active_ms + self.spike_retract_ms + self.spike_idle_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
        assert_eq!(Tuning::default().spike_cycle_ms(), 8000);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "player_speed": 320.0, "max_jumps": 3 }"#).unwrap();
        assert_eq!(tuning.player_speed, 320.0);
        assert_eq!(tuning.max_jumps, 3);
        assert_eq!(tuning.spike_active_ms, 5000);
    }

    #[test]
    fn test_rejects_bad_probability() {
        let err = Tuning::from_json(r#"{ "gap_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Probability { field: "gap_chance", .. }));
    }

    #[test]
    fn test_rejects_right_biased_beam() {
        let tuning = Tuning {
            beam_left: 50.0,
            beam_right: 80.0,
            ..Default::default()
        };
        assert!(matches!(tuning.validate(), Err(TuningError::BeamShape { .. })));
    }

    #[test]
    fn test_rejects_downward_jump() {
        let tuning = Tuning {
            jump_velocity: 100.0,
            ..Default::default()
        };
        assert!(matches!(tuning.validate(), Err(TuningError::JumpDirection(_))));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(Tuning::from_json("{ nope"), Err(TuningError::Json(_))));
    }
}
