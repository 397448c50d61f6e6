//! Cube Runner - An endless side-scrolling runner core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (terrain, hazards, hiding, scoring, lifecycle)
//! - `tuning`: Data-driven game balance
//!
//! Rendering, audio, input binding and UI text live outside this crate and
//! talk to the simulation through `sim::tick`, `sim::TickInput` and the
//! `sim::GameEvent` stream.

pub mod sim;
pub mod tuning;

pub use tuning::{Tuning, TuningError};

/// Fixed world geometry. Balance numbers live in [`Tuning`].
pub mod consts {
    /// Viewport dimensions (pixels)
    pub const VIEWPORT_WIDTH: f32 = 800.0;
    pub const VIEWPORT_HEIGHT: f32 = 600.0;

    /// Player side length; the quantum of platform height variation
    pub const CUBE_SIZE: f32 = 40.0;

    /// Platform segment dimensions
    pub const PLATFORM_WIDTH: f32 = 200.0;
    pub const PLATFORM_HEIGHT: f32 = 40.0;

    /// Top surface of the first platform; the lowest terrain allowed
    pub const BASE_PLATFORM_Y: f32 = 500.0;
    /// Highest terrain allowed (4 cube units above base)
    pub const MIN_PLATFORM_Y: f32 = BASE_PLATFORM_Y - 4.0 * CUBE_SIZE;

    /// World floor; platform extensions reach down to it and the kill-plane sits on it
    pub const WORLD_FLOOR_Y: f32 = VIEWPORT_HEIGHT;
    /// Thickness of the trailing kill-plane zone
    pub const KILL_PLANE_HEIGHT: f32 = 20.0;

    /// Player spawn x (center)
    pub const PLAYER_START_X: f32 = 100.0;

    /// Displacement conversion (pixels per meter)
    pub const PIXELS_PER_METER: f32 = 100.0;
    /// Score points per meter of best displacement
    pub const SCORE_PER_METER: f32 = 2.0;

    /// Spike footprint
    pub const SPIKE_WIDTH: f32 = 40.0;
    pub const SPIKE_HEIGHT: f32 = 20.0;

    /// Nominal frame length used by the headless runner (60 Hz)
    pub const FRAME_MS: f32 = 1000.0 / 60.0;
}

/// Convert a horizontal world position to meters of displacement
#[inline]
pub fn pixels_to_meters(x: f32) -> f32 {
    x / consts::PIXELS_PER_METER
}

/// Wall-clock time of a 60 Hz frame, in whole milliseconds
#[inline]
pub fn frame_time_ms(frame: u64) -> u64 {
    frame * 1000 / 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time_stays_even_on_long_runs() {
        assert_eq!(frame_time_ms(60), 1000);
        // Past 2^24 ms a float clock would start skipping
        let frame = 60 * 5 * 3600;
        let deltas: Vec<u64> = (frame..frame + 6)
            .map(|f| frame_time_ms(f + 1) - frame_time_ms(f))
            .collect();
        assert!(deltas.iter().all(|d| *d == 16 || *d == 17));
        assert_eq!(frame_time_ms(frame + 3) - frame_time_ms(frame), 50);
    }
}
