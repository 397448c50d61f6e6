//! Procedural terrain generation
//!
//! Platforms are laid edge to edge from x = 0. Heights only step by one full
//! cube unit (or stay level) and never leave the band between
//! `MIN_PLATFORM_Y` and `BASE_PLATFORM_Y`. Past the safe zone a segment may be
//! skipped to open a gap, and a new platform may carry a spike.

use rand::Rng;

use super::hazards;
use super::state::{GameEvent, GameState, Platform, PlatformLedger};
use crate::consts::*;

/// Fill the ledger far enough to cover the first screen plus lookahead
pub fn generate_initial(state: &mut GameState) {
    let target = VIEWPORT_WIDTH + state.tuning.lookahead;
    let mut placed = 0;
    while state.ledger.next_x < target {
        if place_segment(state) {
            placed += 1;
        }
    }
    state.events.push(GameEvent::PlatformsGenerated {
        count: placed,
        rightmost_x: state.ledger.rightmost_x(),
    });
}

/// Append a batch when the player gets within lookahead of the terrain's end.
/// Returns how many platforms were placed.
pub fn extend_if_needed(state: &mut GameState, player_x: f32) -> usize {
    if player_x <= state.ledger.rightmost_x() - state.tuning.lookahead {
        return 0;
    }

    let mut placed = 0;
    for _ in 0..state.tuning.platform_batch {
        if place_segment(state) {
            placed += 1;
        }
    }

    log::debug!(
        "Terrain extended: {} platforms, rightmost_x={}",
        placed,
        state.ledger.rightmost_x()
    );
    state.events.push(GameEvent::PlatformsGenerated {
        count: placed,
        rightmost_x: state.ledger.rightmost_x(),
    });
    placed
}

/// Lay down the next segment. Returns false when the segment became a gap.
fn place_segment(state: &mut GameState) -> bool {
    let x = state.ledger.next_x;
    state.ledger.next_x += PLATFORM_WIDTH;

    let past_safe_zone = x > state.tuning.safe_zone_x;

    // Never two gaps in a row, so every gap stays jumpable
    if past_safe_zone
        && !state.ledger.last_was_gap
        && state.rng.random_bool(state.tuning.gap_chance as f64)
    {
        state.ledger.last_was_gap = true;
        return false;
    }
    state.ledger.last_was_gap = false;

    let y = if state.ledger.is_empty() {
        BASE_PLATFORM_Y
    } else {
        next_height(&mut state.rng, state.ledger.last_y)
    };
    state.ledger.last_y = y;

    let id = state.next_entity_id();
    let platform = Platform::new(id, x, y);
    let spike_x = platform.center_x();
    state.ledger.platforms.push_back(platform);

    if past_safe_zone && state.rng.random_bool(state.tuning.terrain_spike_chance as f64) {
        let now = state.time_ms;
        hazards::spawn_spike(state, spike_x, y, now);
    }
    true
}

/// Signed height step: zero, or exactly one cube unit up or down
pub fn height_delta<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    let unit = CUBE_SIZE as i32;
    let raw = rng.random_range(-unit..=unit);
    // Intermediate offsets collapse to a full step
    (raw.signum() as f32) * CUBE_SIZE
}

/// Height of the segment following one at `last_y`, clamped into the band
pub fn next_height<R: Rng + ?Sized>(rng: &mut R, last_y: f32) -> f32 {
    (last_y + height_delta(rng)).clamp(MIN_PLATFORM_Y, BASE_PLATFORM_Y)
}

/// Drop platforms whose right edge is left of `cutoff_x`
pub fn prune_behind(ledger: &mut PlatformLedger, cutoff_x: f32) -> usize {
    let before = ledger.platforms.len();
    while ledger.platforms.front().is_some_and(|p| p.right() < cutoff_x) {
        ledger.platforms.pop_front();
    }
    before - ledger.platforms.len()
}
