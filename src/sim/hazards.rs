//! Spikes, spotlights and the hazard scheduler callbacks
//!
//! Spike cycle, each stage a scheduled task owned by the spike:
//! Hidden -> Rising (500ms) -> Active (5000ms) -> Retracting (500ms) -> Hidden (2000ms) -> ...
//!
//! Stage tasks are chained from the previous task's due time, not from the
//! frame that observed it, so the timeline stays exact under frame jitter.

use rand::Rng;

use super::scheduler::Task;
use super::state::{GameEvent, GameState, Spike, Spotlight};

/// Place a spike on a platform surface. It starts Hidden and begins rising on
/// the next drain.
pub fn spawn_spike(state: &mut GameState, x: f32, platform_y: f32, now_ms: u64) -> u32 {
    let id = state.next_entity_id();
    state.spikes.push(Spike::new(id, x, platform_y, now_ms));
    state
        .scheduler
        .schedule_at(now_ms, Task::SpikeStage { spike: id }, Some(id));

    log::debug!("Spike {} spawned at ({}, {})", id, x, platform_y);
    state.events.push(GameEvent::SpikeSpawned {
        id,
        x,
        y: platform_y,
    });
    id
}

/// Place a spotlight; it expires after the configured lifetime
pub fn spawn_spotlight(state: &mut GameState, x: f32, y: f32, now_ms: u64) -> u32 {
    let id = state.next_entity_id();
    state
        .spotlights
        .push(Spotlight::new(id, x, y, now_ms, &state.tuning));
    state.scheduler.schedule_at(
        now_ms + state.tuning.spotlight_lifetime_ms,
        Task::SpotlightExpire { spotlight: id },
        Some(id),
    );

    log::debug!("Spotlight {} spawned at ({}, {})", id, x, y);
    state.events.push(GameEvent::SpotlightSpawned { id, x, y });
    id
}

/// Spike timer: coin flip, then look for a platform ahead of the player
pub fn on_spike_attempt(state: &mut GameState, now_ms: u64) -> Option<u32> {
    if !state
        .rng
        .random_bool(state.tuning.hazard_spawn_chance as f64)
    {
        return None;
    }

    let target_x = state.player.pos.x + state.tuning.hazard_lead;
    let (x, y) = state
        .ledger
        .find_near(target_x, state.tuning.spike_tolerance)
        .map(|p| (p.center_x(), p.y))?;

    if state.spikes.iter().any(|s| s.anchor_x == x) {
        return None;
    }
    Some(spawn_spike(state, x, y, now_ms))
}

/// Spotlight timer: coin flip, then spawn in the spotlight band ahead of the player
pub fn on_spotlight_attempt(state: &mut GameState, now_ms: u64) -> Option<u32> {
    if !state
        .rng
        .random_bool(state.tuning.hazard_spawn_chance as f64)
    {
        return None;
    }

    let y = state
        .rng
        .random_range(state.tuning.spotlight_min_y..=state.tuning.spotlight_max_y);
    let x = state.player.pos.x + state.tuning.hazard_lead;
    Some(spawn_spotlight(state, x, y, now_ms))
}

/// Move a spike into its next stage and chain the following one
pub fn advance_spike(state: &mut GameState, id: u32, due_ms: u64) {
    let Some(spike) = state.spikes.iter_mut().find(|s| s.id == id) else {
        log::warn!("Stage task for missing spike {}", id);
        return;
    };

    let stage = spike.stage.next();
    spike.enter(stage, due_ms);
    state.scheduler.schedule_at(
        due_ms + stage.duration_ms(&state.tuning),
        Task::SpikeStage { spike: id },
        Some(id),
    );
    state.events.push(GameEvent::SpikeStageChanged { id, stage });
}

/// Remove a spotlight whose lifetime ran out
pub fn expire_spotlight(state: &mut GameState, id: u32) {
    let before = state.spotlights.len();
    state.spotlights.retain(|s| s.id != id);
    if state.spotlights.len() == before {
        log::warn!("Expiry task for missing spotlight {}", id);
        return;
    }
    state.scheduler.cancel_owner(id);
    state.events.push(GameEvent::SpotlightExpired { id });
}

/// Drift every spotlight and refresh its beam
pub fn update_spotlights(state: &mut GameState, dt: f32) {
    for spotlight in &mut state.spotlights {
        spotlight.advance(dt, &state.tuning);
    }
}

/// Destroy hazards entirely left of `cutoff_x`, cancelling their timers first
pub fn cleanup_behind(state: &mut GameState, cutoff_x: f32) {
    let scheduler = &mut state.scheduler;

    state.spikes.retain(|spike| {
        let keep = spike.bounds().right() >= cutoff_x;
        if !keep {
            scheduler.cancel_owner(spike.id);
        }
        keep
    });

    state.spotlights.retain(|spotlight| {
        let keep = spotlight.right() >= cutoff_x;
        if !keep {
            scheduler.cancel_owner(spotlight.id);
        }
        keep
    });
}
