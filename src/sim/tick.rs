//! Per-frame simulation tick
//!
//! Order inside a running tick:
//! timers -> score -> input -> physics -> cleanup -> hiding -> roll ->
//! spotlights -> terrain -> terminal check

use glam::Vec2;

use super::geom::Aabb;
use super::hazards;
use super::physics::Physics;
use super::player;
use super::scheduler::Task;
use super::state::{GameEvent, GameOverCause, GameState, RunState};
use super::terrain;
use crate::consts::*;

/// Input state for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move left (held)
    pub left: bool,
    /// Move right (held)
    pub right: bool,
    /// Jump (held); jumps fire on the press edge
    pub jump: bool,
    /// Restart once the run is over and the affordance is shown
    pub restart: bool,
}

/// Advance the game by one frame.
///
/// `now_ms` is the frame timestamp, `delta_ms` the time since the last frame.
pub fn tick<P: Physics + ?Sized>(
    state: &mut GameState,
    physics: &mut P,
    input: &TickInput,
    now_ms: u64,
    delta_ms: f32,
) {
    if state.is_over() && state.restart_ready && input.restart {
        *state = state.restart(now_ms);
        return;
    }

    state.time_ms = now_ms;
    run_due_tasks(state, now_ms);

    // Frozen: only the restart timer runs
    if state.is_over() {
        return;
    }

    let dt = delta_ms / 1000.0;

    state.score.update(state.player.pos.x);

    if let Some(event) = player::apply_input(&mut state.player, input, &state.tuning) {
        state.events.push(event);
    }

    let solids = state.ledger.solids();
    let contact = physics.step(&mut state.player, &solids, dt);
    if player::apply_contact(&mut state.player, contact) {
        state.events.push(GameEvent::Landed);
    }
    state.camera_x = (state.player.pos.x - VIEWPORT_WIDTH / 2.0).max(0.0);

    let cutoff = state.player.pos.x - state.tuning.cleanup_distance;
    terrain::prune_behind(&mut state.ledger, cutoff);
    hazards::cleanup_behind(state, cutoff);

    let solids = state.ledger.solids();
    player::classify_hiding(
        &mut state.player,
        &solids,
        physics,
        state.tuning.hide_probe_width,
    );

    player::apply_roll(&mut state.player, delta_ms, &state.tuning);

    hazards::update_spotlights(state, dt);

    let player_x = state.player.pos.x;
    terrain::extend_if_needed(state, player_x);

    if let Some(cause) = detect_terminal(state, physics) {
        game_over(state, cause, now_ms);
    }
}

/// Fire every task that came due
fn run_due_tasks(state: &mut GameState, now_ms: u64) {
    for fired in state.scheduler.drain_due(now_ms) {
        match fired.task {
            Task::SpikeAttempt => {
                hazards::on_spike_attempt(state, fired.due_ms);
            }
            Task::SpotlightAttempt => {
                hazards::on_spotlight_attempt(state, fired.due_ms);
            }
            Task::SpikeStage { spike } => hazards::advance_spike(state, spike, fired.due_ms),
            Task::SpotlightExpire { spotlight } => hazards::expire_spotlight(state, spotlight),
            Task::RestartReady => {
                state.restart_ready = true;
                state.events.push(GameEvent::RestartReady);
            }
        }
    }
}

/// The trailing kill-plane under the camera view
pub fn kill_plane(camera_x: f32) -> Aabb {
    Aabb::new(camera_x, WORLD_FLOOR_Y, VIEWPORT_WIDTH, KILL_PLANE_HEIGHT)
}

/// First terminal condition this frame, checked in a fixed order
pub fn detect_terminal<P: Physics + ?Sized>(state: &GameState, physics: &P) -> Option<GameOverCause> {
    let body = state.player.bounds();

    if state
        .spikes
        .iter()
        .filter(|s| s.collidable)
        .any(|s| physics.overlaps(&body, &s.bounds()))
    {
        return Some(GameOverCause::Spike);
    }

    if !state.player.is_hiding
        && state
            .spotlights
            .iter()
            .any(|s| s.beam.contains(state.player.pos))
    {
        return Some(GameOverCause::Spotlight);
    }

    if physics.overlaps(&body, &kill_plane(state.camera_x)) {
        return Some(GameOverCause::KillPlane);
    }

    if state.player.pos.y > VIEWPORT_HEIGHT + state.tuning.fall_buffer {
        return Some(GameOverCause::Fell);
    }

    None
}

/// Freeze the run: cancel every timer, stop the player, fire the blast hook
/// and arm the restart affordance.
pub fn game_over(state: &mut GameState, cause: GameOverCause, now_ms: u64) {
    if state.run_state == RunState::Over {
        return;
    }

    state.run_state = RunState::Over;
    state.scheduler.cancel_all();
    state.player.vel = Vec2::ZERO;
    state.player.is_hiding = false;
    state.events.push(GameEvent::PlayerDestroyed {
        pos: state.player.pos,
        cause,
    });
    state.scheduler.schedule_at(
        now_ms + state.tuning.restart_delay_ms,
        Task::RestartReady,
        None,
    );

    log::info!(
        "Game over ({:?}) at x={:.0}: score {}",
        cause,
        state.player.pos.x,
        state.score.score
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Tuning;
    use crate::sim::hazards::{advance_spike, spawn_spike, spawn_spotlight};
    use crate::sim::physics::{ArcadePhysics, Contact};
    use crate::sim::state::{Platform, Player, SpikeStage};

    /// Physics stand-in: moves nothing, reports a fixed contact
    struct FakePhysics {
        contact: Contact,
    }

    impl FakePhysics {
        fn airborne() -> Self {
            Self {
                contact: Contact::default(),
            }
        }

        fn grounded() -> Self {
            Self {
                contact: Contact {
                    down: true,
                    ..Default::default()
                },
            }
        }
    }

    impl Physics for FakePhysics {
        fn step(&mut self, _player: &mut Player, _solids: &[Aabb], _dt: f32) -> Contact {
            self.contact
        }
    }

    fn quiet_tuning() -> Tuning {
        Tuning {
            terrain_spike_chance: 0.0,
            gap_chance: 0.0,
            hazard_spawn_chance: 0.0,
            ..Default::default()
        }
    }

    fn destroyed_count(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerDestroyed { .. }))
            .count()
    }

    #[test]
    fn test_score_scenario() {
        let mut state = GameState::new(1, quiet_tuning());
        state.player.pos.x = 250.0;
        tick(&mut state, &mut FakePhysics::grounded(), &TickInput::default(), 16, 16.0);
        assert_eq!(state.score.score, 5);
    }

    #[test]
    fn test_beam_triggers_single_game_over() {
        let mut state = GameState::new(1, quiet_tuning());
        let mut physics = FakePhysics::airborne();
        spawn_spotlight(&mut state, 100.0, 100.0, 0);

        tick(&mut state, &mut physics, &TickInput::default(), 16, 16.0);
        assert!(state.is_over());

        let mut events = state.drain_events();
        for frame in 2..30 {
            tick(&mut state, &mut physics, &TickInput::default(), frame * 16, 16.0);
            events.extend(state.drain_events());
        }
        assert_eq!(destroyed_count(&events), 1);
        assert!(events.contains(&GameEvent::PlayerDestroyed {
            pos: Vec2::new(100.0, 480.0),
            cause: GameOverCause::Spotlight,
        }));
    }

    #[test]
    fn test_hiding_shields_from_beam() {
        let mut state = GameState::new(1, quiet_tuning());
        state.ledger.platforms.clear();
        state.ledger.platforms.push_back(Platform::new(900, 0.0, 500.0));
        state.ledger.platforms.push_back(Platform::new(901, 200.0, 460.0));
        state.player.pos = Vec2::new(180.0, 480.0);
        spawn_spotlight(&mut state, 180.0, 100.0, 0);

        tick(&mut state, &mut FakePhysics::grounded(), &TickInput::default(), 16, 16.0);
        assert!(state.player.is_hiding);
        assert!(!state.is_over());

        // Leave the ground: exposed
        tick(&mut state, &mut FakePhysics::airborne(), &TickInput::default(), 32, 16.0);
        assert!(!state.player.is_hiding);
        assert!(state.is_over());
    }

    #[test]
    fn test_active_spike_kills_hidden_spike_does_not() {
        let mut state = GameState::new(1, quiet_tuning());
        let id = spawn_spike(&mut state, 100.0, 500.0, 0);
        let mut physics = FakePhysics::grounded();

        tick(&mut state, &mut physics, &TickInput::default(), 0, 16.0);
        assert_eq!(state.spike(id).unwrap().stage, SpikeStage::Rising);
        assert!(!state.is_over());

        tick(&mut state, &mut physics, &TickInput::default(), 500, 16.0);
        assert_eq!(state.spike(id).unwrap().stage, SpikeStage::Active);
        assert!(state.is_over());
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PlayerDestroyed {
                cause: GameOverCause::Spike,
                ..
            }
        )));
    }

    #[test]
    fn test_first_terminal_condition_wins() {
        let mut state = GameState::new(1, quiet_tuning());
        let id = spawn_spike(&mut state, 100.0, 500.0, 0);
        advance_spike(&mut state, id, 0);
        advance_spike(&mut state, id, 500);
        spawn_spotlight(&mut state, 100.0, 100.0, 0);

        assert_eq!(
            detect_terminal(&state, &FakePhysics::airborne()),
            Some(GameOverCause::Spike)
        );
    }

    #[test]
    fn test_fall_below_viewport() {
        let mut state = GameState::new(1, quiet_tuning());
        state.player.pos.y = VIEWPORT_HEIGHT + 101.0;
        tick(&mut state, &mut FakePhysics::airborne(), &TickInput::default(), 16, 16.0);
        assert!(state.is_over());
        assert!(state.drain_events().contains(&GameEvent::PlayerDestroyed {
            pos: Vec2::new(100.0, VIEWPORT_HEIGHT + 101.0),
            cause: GameOverCause::Fell,
        }));
    }

    #[test]
    fn test_kill_plane_follows_camera() {
        let mut state = GameState::new(1, quiet_tuning());
        state.player.pos = Vec2::new(2000.0, WORLD_FLOOR_Y + 5.0);
        tick(&mut state, &mut FakePhysics::airborne(), &TickInput::default(), 16, 16.0);
        assert_eq!(state.camera_x, 1600.0);
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::PlayerDestroyed {
                cause: GameOverCause::KillPlane,
                ..
            }
        )));
    }

    #[test]
    fn test_over_freezes_everything() {
        let mut state = GameState::new(1, quiet_tuning());
        let mut physics = FakePhysics::airborne();
        spawn_spike(&mut state, 700.0, 500.0, 0);
        state.player.pos.y = VIEWPORT_HEIGHT + 200.0;
        tick(&mut state, &mut physics, &TickInput::default(), 16, 16.0);
        assert!(state.is_over());

        // Only the restart timer survives
        assert_eq!(state.scheduler.len(), 1);
        assert!(state.scheduler.pending().all(|t| t.task == Task::RestartReady));

        let player = state.player.clone();
        let score = state.score.clone();
        let platforms = state.ledger.platforms.clone();
        let spikes = state.spikes.clone();

        let run_right = TickInput {
            right: true,
            jump: true,
            ..Default::default()
        };
        for frame in 2..50 {
            tick(&mut state, &mut physics, &run_right, frame * 16, 16.0);
        }
        assert_eq!(state.player, player);
        assert_eq!(state.score, score);
        assert_eq!(state.ledger.platforms, platforms);
        assert_eq!(state.spikes, spikes);
    }

    #[test]
    fn test_restart_after_delay() {
        let tuning = Tuning {
            hazard_spawn_chance: 1.0,
            ..Default::default()
        };
        let fresh = GameState::new(77, tuning.clone());
        let mut state = GameState::new(77, tuning);
        let mut physics = ArcadePhysics::from_tuning(&state.tuning);
        let right = TickInput {
            right: true,
            ..Default::default()
        };
        for frame in 1..120 {
            tick(&mut state, &mut physics, &right, frame * 16, 16.0);
        }
        state.player.jump_count = 1;
        state.player.pos.y = VIEWPORT_HEIGHT + 500.0;
        tick(&mut state, &mut physics, &right, 2000, 16.0);
        assert!(state.is_over());

        let restart = TickInput {
            restart: true,
            ..Default::default()
        };
        // Not ready yet
        tick(&mut state, &mut physics, &restart, 2500, 16.0);
        assert!(state.is_over());
        assert!(!state.restart_ready);

        tick(&mut state, &mut physics, &TickInput::default(), 3000, 16.0);
        assert!(state.restart_ready);
        assert!(state.drain_events().contains(&GameEvent::RestartReady));

        tick(&mut state, &mut physics, &restart, 3016, 16.0);
        assert_eq!(state.run_state, RunState::Running);
        assert_eq!(state.player.jump_count, 0);
        assert!(!state.player.is_hiding);
        assert_eq!(state.score.score, 0);
        assert_eq!(state.ledger.platforms, fresh.ledger.platforms);
        assert_eq!(state.spikes.len(), fresh.spikes.len());

        // Hazard timers re-armed relative to the restart
        let spike_attempt = state
            .scheduler
            .pending()
            .find(|t| t.task == Task::SpikeAttempt)
            .map(|t| t.due_ms);
        assert_eq!(spike_attempt, Some(3016 + 5000));
    }

    #[test]
    fn test_hazard_scheduler_spawns_on_interval() {
        let tuning = Tuning {
            hazard_spawn_chance: 1.0,
            terrain_spike_chance: 0.0,
            gap_chance: 0.0,
            ..Default::default()
        };
        let mut state = GameState::new(5, tuning);
        let mut physics = FakePhysics::grounded();

        tick(&mut state, &mut physics, &TickInput::default(), 4999, 16.0);
        assert!(state.spikes.is_empty());
        tick(&mut state, &mut physics, &TickInput::default(), 5000, 16.0);
        assert_eq!(state.spikes.len(), 1);
        assert_eq!(state.spikes[0].stage_started_ms, 5000);

        tick(&mut state, &mut physics, &TickInput::default(), 7500, 16.0);
        assert_eq!(state.spotlights.len(), 1);
        assert_eq!(state.spotlights[0].spawned_ms, 7500);
    }

    #[test]
    fn test_game_over_is_idempotent() {
        let mut state = GameState::new(1, quiet_tuning());
        game_over(&mut state, GameOverCause::Fell, 10);
        game_over(&mut state, GameOverCause::Spike, 20);
        assert_eq!(destroyed_count(&state.drain_events()), 1);
        assert_eq!(state.scheduler.len(), 1);
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(99999, Tuning::default());
        let mut b = GameState::new(99999, Tuning::default());
        let mut pa = ArcadePhysics::from_tuning(&a.tuning);
        let mut pb = ArcadePhysics::from_tuning(&b.tuning);

        for frame in 1..600u64 {
            let input = TickInput {
                right: true,
                jump: frame % 40 < 3,
                ..Default::default()
            };
            tick(&mut a, &mut pa, &input, frame * 16, 16.0);
            tick(&mut b, &mut pb, &input, frame * 16, 16.0);
        }

        assert_eq!(a.player, b.player);
        assert_eq!(a.score, b.score);
        assert_eq!(a.ledger.platforms, b.ledger.platforms);
        assert_eq!(a.spikes, b.spikes);
        assert_eq!(a.spotlights, b.spotlights);
        assert_eq!(a.run_state, b.run_state);
    }

    #[test]
    fn test_runs_right_and_extends_terrain() {
        let mut state = GameState::new(3, quiet_tuning());
        let mut physics = ArcadePhysics::from_tuning(&state.tuning);
        let start_rightmost = state.ledger.rightmost_x();
        let right = TickInput {
            right: true,
            ..Default::default()
        };
        for frame in 1..500u64 {
            // Hop every so often to clear steps
            let input = TickInput {
                jump: frame % 20 == 0,
                ..right.clone()
            };
            tick(&mut state, &mut physics, &input, frame * 16, 16.0);
        }
        assert!(!state.is_over());
        assert!(state.player.pos.x > 800.0);
        assert!(state.score.score > 0);
        assert!(state.ledger.rightmost_x() > start_rightmost);
    }
}
