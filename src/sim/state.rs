//! Game state and core simulation types
//!
//! Everything one run owns lives in [`GameState`]. Restart throws the whole
//! value away and builds a new one.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geom::{Aabb, Triangle};
use super::scheduler::{Scheduler, Task};
use super::score::ScoreTracker;
use super::terrain;
use crate::Tuning;
use crate::consts::*;

/// Whether the run is still live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Running,
    /// Frozen until restart
    Over,
}

/// Decorative filler from a platform's underside to the world floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformExtension {
    pub x: f32,
    pub top: f32,
    pub width: f32,
    pub bottom: f32,
}

/// A static terrain segment. `y` is the walkable top surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub extension: PlatformExtension,
}

impl Platform {
    pub fn new(id: u32, x: f32, y: f32) -> Self {
        Self {
            id,
            x,
            y,
            width: PLATFORM_WIDTH,
            height: PLATFORM_HEIGHT,
            extension: PlatformExtension {
                x,
                top: y + PLATFORM_HEIGHT,
                width: PLATFORM_WIDTH,
                bottom: WORLD_FLOOR_Y,
            },
        }
    }

    /// Solid body used for collision
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Ordered platform strip plus the generator cursor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformLedger {
    /// Platforms sorted by x
    pub platforms: VecDeque<Platform>,
    /// Left edge of the next segment (gaps included)
    pub next_x: f32,
    /// Height of the last placed platform
    pub last_y: f32,
    /// Whether the last segment was skipped
    pub last_was_gap: bool,
}

impl Default for PlatformLedger {
    fn default() -> Self {
        Self {
            platforms: VecDeque::new(),
            next_x: 0.0,
            last_y: BASE_PLATFORM_Y,
            last_was_gap: false,
        }
    }
}

impl PlatformLedger {
    /// Right edge of generated terrain
    pub fn rightmost_x(&self) -> f32 {
        self.next_x
    }

    /// Collision bodies of every platform
    pub fn solids(&self) -> Vec<Aabb> {
        self.platforms.iter().map(Platform::bounds).collect()
    }

    /// First platform whose center lies within `x ± tolerance`
    pub fn find_near(&self, x: f32, tolerance: f32) -> Option<&Platform> {
        self.platforms
            .iter()
            .find(|p| (p.center_x() - x).abs() <= tolerance)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// Spike animation stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpikeStage {
    Hidden,
    Rising,
    Active,
    Retracting,
}

impl SpikeStage {
    /// The stage that follows this one; the cycle has no terminal stage
    pub fn next(self) -> Self {
        match self {
            SpikeStage::Hidden => SpikeStage::Rising,
            SpikeStage::Rising => SpikeStage::Active,
            SpikeStage::Active => SpikeStage::Retracting,
            SpikeStage::Retracting => SpikeStage::Hidden,
        }
    }

    /// How long this stage lasts before `next()` is entered
    pub fn duration_ms(self, tuning: &Tuning) -> u64 {
        match self {
            SpikeStage::Hidden => tuning.spike_idle_ms,
            SpikeStage::Rising => tuning.spike_rise_ms,
            SpikeStage::Active => tuning.spike_active_ms,
            SpikeStage::Retracting => tuning.spike_retract_ms,
        }
    }
}

/// A retractable spike sitting on a platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub id: u32,
    /// Horizontal center
    pub anchor_x: f32,
    /// Platform surface the spike rises from
    pub rest_y: f32,
    pub stage: SpikeStage,
    /// True only while Active
    pub collidable: bool,
    /// When the current stage began (ms)
    pub stage_started_ms: u64,
}

impl Spike {
    pub fn new(id: u32, anchor_x: f32, rest_y: f32, now_ms: u64) -> Self {
        Self {
            id,
            anchor_x,
            rest_y,
            stage: SpikeStage::Hidden,
            collidable: false,
            stage_started_ms: now_ms,
        }
    }

    /// Switch stage, keeping `collidable` tied to Active
    pub fn enter(&mut self, stage: SpikeStage, at_ms: u64) {
        self.stage = stage;
        self.collidable = stage == SpikeStage::Active;
        self.stage_started_ms = at_ms;
    }

    /// Footprint when fully risen
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.anchor_x - SPIKE_WIDTH / 2.0,
            self.rest_y - SPIKE_HEIGHT,
            SPIKE_WIDTH,
            SPIKE_HEIGHT,
        )
    }

    /// How far out of the platform the spike is (0 hidden, 1 fully risen)
    pub fn exposure(&self, now_ms: u64, tuning: &Tuning) -> f32 {
        let elapsed = now_ms.saturating_sub(self.stage_started_ms) as f32;
        match self.stage {
            SpikeStage::Hidden => 0.0,
            SpikeStage::Active => 1.0,
            SpikeStage::Rising => (elapsed / tuning.spike_rise_ms as f32).min(1.0),
            SpikeStage::Retracting => 1.0 - (elapsed / tuning.spike_retract_ms as f32).min(1.0),
        }
    }
}

/// A drifting spotlight and its beam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spotlight {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    /// Pixels/s, negative (leftward)
    pub velocity_x: f32,
    /// Hit region derived from the current position
    pub beam: Triangle,
    pub spawned_ms: u64,
}

impl Spotlight {
    pub fn new(id: u32, x: f32, y: f32, now_ms: u64, tuning: &Tuning) -> Self {
        Self {
            id,
            x,
            y,
            velocity_x: -tuning.spotlight_speed,
            beam: Self::beam_at(x, y, tuning),
            spawned_ms: now_ms,
        }
    }

    /// Downward beam: apex under the lamp, base spread wider to the left
    pub fn beam_at(x: f32, y: f32, tuning: &Tuning) -> Triangle {
        let base_y = y + tuning.beam_length;
        Triangle::new(
            Vec2::new(x, y + tuning.beam_apex_offset),
            Vec2::new(x - tuning.beam_left, base_y),
            Vec2::new(x + tuning.beam_right, base_y),
        )
    }

    /// Move and re-derive the beam
    pub fn advance(&mut self, dt: f32, tuning: &Tuning) {
        self.x += self.velocity_x * dt;
        self.beam = Self::beam_at(self.x, self.y, tuning);
    }

    /// Rightmost point of lamp or beam
    pub fn right(&self) -> f32 {
        self.beam.bounds().right().max(self.x)
    }
}

/// The player's cube
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    pub jump_count: u8,
    pub max_jumps: u8,
    /// Visual roll (degrees)
    pub angle: f32,
    pub is_hiding: bool,
    /// Touching a platform from above after the last physics step
    pub grounded: bool,
    /// Jump input level last frame (for edge detection)
    pub jump_held: bool,
}

impl Player {
    pub fn new(pos: Vec2, max_jumps: u8) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            jump_count: 0,
            max_jumps,
            angle: 0.0,
            is_hiding: false,
            grounded: false,
            jump_held: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center(self.pos, Vec2::splat(CUBE_SIZE))
    }
}

/// Which terminal condition ended the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    Spike,
    Spotlight,
    KillPlane,
    Fell,
}

/// Notifications for the presentation layer, drained each frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PlatformsGenerated { count: usize, rightmost_x: f32 },
    SpikeSpawned { id: u32, x: f32, y: f32 },
    SpikeStageChanged { id: u32, stage: SpikeStage },
    SpotlightSpawned { id: u32, x: f32, y: f32 },
    SpotlightExpired { id: u32 },
    Jumped { jump_count: u8 },
    Landed,
    /// One-shot destruction effect at the player's last position
    PlayerDestroyed { pos: Vec2, cause: GameOverCause },
    RestartReady,
}

/// Complete state of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: Tuning,
    pub rng: Pcg32,
    pub run_state: RunState,
    pub player: Player,
    pub ledger: PlatformLedger,
    /// Sorted by id
    pub spikes: Vec<Spike>,
    /// Sorted by id
    pub spotlights: Vec<Spotlight>,
    pub score: ScoreTracker,
    /// Left edge of the camera view
    pub camera_x: f32,
    pub scheduler: Scheduler,
    /// Restart is accepted once this is set
    pub restart_ready: bool,
    /// Time of the last tick (ms)
    pub time_ms: u64,
    /// Pending notifications
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Build the initial world with the clock at zero
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        Self::started_at(seed, tuning, 0)
    }

    /// Build the initial world, with run timers anchored at `now_ms`
    ///
    /// `tuning` must already be valid; probabilities outside `0..=1` panic in
    /// the RNG.
    pub fn started_at(seed: u64, tuning: Tuning, now_ms: u64) -> Self {
        debug_assert!(tuning.validate().is_ok(), "invalid tuning: {:?}", tuning.validate());
        let player = Player::new(
            Vec2::new(PLAYER_START_X, BASE_PLATFORM_Y - CUBE_SIZE / 2.0),
            tuning.max_jumps,
        );

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            run_state: RunState::Running,
            player,
            ledger: PlatformLedger::default(),
            spikes: Vec::new(),
            spotlights: Vec::new(),
            score: ScoreTracker::default(),
            camera_x: 0.0,
            scheduler: Scheduler::new(),
            restart_ready: false,
            time_ms: now_ms,
            events: Vec::new(),
            next_id: 1,
            tuning,
        };

        terrain::generate_initial(&mut state);

        state.scheduler.schedule_repeating(
            now_ms + state.tuning.spike_attempt_ms,
            state.tuning.spike_attempt_ms,
            Task::SpikeAttempt,
        );
        state.scheduler.schedule_repeating(
            now_ms + state.tuning.spotlight_attempt_ms,
            state.tuning.spotlight_attempt_ms,
            Task::SpotlightAttempt,
        );

        log::info!(
            "Run started: seed={} platforms={} rightmost_x={}",
            seed,
            state.ledger.len(),
            state.ledger.rightmost_x()
        );
        state
    }

    /// Discard this run and build a fresh one with the same seed and tuning
    pub fn restart(&self, now_ms: u64) -> Self {
        log::info!("Restarting run (seed {})", self.seed);
        Self::started_at(self.seed, self.tuning.clone(), now_ms)
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_over(&self) -> bool {
        self.run_state == RunState::Over
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn spike(&self, id: u32) -> Option<&Spike> {
        self.spikes.iter().find(|s| s.id == id)
    }

    pub fn spotlight(&self, id: u32) -> Option<&Spotlight> {
        self.spotlights.iter().find(|s| s.id == id)
    }

    /// Pretty JSON dump of the run, for debugging
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
