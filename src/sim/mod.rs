//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Timers only fire from the tick's scheduler drain
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; physics comes in through a trait

pub mod geom;
pub mod hazards;
pub mod physics;
pub mod player;
pub mod scheduler;
pub mod score;
pub mod state;
pub mod terrain;
pub mod tick;

pub use geom::{Aabb, Triangle};
pub use physics::{ArcadePhysics, Contact, Physics};
pub use scheduler::{Scheduler, Task, TaskId};
pub use score::ScoreTracker;
pub use state::{
    GameEvent, GameOverCause, GameState, Platform, PlatformExtension, PlatformLedger, Player,
    RunState, Spike, SpikeStage, Spotlight,
};
pub use tick::{TickInput, detect_terminal, game_over, tick};
