//! Cube Runner headless runner
//!
//! Drives the simulation with a simple autopilot so runs can be tuned and
//! replayed without a renderer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use cube_runner::Tuning;
use cube_runner::frame_time_ms;
use cube_runner::sim::{
    ArcadePhysics, GameEvent, GameOverCause, GameState, SpikeStage, TickInput, tick,
};

#[derive(Parser)]
#[command(name = "cube-runner")]
#[command(about = "Run Cube Runner headless with an autopilot", long_about = None)]
#[command(version)]
struct Cli {
    /// Run seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Frames to simulate (60 per second)
    #[arg(long, default_value_t = 3600)]
    frames: u64,

    /// Tuning JSON file (missing keys use defaults)
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// How many times to restart after game over
    #[arg(long, default_value_t = 0)]
    restarts: u32,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Print the final game state as JSON
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Serialize)]
struct RunSummary {
    score: u32,
    best_displacement_m: f32,
    cause: Option<GameOverCause>,
    ended_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Summary {
    seed: u64,
    frames: u64,
    runs: Vec<RunSummary>,
}

/// Keep running right; hop onto steps, over gaps and over live spikes
fn autopilot(state: &GameState) -> TickInput {
    let player = &state.player;
    let body = player.bounds();
    let probe_x = body.right() + 30.0;

    let platform_at = |x: f32| {
        state
            .ledger
            .platforms
            .iter()
            .find(|p| p.x <= x && x < p.right())
    };

    let step_ahead = platform_at(probe_x).is_some_and(|p| p.y < body.bottom() - 1.0);
    let gap_ahead = platform_at(probe_x).is_none();
    let spike_ahead = state.spikes.iter().any(|s| {
        s.stage != SpikeStage::Hidden
            && s.anchor_x > body.left()
            && s.anchor_x - body.right() < 80.0
    });
    let falling_into_gap = !player.grounded && player.vel.y > 0.0 && platform_at(player.pos.x).is_none();

    let want_jump = (player.grounded && (step_ahead || gap_ahead || spike_ahead)) || falling_into_gap;

    TickInput {
        right: true,
        // Release every other frame so each jump is a fresh press
        jump: want_jump && !player.jump_held,
        ..Default::default()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let tuning = match &cli.tuning {
        Some(path) => Tuning::load(path)
            .with_context(|| format!("loading tuning from {}", path.display()))?,
        None => Tuning::default(),
    };

    log::info!("Cube Runner (headless) starting: seed={} frames={}", cli.seed, cli.frames);

    let mut physics = ArcadePhysics::from_tuning(&tuning);
    let mut state = GameState::new(cli.seed, tuning);
    let mut runs = Vec::new();
    let mut restarts_left = cli.restarts;
    let mut restart_pending = false;
    let mut last_ms = 0u64;

    for frame in 1..=cli.frames {
        let now_ms = frame_time_ms(frame);
        let delta_ms = (now_ms - last_ms) as f32;
        last_ms = now_ms;

        let mut input = if state.is_over() {
            TickInput::default()
        } else {
            autopilot(&state)
        };
        input.restart = restart_pending;
        restart_pending = false;

        tick(&mut state, &mut physics, &input, now_ms, delta_ms);

        for event in state.drain_events() {
            match event {
                GameEvent::PlayerDestroyed { cause, pos } => {
                    log::info!("Player destroyed by {:?} at ({:.0}, {:.0})", cause, pos.x, pos.y);
                    runs.push(RunSummary {
                        score: state.score.score,
                        best_displacement_m: state.score.max_displacement_m,
                        cause: Some(cause),
                        ended_ms: Some(now_ms),
                    });
                }
                GameEvent::RestartReady if restarts_left > 0 => {
                    restarts_left -= 1;
                    restart_pending = true;
                }
                other => log::debug!("{:?}", other),
            }
        }
    }

    if !state.is_over() {
        runs.push(RunSummary {
            score: state.score.score,
            best_displacement_m: state.score.max_displacement_m,
            cause: None,
            ended_ms: None,
        });
    }

    let summary = Summary {
        seed: cli.seed,
        frames: cli.frames,
        runs,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for (i, run) in summary.runs.iter().enumerate() {
            match run.cause {
                Some(cause) => println!(
                    "run {}: score {} ({:.1}m), ended by {:?} at {}ms",
                    i + 1,
                    run.score,
                    run.best_displacement_m,
                    cause,
                    run.ended_ms.unwrap_or_default()
                ),
                None => println!(
                    "run {}: score {} ({:.1}m), still running",
                    i + 1,
                    run.score,
                    run.best_displacement_m
                ),
            }
        }
    }

    if cli.dump {
        println!("{}", state.snapshot_json()?);
    }

    Ok(())
}
