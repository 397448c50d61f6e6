//! Player motion, landing, roll and hiding

use super::geom::Aabb;
use super::physics::{Contact, Physics};
use super::state::{GameEvent, Player};
use super::tick::TickInput;
use crate::Tuning;
use crate::consts::CUBE_SIZE;

/// Turn input intent into velocity. Horizontal speed is immediate; a jump
/// fires only on the frame the jump input goes down.
pub fn apply_input(player: &mut Player, input: &TickInput, tuning: &Tuning) -> Option<GameEvent> {
    player.vel.x = match (input.left, input.right) {
        (true, false) => -tuning.player_speed,
        (false, true) => tuning.player_speed,
        _ => 0.0,
    };

    let pressed = input.jump && !player.jump_held;
    player.jump_held = input.jump;

    if pressed && player.jump_count < player.max_jumps {
        player.vel.y = tuning.jump_velocity;
        player.jump_count += 1;
        return Some(GameEvent::Jumped {
            jump_count: player.jump_count,
        });
    }
    None
}

/// Record the physics contact. Any downward contact refills jumps and
/// squares the cube up. Returns true on the frame the player lands.
pub fn apply_contact(player: &mut Player, contact: Contact) -> bool {
    let was_grounded = player.grounded;
    player.grounded = contact.down;
    if contact.down {
        player.jump_count = 0;
        player.angle = 0.0;
    }
    contact.down && !was_grounded
}

/// Spin the cube while airborne
pub fn apply_roll(player: &mut Player, delta_ms: f32, tuning: &Tuning) {
    if !player.grounded {
        player.angle += tuning.roll_deg_per_ms * delta_ms;
    }
}

/// Thin zones flush with the player's left and right edges
pub fn hide_probes(player: &Player, probe_width: f32) -> [Aabb; 2] {
    let body = player.bounds();
    [
        Aabb::new(body.left() - probe_width, body.top(), probe_width, CUBE_SIZE),
        Aabb::new(body.right(), body.top(), probe_width, CUBE_SIZE),
    ]
}

/// Hiding means standing on the ground pressed against a platform face
pub fn classify_hiding<P: Physics + ?Sized>(
    player: &mut Player,
    platforms: &[Aabb],
    physics: &P,
    probe_width: f32,
) -> bool {
    if !player.grounded {
        player.is_hiding = false;
        return false;
    }

    let probes = hide_probes(player, probe_width);
    player.is_hiding = probes
        .iter()
        .any(|probe| platforms.iter().any(|p| physics.overlaps(probe, p)));
    player.is_hiding
}
