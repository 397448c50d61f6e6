//! Physics capability
//!
//! The simulation never integrates bodies itself; it calls into a [`Physics`]
//! implementation once per tick and polls it for overlaps in a fixed order.
//! [`ArcadePhysics`] is the bundled implementation (gravity plus axis-separated
//! AABB resolution against static platforms). Tests inject their own.

use super::geom::Aabb;
use super::state::Player;
use crate::Tuning;

/// Which sides of the player touched a solid during a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Contact {
    /// Standing on something (touching from above)
    pub down: bool,
    pub up: bool,
    pub left: bool,
    pub right: bool,
}

/// Body integration and overlap queries
pub trait Physics {
    /// Integrate the player's velocity against static solids
    fn step(&mut self, player: &mut Player, solids: &[Aabb], dt: f32) -> Contact;

    /// Polled overlap query
    fn overlaps(&self, a: &Aabb, b: &Aabb) -> bool {
        a.intersects(b)
    }
}

/// Simple platformer physics: gravity, terminal velocity, and
/// move-then-resolve on each axis
#[derive(Debug, Clone)]
pub struct ArcadePhysics {
    pub gravity: f32,
    pub max_fall_speed: f32,
    /// Left world bound for the player's edge
    pub min_x: f32,
}

impl ArcadePhysics {
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            max_fall_speed: 800.0,
            min_x: 0.0,
        }
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        Self::new(tuning.gravity)
    }
}

impl Physics for ArcadePhysics {
    fn step(&mut self, player: &mut Player, solids: &[Aabb], dt: f32) -> Contact {
        let mut contact = Contact::default();
        let half = player.bounds().size / 2.0;

        player.vel.y = (player.vel.y + self.gravity * dt).min(self.max_fall_speed);

        // Horizontal
        player.pos.x += player.vel.x * dt;
        if player.pos.x - half.x < self.min_x {
            player.pos.x = self.min_x + half.x;
            contact.left = true;
        }
        for solid in solids {
            if !player.bounds().intersects(solid) {
                continue;
            }
            if player.vel.x > 0.0 {
                player.pos.x = solid.left() - half.x;
                contact.right = true;
            } else if player.vel.x < 0.0 {
                player.pos.x = solid.right() + half.x;
                contact.left = true;
            }
        }

        // Vertical
        player.pos.y += player.vel.y * dt;
        for solid in solids {
            if !player.bounds().intersects(solid) {
                continue;
            }
            if player.vel.y > 0.0 {
                player.pos.y = solid.top() - half.y;
                contact.down = true;
            } else if player.vel.y < 0.0 {
                player.pos.y = solid.bottom() + half.y;
                contact.up = true;
            }
            player.vel.y = 0.0;
        }

        contact
    }
}
