//! Ship flight model and overlap tests

use super::constants::{
    ACCELERATION, BRAKE_FORCE, MAX_PITCH, MAX_ROLL, MAX_SPEED, MOUSE_SENSITIVITY,
    POWERUP_SPEED_MULTIPLIER, ROLL_DECAY_BASE, ROLL_SPEED,
};
use super::entity::{EffectKind, Entity, TickInput};
use super::math::{distance_sq, forward, Vec3};

/// Flight limits for a ship this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightStats {
    /// Speed cap
    pub max_speed: f32,
    /// Speed gained per second under throttle
    pub acceleration: f32,
    /// Speed lost per second under brake
    pub brake_force: f32,
}

impl FlightStats {
    pub fn for_entity(entity: &Entity) -> Self {
        let max_speed = if entity.has_effect(EffectKind::Speed) {
            MAX_SPEED * POWERUP_SPEED_MULTIPLIER
        } else {
            MAX_SPEED
        };
        Self {
            max_speed,
            acceleration: ACCELERATION,
            brake_force: BRAKE_FORCE,
        }
    }
}

/// Physics system for updating ship orientation, speed and position
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one ship by `dt` using this tick's drained input.
    /// Dead ships are left untouched.
    pub fn integrate(entity: &mut Entity, input: &TickInput, dt: f32) {
        if !entity.is_alive() {
            return;
        }

        // Mouse look
        entity.yaw -= input.mouse_dx * MOUSE_SENSITIVITY;
        entity.pitch = (entity.pitch - input.mouse_dy * MOUSE_SENSITIVITY).clamp(-MAX_PITCH, MAX_PITCH);

        // Bank while a roll key is held, otherwise ease back to level
        let controls = input.controls;
        if controls.roll_left {
            entity.roll = (entity.roll + ROLL_SPEED * dt).min(MAX_ROLL);
        } else if controls.roll_right {
            entity.roll = (entity.roll - ROLL_SPEED * dt).max(-MAX_ROLL);
        } else {
            entity.roll *= ROLL_DECAY_BASE.powf(dt);
        }

        // Throttle / brake, clamped to the current cap
        let stats = FlightStats::for_entity(entity);
        let mut speed = entity.speed;
        if controls.throttle {
            speed += stats.acceleration * dt;
        } else if controls.brake {
            speed -= stats.brake_force * dt;
        }
        entity.speed = speed.clamp(0.0, stats.max_speed);

        // Move along the heading
        let dir = forward(entity.yaw, entity.pitch);
        entity.position += dir * (entity.speed * dt);
    }

    /// Whether two spheres touch (boundary inclusive)
    pub fn spheres_overlap(a: Vec3, radius_a: f32, b: Vec3, radius_b: f32) -> bool {
        let combined = radius_a + radius_b;
        distance_sq(a, b) <= combined * combined
    }
}
