//! Simulation constants shared with clients
//!
//! These values are part of the wire contract: clients replicate the movement
//! and projectile math, so changing any of them is a protocol change.

use std::f32::consts::PI;

// ---- Tick ----

/// Simulation ticks per second
pub const TICK_RATE: u32 = 60;

// ---- Flight ----

/// Top speed in units per second
pub const MAX_SPEED: f32 = 25.0;
/// Units/s² gained while throttle is held
pub const ACCELERATION: f32 = 5.0;
/// Units/s² lost while brake is held
pub const BRAKE_FORCE: f32 = 8.0;
/// Radians per unit of mouse delta
pub const MOUSE_SENSITIVITY: f32 = 0.003;
/// Pitch limit (±60°)
pub const MAX_PITCH: f32 = PI / 3.0;
/// Roll rate in radians per second while a roll key is held
pub const ROLL_SPEED: f32 = 2.0;
/// Roll limit while banking
pub const MAX_ROLL: f32 = PI / 4.0;
/// Per-second retention factor when roll eases back to level
pub const ROLL_DECAY_BASE: f32 = 0.05;
/// Largest mouse delta accepted per tick (≈ 6 rad of turn)
pub const MAX_MOUSE_DELTA: f32 = 2000.0;

// ---- Weapons ----

pub const PROJECTILE_SPEED: f32 = 40.0;
/// Seconds a projectile lives before expiring
pub const PROJECTILE_LIFETIME: f32 = 3.0;
/// Distance ahead of the ship where projectiles appear
pub const PROJECTILE_SPAWN_OFFSET: f32 = 0.95;
pub const FIRE_COOLDOWN: f32 = 0.3;
/// Bots fire slower than humans
pub const NPC_FIRE_COOLDOWN: f32 = 0.8;
pub const PROJECTILE_HIT_RADIUS: f32 = 1.0;
pub const MAX_PROJECTILES_PER_PLAYER: usize = 10;

// ---- Heat ----

pub const HEAT_PER_SHOT: f32 = 0.10;
/// Heat lost per second
pub const HEAT_DECAY_RATE: f32 = 0.20;
pub const OVERHEAT_THRESHOLD: f32 = 1.0;
/// Overheat lockout clears only once heat is back down here
pub const OVERHEAT_RECOVERY: f32 = 0.0;

// ---- Health / collisions ----

pub const MAX_HP: u8 = 4;
pub const RESPAWN_TIME: f32 = 5.0;
pub const SHIP_COLLISION_RADIUS: f32 = 1.5;

// ---- Spawning ----

pub const SPAWN_RADIUS_MIN: f32 = 80.0;
pub const SPAWN_RADIUS_MAX: f32 = 130.0;
/// Spawn height is uniform in ±SPAWN_Y_RANGE
pub const SPAWN_Y_RANGE: f32 = 20.0;

// ---- NPCs ----

pub const NPC_COUNT: usize = 75;
/// Max synthetic mouse delta per tick at skill 1.0
pub const NPC_TURN_RATE: f32 = 400.0;
pub const NPC_WANDER_INTERVAL_MIN: f32 = 2.0;
pub const NPC_WANDER_INTERVAL_MAX: f32 = 5.0;
pub const NPC_MIN_SKILL: f32 = 0.3;
pub const NPC_MAX_SKILL: f32 = 1.0;
pub const NPC_DETECTION_RANGE: f32 = 50.0;
pub const NPC_MIN_COMBAT_RANGE: f32 = 5.0;
pub const NPC_MAX_SPEED_FACTOR: f32 = 0.7;
pub const NPC_AIM_THRESHOLD_MIN: f32 = 0.15;
pub const NPC_AIM_THRESHOLD_MAX: f32 = 0.5;
/// Speed band around the target speed where a bot neither throttles nor brakes
pub const NPC_SPEED_DEADBAND: f32 = 0.1;
/// Max yaw offset of a new wander heading (±120°)
pub const NPC_WANDER_YAW_OFFSET: f32 = 2.0 * PI / 3.0;
/// Max pitch offset of a new wander heading (±30°)
pub const NPC_WANDER_PITCH_OFFSET: f32 = PI / 6.0;
/// Wander headings never pitch beyond this
pub const NPC_WANDER_PITCH_LIMIT: f32 = 0.4;
/// Initial steering pitch is uniform in ±NPC_INITIAL_PITCH_SPREAD
pub const NPC_INITIAL_PITCH_SPREAD: f32 = 0.25;
/// Yaw error at which steering reaches full deflection
pub const NPC_YAW_REFERENCE_ANGLE: f32 = 0.5;
/// Pitch error at which steering reaches full deflection
pub const NPC_PITCH_REFERENCE_ANGLE: f32 = 0.3;

// ---- Power-ups ----

pub const POWERUP_COUNT: usize = 10;
pub const POWERUP_PICKUP_RADIUS: f32 = 3.0;
pub const POWERUP_RESPAWN_COOLDOWN: f32 = 30.0;
pub const POWERUP_SHIELD_DURATION: f32 = 15.0;
pub const POWERUP_SPEED_DURATION: f32 = 10.0;
pub const POWERUP_RAPID_FIRE_DURATION: f32 = 10.0;
pub const POWERUP_SPEED_MULTIPLIER: f32 = 1.5;
/// Heat per shot is scaled by this while rapid fire is active
pub const POWERUP_RAPID_FIRE_HEAT_MULT: f32 = 0.5;
pub const POWERUP_SPAWN_RADIUS_MIN: f32 = 20.0;
pub const POWERUP_SPAWN_RADIUS_MAX: f32 = 150.0;
pub const POWERUP_SPAWN_Y_RANGE: f32 = 30.0;
