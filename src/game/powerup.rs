//! Power-up slots, pickups and timed effects

use std::f32::consts::TAU;

use rand::Rng;
use serde::Serialize;

use super::constants::{
    MAX_HP, POWERUP_PICKUP_RADIUS, POWERUP_RAPID_FIRE_DURATION, POWERUP_RESPAWN_COOLDOWN,
    POWERUP_SHIELD_DURATION, POWERUP_SPAWN_RADIUS_MAX, POWERUP_SPAWN_RADIUS_MIN,
    POWERUP_SPAWN_Y_RANGE, POWERUP_SPEED_DURATION,
};
use super::entity::{ActiveEffect, EffectKind, Entity, EntityId};
use super::math::{distance_sq, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerUpKind {
    Health,
    Shield,
    Speed,
    RapidFire,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Health,
        PowerUpKind::Shield,
        PowerUpKind::Speed,
        PowerUpKind::RapidFire,
    ];

    /// Timed effect granted on pickup, with its duration. Health is instant.
    pub fn effect(self) -> Option<(EffectKind, f32)> {
        match self {
            PowerUpKind::Health => None,
            PowerUpKind::Shield => Some((EffectKind::Shield, POWERUP_SHIELD_DURATION)),
            PowerUpKind::Speed => Some((EffectKind::Speed, POWERUP_SPEED_DURATION)),
            PowerUpKind::RapidFire => Some((EffectKind::RapidFire, POWERUP_RAPID_FIRE_DURATION)),
        }
    }
}

/// A fixed pickup location. Cooldown 0 means the pickup is live.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerUpSlot {
    pub id: u32,
    pub kind: PowerUpKind,
    pub position: Vec3,
    pub cooldown: f32,
}

impl PowerUpSlot {
    pub fn is_active(&self) -> bool {
        self.cooldown <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PickupEvent {
    pub slot_id: u32,
    pub entity_id: EntityId,
    pub kind: PowerUpKind,
    pub position: Vec3,
}

pub fn random_kind(rng: &mut impl Rng) -> PowerUpKind {
    PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())]
}

pub fn random_position(rng: &mut impl Rng) -> Vec3 {
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(POWERUP_SPAWN_RADIUS_MIN..POWERUP_SPAWN_RADIUS_MAX);
    let y = rng.gen_range(-POWERUP_SPAWN_Y_RANGE..POWERUP_SPAWN_Y_RANGE);
    Vec3::new(angle.cos() * radius, y, angle.sin() * radius)
}

/// `count` live slots with sequential ids from `start_id`
pub fn create_slots(count: usize, start_id: u32, rng: &mut impl Rng) -> Vec<PowerUpSlot> {
    (start_id..)
        .take(count)
        .map(|id| PowerUpSlot {
            id,
            kind: random_kind(rng),
            position: random_position(rng),
            cooldown: 0.0,
        })
        .collect()
}

/// Each live slot goes to the first alive ship in range (boundary inclusive),
/// then starts its respawn cooldown.
pub fn detect_pickups(slots: &mut [PowerUpSlot], entities: &[Entity]) -> Vec<PickupEvent> {
    let radius_sq = POWERUP_PICKUP_RADIUS * POWERUP_PICKUP_RADIUS;
    let mut pickups = Vec::new();

    for slot in slots.iter_mut().filter(|s| s.is_active()) {
        let taker = entities
            .iter()
            .filter(|e| e.is_alive())
            .find(|e| distance_sq(slot.position, e.position) <= radius_sq);

        if let Some(entity) = taker {
            pickups.push(PickupEvent {
                slot_id: slot.id,
                entity_id: entity.id.clone(),
                kind: slot.kind,
                position: slot.position,
            });
            slot.cooldown = POWERUP_RESPAWN_COOLDOWN;
        }
    }

    pickups
}

/// Health heals one point up to the cap. Timed kinds add the effect or reset
/// an existing one to full duration.
pub fn apply_effect(entity: &mut Entity, kind: PowerUpKind) {
    let Some((effect, duration)) = kind.effect() else {
        entity.hp = (entity.hp + 1).min(MAX_HP);
        return;
    };

    match entity.effects.iter_mut().find(|e| e.kind == effect) {
        Some(existing) => existing.remaining_time = duration,
        None => entity.effects.push(ActiveEffect {
            kind: effect,
            remaining_time: duration,
        }),
    }
}

/// Count down effect timers, dropping expired ones
pub fn tick_effects(entity: &mut Entity, dt: f32) {
    entity.effects.retain_mut(|effect| {
        effect.remaining_time -= dt;
        effect.remaining_time > 0.0
    });
}

/// Count down respawning slots; a slot that comes back gets a new place and kind
pub fn update_cooldowns(slots: &mut [PowerUpSlot], dt: f32, rng: &mut impl Rng) {
    for slot in slots.iter_mut().filter(|s| !s.is_active()) {
        slot.cooldown -= dt;
        if slot.cooldown <= 0.0 {
            slot.cooldown = 0.0;
            slot.position = random_position(rng);
            slot.kind = random_kind(rng);
        }
    }
}
