//! Combat system - weapons, heat, projectiles, hit detection

use std::collections::HashMap;

use super::constants::{
    FIRE_COOLDOWN, HEAT_DECAY_RATE, HEAT_PER_SHOT, MAX_PROJECTILES_PER_PLAYER, NPC_FIRE_COOLDOWN,
    OVERHEAT_RECOVERY, OVERHEAT_THRESHOLD, POWERUP_RAPID_FIRE_HEAT_MULT, PROJECTILE_HIT_RADIUS,
    PROJECTILE_LIFETIME, PROJECTILE_SPAWN_OFFSET, PROJECTILE_SPEED,
};
use super::entity::{EffectKind, Entity, EntityId, Team};
use super::math::{distance_sq, forward, Vec3};

/// Weapon stats per ship kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Cooldown between shots (seconds)
    pub cooldown: f32,
    /// Heat added per shot
    pub heat_per_shot: f32,
}

impl WeaponStats {
    pub fn for_entity(entity: &Entity) -> Self {
        let cooldown = if entity.is_npc() {
            NPC_FIRE_COOLDOWN
        } else {
            FIRE_COOLDOWN
        };
        let heat_per_shot = if entity.has_effect(EffectKind::RapidFire) {
            HEAT_PER_SHOT * POWERUP_RAPID_FIRE_HEAT_MULT
        } else {
            HEAT_PER_SHOT
        };
        Self {
            cooldown,
            heat_per_shot,
        }
    }
}

/// Active projectile in the arena
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub owner_id: EntityId,
    pub position: Vec3,
    /// Unit travel direction
    pub direction: Vec3,
    /// Seconds since spawn
    pub age: f32,
}

/// Minimal view of a ship for hit tests
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionTarget {
    pub id: EntityId,
    pub position: Vec3,
    pub team: Team,
}

impl CollisionTarget {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            position: entity.position,
            team: entity.team,
        }
    }
}

/// How projectiles treat teammates. Chosen once when the world is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Same-team targets are never hit
    #[default]
    TeamAware,
    /// Anyone but the shooter can be hit
    TeamAgnostic,
}

/// A projectile struck a ship
#[derive(Debug, Clone, PartialEq)]
pub struct HitEvent {
    pub target_id: EntityId,
    pub attacker_id: EntityId,
    pub projectile_id: u64,
    /// Projectile position at impact
    pub position: Vec3,
    /// Set by damage resolution when a shield took the hit
    pub shield_absorbed: bool,
}

/// Combat system for managing weapons and projectiles
pub struct CombatSystem;

impl CombatSystem {
    /// Try to fire. Returns `None` when the ship has no fire intent, is on
    /// cooldown, is overheated, or already has the maximum number of live
    /// projectiles. The caller resets fire intent and sets the cooldown.
    pub fn spawn_projectile(entity: &Entity, live_count: usize, id: u64) -> Option<Projectile> {
        if !entity.fire_intent
            || entity.fire_cooldown > 0.0
            || entity.overheated
            || live_count >= MAX_PROJECTILES_PER_PLAYER
        {
            return None;
        }

        let direction = forward(entity.yaw, entity.pitch);
        Some(Projectile {
            id,
            owner_id: entity.id.clone(),
            position: entity.position + direction * PROJECTILE_SPAWN_OFFSET,
            direction,
            age: 0.0,
        })
    }

    /// Update weapon cooldown
    pub fn update_cooldown(cooldown: f32, dt: f32) -> f32 {
        (cooldown - dt).max(0.0)
    }

    /// Decay heat, add the cost of a shot fired this tick, and flip the
    /// overheat lockout. Lockout engages at the threshold and only clears
    /// once heat has decayed all the way to the recovery level.
    pub fn update_heat(entity: &mut Entity, dt: f32, just_fired: bool) {
        let mut heat = (entity.heat - HEAT_DECAY_RATE * dt).max(0.0);
        if just_fired {
            heat = (heat + WeaponStats::for_entity(entity).heat_per_shot).min(OVERHEAT_THRESHOLD);
        }
        entity.heat = heat;

        if heat >= OVERHEAT_THRESHOLD {
            entity.overheated = true;
        } else if entity.overheated && heat <= OVERHEAT_RECOVERY {
            entity.overheated = false;
        }
    }

    /// Advance projectiles and drop the ones that aged out
    pub fn move_projectiles(projectiles: &mut Vec<Projectile>, dt: f32) {
        projectiles.retain_mut(|p| {
            p.position += p.direction * (PROJECTILE_SPEED * dt);
            p.age += dt;
            p.age < PROJECTILE_LIFETIME
        });
    }

    /// Find projectile hits. Each projectile is tested against targets in
    /// order and hits the first one in range that is not its owner (and,
    /// under [`CollisionPolicy::TeamAware`], not on the owner's team).
    /// Returns the surviving projectiles and the hits.
    pub fn detect_collisions(
        projectiles: Vec<Projectile>,
        targets: &[CollisionTarget],
        policy: CollisionPolicy,
        owner_teams: &HashMap<EntityId, Team>,
    ) -> (Vec<Projectile>, Vec<HitEvent>) {
        let hit_radius_sq = PROJECTILE_HIT_RADIUS * PROJECTILE_HIT_RADIUS;
        let mut survivors = Vec::with_capacity(projectiles.len());
        let mut hits = Vec::new();

        for projectile in projectiles {
            let owner_team = match policy {
                CollisionPolicy::TeamAware => owner_teams.get(&projectile.owner_id).copied(),
                CollisionPolicy::TeamAgnostic => None,
            };

            let struck = targets.iter().find(|target| {
                target.id != projectile.owner_id
                    && owner_team.map_or(true, |team| team != target.team)
                    && distance_sq(projectile.position, target.position) <= hit_radius_sq
            });

            match struck {
                Some(target) => hits.push(HitEvent {
                    target_id: target.id.clone(),
                    attacker_id: projectile.owner_id.clone(),
                    projectile_id: projectile.id,
                    position: projectile.position,
                    shield_absorbed: false,
                }),
                None => survivors.push(projectile),
            }
        }

        (survivors, hits)
    }
}
