//! Spawn poses and delayed resurrection

use std::collections::BTreeMap;
use std::f32::consts::TAU;

use rand::Rng;

use super::constants::{MAX_HP, RESPAWN_TIME, SPAWN_RADIUS_MAX, SPAWN_RADIUS_MIN, SPAWN_Y_RANGE};
use super::entity::{Entity, EntityId};
use super::math::Vec3;
use super::npc;

/// Where and how a ship enters the arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPose {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

/// Random point in the spawn annulus around the origin, facing away from it
pub fn random_spawn_pose(rng: &mut impl Rng) -> SpawnPose {
    let angle = rng.gen_range(0.0..TAU);
    let radius = rng.gen_range(SPAWN_RADIUS_MIN..SPAWN_RADIUS_MAX);
    let x = angle.cos() * radius;
    let z = angle.sin() * radius;
    let y = rng.gen_range(-SPAWN_Y_RANGE..SPAWN_Y_RANGE);

    SpawnPose {
        position: Vec3::new(x, y, z),
        yaw: (-x).atan2(-z),
        pitch: 0.0,
    }
}

/// Put a ship at a fresh pose with full health and no carried-over state.
/// Id, name, team, score and bot skill persist.
pub fn respawn_entity(entity: &mut Entity, rng: &mut impl Rng) {
    let pose = random_spawn_pose(rng);
    entity.position = pose.position;
    entity.yaw = pose.yaw;
    entity.pitch = pose.pitch;
    entity.roll = 0.0;
    entity.speed = 0.0;
    entity.hp = MAX_HP;
    entity.fire_cooldown = 0.0;
    entity.heat = 0.0;
    entity.overheated = false;
    entity.effects.clear();

    if let Some(brain) = entity.brain_mut() {
        npc::reset_brain(brain, pose.yaw, rng);
    }
}

/// Countdown timers for dead ships, keyed by entity id.
///
/// Ordered so that ships due on the same tick come back in a stable order.
#[derive(Debug, Default)]
pub struct RespawnScheduler {
    timers: BTreeMap<EntityId, f32>,
}

impl RespawnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: &str) {
        self.timers.insert(id.to_string(), RESPAWN_TIME);
    }

    pub fn cancel(&mut self, id: &str) {
        self.timers.remove(id);
    }

    #[cfg(test)]
    pub fn is_pending(&self, id: &str) -> bool {
        self.timers.contains_key(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Advance all timers, returning the ids whose timer ran out
    pub fn tick(&mut self, dt: f32) -> Vec<EntityId> {
        let mut due = Vec::new();
        self.timers.retain(|id, remaining| {
            *remaining -= dt;
            if *remaining <= 0.0 {
                due.push(id.clone());
                false
            } else {
                true
            }
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{NPC_WANDER_INTERVAL_MAX, NPC_WANDER_INTERVAL_MIN, TICK_RATE};
    use crate::game::entity::{ActiveEffect, EffectKind, EntityKind, Team};
    use crate::game::math::forward;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / TICK_RATE as f32;

    #[test]
    fn timer_fires_after_respawn_time() {
        let mut scheduler = RespawnScheduler::new();
        scheduler.schedule("p1");

        let ticks_needed = (RESPAWN_TIME * TICK_RATE as f32).ceil() as usize;
        for _ in 0..ticks_needed - 2 {
            assert!(scheduler.tick(DT).is_empty());
        }
        let mut fired = Vec::new();
        for _ in 0..4 {
            fired.extend(scheduler.tick(DT));
        }
        assert_eq!(fired, vec!["p1".to_string()]);
        assert!(!scheduler.is_pending("p1"));
    }

    #[test]
    fn cancel_drops_the_timer() {
        let mut scheduler = RespawnScheduler::new();
        scheduler.schedule("p1");
        scheduler.schedule("npc-3");
        scheduler.cancel("p1");
        assert_eq!(scheduler.len(), 1);
        assert_eq!(scheduler.tick(RESPAWN_TIME), vec!["npc-3".to_string()]);
    }

    #[test]
    fn respawn_restores_a_fresh_ship() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut e = Entity::new("p1", "Pilot 1", Team::Red, EntityKind::Player);
        e.kill();
        e.kills = 3;
        e.deaths = 2;
        e.heat = 0.8;
        e.overheated = true;
        e.roll = 0.4;
        e.effects.push(ActiveEffect {
            kind: EffectKind::Speed,
            remaining_time: 4.0,
        });

        respawn_entity(&mut e, &mut rng);

        assert_eq!(e.hp, MAX_HP);
        assert_eq!(e.speed, 0.0);
        assert_eq!(e.heat, 0.0);
        assert!(!e.overheated);
        assert!(e.effects.is_empty());
        assert_eq!(e.roll, 0.0);
        assert_eq!((e.kills, e.deaths), (3, 2));
        assert_eq!(e.team, Team::Red);
    }

    #[test]
    fn respawned_bot_keeps_identity_and_gets_fresh_brain() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut bot = npc::create_npc(7, Team::Green, &mut rng);
        let skill = bot.brain().unwrap().skill;
        bot.brain_mut().unwrap().wander_timer = -1.0;
        bot.kill();

        respawn_entity(&mut bot, &mut rng);

        assert_eq!(bot.id, "npc-7");
        assert_eq!(bot.hp, MAX_HP);
        let brain = bot.brain().unwrap();
        assert_eq!(brain.skill, skill);
        assert_eq!(brain.target_yaw, bot.yaw);
        assert!((NPC_WANDER_INTERVAL_MIN..=NPC_WANDER_INTERVAL_MAX).contains(&brain.wander_timer));
    }

    proptest! {
        #[test]
        fn spawn_pose_is_in_the_annulus_facing_outward(seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let pose = random_spawn_pose(&mut rng);
            let p = pose.position;
            let horizontal = (p.x * p.x + p.z * p.z).sqrt();

            prop_assert!(horizontal >= SPAWN_RADIUS_MIN - 1e-3);
            prop_assert!(horizontal <= SPAWN_RADIUS_MAX + 1e-3);
            prop_assert!(p.y.abs() <= SPAWN_Y_RANGE);
            prop_assert_eq!(pose.pitch, 0.0);

            let dir = forward(pose.yaw, pose.pitch);
            let outward = (dir.x * p.x + dir.z * p.z) / horizontal;
            prop_assert!(outward > 0.999);
        }
    }
}
