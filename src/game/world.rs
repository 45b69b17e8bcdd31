//! The authoritative world and its fixed-step tick

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::ws::protocol::InputMsg;

use super::celestial::{default_bodies, CelestialBody};
use super::combat::{CollisionPolicy, CollisionTarget, CombatSystem, HitEvent, Projectile, WeaponStats};
use super::constants::{NPC_COUNT, POWERUP_COUNT};
use super::damage::{DamageResolver, KillCredit, KillEvent};
use super::entity::{Entity, EntityId, EntityKind, Team};
use super::error::GameError;
use super::math::Vec3;
use super::npc::{create_all_npcs, update_npc_ai, TargetView};
use super::physics::PhysicsSystem;
use super::powerup::{self, PickupEvent, PowerUpSlot};
use super::respawn::{random_spawn_pose, respawn_entity, RespawnScheduler};

/// World construction parameters
#[derive(Debug, Clone)]
pub struct WorldConfig {
    pub seed: u64,
    pub npc_count: usize,
    pub powerup_count: usize,
    pub collision_policy: CollisionPolicy,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            npc_count: NPC_COUNT,
            powerup_count: POWERUP_COUNT,
            collision_policy: CollisionPolicy::TeamAware,
        }
    }
}

/// A kill annotated with names and teams for the kill feed
#[derive(Debug, Clone, PartialEq)]
pub struct KillReport {
    pub target_id: EntityId,
    pub target_name: String,
    pub target_team: Team,
    /// `None` for environmental kills
    pub attacker_id: Option<EntityId>,
    pub attacker_name: String,
    pub attacker_team: Option<Team>,
    pub position: Vec3,
}

/// Everything that happened during one tick besides the state itself
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub hits: Vec<HitEvent>,
    pub kills: Vec<KillReport>,
    pub pickups: Vec<PickupEvent>,
}

/// Owns every live entity, projectile and power-up slot.
///
/// Human players are kept ahead of bots in `entities`, so iteration order
/// is players first, then NPCs.
pub struct World {
    pub entities: Vec<Entity>,
    pub projectiles: Vec<Projectile>,
    pub slots: Vec<PowerUpSlot>,
    pub bodies: Vec<CelestialBody>,
    respawns: RespawnScheduler,
    rng: ChaCha8Rng,
    policy: CollisionPolicy,
    next_projectile_id: u64,
    tick: u64,
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let entities = create_all_npcs(config.npc_count, &mut rng);
        let slots = powerup::create_slots(config.powerup_count, 1, &mut rng);

        Self {
            entities,
            projectiles: Vec::new(),
            slots,
            bodies: default_bodies(),
            respawns: RespawnScheduler::new(),
            rng,
            policy: config.collision_policy,
            next_projectile_id: 1,
            tick: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn human_count(&self) -> usize {
        self.entities.iter().filter(|e| !e.is_npc()).count()
    }

    /// Human players per team, indexed by team number
    pub fn team_counts(&self) -> [u32; 2] {
        let mut counts = [0; 2];
        for entity in self.entities.iter().filter(|e| !e.is_npc()) {
            counts[entity.team.index()] += 1;
        }
        counts
    }

    /// Put a human ship into the arena at a random spawn pose
    pub fn join(&mut self, id: &str, name: &str, team: Team) -> Result<&Entity, GameError> {
        if self.entity(id).is_some() {
            return Err(GameError::AlreadyJoined(id.to_string()));
        }

        let pose = random_spawn_pose(&mut self.rng);
        let mut player = Entity::new(id, name, team, EntityKind::Player);
        player.position = pose.position;
        player.yaw = pose.yaw;
        player.pitch = pose.pitch;

        let slot = self
            .entities
            .iter()
            .position(Entity::is_npc)
            .unwrap_or(self.entities.len());
        self.entities.insert(slot, player);

        debug!(player_id = %id, ?team, "Player entered arena");
        Ok(&self.entities[slot])
    }

    /// Buffer a client input message for the next tick
    pub fn apply_input(&mut self, id: &str, msg: &InputMsg) -> Result<(), GameError> {
        let entity = self
            .entity_mut(id)
            .ok_or_else(|| GameError::UnknownEntity(id.to_string()))?;
        entity.input.apply(msg);
        Ok(())
    }

    /// Drop a human ship together with its projectiles and respawn timer.
    /// Returns whether anything was removed.
    pub fn disconnect(&mut self, id: &str) -> bool {
        let Some(idx) = self.entities.iter().position(|e| e.id == id && !e.is_npc()) else {
            return false;
        };
        self.entities.remove(idx);
        self.projectiles.retain(|p| p.owner_id != id);
        self.respawns.cancel(id);
        true
    }

    /// Advance the simulation by one fixed step
    pub fn step(&mut self, dt: f32) -> TickOutcome {
        self.tick += 1;

        self.update_movement(dt);
        self.update_weapons(dt);
        CombatSystem::move_projectiles(&mut self.projectiles, dt);

        let targets: Vec<CollisionTarget> = self
            .entities
            .iter()
            .filter(|e| e.is_alive())
            .map(CollisionTarget::from_entity)
            .collect();
        let owner_teams: HashMap<EntityId, Team> = self
            .entities
            .iter()
            .map(|e| (e.id.clone(), e.team))
            .collect();
        let (survivors, mut hits) = CombatSystem::detect_collisions(
            std::mem::take(&mut self.projectiles),
            &targets,
            self.policy,
            &owner_teams,
        );
        self.projectiles = survivors;

        let mut kills = DamageResolver::apply_damage(&mut hits, &mut self.entities);
        kills.extend(DamageResolver::detect_ship_collisions(&mut self.entities));
        kills.extend(DamageResolver::detect_celestial_collisions(
            &mut self.entities,
            &self.bodies,
        ));
        let kills = self.settle_kills(kills);

        self.update_respawns(dt);
        let pickups = self.update_powerups(dt);

        TickOutcome {
            hits,
            kills,
            pickups,
        }
    }

    /// AI steering for bots, then input drain and integration for everyone
    fn update_movement(&mut self, dt: f32) {
        let views: Vec<TargetView> = self.entities.iter().map(TargetView::from_entity).collect();

        for entity in self.entities.iter_mut() {
            if entity.is_npc() && entity.is_alive() {
                update_npc_ai(entity, dt, &views, &mut self.rng);
            }

            // Drained even while dead so nothing queued during the respawn
            // wait fires on the first tick back
            let input = entity.input.drain();
            entity.controls = input.controls;
            entity.fire_intent = input.fire && entity.is_alive();

            let before = entity.kinematics();
            PhysicsSystem::integrate(entity, &input, dt);
            if !entity.kinematics().is_finite() {
                warn!(entity_id = %entity.id, "Non-finite kinematics, reverting step");
                entity.restore_kinematics(before);
            }
        }
    }

    /// Cooldowns, projectile spawns and heat, in roster order
    fn update_weapons(&mut self, dt: f32) {
        let mut live: HashMap<EntityId, usize> = HashMap::new();
        for projectile in &self.projectiles {
            *live.entry(projectile.owner_id.clone()).or_default() += 1;
        }

        for entity in self.entities.iter_mut() {
            entity.fire_cooldown = CombatSystem::update_cooldown(entity.fire_cooldown, dt);
            if !entity.is_alive() {
                entity.fire_intent = false;
                continue;
            }

            let count = live.get(&entity.id).copied().unwrap_or(0);
            let projectile = CombatSystem::spawn_projectile(entity, count, self.next_projectile_id);
            let fired = projectile.is_some();
            if let Some(projectile) = projectile {
                self.next_projectile_id += 1;
                *live.entry(entity.id.clone()).or_default() += 1;
                entity.fire_cooldown = WeaponStats::for_entity(entity).cooldown;
                self.projectiles.push(projectile);
            }
            entity.fire_intent = false;
            CombatSystem::update_heat(entity, dt, fired);
        }
    }

    /// Update scores, schedule respawns and annotate kills with names
    fn settle_kills(&mut self, kills: Vec<KillEvent>) -> Vec<KillReport> {
        let mut reports = Vec::with_capacity(kills.len());

        for kill in kills {
            let Some(target) = self.entity_mut(&kill.target_id) else {
                continue;
            };
            target.deaths += 1;
            let (target_name, target_team) = (target.name.clone(), target.team);
            self.respawns.schedule(&kill.target_id);

            let (attacker_id, attacker_name, attacker_team) = match &kill.credit {
                KillCredit::Ship(id) => match self.entity_mut(id) {
                    Some(attacker) => {
                        attacker.kills += 1;
                        (Some(id.clone()), attacker.name.clone(), Some(attacker.team))
                    }
                    // Shooter left while the projectile was in flight
                    None => (Some(id.clone()), id.clone(), None),
                },
                KillCredit::Environment(name) => (None, (*name).to_string(), None),
            };

            debug!(
                target_id = %kill.target_id,
                attacker = %attacker_name,
                "Ship destroyed"
            );

            reports.push(KillReport {
                target_id: kill.target_id,
                target_name,
                target_team,
                attacker_id,
                attacker_name,
                attacker_team,
                position: kill.position,
            });
        }

        reports
    }

    fn update_respawns(&mut self, dt: f32) {
        for id in self.respawns.tick(dt) {
            let Some(idx) = self.entities.iter().position(|e| e.id == id) else {
                continue;
            };
            let entity = &mut self.entities[idx];
            if entity.is_alive() {
                continue;
            }
            respawn_entity(entity, &mut self.rng);
            debug!(entity_id = %id, "Respawned");
        }
    }

    fn update_powerups(&mut self, dt: f32) -> Vec<PickupEvent> {
        powerup::update_cooldowns(&mut self.slots, dt, &mut self.rng);
        for entity in self.entities.iter_mut() {
            powerup::tick_effects(entity, dt);
        }

        let pickups = powerup::detect_pickups(&mut self.slots, &self.entities);
        for pickup in &pickups {
            if let Some(entity) = self.entity_mut(&pickup.entity_id) {
                powerup::apply_effect(entity, pickup.kind);
            }
        }
        pickups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{MAX_HP, RESPAWN_TIME, TICK_RATE};

    const DT: f32 = 1.0 / TICK_RATE as f32;

    fn empty_world() -> World {
        let mut world = World::new(WorldConfig {
            seed: 1,
            npc_count: 0,
            powerup_count: 0,
            ..WorldConfig::default()
        });
        world.bodies.clear();
        world
    }

    fn fire_msg(seq: u32) -> InputMsg {
        InputMsg {
            seq,
            keys: HashMap::new(),
            mouse_dx: 0.0,
            mouse_dy: 0.0,
            fire: true,
        }
    }

    fn place(world: &mut World, id: &str, position: Vec3, yaw: f32) {
        let e = world.entity_mut(id).unwrap();
        e.position = position;
        e.yaw = yaw;
        e.pitch = 0.0;
        e.speed = 0.0;
    }

    #[test]
    fn new_world_has_roster_and_slots() {
        let world = World::new(WorldConfig {
            seed: 5,
            ..WorldConfig::default()
        });
        assert_eq!(world.entities.len(), NPC_COUNT);
        assert_eq!(world.slots.len(), POWERUP_COUNT);
        assert_eq!(world.bodies.len(), 9);
        assert_eq!(world.team_counts(), [0, 0]);
    }

    #[test]
    fn humans_are_ordered_before_bots() {
        let mut world = World::new(WorldConfig {
            seed: 5,
            npc_count: 4,
            powerup_count: 0,
            ..WorldConfig::default()
        });
        world.join("1", "Pilot 1", Team::Green).unwrap();
        world.join("2", "Pilot 2", Team::Red).unwrap();
        assert_eq!(world.entities[0].id, "1");
        assert_eq!(world.entities[1].id, "2");
        assert!(world.entities[2..].iter().all(Entity::is_npc));
        assert_eq!(world.team_counts(), [1, 1]);
    }

    #[test]
    fn join_twice_is_rejected() {
        let mut world = empty_world();
        world.join("1", "Pilot 1", Team::Green).unwrap();
        let err = world.join("1", "Pilot 1", Team::Red).unwrap_err();
        assert_eq!(err, GameError::AlreadyJoined("1".into()));
    }

    #[test]
    fn input_for_unknown_entity_is_an_error() {
        let mut world = empty_world();
        let err = world.apply_input("ghost", &fire_msg(1)).unwrap_err();
        assert_eq!(err, GameError::UnknownEntity("ghost".into()));
    }

    #[test]
    fn fire_spawns_one_projectile_and_sets_cooldown() {
        let mut world = empty_world();
        world.join("1", "Pilot 1", Team::Green).unwrap();
        place(&mut world, "1", Vec3::ZERO, 0.0);

        world.apply_input("1", &fire_msg(1)).unwrap();
        world.step(DT);
        assert_eq!(world.projectiles.len(), 1);
        let shooter = world.entity("1").unwrap();
        assert!(shooter.fire_cooldown > 0.0);
        assert!(shooter.heat > 0.0);
        assert!(!shooter.fire_intent);

        // Fire was consumed; no second shot without a new press
        world.step(DT);
        assert_eq!(world.projectiles.len(), 1);
    }

    #[test]
    fn disconnect_removes_ship_and_its_projectiles() {
        let mut world = empty_world();
        world.join("1", "Pilot 1", Team::Green).unwrap();
        world.join("2", "Pilot 2", Team::Red).unwrap();
        place(&mut world, "1", Vec3::ZERO, 0.0);
        place(&mut world, "2", Vec3::new(500.0, 0.0, 0.0), 0.0);
        world.apply_input("1", &fire_msg(1)).unwrap();
        world.apply_input("2", &fire_msg(1)).unwrap();
        world.step(DT);
        assert_eq!(world.projectiles.len(), 2);

        assert!(world.disconnect("1"));
        assert!(world.entity("1").is_none());
        assert!(world.projectiles.iter().all(|p| p.owner_id == "2"));
        assert!(!world.disconnect("1"));
    }

    /// Step until something is hit, at most a second of game time
    fn step_until_hit(world: &mut World) -> TickOutcome {
        for _ in 0..TICK_RATE {
            let outcome = world.step(DT);
            if !outcome.hits.is_empty() {
                return outcome;
            }
        }
        panic!("no hit within a second");
    }

    #[test]
    fn projectile_hit_through_full_ticks() {
        let mut world = empty_world();
        world.join("a", "Pilot A", Team::Green).unwrap();
        world.join("b", "Pilot B", Team::Red).unwrap();
        place(&mut world, "a", Vec3::ZERO, 0.0);
        place(&mut world, "b", Vec3::new(0.0, 0.0, -10.0), 0.0);

        world.apply_input("a", &fire_msg(1)).unwrap();
        let outcome = step_until_hit(&mut world);

        assert_eq!(outcome.hits.len(), 1);
        assert_eq!(outcome.hits[0].attacker_id, "a");
        assert_eq!(outcome.hits[0].target_id, "b");
        assert!(outcome.kills.is_empty());
        assert_eq!(world.entity("b").unwrap().hp, MAX_HP - 1);
        assert!(world.projectiles.is_empty());
    }

    #[test]
    fn kills_update_scores_and_respawn_later() {
        let mut world = empty_world();
        world.join("a", "Pilot A", Team::Green).unwrap();
        world.join("b", "Pilot B", Team::Red).unwrap();
        place(&mut world, "a", Vec3::ZERO, 0.0);
        place(&mut world, "b", Vec3::new(0.0, 0.0, -10.0), 0.0);
        world.entity_mut("b").unwrap().hp = 1;

        world.apply_input("a", &fire_msg(1)).unwrap();
        let outcome = step_until_hit(&mut world);

        assert_eq!(outcome.kills.len(), 1);
        let kill = &outcome.kills[0];
        assert_eq!(kill.attacker_id.as_deref(), Some("a"));
        assert_eq!(kill.attacker_name, "Pilot A");
        assert_eq!(kill.attacker_team, Some(Team::Green));
        assert_eq!(kill.target_name, "Pilot B");
        assert_eq!(kill.target_team, Team::Red);
        assert_eq!(world.entity("a").unwrap().kills, 1);
        assert_eq!(world.entity("b").unwrap().deaths, 1);

        let ticks = (RESPAWN_TIME * TICK_RATE as f32) as usize + 2;
        for _ in 0..ticks {
            world.step(DT);
        }
        let b = world.entity("b").unwrap();
        assert_eq!(b.hp, MAX_HP);
        assert_eq!(b.deaths, 1);
    }

    #[test]
    fn sun_crash_is_reported_without_attacker() {
        let mut world = empty_world();
        world.bodies = default_bodies();
        world.join("a", "Pilot A", Team::Green).unwrap();
        let sun = world.bodies[0].position;
        place(&mut world, "a", sun, 0.0);

        let outcome = world.step(DT);
        assert_eq!(outcome.kills.len(), 1);
        assert_eq!(outcome.kills[0].attacker_id, None);
        assert_eq!(outcome.kills[0].attacker_team, None);
        assert_eq!(outcome.kills[0].attacker_name, "the Sun");
        assert_eq!(world.entity("a").unwrap().kills, 0);
    }

    #[test]
    fn same_seed_same_world() {
        let config = WorldConfig {
            seed: 77,
            ..WorldConfig::default()
        };
        let mut a = World::new(config.clone());
        let mut b = World::new(config);
        for _ in 0..120 {
            a.step(DT);
            b.step(DT);
        }
        let pos_a: Vec<Vec3> = a.entities.iter().map(|e| e.position).collect();
        let pos_b: Vec<Vec3> = b.entities.iter().map(|e| e.position).collect();
        assert_eq!(pos_a, pos_b);
        assert_eq!(a.projectiles, b.projectiles);
    }
}
