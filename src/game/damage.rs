//! Damage, kills and crash detection

use super::celestial::CelestialBody;
use super::combat::HitEvent;
use super::constants::SHIP_COLLISION_RADIUS;
use super::entity::{EffectKind, Entity, EntityId};
use super::math::Vec3;
use super::physics::PhysicsSystem;

/// Who gets credit for a kill
#[derive(Debug, Clone, PartialEq)]
pub enum KillCredit {
    Ship(EntityId),
    /// Crashed into a celestial body
    Environment(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub target_id: EntityId,
    pub credit: KillCredit,
    pub position: Vec3,
}

impl KillEvent {
    #[cfg(test)]
    pub fn attacker_id(&self) -> Option<&str> {
        match &self.credit {
            KillCredit::Ship(id) => Some(id),
            KillCredit::Environment(_) => None,
        }
    }
}

/// Resolves hits and crashes into hp loss and kills
pub struct DamageResolver;

impl DamageResolver {
    /// Apply hits in order. A shielded target loses the shield instead of hp
    /// (the hit is flagged `shield_absorbed`). Hits on missing or already-dead
    /// targets are skipped, so a target dies at most once per batch and the
    /// first lethal hit in order gets the credit.
    pub fn apply_damage(hits: &mut [HitEvent], entities: &mut [Entity]) -> Vec<KillEvent> {
        let mut kills = Vec::new();

        for hit in hits.iter_mut() {
            let Some(target) = entities.iter_mut().find(|e| e.id == hit.target_id) else {
                continue;
            };
            if !target.is_alive() {
                continue;
            }

            if target.consume_effect(EffectKind::Shield) {
                hit.shield_absorbed = true;
                continue;
            }

            target.hp -= 1;
            if target.hp == 0 {
                target.kill();
                kills.push(KillEvent {
                    target_id: target.id.clone(),
                    credit: KillCredit::Ship(hit.attacker_id.clone()),
                    position: target.position,
                });
            }
        }

        kills
    }

    /// Ships that touch destroy each other. Each is credited with the other's
    /// kill and both kills are placed at the midpoint.
    pub fn detect_ship_collisions(entities: &mut [Entity]) -> Vec<KillEvent> {
        let mut kills = Vec::new();

        for i in 0..entities.len() {
            for j in (i + 1)..entities.len() {
                let (a, b) = (&entities[i], &entities[j]);
                if !a.is_alive() || !b.is_alive() {
                    continue;
                }
                if !PhysicsSystem::spheres_overlap(
                    a.position,
                    SHIP_COLLISION_RADIUS,
                    b.position,
                    SHIP_COLLISION_RADIUS,
                ) {
                    continue;
                }

                let impact = a.position.midpoint(b.position);
                let (a_id, b_id) = (a.id.clone(), b.id.clone());
                entities[i].kill();
                entities[j].kill();

                kills.push(KillEvent {
                    target_id: a_id.clone(),
                    credit: KillCredit::Ship(b_id.clone()),
                    position: impact,
                });
                kills.push(KillEvent {
                    target_id: b_id,
                    credit: KillCredit::Ship(a_id),
                    position: impact,
                });
            }
        }

        kills
    }

    /// Ships touching a celestial body die with an environmental kill
    pub fn detect_celestial_collisions(
        entities: &mut [Entity],
        bodies: &[CelestialBody],
    ) -> Vec<KillEvent> {
        let mut kills = Vec::new();

        for entity in entities.iter_mut().filter(|e| e.is_alive()) {
            let crashed = bodies.iter().find(|body| {
                PhysicsSystem::spheres_overlap(
                    entity.position,
                    SHIP_COLLISION_RADIUS,
                    body.position,
                    body.radius,
                )
            });

            if let Some(body) = crashed {
                entity.kill();
                kills.push(KillEvent {
                    target_id: entity.id.clone(),
                    credit: KillCredit::Environment(body.name),
                    position: entity.position,
                });
            }
        }

        kills
    }
}
