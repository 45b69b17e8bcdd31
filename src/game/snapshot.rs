//! Snapshot building and serialization

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ws::protocol::{
    HitMsg, KillMsg, PickupMsg, PlayerSnapshot, PowerUpSnapshot, ProjectileSnapshot, ServerMsg,
    StateMsg,
};

use super::combat::{HitEvent, Projectile};
use super::constants::TICK_RATE;
use super::entity::Entity;
use super::powerup::{PickupEvent, PowerUpSlot};
use super::world::{KillReport, TickOutcome, World};

/// A serialized text frame, shared by every connection
pub type Frame = Arc<str>;

/// Snapshots between two stats log lines
const STATS_LOG_INTERVAL: u64 = TICK_RATE as u64 * 30;

impl From<&Entity> for PlayerSnapshot {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id.clone(),
            name: e.name.clone(),
            x: e.position.x,
            y: e.position.y,
            z: e.position.z,
            yaw: e.yaw,
            pitch: e.pitch,
            roll: e.roll,
            speed: e.speed,
            hp: e.hp,
            kills: e.kills,
            deaths: e.deaths,
            thrust_state: e.controls.thrust_state(),
            team: e.team,
            heat: e.heat,
            overheated: e.overheated,
            effects: e.effects.clone(),
        }
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            owner_id: p.owner_id.clone(),
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
            dx: p.direction.x,
            dy: p.direction.y,
            dz: p.direction.z,
        }
    }
}

impl From<&PowerUpSlot> for PowerUpSnapshot {
    fn from(s: &PowerUpSlot) -> Self {
        Self {
            id: s.id,
            kind: s.kind,
            x: s.position.x,
            y: s.position.y,
            z: s.position.z,
        }
    }
}

impl From<&HitEvent> for HitMsg {
    fn from(h: &HitEvent) -> Self {
        Self {
            target_id: h.target_id.clone(),
            attacker_id: h.attacker_id.clone(),
            projectile_id: h.projectile_id,
            shield_absorbed: h.shield_absorbed,
            x: h.position.x,
            y: h.position.y,
            z: h.position.z,
        }
    }
}

impl From<&KillReport> for KillMsg {
    fn from(k: &KillReport) -> Self {
        Self {
            target_id: k.target_id.clone(),
            attacker_id: k.attacker_id.clone(),
            attacker_name: k.attacker_name.clone(),
            target_name: k.target_name.clone(),
            attacker_team: k.attacker_team,
            target_team: k.target_team,
            x: k.position.x,
            y: k.position.y,
            z: k.position.z,
        }
    }
}

impl From<&PickupEvent> for PickupMsg {
    fn from(p: &PickupEvent) -> Self {
        Self {
            slot_id: p.slot_id,
            entity_id: p.entity_id.clone(),
            kind: p.kind,
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
        }
    }
}

/// Serialize a message once for broadcast
pub fn encode(msg: &ServerMsg) -> Option<Frame> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Arc::from(json)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize server message");
            None
        }
    }
}

/// Builds the per-tick frames for network transmission
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    stats: SnapshotStats,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn stats(&self) -> &SnapshotStats {
        &self.stats
    }

    /// The full world state message
    pub fn state(world: &World) -> ServerMsg {
        ServerMsg::State(StateMsg {
            players: world.entities.iter().map(PlayerSnapshot::from).collect(),
            projectiles: world.projectiles.iter().map(ProjectileSnapshot::from).collect(),
            power_ups: world
                .slots
                .iter()
                .filter(|s| s.is_active())
                .map(PowerUpSnapshot::from)
                .collect(),
        })
    }

    /// Event messages for one tick: hits, then kills, then pickups
    pub fn events(outcome: &TickOutcome) -> Vec<ServerMsg> {
        let hits = outcome.hits.iter().map(|h| ServerMsg::Hit(h.into()));
        let kills = outcome.kills.iter().map(|k| ServerMsg::Kill(k.into()));
        let pickups = outcome.pickups.iter().map(|p| ServerMsg::Pickup(p.into()));
        hits.chain(kills).chain(pickups).collect()
    }

    /// Serialize the state frame followed by this tick's event frames
    pub fn build(&mut self, world: &World, outcome: &TickOutcome) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(1 + outcome.hits.len() + outcome.kills.len());

        if let Some(state) = encode(&Self::state(world)) {
            self.stats.record(world.entities.len(), state.len());
            frames.push(state);
        }
        frames.extend(Self::events(outcome).iter().filter_map(encode));

        if self.stats.total_snapshots % STATS_LOG_INTERVAL == 0 {
            debug!(
                snapshots = self.stats.total_snapshots,
                avg_bytes = self.stats.avg_bytes(),
                avg_players = self.stats.avg_players_per_snapshot,
                "Snapshot stats"
            );
        }

        frames
    }
}

/// Snapshot size stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub avg_players_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, player_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_players_per_snapshot =
            self.avg_players_per_snapshot * ((n - 1.0) / n) + (player_count as f32 / n);
    }

    pub fn avg_bytes(&self) -> u64 {
        self.total_bytes.checked_div(self.total_snapshots).unwrap_or(0)
    }
}
