//! WebSocket protocol message definitions
//! These are the JSON wire types for client-server communication

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::celestial::CelestialBody;
use crate::game::entity::{ActiveEffect, Team, ThrustState};
use crate::game::powerup::PowerUpKind;

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Held keys and mouse movement since the previous message
    Input(InputMsg),
    /// Enter the arena on a team
    JoinTeam(JoinTeamMsg),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMsg {
    pub seq: u32,
    /// Keys currently pressed, e.g. `{"w": true}`
    #[serde(default)]
    pub keys: HashMap<String, bool>,
    #[serde(default)]
    pub mouse_dx: f32,
    #[serde(default)]
    pub mouse_dy: f32,
    #[serde(default)]
    pub fire: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct JoinTeamMsg {
    pub team: Team,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// First frame on every connection
    Welcome(WelcomeMsg),
    /// Human players per team
    TeamInfo(TeamInfoMsg),
    /// Full world snapshot, every tick
    State(StateMsg),
    /// A projectile struck a ship
    Hit(HitMsg),
    /// A ship was destroyed
    Kill(KillMsg),
    /// A power-up was collected
    Pickup(PickupMsg),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub player_id: String,
    pub player_name: String,
    pub celestial_bodies: Vec<CelestialBody>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamInfoMsg {
    pub teams: [u32; 2],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMsg {
    pub players: Vec<PlayerSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub power_ups: Vec<PowerUpSnapshot>,
}

/// Per-ship state in a snapshot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,
    pub hp: u8,
    pub kills: u32,
    pub deaths: u32,
    pub thrust_state: ThrustState,
    pub team: Team,
    pub heat: f32,
    pub overheated: bool,
    pub effects: Vec<ActiveEffect>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub owner_id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub dx: f32,
    pub dy: f32,
    pub dz: f32,
}

/// A pickupable slot; slots on cooldown are not sent
#[derive(Debug, Clone, Serialize)]
pub struct PowerUpSnapshot {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HitMsg {
    pub target_id: String,
    pub attacker_id: String,
    pub projectile_id: u64,
    pub shield_absorbed: bool,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KillMsg {
    pub target_id: String,
    /// Null when a celestial body did it
    pub attacker_id: Option<String>,
    pub attacker_name: String,
    pub target_name: String,
    pub attacker_team: Option<Team>,
    pub target_team: Team,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupMsg {
    pub slot_id: u32,
    pub entity_id: String,
    #[serde(rename = "type")]
    pub kind: PowerUpKind,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
