//! Ships: human players and bots share one entity shape

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ws::protocol::InputMsg;

use super::constants::{MAX_HP, MAX_MOUSE_DELTA};
use super::error::GameError;
use super::math::Vec3;

/// Player ids are connection counters ("1", "2", ...), bots are "npc-N"
pub type EntityId = String;

/// Team membership. Serialized as 0 (green) or 1 (red).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Team {
    Green,
    Red,
}

impl Team {
    pub fn index(self) -> usize {
        match self {
            Team::Green => 0,
            Team::Red => 1,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Team::Green),
            1 => Ok(Team::Red),
            other => Err(GameError::InvalidTeam(other)),
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.index() as u8
    }
}

/// Timed buff types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Shield,
    Speed,
    RapidFire,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    /// Seconds until the effect is removed
    pub remaining_time: f32,
}

/// What the engine exhaust shows to other clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThrustState {
    Idle,
    Forward,
    Brake,
}

/// Held flight keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub throttle: bool,
    pub brake: bool,
    pub roll_left: bool,
    pub roll_right: bool,
}

impl Controls {
    pub const THROTTLE: Self = Self {
        throttle: true,
        brake: false,
        roll_left: false,
        roll_right: false,
    };

    pub const BRAKE: Self = Self {
        throttle: false,
        brake: true,
        roll_left: false,
        roll_right: false,
    };

    /// Decode the client's key map (`{"w": true, "ArrowLeft": true, ...}`)
    pub fn from_keys(keys: &HashMap<String, bool>) -> Self {
        let held = |a: &str, b: &str| {
            keys.get(a).copied().unwrap_or(false) || keys.get(b).copied().unwrap_or(false)
        };
        Self {
            throttle: held("w", "ArrowUp"),
            brake: held("s", "ArrowDown"),
            roll_left: held("a", "ArrowLeft"),
            roll_right: held("d", "ArrowRight"),
        }
    }

    pub fn thrust_state(&self) -> ThrustState {
        if self.throttle {
            ThrustState::Forward
        } else if self.brake {
            ThrustState::Brake
        } else {
            ThrustState::Idle
        }
    }
}

/// Input gathered between two ticks.
///
/// Network messages (or the bot AI) write into the buffer; the tick takes it
/// out exactly once with [`InputBuffer::drain`]. Mouse deltas accumulate and
/// fire is sticky until drained, so nothing pressed between ticks is lost.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    controls: Controls,
    mouse_dx: f32,
    mouse_dy: f32,
    fire: bool,
}

impl InputBuffer {
    /// Fold one client input message into the buffer
    pub fn apply(&mut self, msg: &InputMsg) {
        self.controls = Controls::from_keys(&msg.keys);
        self.mouse_dx = accumulate_delta(self.mouse_dx, msg.mouse_dx);
        self.mouse_dy = accumulate_delta(self.mouse_dy, msg.mouse_dy);
        self.fire |= msg.fire;
    }

    /// Replace the buffer with bot-generated input
    pub fn set_synthetic(&mut self, controls: Controls, mouse_dx: f32, mouse_dy: f32, fire: bool) {
        self.controls = controls;
        self.mouse_dx = mouse_dx;
        self.mouse_dy = mouse_dy;
        self.fire = fire;
    }

    /// Take this tick's input. Deltas and fire reset; held keys persist.
    pub fn drain(&mut self) -> TickInput {
        let input = TickInput {
            controls: self.controls,
            mouse_dx: self.mouse_dx,
            mouse_dy: self.mouse_dy,
            fire: self.fire,
        };
        self.mouse_dx = 0.0;
        self.mouse_dy = 0.0;
        self.fire = false;
        input
    }
}

/// Non-finite deltas are dropped. Each delta and the running sum are clamped.
fn accumulate_delta(acc: f32, delta: f32) -> f32 {
    if !delta.is_finite() {
        return acc;
    }
    let delta = delta.clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA);
    (acc + delta).clamp(-MAX_MOUSE_DELTA, MAX_MOUSE_DELTA)
}

/// One tick's worth of drained input
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub controls: Controls,
    pub mouse_dx: f32,
    pub mouse_dy: f32,
    pub fire: bool,
}

/// AI-only state
#[derive(Debug, Clone, PartialEq)]
pub struct NpcBrain {
    /// In [0.3, 1.0]; scales speed, turn rate and aim discipline
    pub skill: f32,
    pub target_yaw: f32,
    pub target_pitch: f32,
    /// Seconds until the next wander heading is picked
    pub wander_timer: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player,
    Npc(NpcBrain),
}

/// A ship in the arena
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub team: Team,
    pub kind: EntityKind,

    // Kinematics
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,

    // Health (0 = dead until respawn)
    pub hp: u8,

    // Input
    pub input: InputBuffer,
    /// Keys held as of the last drained tick
    pub controls: Controls,
    /// Fire intent for the current tick
    pub fire_intent: bool,
    pub fire_cooldown: f32,

    // Weapon heat
    pub heat: f32,
    pub overheated: bool,

    /// At most one entry per kind
    pub effects: Vec<ActiveEffect>,

    pub kills: u32,
    pub deaths: u32,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>, team: Team, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            team,
            kind,
            position: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            speed: 0.0,
            hp: MAX_HP,
            input: InputBuffer::default(),
            controls: Controls::default(),
            fire_intent: false,
            fire_cooldown: 0.0,
            heat: 0.0,
            overheated: false,
            effects: Vec::new(),
            kills: 0,
            deaths: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_npc(&self) -> bool {
        matches!(self.kind, EntityKind::Npc(_))
    }

    #[cfg(test)]
    pub fn brain(&self) -> Option<&NpcBrain> {
        match &self.kind {
            EntityKind::Npc(brain) => Some(brain),
            EntityKind::Player => None,
        }
    }

    pub fn brain_mut(&mut self) -> Option<&mut NpcBrain> {
        match &mut self.kind {
            EntityKind::Npc(brain) => Some(brain),
            EntityKind::Player => None,
        }
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Remove an effect, returning whether it was present
    pub fn consume_effect(&mut self, kind: EffectKind) -> bool {
        match self.effects.iter().position(|e| e.kind == kind) {
            Some(idx) => {
                self.effects.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Mark dead; the respawn scheduler brings the ship back
    pub fn kill(&mut self) {
        self.hp = 0;
        self.speed = 0.0;
    }

    pub fn kinematics(&self) -> Kinematics {
        Kinematics {
            position: self.position,
            yaw: self.yaw,
            pitch: self.pitch,
            roll: self.roll,
            speed: self.speed,
        }
    }

    pub fn restore_kinematics(&mut self, k: Kinematics) {
        self.position = k.position;
        self.yaw = k.yaw;
        self.pitch = k.pitch;
        self.roll = k.roll;
        self.speed = k.speed;
    }
}

/// Copy of the movement state, used to roll back a faulted integration step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub speed: f32,
}

impl Kinematics {
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.yaw.is_finite()
            && self.pitch.is_finite()
            && self.roll.is_finite()
            && self.speed.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(keys: &[&str], dx: f32, dy: f32, fire: bool) -> InputMsg {
        InputMsg {
            seq: 1,
            keys: keys.iter().map(|k| (k.to_string(), true)).collect(),
            mouse_dx: dx,
            mouse_dy: dy,
            fire,
        }
    }

    #[test]
    fn mouse_deltas_accumulate_until_drained() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&[], 10.0, -4.0, false));
        buf.apply(&input(&[], 5.0, 1.0, false));

        let tick = buf.drain();
        assert_eq!(tick.mouse_dx, 15.0);
        assert_eq!(tick.mouse_dy, -3.0);

        let next = buf.drain();
        assert_eq!(next.mouse_dx, 0.0);
        assert_eq!(next.mouse_dy, 0.0);
    }

    #[test]
    fn fire_is_sticky_until_drained() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&[], 0.0, 0.0, true));
        buf.apply(&input(&[], 0.0, 0.0, false));
        assert!(buf.drain().fire);
        assert!(!buf.drain().fire);
    }

    #[test]
    fn held_keys_survive_drain() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&["w", "ArrowLeft"], 0.0, 0.0, false));
        let first = buf.drain();
        let second = buf.drain();
        assert!(first.controls.throttle && first.controls.roll_left);
        assert_eq!(first.controls, second.controls);
    }

    #[test]
    fn key_set_is_replaced_by_each_message() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&["w"], 0.0, 0.0, false));
        buf.apply(&input(&["s"], 0.0, 0.0, false));
        let tick = buf.drain();
        assert!(!tick.controls.throttle);
        assert!(tick.controls.brake);
        assert_eq!(tick.controls.thrust_state(), ThrustState::Brake);
    }

    #[test]
    fn non_finite_and_huge_deltas_are_sanitized() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&[], f32::NAN, f32::INFINITY, false));
        buf.apply(&input(&[], 1.0e9, -1.0e9, false));
        let tick = buf.drain();
        assert_eq!(tick.mouse_dx, MAX_MOUSE_DELTA);
        assert_eq!(tick.mouse_dy, -MAX_MOUSE_DELTA);
    }

    #[test]
    fn opposite_huge_deltas_cancel_out() {
        let mut buf = InputBuffer::default();
        buf.apply(&input(&[], 1.0e9, -1.0e9, false));
        buf.apply(&input(&[], -1.0e9, 1.0e9, false));
        let tick = buf.drain();
        assert_eq!(tick.mouse_dx, 0.0);
        assert_eq!(tick.mouse_dy, 0.0);

        buf.apply(&input(&[], 5000.0, 0.0, false));
        buf.apply(&input(&[], -500.0, 0.0, false));
        assert_eq!(buf.drain().mouse_dx, MAX_MOUSE_DELTA - 500.0);
    }

    #[test]
    fn team_round_trips_through_index() {
        assert_eq!(Team::try_from(0u8), Ok(Team::Green));
        assert_eq!(Team::try_from(1u8), Ok(Team::Red));
        assert_eq!(Team::try_from(2u8), Err(GameError::InvalidTeam(2)));
        assert_eq!(u8::from(Team::Red), 1);
    }

    #[test]
    fn consume_effect_removes_only_that_kind() {
        let mut e = Entity::new("p1", "Pilot 1", Team::Green, EntityKind::Player);
        e.effects.push(ActiveEffect { kind: EffectKind::Shield, remaining_time: 5.0 });
        e.effects.push(ActiveEffect { kind: EffectKind::Speed, remaining_time: 5.0 });

        assert!(e.consume_effect(EffectKind::Shield));
        assert!(!e.consume_effect(EffectKind::Shield));
        assert!(e.has_effect(EffectKind::Speed));
    }
}
