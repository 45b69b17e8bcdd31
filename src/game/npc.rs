//! Bot roster and AI.
//!
//! Bots never touch their kinematics directly. Each tick the AI writes
//! synthetic keys and mouse deltas into the bot's input buffer, and the
//! same flight and weapon code that serves human players consumes them.

use rand::Rng;

use super::constants::{
    MAX_SPEED, MOUSE_SENSITIVITY, NPC_AIM_THRESHOLD_MAX, NPC_AIM_THRESHOLD_MIN,
    NPC_DETECTION_RANGE, NPC_INITIAL_PITCH_SPREAD, NPC_MAX_SKILL, NPC_MAX_SPEED_FACTOR,
    NPC_MIN_COMBAT_RANGE, NPC_MIN_SKILL, NPC_PITCH_REFERENCE_ANGLE, NPC_SPEED_DEADBAND,
    NPC_TURN_RATE, NPC_WANDER_INTERVAL_MAX, NPC_WANDER_INTERVAL_MIN, NPC_WANDER_PITCH_LIMIT,
    NPC_WANDER_PITCH_OFFSET, NPC_WANDER_YAW_OFFSET, NPC_YAW_REFERENCE_ANGLE,
};
use super::entity::{Controls, Entity, EntityId, EntityKind, NpcBrain, Team};
use super::math::{aim_angles, distance_sq, normalize_angle, Vec3};
use super::respawn::random_spawn_pose;

/// What the AI sees of another ship
#[derive(Debug, Clone, PartialEq)]
pub struct TargetView {
    pub id: EntityId,
    pub position: Vec3,
    pub hp: u8,
    pub team: Team,
}

impl TargetView {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            id: entity.id.clone(),
            position: entity.position,
            hp: entity.hp,
            team: entity.team,
        }
    }
}

fn random_wander_timer(rng: &mut impl Rng) -> f32 {
    rng.gen_range(NPC_WANDER_INTERVAL_MIN..NPC_WANDER_INTERVAL_MAX)
}

/// Point the brain at the spawn heading with a fresh wander countdown.
/// Skill is kept.
pub fn reset_brain(brain: &mut NpcBrain, yaw: f32, rng: &mut impl Rng) {
    brain.target_yaw = yaw;
    brain.target_pitch = rng.gen_range(-NPC_INITIAL_PITCH_SPREAD..NPC_INITIAL_PITCH_SPREAD);
    brain.wander_timer = random_wander_timer(rng);
}

/// Build bot `npc-{index}` at a random spawn pose with a random skill
pub fn create_npc(index: usize, team: Team, rng: &mut impl Rng) -> Entity {
    let pose = random_spawn_pose(rng);
    let mut brain = NpcBrain {
        skill: rng.gen_range(NPC_MIN_SKILL..=NPC_MAX_SKILL),
        target_yaw: pose.yaw,
        target_pitch: 0.0,
        wander_timer: 0.0,
    };
    reset_brain(&mut brain, pose.yaw, rng);

    let mut npc = Entity::new(
        format!("npc-{index}"),
        format!("Bot {index}"),
        team,
        EntityKind::Npc(brain),
    );
    npc.position = pose.position;
    npc.yaw = pose.yaw;
    npc.pitch = pose.pitch;
    npc
}

/// The full bot roster, alternating teams starting with red at `npc-1`
pub fn create_all_npcs(count: usize, rng: &mut impl Rng) -> Vec<Entity> {
    (1..=count)
        .map(|i| {
            let team = if i % 2 == 0 { Team::Green } else { Team::Red };
            create_npc(i, team, rng)
        })
        .collect()
}

/// Nearest alive enemy inside the engagement band, if any.
///
/// Ships closer than the minimum combat range are ignored so two bots do not
/// lock onto each other nose to nose.
pub fn find_nearest_target<'a>(npc: &Entity, candidates: &'a [TargetView]) -> Option<&'a TargetView> {
    let max_sq = NPC_DETECTION_RANGE * NPC_DETECTION_RANGE;
    let min_sq = NPC_MIN_COMBAT_RANGE * NPC_MIN_COMBAT_RANGE;

    let mut best: Option<(&TargetView, f32)> = None;
    for candidate in candidates {
        if candidate.id == npc.id || candidate.hp == 0 || candidate.team == npc.team {
            continue;
        }
        let d_sq = distance_sq(npc.position, candidate.position);
        if d_sq < min_sq || d_sq > max_sq {
            continue;
        }
        if best.map_or(true, |(_, best_sq)| d_sq < best_sq) {
            best = Some((candidate, d_sq));
        }
    }
    best.map(|(target, _)| target)
}

/// Largest aim error at which a bot of this skill pulls the trigger
pub fn aim_threshold(skill: f32) -> f32 {
    NPC_AIM_THRESHOLD_MAX - skill * (NPC_AIM_THRESHOLD_MAX - NPC_AIM_THRESHOLD_MIN)
}

/// Mouse delta that turns `error` radians, softened near the target and
/// capped by the bot's turn rate
fn steer(error: f32, reference_angle: f32, max_delta: f32) -> f32 {
    let raw = (-error / MOUSE_SENSITIVITY).clamp(-max_delta, max_delta);
    raw * (error.abs() / reference_angle).min(1.0)
}

/// Run one AI step for a bot, leaving synthetic input in its buffer.
/// Players are ignored.
pub fn update_npc_ai(npc: &mut Entity, dt: f32, candidates: &[TargetView], rng: &mut impl Rng) {
    let target = find_nearest_target(npc, candidates).map(|t| t.position);
    let (position, yaw, pitch, speed) = (npc.position, npc.yaw, npc.pitch, npc.speed);

    let Some(brain) = npc.brain_mut() else {
        return;
    };

    let fire = match target {
        Some(target_pos) => {
            let (aim_yaw, aim_pitch) = aim_angles(position, target_pos);
            brain.target_yaw = aim_yaw;
            brain.target_pitch = aim_pitch;
            brain.wander_timer = 0.0;

            let yaw_err = normalize_angle(aim_yaw - yaw);
            let pitch_err = normalize_angle(aim_pitch - pitch);
            yaw_err.hypot(pitch_err) < aim_threshold(brain.skill)
        }
        None => {
            brain.wander_timer -= dt;
            if brain.wander_timer <= 0.0 {
                brain.target_yaw =
                    yaw + rng.gen_range(-NPC_WANDER_YAW_OFFSET..NPC_WANDER_YAW_OFFSET);
                brain.target_pitch = (pitch
                    + rng.gen_range(-NPC_WANDER_PITCH_OFFSET..NPC_WANDER_PITCH_OFFSET))
                    .clamp(-NPC_WANDER_PITCH_LIMIT, NPC_WANDER_PITCH_LIMIT);
                brain.wander_timer = random_wander_timer(rng);
            }
            false
        }
    };

    let max_delta = brain.skill * NPC_TURN_RATE;
    let yaw_err = normalize_angle(brain.target_yaw - yaw);
    let pitch_err = brain.target_pitch - pitch;
    let mouse_dx = steer(yaw_err, NPC_YAW_REFERENCE_ANGLE, max_delta);
    let mouse_dy = steer(pitch_err, NPC_PITCH_REFERENCE_ANGLE, max_delta);

    let target_speed = brain.skill * MAX_SPEED * NPC_MAX_SPEED_FACTOR;
    let controls = if speed < target_speed - NPC_SPEED_DEADBAND {
        Controls::THROTTLE
    } else if speed > target_speed + NPC_SPEED_DEADBAND {
        Controls::BRAKE
    } else {
        Controls::default()
    };

    npc.input.set_synthetic(controls, mouse_dx, mouse_dy, fire);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{MAX_HP, NPC_COUNT};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn bot(skill: f32) -> Entity {
        let brain = NpcBrain {
            skill,
            target_yaw: 0.0,
            target_pitch: 0.0,
            wander_timer: 3.0,
        };
        Entity::new("npc-1", "Bot 1", Team::Red, EntityKind::Npc(brain))
    }

    fn view(id: &str, position: Vec3, hp: u8, team: Team) -> TargetView {
        TargetView {
            id: id.to_string(),
            position,
            hp,
            team,
        }
    }

    #[test]
    fn roster_alternates_teams_with_stable_ids() {
        let npcs = create_all_npcs(NPC_COUNT, &mut rng());
        assert_eq!(npcs.len(), 75);
        assert_eq!(npcs[0].id, "npc-1");
        assert_eq!(npcs[0].team, Team::Red);
        assert_eq!(npcs[1].team, Team::Green);
        assert_eq!(npcs[74].id, "npc-75");
        for npc in &npcs {
            let brain = npc.brain().unwrap();
            assert!((NPC_MIN_SKILL..=NPC_MAX_SKILL).contains(&brain.skill));
            assert!(brain.wander_timer >= NPC_WANDER_INTERVAL_MIN);
            assert!(brain.wander_timer <= NPC_WANDER_INTERVAL_MAX);
            assert_eq!(npc.hp, MAX_HP);
            assert_eq!(npc.speed, 0.0);
        }
    }

    #[test]
    fn nearest_target_filters_self_dead_friendly_and_range() {
        let npc = bot(0.5);
        let candidates = vec![
            view("npc-1", Vec3::new(0.0, 0.0, -10.0), MAX_HP, Team::Green),
            view("dead", Vec3::new(0.0, 0.0, -10.0), 0, Team::Green),
            view("friend", Vec3::new(0.0, 0.0, -10.0), MAX_HP, Team::Red),
            view("too-close", Vec3::new(0.0, 0.0, -4.9), MAX_HP, Team::Green),
            view("too-far", Vec3::new(0.0, 0.0, -50.1), MAX_HP, Team::Green),
        ];
        assert!(find_nearest_target(&npc, &candidates).is_none());
    }

    #[test]
    fn nearest_target_picks_closest_valid_enemy() {
        let npc = bot(0.5);
        let candidates = vec![
            view("far", Vec3::new(0.0, 0.0, -40.0), MAX_HP, Team::Green),
            view("near", Vec3::new(20.0, 0.0, 0.0), MAX_HP, Team::Green),
            view("edge", Vec3::new(0.0, 50.0, 0.0), MAX_HP, Team::Green),
        ];
        let target = find_nearest_target(&npc, &candidates).unwrap();
        assert_eq!(target.id, "near");
    }

    #[test]
    fn range_boundaries_are_inclusive() {
        let npc = bot(0.5);
        let min = [view("min", Vec3::new(0.0, 0.0, -5.0), MAX_HP, Team::Green)];
        let max = [view("max", Vec3::new(0.0, 0.0, -50.0), MAX_HP, Team::Green)];
        assert!(find_nearest_target(&npc, &min).is_some());
        assert!(find_nearest_target(&npc, &max).is_some());
    }

    #[test]
    fn fires_when_aimed_and_resets_wander_timer() {
        let mut npc = bot(0.5);
        let ahead = [view("p1", Vec3::new(0.0, 0.0, -20.0), MAX_HP, Team::Green)];

        update_npc_ai(&mut npc, 1.0 / 60.0, &ahead, &mut rng());

        assert_eq!(npc.brain().unwrap().wander_timer, 0.0);
        assert!(npc.input.drain().fire);
    }

    #[test]
    fn holds_fire_when_off_target() {
        let mut npc = bot(0.5);
        // Directly behind: yaw error is pi
        let behind = [view("p1", Vec3::new(0.0, 0.0, 20.0), MAX_HP, Team::Green)];

        update_npc_ai(&mut npc, 1.0 / 60.0, &behind, &mut rng());

        let input = npc.input.drain();
        assert!(!input.fire);
        // Turning is capped by skill
        assert!(input.mouse_dx.abs() <= 0.5 * NPC_TURN_RATE + 1e-3);
    }

    #[test]
    fn skilled_bots_demand_tighter_aim() {
        assert!((aim_threshold(1.0) - NPC_AIM_THRESHOLD_MIN).abs() < 1e-6);
        assert!((aim_threshold(0.0) - NPC_AIM_THRESHOLD_MAX).abs() < 1e-6);

        // 0.2 rad off: a sloppy bot shoots, an ace waits
        let offset = Vec3::new(-(0.2f32.sin()) * 20.0, 0.0, -(0.2f32.cos()) * 20.0);
        let target = [view("p1", offset, MAX_HP, Team::Green)];

        let mut sloppy = bot(0.3);
        update_npc_ai(&mut sloppy, 1.0 / 60.0, &target, &mut rng());
        assert!(sloppy.input.drain().fire);

        let mut ace = bot(1.0);
        update_npc_ai(&mut ace, 1.0 / 60.0, &target, &mut rng());
        assert!(!ace.input.drain().fire);
    }

    #[test]
    fn wander_never_fires_and_rerolls_heading_on_timer() {
        let mut npc = bot(0.5);
        npc.brain_mut().unwrap().wander_timer = 0.01;

        update_npc_ai(&mut npc, 1.0 / 60.0, &[], &mut rng());

        let brain = npc.brain().unwrap();
        assert!(brain.wander_timer >= NPC_WANDER_INTERVAL_MIN);
        assert!(brain.target_pitch.abs() <= NPC_WANDER_PITCH_LIMIT);
        assert!(!npc.input.drain().fire);
    }

    #[test]
    fn small_errors_steer_proportionally() {
        let mut npc = bot(1.0);
        {
            let brain = npc.brain_mut().unwrap();
            brain.target_yaw = 0.1;
            brain.target_pitch = 0.1;
        }

        update_npc_ai(&mut npc, 1.0 / 60.0, &[], &mut rng());

        let max_delta = NPC_TURN_RATE;
        let expected_dx = (-0.1f32 / MOUSE_SENSITIVITY).clamp(-max_delta, max_delta)
            * (0.1 / NPC_YAW_REFERENCE_ANGLE);
        let expected_dy = (-0.1f32 / MOUSE_SENSITIVITY).clamp(-max_delta, max_delta)
            * (0.1 / NPC_PITCH_REFERENCE_ANGLE);
        let input = npc.input.drain();
        assert!((input.mouse_dx - expected_dx).abs() < 1e-3, "{}", input.mouse_dx);
        assert!((input.mouse_dy - expected_dy).abs() < 1e-3, "{}", input.mouse_dy);
    }

    #[test]
    fn large_errors_are_capped_by_skill() {
        assert!((steer(2.0, NPC_YAW_REFERENCE_ANGLE, 200.0) + 200.0).abs() < 1e-4);
        assert!((steer(-2.0, NPC_PITCH_REFERENCE_ANGLE, 200.0) - 200.0).abs() < 1e-4);
    }

    #[test]
    fn wander_heading_holds_until_timer_expires() {
        let mut npc = bot(0.5);
        {
            let brain = npc.brain_mut().unwrap();
            brain.target_yaw = 0.7;
            brain.target_pitch = -0.2;
            brain.wander_timer = 1.0;
        }

        let mut rng = rng();
        for _ in 0..30 {
            update_npc_ai(&mut npc, 1.0 / 60.0, &[], &mut rng);
            npc.input.drain();
        }

        let brain = npc.brain().unwrap();
        assert_eq!(brain.target_yaw, 0.7);
        assert_eq!(brain.target_pitch, -0.2);
        assert!((brain.wander_timer - 0.5).abs() < 1e-3);
    }

    #[test]
    fn speed_control_uses_deadband() {
        let skill = 0.6;
        let target_speed = skill * MAX_SPEED * NPC_MAX_SPEED_FACTOR;

        let mut slow = bot(skill);
        update_npc_ai(&mut slow, 1.0 / 60.0, &[], &mut rng());
        assert_eq!(slow.input.drain().controls, Controls::THROTTLE);

        let mut fast = bot(skill);
        fast.speed = target_speed + 1.0;
        update_npc_ai(&mut fast, 1.0 / 60.0, &[], &mut rng());
        assert_eq!(fast.input.drain().controls, Controls::BRAKE);

        let mut cruising = bot(skill);
        cruising.speed = target_speed + 0.05;
        update_npc_ai(&mut cruising, 1.0 / 60.0, &[], &mut rng());
        assert_eq!(cruising.input.drain().controls, Controls::default());
    }

    #[test]
    fn players_are_left_alone() {
        let mut player = Entity::new("p1", "Pilot 1", Team::Green, EntityKind::Player);
        let enemy = [view("npc-2", Vec3::new(0.0, 0.0, -20.0), MAX_HP, Team::Red)];
        update_npc_ai(&mut player, 1.0 / 60.0, &enemy, &mut rng());
        assert_eq!(player.input.drain(), Default::default());
    }
}
