//! Fixed-rate tick loop that owns the world

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::util::time::{tick_delta, tick_duration, Timer};
use crate::ws::protocol::{InputMsg, ServerMsg, TeamInfoMsg};

use super::celestial::CelestialBody;
use super::entity::{EntityId, Team};
use super::snapshot::{encode, Frame, SnapshotBuilder};
use super::world::{World, WorldConfig};

const COMMAND_BUFFER: usize = 1024;
const FRAME_BUFFER: usize = 256;

/// Requests from connection tasks, applied at the next tick boundary
#[derive(Debug, Clone)]
pub enum GameCommand {
    /// A socket opened; the player is in the lobby
    Connected { player_id: EntityId },
    JoinTeam {
        player_id: EntityId,
        name: String,
        team: Team,
    },
    Input { player_id: EntityId, msg: InputMsg },
    Disconnected { player_id: EntityId },
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    pub command_tx: mpsc::Sender<GameCommand>,
    pub frames_tx: broadcast::Sender<Frame>,
    pub celestial_bodies: Arc<[CelestialBody]>,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
}

impl ArenaHandle {
    /// Human ships currently in the arena
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    pub fn tick(&self) -> u64 {
        self.tick.load(Ordering::Relaxed)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames_tx.subscribe()
    }
}

/// The authoritative game arena
pub struct GameArena {
    world: World,
    command_rx: mpsc::Receiver<GameCommand>,
    frames_tx: broadcast::Sender<Frame>,
    snapshot_builder: SnapshotBuilder,
    player_count: Arc<AtomicUsize>,
    tick: Arc<AtomicU64>,
    commands_closed: bool,
}

impl GameArena {
    pub fn new(config: WorldConfig) -> (Self, ArenaHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (frames_tx, _) = broadcast::channel(FRAME_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));
        let tick = Arc::new(AtomicU64::new(0));

        let world = World::new(config);
        let handle = ArenaHandle {
            command_tx,
            frames_tx: frames_tx.clone(),
            celestial_bodies: world.bodies.clone().into(),
            player_count: player_count.clone(),
            tick: tick.clone(),
        };

        let arena = Self {
            world,
            command_rx,
            frames_tx,
            snapshot_builder: SnapshotBuilder::new(),
            player_count,
            tick,
            commands_closed: false,
        };

        (arena, handle)
    }

    /// Run the tick loop until every command sender is gone
    pub async fn run(mut self) {
        info!(
            npcs = self.world.entities.len(),
            power_ups = self.world.slots.len(),
            "Arena started"
        );

        let budget = tick_duration();
        let mut tick_interval = interval(budget);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.commands_closed {
            tick_interval.tick().await;

            let timer = Timer::new();
            for frame in self.advance() {
                // No receivers just means nobody is connected
                let _ = self.frames_tx.send(frame);
            }

            if timer.elapsed() > budget {
                warn!(
                    tick = self.world.tick(),
                    elapsed_micros = timer.elapsed_micros(),
                    "Tick overran its budget"
                );
            }
        }

        info!(tick = self.world.tick(), "Arena stopped");
    }

    /// One tick: apply pending commands, step the world, build the frames
    pub fn advance(&mut self) -> Vec<Frame> {
        let roster_changed = self.process_commands();
        let outcome = self.world.step(tick_delta());
        let mut frames = self.snapshot_builder.build(&self.world, &outcome);

        if roster_changed {
            let teams = ServerMsg::TeamInfo(TeamInfoMsg {
                teams: self.world.team_counts(),
            });
            frames.extend(encode(&teams));
        }

        self.player_count
            .store(self.world.human_count(), Ordering::Relaxed);
        self.tick.store(self.world.tick(), Ordering::Relaxed);
        frames
    }

    /// Drain the command queue. Returns whether team counts need resending.
    fn process_commands(&mut self) -> bool {
        let mut roster_changed = false;

        loop {
            let command = match self.command_rx.try_recv() {
                Ok(command) => command,
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.commands_closed = true;
                    break;
                }
            };

            match command {
                GameCommand::Connected { player_id } => {
                    debug!(player_id = %player_id, "Player in lobby");
                    roster_changed = true;
                }
                GameCommand::JoinTeam {
                    player_id,
                    name,
                    team,
                } => match self.world.join(&player_id, &name, team) {
                    Ok(_) => {
                        info!(
                            player_id = %player_id,
                            ?team,
                            players = self.world.human_count(),
                            "Player joined team"
                        );
                        roster_changed = true;
                    }
                    Err(e) => warn!(player_id = %player_id, error = %e, "Join rejected"),
                },
                GameCommand::Input { player_id, msg } => {
                    // Input before joining or after leaving is a no-op
                    if let Err(e) = self.world.apply_input(&player_id, &msg) {
                        debug!(player_id = %player_id, error = %e, "Input dropped");
                    }
                }
                GameCommand::Disconnected { player_id } => {
                    if self.world.disconnect(&player_id) {
                        info!(player_id = %player_id, "Player left arena");
                    }
                    roster_changed = true;
                }
            }
        }

        roster_changed
    }
}
