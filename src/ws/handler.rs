//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{Frame, GameCommand};
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::protocol::{ClientMsg, JoinTeamMsg, ServerMsg, WelcomeMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = state.allocate_player_id();
    let player_name = format!("Pilot {}", player_id);
    info!(player_id = %player_id, "New WebSocket connection");

    let (mut ws_sink, ws_stream) = socket.split();

    let welcome = ServerMsg::Welcome(WelcomeMsg {
        player_id: player_id.clone(),
        player_name: player_name.clone(),
        celestial_bodies: state.arena.celestial_bodies.to_vec(),
    });
    if let Err(e) = send_msg(&mut ws_sink, &welcome).await {
        error!(player_id = %player_id, error = %e, "Failed to send welcome");
        return;
    }

    // Subscribe before announcing so the first TeamInfo reaches us
    let frames_rx = state.arena.subscribe();
    let command_tx = state.arena.command_tx.clone();
    let connected = GameCommand::Connected {
        player_id: player_id.clone(),
    };
    if command_tx.send(connected).await.is_err() {
        error!(player_id = %player_id, "Arena is not running");
        return;
    }

    let session = Session {
        player_id: player_id.clone(),
        player_name,
        rate_limiter: PlayerRateLimiter::new(state.config.input_rate_limit),
        command_tx: command_tx.clone(),
    };
    session.run(ws_sink, ws_stream, frames_rx).await;

    // Removal happens at the next tick boundary
    let _ = command_tx
        .send(GameCommand::Disconnected {
            player_id: player_id.clone(),
        })
        .await;

    info!(player_id = %player_id, "WebSocket connection closed");
}

struct Session {
    player_id: String,
    player_name: String,
    rate_limiter: PlayerRateLimiter,
    command_tx: mpsc::Sender<GameCommand>,
}

impl Session {
    /// Run the WebSocket session with read/write split
    async fn run(
        self,
        mut ws_sink: SplitSink<WebSocket, Message>,
        mut ws_stream: SplitStream<WebSocket>,
        mut frames_rx: broadcast::Receiver<Frame>,
    ) {
        // Spawn writer task: broadcast frames -> WebSocket
        let writer_id = self.player_id.clone();
        let writer_handle = tokio::spawn(async move {
            loop {
                match frames_rx.recv().await {
                    Ok(frame) => {
                        if let Err(e) = ws_sink.send(Message::Text(frame.to_string())).await {
                            debug!(player_id = %writer_id, error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(
                            player_id = %writer_id,
                            lagged_count = n,
                            "Client lagged, skipping {} frames", n
                        );
                        // Continue - don't disconnect for lag
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(player_id = %writer_id, "Frame channel closed");
                        break;
                    }
                }
            }
        });

        // Reader loop: WebSocket -> arena
        while let Some(result) = ws_stream.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if !self.rate_limiter.check_input() {
                        warn!(player_id = %self.player_id, "Rate limited input message");
                        continue;
                    }
                    if !self.forward(&text).await {
                        debug!(player_id = %self.player_id, "Command channel closed");
                        break;
                    }
                }
                Ok(Message::Binary(_)) => {
                    debug!(player_id = %self.player_id, "Received binary message, ignoring");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => {
                    info!(player_id = %self.player_id, "Client initiated close");
                    break;
                }
                Err(e) => {
                    debug!(player_id = %self.player_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }

        writer_handle.abort();
    }

    /// Parse one text frame and hand it to the arena. Malformed frames are
    /// dropped. Returns false once the arena has gone away.
    async fn forward(&self, text: &str) -> bool {
        let command = match serde_json::from_str::<ClientMsg>(text) {
            Ok(ClientMsg::Input(msg)) => GameCommand::Input {
                player_id: self.player_id.clone(),
                msg,
            },
            Ok(ClientMsg::JoinTeam(JoinTeamMsg { team })) => GameCommand::JoinTeam {
                player_id: self.player_id.clone(),
                name: self.player_name.clone(),
                team,
            },
            Err(e) => {
                debug!(player_id = %self.player_id, error = %e, "Failed to parse client message");
                return true;
            }
        };

        self.command_tx.send(command).await.is_ok()
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json)).await.map_err(|e| e.to_string())
}
