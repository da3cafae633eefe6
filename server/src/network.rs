//! Server network layer: WebSocket sessions, static assets and the tick loop

use crate::client_manager::{outbound_channel, ClientManager, ClientSender, ConnectionId};
use crate::config::ServerConfig;
use crate::game::Game;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientPacket, ServerPacket};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tower_http::services::ServeDir;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Messages sent from connection tasks to the server loop
#[derive(Debug)]
pub enum ServerMessage {
    Connected {
        id: ConnectionId,
        sender: ClientSender,
    },
    PacketReceived {
        id: ConnectionId,
        packet: ClientPacket,
    },
    Disconnected {
        id: ConnectionId,
    },
}

/// Handles shared with every HTTP/WebSocket handler
#[derive(Clone)]
struct AppState {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    next_id: Arc<AtomicU64>,
}

/// Authoritative game server.
///
/// The server loop is the only owner of the game and the session registry:
/// connection events and ticks are handled one at a time, so a tick never
/// observes a half-applied connect, disconnect or input.
pub struct Server {
    listener: Option<TcpListener>,
    config: ServerConfig,
    clients: ClientManager,
    game: Game,
    tick: u64,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, BoxError> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            game: Game::new(config.game),
            config,
            clients: ClientManager::new(),
            tick: 0,
            server_tx,
            server_rx,
        })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, BoxError> {
        match &self.listener {
            Some(listener) => Ok(listener.local_addr()?),
            None => Err("server listener already handed to the HTTP task".into()),
        }
    }

    fn router(&self) -> Router {
        let state = AppState {
            server_tx: self.server_tx.clone(),
            next_id: Arc::new(AtomicU64::new(1)),
        };

        Router::new()
            .route("/ws", get(ws_handler))
            .fallback_service(ServeDir::new(&self.config.static_dir))
            .with_state(state)
    }

    fn send_packet(&self, id: ConnectionId, packet: &ServerPacket) {
        if let Some(text) = encode_packet(packet) {
            if !self.clients.send_to(id, &text) {
                debug!("Connection {} closed before {:?} could be sent", id, packet);
            }
        }
    }

    fn handle_message(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::Connected { id, sender } => self.handle_connect(id, sender),
            ServerMessage::PacketReceived { id, packet } => self.handle_packet(id, packet),
            ServerMessage::Disconnected { id } => self.handle_disconnect(id),
        }
    }

    /// Binds a role, claims its paddle, then sends the role and a snapshot.
    fn handle_connect(&mut self, id: ConnectionId, sender: ClientSender) {
        let role = self.clients.add_client(id, sender);
        if let Some(side) = role.side() {
            self.game.connect_paddle(side);
        }

        self.send_packet(id, &ServerPacket::RoleAssignment { role });
        self.send_packet(
            id,
            &ServerPacket::GameState {
                state: self.game.state.clone(),
            },
        );
    }

    fn handle_packet(&mut self, id: ConnectionId, packet: ClientPacket) {
        let Some(role) = self.clients.role_of(id) else {
            warn!("Packet from unknown connection {}", id);
            return;
        };

        match packet {
            ClientPacket::PaddleMove { y } => match role.side() {
                Some(side) => self.game.set_paddle_target(side, y),
                None => debug!("Ignoring paddle move from spectator {}", id),
            },
            ClientPacket::Restart => {
                info!("Client {} ({}) restarted the ball", id, role);
                self.game.reset_ball();
            }
        }
    }

    fn handle_disconnect(&mut self, id: ConnectionId) {
        if let Some(side) = self.clients.remove_client(id).and_then(|role| role.side()) {
            self.game.disconnect_paddle(side);
        }
    }

    /// Broadcasts the full current state to every open connection
    fn broadcast_game_state(&self) {
        if self.clients.is_empty() {
            return;
        }

        let packet = ServerPacket::GameState {
            state: self.game.state.clone(),
        };
        if let Some(text) = encode_packet(&packet) {
            self.clients.broadcast(&text);
        }
    }

    fn on_tick(&mut self) {
        self.game.tick();
        self.tick += 1;
        self.broadcast_game_state();

        let tick_rate = u64::from(self.config.game.tick_rate.max(1));
        if self.tick % tick_rate == 0 && !self.clients.is_empty() {
            let score = &self.game.state.score;
            debug!(
                "Tick {}: {} clients, score {}-{}",
                self.tick,
                self.clients.len(),
                score.left,
                score.right
            );
        }
    }

    /// Serves HTTP and WebSocket traffic and runs the fixed-rate tick loop
    /// until the HTTP task stops.
    pub async fn run(mut self) -> Result<(), BoxError> {
        let listener = self
            .listener
            .take()
            .ok_or("server is already running")?;
        let app = self.router();
        let mut http = tokio::spawn(async move { axum::serve(listener, app).await });

        let tick_rate = self.config.game.tick_rate.max(1);
        let mut tick_interval = interval(Duration::from_secs_f64(1.0 / f64::from(tick_rate)));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started at {} ticks/s", tick_rate);

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => self.on_tick(),

                result = &mut http => {
                    match result {
                        Ok(Ok(())) => info!("HTTP server stopped"),
                        Ok(Err(e)) => error!("HTTP server error: {}", e),
                        Err(e) => error!("HTTP task failed: {}", e),
                    }
                    break;
                }
            }
        }

        Ok(())
    }
}

fn encode_packet(packet: &ServerPacket) -> Option<String> {
    match packet.to_json() {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to encode packet: {}", e);
            None
        }
    }
}

/// Decodes one inbound frame. Malformed payloads are logged and dropped
/// without affecting the connection.
fn decode_packet(id: ConnectionId, text: &str) -> Option<ClientPacket> {
    match ClientPacket::from_json(text) {
        Ok(packet) => Some(packet),
        Err(e) => {
            warn!("Malformed message from connection {}: {}", id, e);
            None
        }
    }
}

/// Decodes a text or binary frame carrying JSON. Control frames carry no
/// packet.
fn decode_message(id: ConnectionId, message: &Message) -> Option<ClientPacket> {
    match message {
        Message::Text(text) => decode_packet(id, text),
        Message::Binary(data) => match std::str::from_utf8(data) {
            Ok(text) => decode_packet(id, text),
            Err(e) => {
                warn!("Non UTF-8 frame from connection {}: {}", id, e);
                None
            }
        },
        _ => None,
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one connection: a writer draining the registry's channel and a
/// reader forwarding decoded packets, until either side ends.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (client_tx, mut client_rx) = outbound_channel();

    if state
        .server_tx
        .send(ServerMessage::Connected {
            id,
            sender: client_tx,
        })
        .is_err()
    {
        warn!("Server loop is gone, dropping connection {}", id);
        return;
    }

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = client_rx.recv().await {
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let server_tx = state.server_tx.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = ws_rx.next().await {
            let packet = match result {
                Ok(Message::Close(_)) => break,
                Ok(message) => decode_message(id, &message),
                Err(e) => {
                    debug!("Connection {} read error: {}", id, e);
                    break;
                }
            };

            if let Some(packet) = packet {
                if server_tx
                    .send(ServerMessage::PacketReceived { id, packet })
                    .is_err()
                {
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let _ = state.server_tx.send(ServerMessage::Disconnected { id });
}
