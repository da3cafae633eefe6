use crate::connection::{ConnectionMachine, ConnectionState};
use crate::game::ClientView;
use crate::input::Autopilot;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{GameConfig, ServerPacket};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Headless game client.
///
/// Keeps a connection to the server open (reconnecting after a fixed delay
/// whenever it drops), publishes every snapshot it receives, and optionally
/// steers its paddle with an [`Autopilot`].
pub struct Client {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:3000/ws`
    url: String,
    /// Geometry used to turn snapshots into paddle targets
    config: GameConfig,
    /// Reconnect state and retry timing
    machine: ConnectionMachine,
    /// Present only when the client steers its own paddle
    autopilot: Option<Autopilot>,
    /// Publishes the latest role and snapshot to subscribers
    view_tx: watch::Sender<ClientView>,
}

impl Client {
    pub fn new(url: &str, autopilot: bool) -> Self {
        let (view_tx, _view_rx) = watch::channel(ClientView::new());
        Self {
            url: url.to_string(),
            config: GameConfig::default(),
            machine: ConnectionMachine::default(),
            autopilot: autopilot.then(Autopilot::new),
            view_tx,
        }
    }

    /// Uses a custom reconnect delay instead of the default one.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.machine = ConnectionMachine::new(delay);
        self
    }

    /// Watches the client's view of the game, updated on every packet.
    pub fn subscribe(&self) -> watch::Receiver<ClientView> {
        self.view_tx.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.machine.state()
    }

    fn handle_text(&self, text: &str) {
        match ServerPacket::from_json(text) {
            Ok(packet) => self.view_tx.send_modify(|view| view.apply(packet)),
            Err(e) => warn!("Unreadable message from server: {}", e),
        }
    }

    async fn send_input(&mut self, socket: &mut Socket) -> Result<(), BoxError> {
        let Some(autopilot) = self.autopilot.as_mut() else {
            return Ok(());
        };

        let packet = {
            let view = self.view_tx.borrow();
            autopilot.next_move(view.role, view.state.as_ref(), &self.config)
        };

        if let Some(packet) = packet {
            socket.send(Message::Text(packet.to_json()?)).await?;
        }
        Ok(())
    }

    /// Runs one connection until the server closes it or it fails.
    async fn run_session(&mut self, mut socket: Socket) -> Result<(), BoxError> {
        let period = Duration::from_secs_f64(1.0 / f64::from(self.config.tick_rate.max(1)));
        let mut input_interval = interval(period);
        input_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                message = socket.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => self.handle_text(&text),
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Server closed the connection: {:?}", frame);
                            return Ok(());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => return Err(e.into()),
                        None => return Ok(()),
                    }
                },

                _ = input_interval.tick() => {
                    self.send_input(&mut socket).await?;
                },
            }
        }
    }

    /// Connects and reconnects forever.
    pub async fn run(&mut self) -> Result<(), BoxError> {
        loop {
            let wait = self.machine.time_until_retry(Instant::now());
            if !wait.is_zero() {
                sleep(wait).await;
            }
            if !self.machine.begin_connect(Instant::now()) {
                continue;
            }

            info!("Connecting to {} (attempt {})", self.url, self.machine.attempts());
            match connect_async(self.url.as_str()).await {
                Ok((socket, _response)) => {
                    self.machine.on_connected();
                    if let Err(e) = self.run_session(socket).await {
                        error!("Connection error: {}", e);
                    }
                    info!("Disconnected from server");
                }
                Err(e) => warn!("Connection failed: {}", e),
            }

            self.machine.on_closed(Instant::now());
            self.view_tx.send_modify(ClientView::reset);
            if let Some(autopilot) = self.autopilot.as_mut() {
                autopilot.reset();
            }
        }
    }
}
