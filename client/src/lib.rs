//! # Paddle Game Client Library
//!
//! Headless client for the paddle server's WebSocket protocol. It is used
//! as a bot opponent, a load generator and a spectator log, and it is the
//! reference for how a client should behave on the wire.
//!
//! ## Behavior
//!
//! ### Connection Lifecycle
//! The client moves between `Disconnected`, `Connecting` and `Connected`.
//! Whenever a connection fails or closes it waits a fixed delay (one second
//! by default) and tries again, indefinitely. Role and snapshot are dropped
//! on disconnect because the server may hand out a different role next time.
//!
//! ### Snapshots
//! The server sends a role assignment once, then the full game state every
//! tick. The client keeps only the latest snapshot; there is no prediction
//! or interpolation.
//!
//! ### Input
//! With the autopilot enabled and a paddle role assigned, the client sends
//! `paddleMove` messages that keep its paddle level with the ball.
//!
//! ## Modules
//!
//! - `connection`: reconnect state machine
//! - `game`: the client's view of the game
//! - `input`: autopilot paddle input
//! - `network`: WebSocket session loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), client::network::BoxError> {
//!     let mut client = Client::new("ws://127.0.0.1:3000/ws", true);
//!     client.run().await
//! }
//! ```

pub mod connection;
pub mod game;
pub mod input;
pub mod network;
