//! # Paddle Game Server Library
//!
//! Authoritative server for a two-player paddle-and-ball game. It owns the
//! one shared game instance, accepts paddle input from the two players,
//! and streams the full game state to every connected viewer each tick.
//!
//! ## Architecture
//!
//! ### Single Writer
//! All mutable state (the [`game::Game`] and the
//! [`client_manager::ClientManager`]) lives inside one server loop. WebSocket
//! tasks only decode frames and forward them over a channel, so connection
//! events, inputs and ticks are applied strictly one after another.
//!
//! ### Fixed Tick
//! The loop advances physics at a fixed rate (60 Hz by default) regardless
//! of how many clients are connected or how much input arrives. Inputs only
//! store a target; paddles ease towards it on the following ticks.
//!
//! ### Full Snapshots
//! Every tick the complete state is serialized once and sent to each open
//! connection. There is no delta compression or interest filtering.
//!
//! ## Modules
//!
//! - `physics`: pure per-tick steps (paddle easing, ball movement, wall and
//!   paddle bounces, goals, speed cap)
//! - `game`: the game instance, ball serves and paddle ownership
//! - `client_manager`: connection registry and role assignment
//! - `network`: HTTP/WebSocket front end and the tick loop
//! - `config`: startup settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), server::network::BoxError> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod physics;
