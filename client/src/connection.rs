//! Reconnect state machine for the client connection.
//!
//! A dropped or refused connection always waits the same fixed delay before
//! the next attempt. There is no backoff growth and no retry limit.

use log::info;
use std::time::{Duration, Instant};

/// Delay between losing a connection and trying again.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug)]
pub struct ConnectionMachine {
    state: ConnectionState,
    retry_delay: Duration,
    disconnected_at: Option<Instant>,
    attempts: u32,
}

impl ConnectionMachine {
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            retry_delay,
            disconnected_at: None,
            attempts: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection attempts made so far, successful or not.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// How long to wait before [`begin_connect`](Self::begin_connect) will
    /// succeed. Zero for the very first attempt.
    pub fn time_until_retry(&self, now: Instant) -> Duration {
        match (self.state, self.disconnected_at) {
            (ConnectionState::Disconnected, Some(at)) => {
                self.retry_delay.saturating_sub(now.saturating_duration_since(at))
            }
            _ => Duration::ZERO,
        }
    }

    /// Disconnected → Connecting, once the retry delay has passed.
    pub fn begin_connect(&mut self, now: Instant) -> bool {
        if self.state != ConnectionState::Disconnected || !self.time_until_retry(now).is_zero() {
            return false;
        }
        self.state = ConnectionState::Connecting;
        self.attempts += 1;
        true
    }

    /// Connecting → Connected.
    pub fn on_connected(&mut self) {
        if self.state == ConnectionState::Connecting {
            info!("Connected after {} attempt(s)", self.attempts);
            self.state = ConnectionState::Connected;
        }
    }

    /// A failed attempt or a closed connection: back to Disconnected and
    /// start the retry delay.
    pub fn on_closed(&mut self, now: Instant) {
        self.state = ConnectionState::Disconnected;
        self.disconnected_at = Some(now);
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new(RECONNECT_DELAY)
    }
}
