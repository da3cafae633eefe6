//! Session registry for the paddle server
//!
//! Tracks every live connection and the role it was given:
//! - Role assignment (`left`, then `right`, then `spectator`)
//! - Release of paddle roles on disconnect so the next connection can take them
//! - Outbound delivery, skipping connections whose writer has already closed
//!   and dropping messages for connections that have stopped reading
//!
//! The registry is owned by the server loop, so assignment and release are
//! never interleaved with each other or with a tick.

use log::{debug, info};
use shared::{Role, Side};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Identifier handed to each accepted WebSocket connection.
pub type ConnectionId = u64;

/// Outbound half of a connection: serialized packets for its writer task.
pub type ClientSender = mpsc::Sender<String>;

/// Messages a connection may have queued before new ones are dropped.
/// About two seconds of snapshots at the default tick rate.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 128;

/// Creates the outbound queue for one connection.
pub fn outbound_channel() -> (ClientSender, mpsc::Receiver<String>) {
    mpsc::channel(OUTBOUND_QUEUE_CAPACITY)
}

/// A live connection and the role bound to it
#[derive(Debug)]
pub struct Client {
    /// Unique connection identifier
    pub id: ConnectionId,
    /// Role assigned when the connection was accepted
    pub role: Role,
    /// When the connection was accepted
    pub connected_at: Instant,
    /// Queue drained by the connection's writer task
    sender: ClientSender,
}

impl Client {
    pub fn new(id: ConnectionId, role: Role, sender: ClientSender) -> Self {
        Self {
            id,
            role,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// True while the connection's writer task is still draining messages.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Queues a message for this connection without waiting.
    ///
    /// Returns false without sending if the connection is no longer open or
    /// its queue is full. A full queue means the peer has stopped reading;
    /// the message is dropped and later snapshots supersede it.
    pub fn send(&self, message: &str) -> bool {
        if !self.is_open() {
            return false;
        }
        match self.sender.try_send(message.to_owned()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Outbound queue full for connection {}, dropping message", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Maps each connection to its role and enforces one occupant per paddle.
#[derive(Debug, Default)]
pub struct ClientManager {
    clients: HashMap<ConnectionId, Client>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The connection currently holding `side`'s paddle, if any.
    pub fn occupant(&self, side: Side) -> Option<ConnectionId> {
        let role = side.role();
        self.clients
            .values()
            .find(|client| client.role == role)
            .map(|client| client.id)
    }

    /// The role the next connection would get.
    pub fn assign_role(&self) -> Role {
        if self.occupant(Side::Left).is_none() {
            Role::Left
        } else if self.occupant(Side::Right).is_none() {
            Role::Right
        } else {
            Role::Spectator
        }
    }

    /// Registers a new connection and binds it to the next free role.
    pub fn add_client(&mut self, id: ConnectionId, sender: ClientSender) -> Role {
        let role = self.assign_role();
        self.clients.insert(id, Client::new(id, role, sender));
        info!("Client {} connected as {}", id, role);
        role
    }

    /// Drops a connection, returning the role it held so the caller can
    /// release the matching paddle.
    pub fn remove_client(&mut self, id: ConnectionId) -> Option<Role> {
        let client = self.clients.remove(&id)?;
        info!(
            "Client {} ({}) disconnected after {:.1}s",
            id,
            client.role,
            client.connected_at.elapsed().as_secs_f32()
        );
        Some(client.role)
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.clients.get(&id).map(|client| client.role)
    }

    /// Sends to one connection. Closed or unknown connections are skipped.
    pub fn send_to(&self, id: ConnectionId, message: &str) -> bool {
        match self.clients.get(&id) {
            Some(client) => client.send(message),
            None => false,
        }
    }

    /// Sends the same message to every open connection and returns how many
    /// accepted it.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        for client in self.clients.values() {
            if client.send(message) {
                delivered += 1;
            } else if !client.is_open() {
                debug!("Skipping closed connection {}", client.id);
            }
        }
        delivered
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (ClientSender, mpsc::Receiver<String>) {
        outbound_channel()
    }

    fn drain(rx: &mut mpsc::Receiver<String>) -> usize {
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    #[test]
    fn test_roles_assigned_in_order() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = channel();

        assert_eq!(manager.add_client(1, tx.clone()), Role::Left);
        assert_eq!(manager.add_client(2, tx.clone()), Role::Right);
        assert_eq!(manager.add_client(3, tx.clone()), Role::Spectator);
        assert_eq!(manager.add_client(4, tx), Role::Spectator);
        assert_eq!(manager.len(), 4);
    }

    #[test]
    fn test_freed_left_slot_is_reused() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = channel();

        manager.add_client(1, tx.clone());
        manager.add_client(2, tx.clone());
        manager.add_client(3, tx.clone());

        assert_eq!(manager.remove_client(1), Some(Role::Left));
        assert_eq!(manager.assign_role(), Role::Left);
        assert_eq!(manager.add_client(4, tx), Role::Left);
        assert_eq!(manager.occupant(Side::Left), Some(4));
        assert_eq!(manager.occupant(Side::Right), Some(2));
    }

    #[test]
    fn test_spectator_leaving_frees_nothing() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = channel();

        manager.add_client(1, tx.clone());
        manager.add_client(2, tx.clone());
        manager.add_client(3, tx);

        assert_eq!(manager.remove_client(3), Some(Role::Spectator));
        assert_eq!(manager.assign_role(), Role::Spectator);
    }

    #[test]
    fn test_remove_unknown_client() {
        let mut manager = ClientManager::new();
        assert_eq!(manager.remove_client(42), None);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_paddle_roles_never_shared() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = channel();

        for id in 0..20 {
            manager.add_client(id, tx.clone());
            if id % 3 == 0 {
                manager.remove_client(id / 2);
            }
            let lefts = (0..=id).filter(|i| manager.role_of(*i) == Some(Role::Left));
            let rights = (0..=id).filter(|i| manager.role_of(*i) == Some(Role::Right));
            assert!(lefts.count() <= 1);
            assert!(rights.count() <= 1);
        }
    }

    #[test]
    fn test_send_to_open_connection() {
        let mut manager = ClientManager::new();
        let (tx, mut rx) = channel();
        manager.add_client(1, tx);

        assert!(manager.send_to(1, "hello"));
        assert_eq!(rx.try_recv().unwrap(), "hello");
        assert!(!manager.send_to(99, "nobody"));
    }

    #[test]
    fn test_send_to_closed_connection_is_skipped() {
        let mut manager = ClientManager::new();
        let (tx, rx) = channel();
        manager.add_client(1, tx);
        drop(rx);

        assert!(!manager.send_to(1, "hello"));
    }

    #[test]
    fn test_broadcast_counts_open_connections() {
        let mut manager = ClientManager::new();
        let (tx1, mut rx1) = channel();
        let (tx2, rx2) = channel();
        let (tx3, mut rx3) = channel();
        manager.add_client(1, tx1);
        manager.add_client(2, tx2);
        manager.add_client(3, tx3);
        drop(rx2);

        assert_eq!(manager.broadcast("tick"), 2);
        assert_eq!(rx1.try_recv().unwrap(), "tick");
        assert_eq!(rx3.try_recv().unwrap(), "tick");
    }

    #[test]
    fn test_stalled_reader_queue_stays_bounded() {
        let mut manager = ClientManager::new();
        let (tx, mut rx) = channel();
        manager.add_client(1, tx);

        // Ten minutes of snapshots at 60 ticks/s to a peer that never reads.
        let snapshot = "x".repeat(300);
        let mut delivered = 0;
        for _ in 0..36_000 {
            delivered += manager.broadcast(&snapshot);
        }

        assert_eq!(delivered, OUTBOUND_QUEUE_CAPACITY);
        assert_eq!(drain(&mut rx), OUTBOUND_QUEUE_CAPACITY);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_full_queue_does_not_block_other_connections() {
        let mut manager = ClientManager::new();
        let (stalled_tx, mut stalled_rx) = channel();
        let (tx, mut rx) = channel();
        manager.add_client(1, stalled_tx);
        manager.add_client(2, tx);

        for _ in 0..OUTBOUND_QUEUE_CAPACITY * 3 {
            manager.broadcast("tick");
            drain(&mut rx);
        }

        assert_eq!(manager.broadcast("tick"), 1);
        assert_eq!(rx.try_recv().unwrap(), "tick");
        assert!(!manager.send_to(1, "dropped"));

        // Once the stalled reader catches up, delivery resumes.
        assert_eq!(drain(&mut stalled_rx), OUTBOUND_QUEUE_CAPACITY);
        assert!(manager.send_to(1, "resumed"));
        assert_eq!(stalled_rx.try_recv().unwrap(), "resumed");
    }
}
