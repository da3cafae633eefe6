use log::{debug, info};
use shared::{GameState, Role, ServerPacket};

/// What the client currently knows about the game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientView {
    pub role: Option<Role>,
    pub state: Option<GameState>,
    /// Snapshots received on the current connection.
    pub snapshots: u64,
}

impl ClientView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, packet: ServerPacket) {
        match packet {
            ServerPacket::RoleAssignment { role } => {
                info!("Assigned role: {}", role);
                self.role = Some(role);
            }
            ServerPacket::GameState { state } => {
                if let Some(previous) = &self.state {
                    if previous.score != state.score {
                        info!("Score: {}-{}", state.score.left, state.score.right);
                    }
                }
                self.state = Some(state);
                self.snapshots += 1;
            }
        }
    }

    /// Forgets the role and snapshot of a connection that has ended. The
    /// next connection may be given a different role.
    pub fn reset(&mut self) {
        debug!("Clearing view after {} snapshots", self.snapshots);
        *self = Self::default();
    }
}
