use shared::{ClientPacket, GameConfig, GameState, Role};

/// Smallest change in normalized position worth sending.
const DEADBAND: f32 = 0.01;

/// Generates paddle input that keeps the paddle centered on the ball.
///
/// Produces the same `paddleMove` messages a pointer-driven client would,
/// in the `-1..1` range the server maps onto the field height.
#[derive(Debug, Default)]
pub struct Autopilot {
    last_sent: Option<f32>,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalized position that puts the paddle's center level with the
    /// ball's center.
    pub fn target_for(state: &GameState, config: &GameConfig) -> f32 {
        let ball_center = state.ball.y + config.ball_size / 2.0;
        let paddle_top = ball_center - config.paddle_height / 2.0;
        (paddle_top / (config.height / 2.0) - 1.0).clamp(-1.0, 1.0)
    }

    /// The next move to send, if the controlled paddle needs a new target.
    /// Spectators never move anything.
    pub fn next_move(
        &mut self,
        role: Option<Role>,
        state: Option<&GameState>,
        config: &GameConfig,
    ) -> Option<ClientPacket> {
        if role?.side().is_none() {
            return None;
        }
        let y = Self::target_for(state?, config);

        if let Some(last) = self.last_sent {
            if (last - y).abs() < DEADBAND {
                return None;
            }
        }
        self.last_sent = Some(y);
        Some(ClientPacket::PaddleMove { y })
    }

    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
