//! Wire protocol and data model shared by the paddle server and its clients.
//!
//! Every type here serializes to the JSON shape the browser clients expect:
//! camelCase field names and a `type` tag on each packet.

use serde::{Deserialize, Serialize};

/// Geometry and tuning of a single game instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameConfig {
    /// Playfield width in pixels
    pub width: f32,
    /// Playfield height in pixels
    pub height: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Gap between a side wall and the outer face of its paddle.
    pub paddle_margin: f32,
    /// Side length of the square ball
    pub ball_size: f32,
    /// Speed given to the ball on every reset.
    pub ball_speed: f32,
    /// Fraction of the remaining distance a paddle covers per tick.
    pub damping: f32,
    /// Ball speed cap as a multiple of `ball_speed`.
    pub max_speed_factor: f32,
    /// Simulation steps per second
    pub tick_rate: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 400.0,
            paddle_width: 15.0,
            paddle_height: 80.0,
            paddle_margin: 20.0,
            ball_size: 10.0,
            ball_speed: 5.0,
            damping: 0.3,
            max_speed_factor: 2.0,
            tick_rate: 60,
        }
    }
}

impl GameConfig {
    pub fn max_speed(&self) -> f32 {
        self.ball_speed * self.max_speed_factor
    }

    /// Lowest valid paddle `y` (paddles are anchored at their top edge).
    pub fn paddle_max_y(&self) -> f32 {
        self.height - self.paddle_height
    }

    pub fn paddle_center_y(&self) -> f32 {
        self.height / 2.0 - self.paddle_height / 2.0
    }

    pub fn paddle_x(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.paddle_margin,
            Side::Right => self.width - self.paddle_margin - self.paddle_width,
        }
    }

    pub fn clamp_paddle_y(&self, y: f32) -> f32 {
        y.clamp(0.0, self.paddle_max_y())
    }
}

/// Control authority a connection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Left,
    Right,
    Spectator,
}

impl Role {
    /// The paddle this role controls, if any.
    pub fn side(self) -> Option<Side> {
        match self {
            Role::Left => Some(Side::Left),
            Role::Right => Some(Side::Right),
            Role::Spectator => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Left => "left",
            Role::Right => "right",
            Role::Spectator => "spectator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn role(self) -> Role {
        match self {
            Side::Left => Role::Left,
            Side::Right => Role::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddleState {
    /// Left edge, fixed for the paddle's side
    pub x: f32,
    /// Top edge, eased toward `target_y` every tick
    pub y: f32,
    /// Position requested by the controlling connection
    pub target_y: f32,
    /// Whether a connection currently holds this paddle
    pub connected: bool,
}

impl PaddleState {
    /// A paddle resting at the vertical center of its side.
    pub fn centered(config: &GameConfig, side: Side) -> Self {
        let y = config.paddle_center_y();
        Self {
            x: config.paddle_x(side),
            y,
            target_y: y,
            connected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallState {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl BallState {
    pub fn speed(&self) -> f32 {
        (self.vx * self.vx + self.vy * self.vy).sqrt()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Players {
    pub left: PaddleState,
    pub right: PaddleState,
}

impl Players {
    pub fn get(&self, side: Side) -> &PaddleState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut PaddleState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

/// The authoritative snapshot broadcast every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub players: Players,
    pub ball: BallState,
    pub score: Score,
    pub game_running: bool,
}

impl GameState {
    /// Paddles centered, ball at rest in the middle of the field.
    ///
    /// The server serves its first ball from here, so the velocity is left
    /// at zero for the caller to randomize.
    pub fn new(config: &GameConfig) -> Self {
        Self {
            players: Players {
                left: PaddleState::centered(config, Side::Left),
                right: PaddleState::centered(config, Side::Right),
            },
            ball: BallState {
                x: config.width / 2.0,
                y: config.height / 2.0,
                vx: 0.0,
                vy: 0.0,
            },
            score: Score::default(),
            game_running: true,
        }
    }
}

/// Server → client messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerPacket {
    RoleAssignment { role: Role },
    GameState { state: GameState },
}

/// Client → server messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientPacket {
    /// Normalized pointer position, `-1` top to `1` bottom.
    PaddleMove { y: f32 },
    Restart,
}

impl ServerPacket {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl ClientPacket {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
