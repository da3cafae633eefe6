//! Per-tick physics steps for the paddle game.
//!
//! Each function advances or resolves one aspect of the simulation and is
//! called in a fixed order by [`crate::game::Game::tick`]. Collision
//! detection is plain AABB overlap on the post-translation position, so a
//! ball moving faster than a paddle is wide can pass straight through it.

use shared::{BallState, GameConfig, PaddleState, Side};
use std::f32::consts::PI;

/// Widest deflection off a paddle edge, either side of straight back.
pub const MAX_BOUNCE_ANGLE: f32 = PI / 6.0;

/// Moves a paddle a fixed fraction of the way towards its target, then
/// keeps it on the field.
pub fn ease_paddle(paddle: &mut PaddleState, config: &GameConfig) {
    let diff = paddle.target_y - paddle.y;
    paddle.y += diff * config.damping;
    paddle.y = config.clamp_paddle_y(paddle.y);
}

pub fn translate_ball(ball: &mut BallState) {
    ball.x += ball.vx;
    ball.y += ball.vy;
}

/// Reflects the ball off the top and bottom walls.
///
/// Returns true if the ball touched a wall this tick.
pub fn bounce_off_walls(ball: &mut BallState, config: &GameConfig) -> bool {
    let max_y = config.height - config.ball_size;
    if ball.y <= 0.0 || ball.y >= max_y {
        ball.vy = -ball.vy;
        ball.y = ball.y.clamp(0.0, max_y);
        true
    } else {
        false
    }
}

/// Outgoing angle for an impact at `hit_pos` (0 = paddle top, 1 = bottom).
pub fn bounce_angle(hit_pos: f32) -> f32 {
    (hit_pos.clamp(0.0, 1.0) - 0.5) * 2.0 * MAX_BOUNCE_ANGLE
}

/// Where along the paddle the ball's top edge struck, normalized to 0..1.
fn hit_position(ball: &BallState, paddle: &PaddleState, config: &GameConfig) -> f32 {
    (ball.y - paddle.y) / config.paddle_height
}

fn overlaps_vertically(ball: &BallState, paddle: &PaddleState, config: &GameConfig) -> bool {
    ball.y + config.ball_size >= paddle.y && ball.y <= paddle.y + config.paddle_height
}

/// Sends the ball back off `paddle` at an angle set by where it hit,
/// keeping its speed.
fn deflect(ball: &mut BallState, paddle: &PaddleState, config: &GameConfig, side: Side) {
    let angle = bounce_angle(hit_position(ball, paddle, config));
    let speed = ball.speed();
    let vx = (speed * angle.cos()).abs();

    match side {
        Side::Left => {
            ball.vx = vx;
            ball.x = paddle.x + config.paddle_width + 1.0;
        }
        Side::Right => {
            ball.vx = -vx;
            ball.x = paddle.x - config.ball_size - 1.0;
        }
    }
    ball.vy = speed * angle.sin();
}

/// Resolves a hit on the left paddle. Only a ball moving left can hit it.
pub fn bounce_off_left_paddle(
    ball: &mut BallState,
    paddle: &PaddleState,
    config: &GameConfig,
) -> bool {
    let hit = ball.x <= paddle.x + config.paddle_width
        && ball.x >= paddle.x
        && overlaps_vertically(ball, paddle, config)
        && ball.vx < 0.0;

    if hit {
        deflect(ball, paddle, config, Side::Left);
    }
    hit
}

/// Resolves a hit on the right paddle. Only a ball moving right can hit it.
pub fn bounce_off_right_paddle(
    ball: &mut BallState,
    paddle: &PaddleState,
    config: &GameConfig,
) -> bool {
    let leading_edge = ball.x + config.ball_size;
    let hit = leading_edge >= paddle.x
        && leading_edge <= paddle.x + config.paddle_width
        && overlaps_vertically(ball, paddle, config)
        && ball.vx > 0.0;

    if hit {
        deflect(ball, paddle, config, Side::Right);
    }
    hit
}

/// The side that scores when the ball has left the field, if it has.
pub fn check_goal(ball: &BallState, config: &GameConfig) -> Option<Side> {
    if ball.x < 0.0 {
        Some(Side::Right)
    } else if ball.x > config.width {
        Some(Side::Left)
    } else {
        None
    }
}

/// Rescales the velocity to `max_speed` if it is faster, keeping direction.
pub fn clamp_speed(ball: &mut BallState, max_speed: f32) {
    let speed = ball.speed();
    if speed > max_speed {
        ball.vx = ball.vx / speed * max_speed;
        ball.vy = ball.vy / speed * max_speed;
    }
}
