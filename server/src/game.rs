use crate::physics;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{GameConfig, GameState, PaddleState, Side};

/// The single authoritative game instance.
///
/// Owns the wire-visible [`GameState`] together with the configuration
/// and random source that drive it. Only the server loop holds one.
#[derive(Debug)]
pub struct Game {
    pub state: GameState,
    config: GameConfig,
    rng: StdRng,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// A game whose ball serves are reproducible.
    pub fn with_seed(config: GameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: GameConfig, rng: StdRng) -> Self {
        let mut game = Self {
            state: GameState::new(&config),
            config,
            rng,
        };
        game.reset_ball();
        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Serves a fresh ball from the center: full base speed horizontally in
    /// a random direction, up to half of it vertically. Scores are kept.
    pub fn reset_ball(&mut self) {
        let speed = self.config.ball_speed;
        let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let ball = &mut self.state.ball;

        ball.x = self.config.width / 2.0;
        ball.y = self.config.height / 2.0;
        ball.vx = speed * direction;
        ball.vy = (self.rng.gen::<f32>() - 0.5) * speed;
    }

    /// Stores a new target for `side` from a normalized `-1..1` position.
    /// The paddle only moves on the following ticks.
    pub fn set_paddle_target(&mut self, side: Side, normalized_y: f32) {
        let target_y = (normalized_y + 1.0) * (self.config.height / 2.0);
        self.state.players.get_mut(side).target_y = self.config.clamp_paddle_y(target_y);
    }

    pub fn connect_paddle(&mut self, side: Side) {
        self.state.players.get_mut(side).connected = true;
    }

    /// Frees `side` for the next connection and parks its paddle at center.
    pub fn disconnect_paddle(&mut self, side: Side) {
        *self.state.players.get_mut(side) = PaddleState::centered(&self.config, side);
    }

    pub fn is_paddle_connected(&self, side: Side) -> bool {
        self.state.players.get(side).connected
    }

    /// Advances the simulation by one tick.
    ///
    /// Returns the side that scored, if any. Does nothing while the game is
    /// not running.
    pub fn tick(&mut self) -> Option<Side> {
        if !self.state.game_running {
            return None;
        }

        let config = self.config;
        let state = &mut self.state;

        for side in Side::BOTH {
            physics::ease_paddle(state.players.get_mut(side), &config);
        }

        let ball = &mut state.ball;
        physics::translate_ball(ball);
        physics::bounce_off_walls(ball, &config);
        physics::bounce_off_left_paddle(ball, &state.players.left, &config);
        physics::bounce_off_right_paddle(ball, &state.players.right, &config);

        let scorer = physics::check_goal(&state.ball, &config);
        if let Some(side) = scorer {
            match side {
                Side::Left => state.score.left += 1,
                Side::Right => state.score.right += 1,
            }
            info!(
                "Point for {:?}! Score: {}-{}",
                side, state.score.left, state.score.right
            );
            self.reset_ball();
        }

        physics::clamp_speed(&mut self.state.ball, config.max_speed());
        scorer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn test_game() -> Game {
        Game::with_seed(GameConfig::default(), 7)
    }

    fn assert_fresh_serve(game: &Game) {
        let ball = &game.state.ball;
        assert_eq!(ball.x, 400.0);
        assert_eq!(ball.y, 200.0);
        assert_eq!(ball.vx.abs(), 5.0);
        assert!((-2.5..=2.5).contains(&ball.vy));
    }

    #[test]
    fn test_new_game_serves_from_center() {
        let game = test_game();
        assert_fresh_serve(&game);
        assert_eq!(game.state.players.left.y, 160.0);
        assert_eq!(game.state.players.right.y, 160.0);
        assert!(game.state.game_running);
    }

    #[test]
    fn test_serves_go_both_ways() {
        let mut game = test_game();
        let mut left = false;
        let mut right = false;
        for _ in 0..64 {
            game.reset_ball();
            assert_fresh_serve(&game);
            if game.state.ball.vx > 0.0 {
                right = true;
            } else {
                left = true;
            }
        }
        assert!(left && right);
    }

    #[test]
    fn test_set_paddle_target_maps_and_clamps() {
        let mut game = test_game();

        game.set_paddle_target(Side::Left, 0.0);
        assert_eq!(game.state.players.left.target_y, 200.0);

        game.set_paddle_target(Side::Left, -1.0);
        assert_eq!(game.state.players.left.target_y, 0.0);

        game.set_paddle_target(Side::Right, 1.0);
        assert_eq!(game.state.players.right.target_y, 320.0);

        game.set_paddle_target(Side::Right, 7.5);
        assert_eq!(game.state.players.right.target_y, 320.0);
    }

    #[test]
    fn test_paddle_move_takes_effect_on_later_ticks() {
        let mut game = test_game();
        game.set_paddle_target(Side::Left, 1.0);
        assert_eq!(game.state.players.left.y, 160.0);

        game.tick();
        let after_one = game.state.players.left.y;
        assert!(after_one > 160.0);
        assert!(after_one < 320.0);

        for _ in 0..60 {
            game.tick();
        }
        assert_approx_eq!(game.state.players.left.y, 320.0, 1e-2);
    }

    #[test]
    fn test_connect_and_disconnect_paddle() {
        let mut game = test_game();
        game.connect_paddle(Side::Right);
        assert!(game.is_paddle_connected(Side::Right));
        assert!(!game.is_paddle_connected(Side::Left));

        game.set_paddle_target(Side::Right, 1.0);
        for _ in 0..10 {
            game.tick();
        }
        assert!(game.state.players.right.y > 160.0);

        game.disconnect_paddle(Side::Right);
        let paddle = &game.state.players.right;
        assert!(!paddle.connected);
        assert_eq!(paddle.y, 160.0);
        assert_eq!(paddle.target_y, 160.0);
        assert_eq!(paddle.x, 765.0);
    }

    #[test]
    fn test_left_scores_when_ball_leaves_right_edge() {
        let mut game = test_game();
        // Move the right paddle out of the ball's path.
        game.state.players.right.y = 0.0;
        game.state.players.right.target_y = 0.0;
        game.state.ball.x = 798.0;
        game.state.ball.y = 300.0;
        game.state.ball.vx = 5.0;
        game.state.ball.vy = 0.0;

        assert_eq!(game.tick(), Some(Side::Left));
        assert_eq!(game.state.score.left, 1);
        assert_eq!(game.state.score.right, 0);
        assert_fresh_serve(&game);
        assert_ne!(game.state.ball.vx, 0.0);
    }

    #[test]
    fn test_right_scores_when_ball_leaves_left_edge() {
        let mut game = test_game();
        game.state.players.left.y = 0.0;
        game.state.players.left.target_y = 0.0;
        game.state.ball.x = 2.0;
        game.state.ball.y = 300.0;
        game.state.ball.vx = -5.0;
        game.state.ball.vy = 0.0;

        assert_eq!(game.tick(), Some(Side::Right));
        assert_eq!(game.state.score.right, 1);
        assert_eq!(game.state.score.left, 0);
    }

    #[test]
    fn test_restart_keeps_score() {
        let mut game = test_game();
        game.state.score.left = 3;
        game.state.score.right = 2;
        game.state.ball.x = 123.0;
        game.state.ball.y = 45.0;

        game.reset_ball();

        assert_eq!(game.state.score.left, 3);
        assert_eq!(game.state.score.right, 2);
        assert_fresh_serve(&game);
    }

    #[test]
    fn test_paused_game_is_frozen() {
        let mut game = test_game();
        game.state.game_running = false;
        game.set_paddle_target(Side::Left, 1.0);
        let before = game.state.clone();

        assert_eq!(game.tick(), None);
        assert_eq!(game.state, before);
    }

    #[test]
    fn test_tick_clamps_ball_speed() {
        let mut game = test_game();
        game.state.ball.x = 400.0;
        game.state.ball.y = 200.0;
        game.state.ball.vx = 30.0;
        game.state.ball.vy = 0.0;

        game.tick();
        assert!(game.state.ball.speed() <= game.config().max_speed() + 1e-4);
    }

    #[test]
    fn test_invariants_hold_over_long_run() {
        let mut game = test_game();
        let config = *game.config();
        for i in 0..5_000 {
            if i % 90 == 0 {
                let y = ((i / 90) as f32 * 0.37).sin() * 1.2;
                game.set_paddle_target(Side::Left, y);
                game.set_paddle_target(Side::Right, -y);
            }
            game.tick();
            for side in Side::BOTH {
                let y = game.state.players.get(side).y;
                assert!((0.0..=config.paddle_max_y()).contains(&y));
            }
            assert!(game.state.ball.speed() <= config.max_speed() + 1e-4);
        }
    }
}
