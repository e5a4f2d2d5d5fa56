//! The game loop
//!
//! One iteration (`step`):
//! 1. sample the clock
//! 2. let the active state request a transition
//! 3. interpret input
//! 4. advance the simulation if the loop timer fired (skipped while paused)
//! 5. render, then drop the per-tick input latches
//!
//! `run` repeats `step` and sleeps off the rest of each frame.

use std::time::Duration;

use super::context::GameContext;
use super::states::{GameMachine, StateId, catalog};
use crate::interface::Renderer;
use crate::machine::{MachineError, StateMachine};

pub struct GameLoop {
    pub ctx: GameContext,
    machine: GameMachine,
    renderer: Box<dyn Renderer>,
}

impl GameLoop {
    /// Build the state catalog and enter `initial`
    pub fn new(
        mut ctx: GameContext,
        initial: StateId,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, MachineError> {
        let machine = StateMachine::new(initial, catalog(), &mut ctx)?;
        Ok(Self {
            ctx,
            machine,
            renderer,
        })
    }

    pub fn state(&self) -> StateId {
        self.machine.current_state()
    }

    pub fn last_state(&self) -> StateId {
        self.machine.last_state()
    }

    /// Run a single loop iteration
    pub fn step(&mut self) -> Result<(), MachineError> {
        let ctx = &mut self.ctx;
        ctx.clock.update();

        self.machine.update_states(ctx)?;
        self.machine.state_events(ctx);

        if ctx.paused {
            ctx.loop_timer.freeze(&ctx.clock);
            // Suspended screens freeze the bonus themselves
            if !ctx.suspended {
                ctx.bonus.freeze(&ctx.clock);
            }
        } else if ctx.loop_timer.poll(&ctx.clock) {
            self.machine.state_logic(ctx);
        }

        self.machine.state_render(ctx, self.renderer.as_mut());
        ctx.input.clear();
        Ok(())
    }

    /// Loop until a state clears `running`.
    ///
    /// `host` runs at the top of every iteration to feed input and HUD
    /// state into the context.
    pub fn run<F>(&mut self, mut host: F) -> Result<(), MachineError>
    where
        F: FnMut(&mut GameContext),
    {
        log::info!("Loop started in {}", self.state());
        while self.ctx.running {
            host(&mut self.ctx);
            self.step()?;

            let sleep = self.ctx.clock.leftover(self.ctx.settings.fps);
            if sleep > 0 {
                std::thread::sleep(Duration::from_millis(sleep));
            }
        }
        log::info!("Loop stopped in {}", self.state());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{Action, Button, Group, NullRenderer, RecordingHud};
    use crate::settings::{Settings, SpeedMapping};
    use crate::sim::{APPLE, Direction, Field, Snake};
    use crate::time::{Clock, ManualTime};
    use glam::IVec2;

    /// 10x10 field, fixed 250 ms move delay, no random bonus
    fn settings() -> Settings {
        Settings {
            field_width: 10,
            field_height: 10,
            bonus_chance: 0.0,
            speed_mapping: SpeedMapping {
                slowest_delay_ms: 250.0,
                fastest_delay_ms: 250.0,
                ..Default::default()
            },
            intro_ms: 500.0,
            fps: 1000,
            seed: Some(11),
            ..Default::default()
        }
    }

    struct Harness {
        time: ManualTime,
        hud: RecordingHud,
        game: GameLoop,
    }

    impl Harness {
        fn new(settings: Settings, initial: StateId) -> Self {
            let time = ManualTime::new(0.0);
            let hud = RecordingHud::new();
            let ctx = GameContext::new(settings, Clock::manual(&time), Box::new(hud.clone()));
            let game = GameLoop::new(ctx, initial, Box::new(NullRenderer)).unwrap();
            Self { time, hud, game }
        }

        fn step_ms(&mut self, millis: u64) {
            self.time.advance_ms(millis);
            self.game.step().unwrap();
        }

        fn click(&mut self, button: Button) {
            self.game.ctx.input.click(button);
            self.step_ms(0);
        }

        fn press(&mut self, action: Action) {
            self.game.ctx.input.press(action);
            self.step_ms(0);
            self.game.ctx.input.release(action);
        }

        /// Start a run and replace the random spawn with a known layout:
        /// snake in row 0 heading right, apple in the far corner
        fn enter_game(&mut self) {
            self.game.ctx.input.press_unbound();
            self.step_ms(0);
            assert_eq!(self.game.state(), StateId::Game);

            let ctx = &mut self.game.ctx;
            ctx.field.clear();
            ctx.snake = Snake::new(&mut ctx.field, IVec2::new(3, 0), Direction::Right, 3);
            ctx.apple.position = IVec2::new(9, 9);
            ctx.field.set(ctx.apple.position, APPLE);
        }
    }

    #[test]
    fn test_intro_times_out() {
        let mut h = Harness::new(settings(), StateId::Intro);
        h.step_ms(250);
        assert_eq!(h.game.state(), StateId::Intro);
        h.step_ms(250);
        assert_eq!(h.game.state(), StateId::Menu);
        assert!(h.hud.is_visible(Group::Menu));
    }

    #[test]
    fn test_menu_to_game() {
        let mut h = Harness::new(settings(), StateId::Menu);
        h.click(Button::Play);
        assert_eq!(h.game.state(), StateId::Start);
        assert!(h.hud.is_visible(Group::StartGame));
        assert!(!h.hud.is_visible(Group::Menu));

        // Clicks are not key presses
        h.click(Button::Play);
        assert_eq!(h.game.state(), StateId::Start);

        h.enter_game();
        assert!(!h.hud.is_visible(Group::StartGame));
    }

    #[test]
    fn test_snake_moves_once_per_period() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();

        h.step_ms(125);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(3, 0));
        h.step_ms(125);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(4, 0));

        // The pressed direction is queued and committed on the next move
        h.game.ctx.input.press(Action::Down);
        h.step_ms(250);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(4, 1));
    }

    #[test]
    fn test_bonus_expires_in_game() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();

        let ctx = &mut h.game.ctx;
        let mut hud = h.hud.clone();
        ctx.bonus
            .activate(&mut ctx.field, &ctx.clock, &mut hud, &mut ctx.rng)
            .unwrap();
        let placed = ctx.bonus.position;
        ctx.field.set(placed, 0);
        ctx.bonus.position = IVec2::new(5, 5);
        ctx.field.set(ctx.bonus.position, crate::sim::BONUS);

        // Lifetime is 250 ms x (10 + 10)
        for _ in 0..19 {
            h.step_ms(250);
        }
        assert!(h.game.ctx.bonus.active());
        assert!(h.game.ctx.field.value(IVec2::new(5, 5)) < 0);

        h.step_ms(250);
        assert!(!h.game.ctx.bonus.active());
        assert_eq!(h.game.ctx.field.value(IVec2::new(5, 5)), 0);
        assert!(!h.hud.is_visible(Group::Bonus));
        assert_eq!(h.game.state(), StateId::Game);
    }

    #[test]
    fn test_paused_state_freezes_bonus() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();
        let ctx = &mut h.game.ctx;
        let mut hud = h.hud.clone();
        ctx.bonus
            .activate(&mut ctx.field, &ctx.clock, &mut hud, &mut ctx.rng)
            .unwrap();

        h.press(Action::Pause);
        assert_eq!(h.game.state(), StateId::Paused);
        assert!(h.hud.is_visible(Group::Resume));
        let head = h.game.ctx.snake.position;

        for _ in 0..40 {
            h.step_ms(250);
        }
        assert_eq!(h.game.ctx.snake.position, head);
        assert!(h.game.ctx.bonus.active());
        assert_eq!(h.game.ctx.bonus.remaining(&h.game.ctx.clock), 5.0);

        h.click(Button::Continue);
        assert_eq!(h.game.state(), StateId::Game);
        assert!(!h.hud.is_visible(Group::Resume));
    }

    #[test]
    fn test_screens_opened_from_pause_freeze_bonus() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();
        let ctx = &mut h.game.ctx;
        let mut hud = h.hud.clone();
        ctx.bonus
            .activate(&mut ctx.field, &ctx.clock, &mut hud, &mut ctx.rng)
            .unwrap();
        let placed = ctx.bonus.position;
        ctx.field.set(placed, 0);
        ctx.bonus.position = IVec2::new(5, 5);
        ctx.field.set(ctx.bonus.position, crate::sim::BONUS);

        h.press(Action::Pause);
        h.click(Button::Settings);
        assert_eq!(h.game.state(), StateId::Settings);
        for _ in 0..8 {
            h.step_ms(250);
        }
        h.click(Button::Back);
        h.click(Button::Leaderboard);
        h.step_ms(1000);
        h.click(Button::Back);
        assert_eq!(h.game.state(), StateId::Paused);
        assert_eq!(h.game.ctx.bonus.remaining(&h.game.ctx.clock), 5.0);

        h.click(Button::Continue);
        assert_eq!(h.game.state(), StateId::Game);
        assert!(!h.game.ctx.suspended);
        h.step_ms(1000);
        assert_eq!(h.game.ctx.bonus.remaining(&h.game.ctx.clock), 4.0);
    }

    #[test]
    fn test_rapid_taps_in_one_frame_never_reverse() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();

        let input = &mut h.game.ctx.input;
        input.press(Action::Up);
        input.press(Action::Left);
        input.press(Action::Down);
        h.step_ms(250);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(4, 0));
        assert_eq!(h.game.ctx.snake.direction, Direction::Right);

        h.step_ms(250);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(4, 1));
        assert_eq!(h.game.state(), StateId::Game);
    }

    #[test]
    fn test_host_pause_skips_logic() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();

        h.game.ctx.paused = true;
        h.step_ms(1000);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(3, 0));

        // No burst of catch-up moves after resuming
        h.game.ctx.paused = false;
        h.step_ms(250);
        h.step_ms(0);
        assert_eq!(h.game.ctx.snake.position, IVec2::new(4, 0));
    }

    #[test]
    fn test_settings_return_to_caller() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();
        h.press(Action::Exit);
        assert_eq!(h.game.state(), StateId::Paused);

        h.click(Button::Settings);
        assert_eq!(h.game.state(), StateId::Settings);
        h.click(Button::Back);
        assert_eq!(h.game.state(), StateId::Paused);
        assert_eq!(h.game.last_state(), StateId::Settings);

        h.click(Button::Menu);
        assert_eq!(h.game.state(), StateId::Paused);
        h.click(Button::Leaderboard);
        h.click(Button::Back);
        assert_eq!(h.game.state(), StateId::Paused);

        let mut h = Harness::new(settings(), StateId::Menu);
        h.click(Button::KeyConfig);
        assert_eq!(h.game.state(), StateId::KeyConfig);
        h.click(Button::Back);
        assert_eq!(h.game.state(), StateId::Menu);
    }

    #[test]
    fn test_pending_settings_applied_on_restart() {
        let mut h = Harness::new(settings(), StateId::Start);
        h.enter_game();
        h.press(Action::Pause);
        h.click(Button::Settings);
        h.game.ctx.pending_settings.walls = true;
        h.click(Button::Back);
        assert!(!h.game.ctx.walls);

        h.click(Button::Restart);
        assert_eq!(h.game.state(), StateId::Start);
        assert!(h.game.ctx.walls);
    }

    #[test]
    fn test_wall_collision_game_over() {
        let mut s = settings();
        s.walls = true;
        let mut h = Harness::new(s, StateId::Start);
        h.enter_game();
        let ctx = &mut h.game.ctx;
        ctx.field.clear();
        ctx.snake = Snake::new(&mut ctx.field, IVec2::new(9, 0), Direction::Right, 1);

        h.step_ms(250);
        // Transition is picked up on the next iteration
        assert_eq!(h.game.state(), StateId::Game);
        h.step_ms(0);
        assert_eq!(h.game.state(), StateId::GameOver);
        assert!(h.hud.is_visible(Group::GameOver));
        assert!(h.game.ctx.high_scores.is_empty());

        h.click(Button::PlayAgain);
        assert_eq!(h.game.state(), StateId::Start);
    }

    #[test]
    fn test_qualifying_score_records_high_score() {
        let mut s = settings();
        s.walls = true;
        let mut h = Harness::new(s, StateId::Start);
        h.enter_game();
        let ctx = &mut h.game.ctx;
        ctx.field = Field::new(10, 10);
        ctx.snake = Snake::new(&mut ctx.field, IVec2::new(9, 4), Direction::Right, 1);
        ctx.score = 120;

        h.step_ms(250);
        h.step_ms(0);
        assert_eq!(h.game.state(), StateId::NewHighScore);
        assert_eq!(h.game.ctx.high_scores.top_score(), Some(120));
        assert_eq!(h.game.ctx.last_rank, Some(1));

        h.click(Button::Menu);
        assert_eq!(h.game.state(), StateId::Menu);
        assert_eq!(h.game.ctx.score, 0);
    }

    #[test]
    fn test_run_until_outro() {
        let mut h = Harness::new(settings(), StateId::Menu);
        let mut iterations = 0;
        h.game
            .run(|ctx| {
                iterations += 1;
                if iterations == 3 {
                    ctx.input.press(Action::Exit);
                }
            })
            .unwrap();
        assert_eq!(iterations, 3);
        assert_eq!(h.game.state(), StateId::Outro);
        assert!(!h.game.ctx.running);
    }
}
