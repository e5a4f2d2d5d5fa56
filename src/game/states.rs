//! Screen and mode catalog
//!
//! ```text
//! Intro -> Menu -> Start -> Game -> GameOver | NewHighScore
//!                    ^        |  ^
//!                    |        v  |
//!                    +----- Paused
//! Menu/Paused -> Settings | KeyConfig | Leaderboard -> back to caller
//! Menu/Paused -> Outro (stops the loop)
//! ```

use std::fmt;

use super::context::{GameContext, walls_text};
use super::tick::tick;
use crate::interface::{Action, Button, Group, Label, Renderer};
use crate::machine::{State, StateMachine, Transition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Intro,
    Menu,
    Start,
    Game,
    GameOver,
    NewHighScore,
    Paused,
    Settings,
    KeyConfig,
    Leaderboard,
    Outro,
}

impl StateId {
    pub const ALL: [StateId; 11] = [
        StateId::Intro,
        StateId::Menu,
        StateId::Start,
        StateId::Game,
        StateId::GameOver,
        StateId::NewHighScore,
        StateId::Paused,
        StateId::Settings,
        StateId::KeyConfig,
        StateId::Leaderboard,
        StateId::Outro,
    ];

    /// Display name
    pub fn as_str(self) -> &'static str {
        match self {
            StateId::Intro => "Intro",
            StateId::Menu => "Menu",
            StateId::Start => "Start",
            StateId::Game => "Game",
            StateId::GameOver => "Game over",
            StateId::NewHighScore => "New high score",
            StateId::Paused => "Paused",
            StateId::Settings => "Settings",
            StateId::KeyConfig => "Key config",
            StateId::Leaderboard => "High scores",
            StateId::Outro => "Outro",
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type GameMachine = StateMachine<StateId, GameContext>;
type BoxedState = Box<dyn State<StateId, GameContext>>;

/// Every state of the game, ready to hand to `StateMachine::new`
pub fn catalog() -> Vec<BoxedState> {
    vec![
        Box::new(Intro),
        Box::new(Menu),
        Box::new(Start),
        Box::new(Game::default()),
        Box::new(GameOver),
        Box::new(NewHighScore),
        Box::new(Paused),
        Box::new(Settings),
        Box::new(KeyConfig),
        Box::new(Leaderboard),
        Box::new(Outro),
    ]
}

fn draw_field(ctx: &GameContext, renderer: &mut dyn Renderer) {
    renderer.draw_field(&ctx.field, ctx.snake.length, ctx.snake.heading);
}

/// Splash screen, leaves on its own after the intro duration
pub struct Intro;

impl State<StateId, GameContext> for Intro {
    fn id(&self) -> StateId {
        StateId::Intro
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        ctx.state_timer
            .expired(&ctx.clock)
            .then_some(Transition::To(StateId::Menu))
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.state_timer.set(ctx.settings.intro_ms);
        ctx.state_timer.start(&ctx.clock);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.state_timer.stop();
    }
}

pub struct Menu;

impl State<StateId, GameContext> for Menu {
    fn id(&self) -> StateId {
        StateId::Menu
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        let input = &ctx.input;
        let target = if input.clicked(Button::Play) {
            StateId::Start
        } else if input.clicked(Button::Settings) {
            StateId::Settings
        } else if input.clicked(Button::KeyConfig) {
            StateId::KeyConfig
        } else if input.clicked(Button::Leaderboard) {
            StateId::Leaderboard
        } else if input.clicked(Button::Exit) || input.pressed(Action::Exit) {
            StateId::Outro
        } else {
            return None;
        };
        Some(Transition::To(target))
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.activate(Group::Menu);
        ctx.hud.activate(Group::Start);
        ctx.score = 0;
        ctx.hud.set_label(Label::Score, ctx.score.to_string());
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::Menu);
        ctx.hud.deactivate(Group::Start);
    }
}

/// Fresh field on screen, waiting for any key
pub struct Start;

impl State<StateId, GameContext> for Start {
    fn id(&self) -> StateId {
        StateId::Start
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        ctx.input
            .any_pressed()
            .then_some(Transition::To(StateId::Game))
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.reset();
        ctx.hud.activate(Group::StartGame);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::StartGame);
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        draw_field(ctx, renderer);
    }
}

/// Running session. Moves the snake once per loop timer period.
#[derive(Default)]
pub struct Game {
    game_over: bool,
}

impl State<StateId, GameContext> for Game {
    fn id(&self) -> StateId {
        StateId::Game
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        // A finished run never goes to Paused
        if self.game_over {
            let target = if ctx.high_scores.qualifies(ctx.score) {
                StateId::NewHighScore
            } else {
                StateId::GameOver
            };
            return Some(Transition::To(target));
        }
        if ctx.input.pressed(Action::Pause) || ctx.input.pressed(Action::Exit) {
            return Some(Transition::To(StateId::Paused));
        }
        None
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        self.game_over = false;
        ctx.suspended = false;
        // First move waits a full period
        ctx.loop_timer.start(&ctx.clock);
    }

    fn events(&mut self, ctx: &mut GameContext) {
        // Arrival order matters for rapid taps
        for direction in ctx.input.presses().filter_map(Action::direction) {
            ctx.snake.turn(direction);
        }
    }

    fn logic(&mut self, ctx: &mut GameContext) {
        if self.game_over {
            return;
        }
        let report = tick(ctx);
        if let Some(collision) = report.collision {
            log::info!(
                "Game over ({:?}): score {}, length {}",
                collision,
                ctx.score,
                ctx.snake.length
            );
            self.game_over = true;
        }
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        draw_field(ctx, renderer);
    }
}

pub struct GameOver;

impl State<StateId, GameContext> for GameOver {
    fn id(&self) -> StateId {
        StateId::GameOver
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        finished_run_buttons(ctx)
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.bonus.deactivate(ctx.hud.as_mut());
        ctx.hud.activate(Group::GameOver);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::GameOver);
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        draw_field(ctx, renderer);
        renderer.fade();
    }
}

/// Game over screen for a run that made the leaderboard
pub struct NewHighScore;

impl State<StateId, GameContext> for NewHighScore {
    fn id(&self) -> StateId {
        StateId::NewHighScore
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        finished_run_buttons(ctx)
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.record_high_score();
        ctx.bonus.deactivate(ctx.hud.as_mut());
        ctx.hud.activate(Group::GameOver);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::GameOver);
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        draw_field(ctx, renderer);
        renderer.fade();
    }
}

fn finished_run_buttons(ctx: &GameContext) -> Option<Transition<StateId>> {
    if ctx.input.clicked(Button::PlayAgain) {
        Some(Transition::To(StateId::Start))
    } else if ctx.input.clicked(Button::Menu) {
        Some(Transition::To(StateId::Menu))
    } else {
        None
    }
}

/// Session on hold. The bonus does not age while here.
pub struct Paused;

impl State<StateId, GameContext> for Paused {
    fn id(&self) -> StateId {
        StateId::Paused
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        let input = &ctx.input;
        let target = if input.pressed(Action::Pause)
            || input.pressed(Action::Exit)
            || input.clicked(Button::Continue)
        {
            StateId::Game
        } else if input.clicked(Button::Restart) {
            StateId::Start
        } else if input.clicked(Button::Settings) {
            StateId::Settings
        } else if input.clicked(Button::KeyConfig) {
            StateId::KeyConfig
        } else if input.clicked(Button::Leaderboard) {
            StateId::Leaderboard
        } else if input.clicked(Button::Exit) {
            StateId::Outro
        } else {
            return None;
        };
        Some(Transition::To(target))
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.suspended = true;
        ctx.hud.activate(Group::Menu);
        ctx.hud.activate(Group::Resume);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::Menu);
        ctx.hud.deactivate(Group::Resume);
    }

    fn events(&mut self, ctx: &mut GameContext) {
        hold_bonus(ctx);
    }

    fn render(&self, ctx: &GameContext, renderer: &mut dyn Renderer) {
        draw_field(ctx, renderer);
        renderer.fade();
    }
}

/// Keep a suspended run's bonus from ageing
fn hold_bonus(ctx: &mut GameContext) {
    if ctx.suspended {
        ctx.bonus.freeze(&ctx.clock);
    }
}

/// Host edits `ctx.pending_settings` while this screen is up
pub struct Settings;

impl State<StateId, GameContext> for Settings {
    fn id(&self) -> StateId {
        StateId::Settings
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        back_button(ctx)
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.activate(Group::Settings);
    }

    fn events(&mut self, ctx: &mut GameContext) {
        hold_bonus(ctx);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        let pending = &ctx.pending_settings;
        let walls = walls_text(pending.walls).to_string();
        let speed = pending.starting_speed.to_string();
        ctx.hud.set_label(Label::Walls, walls);
        ctx.hud.set_label(Label::Speed, speed);
        ctx.hud.deactivate(Group::Settings);
    }
}

pub struct KeyConfig;

impl State<StateId, GameContext> for KeyConfig {
    fn id(&self) -> StateId {
        StateId::KeyConfig
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        back_button(ctx)
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.activate(Group::KeyConfig);
    }

    fn events(&mut self, ctx: &mut GameContext) {
        hold_bonus(ctx);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::KeyConfig);
    }
}

pub struct Leaderboard;

impl State<StateId, GameContext> for Leaderboard {
    fn id(&self) -> StateId {
        StateId::Leaderboard
    }

    fn check_conditions(&self, ctx: &GameContext) -> Option<Transition<StateId>> {
        back_button(ctx)
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        log::debug!("Leaderboard: {} entries", ctx.high_scores.entries.len());
        ctx.hud.activate(Group::Leaderboard);
    }

    fn events(&mut self, ctx: &mut GameContext) {
        hold_bonus(ctx);
    }

    fn exit_actions(&mut self, ctx: &mut GameContext) {
        ctx.hud.deactivate(Group::Leaderboard);
    }
}

fn back_button(ctx: &GameContext) -> Option<Transition<StateId>> {
    ctx.input
        .clicked(Button::Back)
        .then_some(Transition::Return)
}

/// Terminal state
pub struct Outro;

impl State<StateId, GameContext> for Outro {
    fn id(&self) -> StateId {
        StateId::Outro
    }

    fn check_conditions(&self, _ctx: &GameContext) -> Option<Transition<StateId>> {
        None
    }

    fn entry_actions(&mut self, ctx: &mut GameContext) {
        ctx.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::RecordingHud;
    use crate::settings;
    use crate::time::{Clock, ManualTime};
    use std::collections::HashSet;

    fn context() -> (RecordingHud, GameContext) {
        let time = ManualTime::new(0.0);
        let hud = RecordingHud::new();
        let settings = settings::Settings {
            seed: Some(5),
            ..Default::default()
        };
        let ctx = GameContext::new(settings, Clock::manual(&time), Box::new(hud.clone()));
        (hud, ctx)
    }

    #[test]
    fn test_catalog_is_complete() {
        let ids: HashSet<StateId> = catalog().iter().map(|s| s.id()).collect();
        let all: HashSet<StateId> = StateId::ALL.into_iter().collect();
        assert_eq!(ids, all);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StateId::GameOver.to_string(), "Game over");
        assert_eq!(StateId::Leaderboard.as_str(), "High scores");
    }

    #[test]
    fn test_game_over_beats_pause() {
        let (_, mut ctx) = context();
        ctx.input.press(Action::Pause);
        let game = Game { game_over: true };
        assert_eq!(
            game.check_conditions(&ctx),
            Some(Transition::To(StateId::GameOver))
        );

        ctx.score = 40;
        assert_eq!(
            game.check_conditions(&ctx),
            Some(Transition::To(StateId::NewHighScore))
        );
    }

    #[test]
    fn test_settings_exit_publishes_pending() {
        let (hud, mut ctx) = context();
        ctx.pending_settings.walls = true;
        ctx.pending_settings.starting_speed = 8;
        let mut state = Settings;
        state.entry_actions(&mut ctx);
        assert!(hud.is_visible(Group::Settings));
        state.exit_actions(&mut ctx);
        assert!(!hud.is_visible(Group::Settings));
        assert_eq!(hud.label(Label::Walls).as_deref(), Some("ON"));
        assert_eq!(hud.label(Label::Speed).as_deref(), Some("8"));
        // Live session untouched until the next reset
        assert!(!ctx.walls);
    }

    #[test]
    fn test_outro_stops_loop() {
        let (_, mut ctx) = context();
        Outro.entry_actions(&mut ctx);
        assert!(!ctx.running);
        assert_eq!(Outro.check_conditions(&ctx), None);
    }
}
