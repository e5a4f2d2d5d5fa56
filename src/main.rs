//! Headless demo host
//!
//! Runs the full game loop against the wall clock with an autopilot at the
//! keys and a text renderer that logs the board on pause and game over.
//!
//! Usage: `snake-arcade [settings.json] [highscores.json]`

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use snake_arcade::interface::{Action, Button, Group, Hud, Label, Renderer};
use snake_arcade::sim::{Direction, Field, Tile};
use snake_arcade::{Clock, GameContext, GameLoop, HighScores, Settings, StateId};

/// Runs played before the autopilot exits
const DEMO_RUNS: u32 = 3;
/// The autopilot pauses and moves on after this many apples
const APPLES_PER_RUN: u32 = 12;
/// Log the board every N frames at debug level
const FRAME_LOG_INTERVAL: u64 = 600;

/// Tracks visible groups so the autopilot knows which screen is up
#[derive(Clone, Default)]
struct DemoHud {
    visible: Rc<RefCell<HashSet<Group>>>,
}

impl DemoHud {
    fn is_visible(&self, group: Group) -> bool {
        self.visible.borrow().contains(&group)
    }
}

impl Hud for DemoHud {
    fn activate(&mut self, group: Group) {
        log::debug!("Show {:?}", group);
        self.visible.borrow_mut().insert(group);
    }

    fn deactivate(&mut self, group: Group) {
        self.visible.borrow_mut().remove(&group);
    }

    fn set_label(&mut self, label: Label, text: String) {
        match label {
            Label::BonusTimer => log::trace!("{:?}: {}", label, text),
            _ => log::debug!("{:?}: {}", label, text),
        }
    }
}

#[derive(Default)]
struct TextRenderer {
    frames: u64,
    board: String,
    dimmed: bool,
    was_dimmed: bool,
}

impl TextRenderer {
    fn draw(&mut self, field: &Field, head_value: i32, heading: Direction) {
        self.board.clear();
        for y in 0..field.height() {
            for x in 0..field.width() {
                let at = glam::IVec2::new(x, y);
                let c = match field.tile(at) {
                    Tile::Empty => '.',
                    Tile::Snake(n) if n == head_value => match heading {
                        Direction::Up => '^',
                        Direction::Down => 'v',
                        Direction::Left => '<',
                        Direction::Right => '>',
                    },
                    Tile::Snake(_) => 'o',
                    Tile::Apple => '@',
                    Tile::Bonus { blink: false } => '$',
                    Tile::Bonus { blink: true } => '*',
                };
                self.board.push(c);
            }
            self.board.push('\n');
        }
    }
}

impl Renderer for TextRenderer {
    fn draw_field(&mut self, field: &Field, head_value: i32, heading: Direction) {
        self.frames += 1;
        self.was_dimmed = self.dimmed;
        self.dimmed = false;
        self.draw(field, head_value, heading);
        if self.frames % FRAME_LOG_INTERVAL == 0 {
            log::debug!("Frame {}\n{}", self.frames, self.board);
        }
    }

    fn fade(&mut self) {
        if !self.was_dimmed {
            log::info!("Board after {} frames:\n{}", self.frames, self.board);
        }
        self.dimmed = true;
    }
}

fn action_for(direction: Direction) -> Action {
    match direction {
        Direction::Up => Action::Up,
        Direction::Down => Action::Down,
        Direction::Left => Action::Left,
        Direction::Right => Action::Right,
    }
}

struct Autopilot {
    hud: DemoHud,
    runs_left: u32,
    steering: Option<Action>,
}

impl Autopilot {
    fn new(hud: DemoHud, runs: u32) -> Self {
        Self {
            hud,
            runs_left: runs,
            steering: None,
        }
    }

    /// Feed one iteration of input, based on which screen is visible
    fn drive(&mut self, ctx: &mut GameContext) {
        if let Some(action) = self.steering.take() {
            ctx.input.release(action);
        }
        let more = self.runs_left > 0;

        if self.hud.is_visible(Group::StartGame) {
            self.runs_left = self.runs_left.saturating_sub(1);
            ctx.input.press_unbound();
        } else if self.hud.is_visible(Group::GameOver) {
            ctx.input
                .click(if more { Button::PlayAgain } else { Button::Menu });
        } else if self.hud.is_visible(Group::Resume) {
            ctx.input
                .click(if more { Button::Restart } else { Button::Exit });
        } else if self.hud.is_visible(Group::Menu) {
            ctx.input.click(if more { Button::Play } else { Button::Exit });
        } else if ctx.snake.stats.apples >= APPLES_PER_RUN {
            ctx.input.press(Action::Pause);
            self.steering = Some(Action::Pause);
        } else if let Some(action) = steer(ctx) {
            ctx.input.press(action);
            self.steering = Some(action);
        }
    }
}

/// Greedy steering toward the apple, avoiding the body (and walls)
fn steer(ctx: &GameContext) -> Option<Action> {
    let snake = &ctx.snake;
    if snake.queued_turns().next().is_some() {
        return None;
    }
    let delta = ctx.apple.position - snake.position;
    let mut order = Vec::with_capacity(8);
    if delta.x > 0 {
        order.push(Direction::Right);
    } else if delta.x < 0 {
        order.push(Direction::Left);
    }
    if delta.y > 0 {
        order.push(Direction::Down);
    } else if delta.y < 0 {
        order.push(Direction::Up);
    }
    order.push(snake.direction);
    order.extend(Direction::ALL);

    let safe = |d: Direction| {
        let next = snake.position + d.vec();
        if ctx.walls && !ctx.field.contains(next) {
            return false;
        }
        // A segment at 1 is gone by the time the head arrives
        ctx.field.value(ctx.field.wrap(next)) <= 1
    };
    let choice = order
        .into_iter()
        .find(|&d| d != snake.direction.opposite() && safe(d))?;
    (choice != snake.direction).then(|| action_for(choice))
}

fn load_settings(path: Option<&str>) -> Settings {
    match path {
        Some(p) => Settings::load_or_default(Path::new(p)),
        None => Settings::default(),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Snake Arcade (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = load_settings(args.next().as_deref());
    let scores_path: Option<PathBuf> = args.next().map(PathBuf::from);

    let hud = DemoHud::default();
    let mut ctx = GameContext::new(settings, Clock::system(), Box::new(hud.clone()));
    if let Some(path) = &scores_path {
        ctx.high_scores = HighScores::load_or_default(path);
    }

    let mut game = match GameLoop::new(ctx, StateId::Intro, Box::new(TextRenderer::default())) {
        Ok(game) => game,
        Err(e) => {
            log::error!("Failed to build state machine: {}", e);
            std::process::exit(1);
        }
    };

    let mut pilot = Autopilot::new(hud, DEMO_RUNS);
    if let Err(e) = game.run(|ctx| pilot.drive(ctx)) {
        log::error!("Game loop failed: {}", e);
        std::process::exit(1);
    }

    let scores = &game.ctx.high_scores;
    let mut summary = String::new();
    for (rank, entry) in scores.entries.iter().enumerate() {
        let _ = writeln!(
            summary,
            "{:>2}. {:>6}  apples {:>3}  bonuses {:>2}",
            rank + 1,
            entry.score,
            entry.apples,
            entry.bonuses
        );
    }
    log::info!("High scores:\n{}", summary);

    if let Some(path) = &scores_path {
        if let Err(e) = scores.save_to(path) {
            log::warn!("Failed to save high scores: {}", e);
        }
    }
}
