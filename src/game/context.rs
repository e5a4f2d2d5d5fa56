//! Shared state lent to every game-state hook

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::highscores::{HighScoreEntry, HighScores, unix_timestamp};
use crate::interface::{Hud, InputState, Label};
use crate::settings::Settings;
use crate::sim::{Apple, Bonus, Field, Snake};
use crate::time::{Clock, Timer};

pub struct GameContext {
    /// Settings of the running session
    pub settings: Settings,
    /// Edited by settings screens, applied at the next `reset`
    pub pending_settings: Settings,

    pub clock: Clock,
    /// Throttles `logic` to the snake's move delay
    pub loop_timer: Timer,
    /// One-shot timer for timed screens (intro)
    pub state_timer: Timer,

    pub input: InputState,
    pub hud: Box<dyn Hud>,

    pub field: Field,
    pub snake: Snake,
    pub apple: Apple,
    pub bonus: Bonus,

    pub score: u64,
    /// Current speed level
    pub speed: u32,
    pub walls: bool,

    /// Cleared to end the loop after the current iteration
    pub running: bool,
    /// Host-level pause (e.g. window hidden): logic is skipped entirely
    pub paused: bool,
    /// A run is on hold behind Paused or a screen opened from it
    pub suspended: bool,

    pub high_scores: HighScores,
    /// Rank of the last run on the leaderboard, if it made it
    pub last_rank: Option<usize>,
    pub rng: Pcg32,
}

impl GameContext {
    pub fn new(settings: Settings, clock: Clock, hud: Box<dyn Hud>) -> Self {
        let settings = settings.sanitized();
        let seed = settings.seed.unwrap_or_else(rand::random::<u64>);
        log::info!("Session seed: {}", seed);
        let mut rng = Pcg32::seed_from_u64(seed);

        let delay = settings.delay_ms();
        let mut field = Field::new(settings.field_width, settings.field_height);
        let snake = Snake::spawn(&mut field, settings.starting_length, &mut rng);
        let mut apple = Apple::new();
        if let Err(e) = apple.repos(&mut field, &mut rng) {
            log::warn!("Apple not placed: {}", e);
        }
        let mut bonus = Bonus::new(&clock, 0.0);
        bonus.set_lifetime(delay, &field);

        Self {
            loop_timer: Timer::periodic(&clock, delay),
            state_timer: Timer::one_shot(&clock, settings.intro_ms),
            pending_settings: settings.clone(),
            speed: settings.starting_speed,
            walls: settings.walls,
            settings,
            clock,
            input: InputState::new(),
            hud,
            field,
            snake,
            apple,
            bonus,
            score: 0,
            running: true,
            paused: false,
            suspended: false,
            high_scores: HighScores::new(),
            last_rank: None,
            rng,
        }
    }

    /// Start a fresh session: apply pending settings, rebuild the field and
    /// its occupants, reset score and timers.
    pub fn reset(&mut self) {
        self.settings = self.pending_settings.sanitized();
        let s = &self.settings;

        if self.field.width() != s.field_width || self.field.height() != s.field_height {
            self.field = Field::new(s.field_width, s.field_height).with_layout(self.field.layout);
        } else {
            self.field.clear();
        }
        self.snake = Snake::spawn(&mut self.field, s.starting_length, &mut self.rng);
        if let Err(e) = self.apple.repos(&mut self.field, &mut self.rng) {
            log::warn!("Apple not placed: {}", e);
        }

        self.score = 0;
        self.walls = s.walls;
        self.speed = s.starting_speed;
        self.last_rank = None;
        self.suspended = false;

        let delay = s.delay_ms();
        self.loop_timer.set(delay);
        self.bonus.set_lifetime(delay, &self.field);
        self.bonus.deactivate(self.hud.as_mut());

        self.publish_score();
        self.hud.set_label(Label::Speed, self.speed.to_string());
        self.hud.set_label(Label::Walls, walls_text(self.walls).to_string());
        log::info!(
            "Session reset: {}x{} field, speed {}, walls {}",
            self.field.width(),
            self.field.height(),
            self.speed,
            walls_text(self.walls)
        );
    }

    /// Push score and run stats to the HUD
    pub fn publish_score(&mut self) {
        self.hud.set_label(Label::Score, self.score.to_string());
        self.hud
            .set_label(Label::Apples, self.snake.stats.apples.to_string());
        self.hud
            .set_label(Label::Bonuses, self.snake.stats.bonuses.to_string());
        let rank = match self.high_scores.potential_rank(self.score) {
            Some(rank) => rank.to_string(),
            None => "-".to_string(),
        };
        self.hud.set_label(Label::Rank, rank);
    }

    /// Record the finished run on the leaderboard
    pub fn record_high_score(&mut self) -> Option<usize> {
        let entry = HighScoreEntry {
            score: self.score,
            apples: self.snake.stats.apples,
            bonuses: self.snake.stats.bonuses,
            timestamp: unix_timestamp(),
        };
        let rank = self.high_scores.add_score(entry);
        if let Some(rank) = rank {
            log::info!("New high score {} (rank {})", self.score, rank);
        }
        self.last_rank = rank;
        rank
    }
}

pub fn walls_text(walls: bool) -> &'static str {
    if walls { "ON" } else { "OFF" }
}
