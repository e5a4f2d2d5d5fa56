//! Snake Arcade - runtime core of a grid-based snake game
//!
//! Core modules:
//! - `time`: Clock and timers that pace the loop
//! - `machine`: Generic state machine with declarative transitions
//! - `sim`: Grid simulation (field, snake, apple, bonus)
//! - `game`: Screen catalog, logic tick and the game loop
//! - `interface`: Input, HUD and renderer seams to the host
//! - `settings` / `highscores`: JSON-backed configuration and leaderboard
//!
//! No windowing or drawing lives here. A host feeds `InputState`,
//! implements `Hud` and `Renderer`, and calls `GameLoop::run`.

pub mod game;
pub mod highscores;
pub mod interface;
pub mod machine;
pub mod settings;
pub mod sim;
pub mod time;

pub use game::{GameContext, GameLoop, StateId};
pub use highscores::HighScores;
pub use machine::{MachineError, State, StateMachine, Transition};
pub use settings::{Settings, StorageError};
pub use time::{Clock, Timer};
