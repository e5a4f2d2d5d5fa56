//! The snake game on top of the generic state machine
//!
//! - `context`: everything the states share (clock, timers, field, score)
//! - `tick`: one snake move
//! - `states`: the screen catalog (intro, menu, game, pause, ...)
//! - `runner`: `GameLoop`, which paces and dispatches the states

pub mod context;
pub mod runner;
pub mod states;
pub mod tick;

pub use context::GameContext;
pub use runner::GameLoop;
pub use states::{GameMachine, StateId, catalog};
pub use tick::{Collision, TickReport, tick};
