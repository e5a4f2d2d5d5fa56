//! Grid simulation
//!
//! Everything that moves on the field lives here:
//! - `Field`: integer cell matrix (snake ages and item markers)
//! - `Snake`: head position, direction, buffered turns
//! - `Apple` / `Bonus`: items that relocate to random empty cells
//!
//! No rendering or platform dependencies. Randomness comes from the
//! caller's seeded RNG.

pub mod field;
pub mod items;
pub mod snake;

pub use field::{APPLE, BONUS, BONUS_BLINK, EMPTY, Field, FieldLayout, MAX_FIELD_EXTENT, Rect, Tile};
pub use items::{Apple, BONUS_BLINK_MS, Bonus, SimError};
pub use snake::{Direction, Snake, SnakeStats, TURN_QUEUE_CAPACITY};
