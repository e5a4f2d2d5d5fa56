//! The snake: position, direction and buffered turn input

use std::collections::VecDeque;

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::field::Field;

/// Maximum number of buffered turn intents
pub const TURN_QUEUE_CAPACITY: usize = 2;

/// Minimum distance from the field edge for the starting head position
const SPAWN_MARGIN: i32 = 4;

/// Cardinal movement direction (screen coordinates, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit step on the grid
    pub fn vec(self) -> IVec2 {
        match self {
            Direction::Up => IVec2::new(0, -1),
            Direction::Down => IVec2::new(0, 1),
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeStats {
    pub apples: u32,
    pub bonuses: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snake {
    pub position: IVec2,
    pub direction: Direction,
    /// Direction of the last move (orients the head when drawn)
    pub heading: Direction,
    pub length: i32,
    pub stats: SnakeStats,
    turn_queue: VecDeque<Direction>,
}

impl Snake {
    /// Snake at `position` with `length` body cells written behind it
    pub fn new(field: &mut Field, position: IVec2, direction: Direction, length: i32) -> Self {
        let mut snake = Self {
            position,
            direction,
            heading: direction,
            length: length.max(1),
            stats: SnakeStats::default(),
            turn_queue: VecDeque::with_capacity(TURN_QUEUE_CAPACITY),
        };
        snake.write_body(field);
        snake
    }

    /// Random placement away from the edges, random direction
    pub fn spawn<R: Rng>(field: &mut Field, length: i32, rng: &mut R) -> Self {
        let pick = |extent: i32, rng: &mut R| {
            if extent > 2 * SPAWN_MARGIN {
                rng.random_range(SPAWN_MARGIN..extent - SPAWN_MARGIN)
            } else {
                extent / 2
            }
        };
        let x = pick(field.width(), rng);
        let y = pick(field.height(), rng);
        let direction = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
        Self::new(field, IVec2::new(x, y), direction, length)
    }

    /// Body cells `length, length - 1, ..., 1` from the head backwards
    fn write_body(&self, field: &mut Field) {
        for tile in 0..self.length {
            let at = field.wrap(self.position - self.direction.vec() * tile);
            field.set(at, self.length - tile);
        }
    }

    pub fn next_position(&self) -> IVec2 {
        self.position + self.direction.vec()
    }

    /// Queue a turn intent.
    ///
    /// An intent reversing the previously queued one (or the current
    /// direction when nothing is queued) is dropped. A full queue evicts
    /// its oldest entry so the latest inputs are kept.
    pub fn turn(&mut self, direction: Direction) {
        let reference = self.turn_queue.back().copied().unwrap_or(self.direction);
        if direction == reference.opposite() {
            log::debug!("Rejected reversal {:?} after {:?}", direction, reference);
            return;
        }
        if self.turn_queue.len() >= TURN_QUEUE_CAPACITY {
            self.turn_queue.pop_front();
        }
        self.turn_queue.push_back(direction);
    }

    /// Commit the oldest queued intent as the movement direction.
    ///
    /// An intent that reverses the committed direction is consumed without
    /// effect. This happens when eviction removed the turn it followed.
    pub fn change_direction(&mut self) {
        if let Some(direction) = self.turn_queue.pop_front() {
            if direction != self.direction.opposite() {
                self.direction = direction;
            } else {
                log::debug!("Dropped reversal {:?} while moving {:?}", direction, self.direction);
            }
        }
    }

    /// Step one tile and wrap onto the torus
    pub fn move_on(&mut self, field: &Field) {
        self.position = field.wrap(self.position + self.direction.vec());
        self.heading = self.direction;
    }

    pub fn queued_turns(&self) -> impl Iterator<Item = Direction> + '_ {
        self.turn_queue.iter().copied()
    }

    pub fn clear_turns(&mut self) {
        self.turn_queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn snake_facing(direction: Direction) -> (Field, Snake) {
        let mut field = Field::new(10, 10);
        let snake = Snake::new(&mut field, IVec2::new(5, 5), direction, 3);
        (field, snake)
    }

    #[test]
    fn test_initial_body_written() {
        let (field, snake) = snake_facing(Direction::Right);
        assert_eq!(field.value(IVec2::new(5, 5)), 3);
        assert_eq!(field.value(IVec2::new(4, 5)), 2);
        assert_eq!(field.value(IVec2::new(3, 5)), 1);
        assert_eq!(field.snake_cells(), snake.length as usize);
    }

    #[test]
    fn test_turn_queue_drops_oldest() {
        let (_, mut snake) = snake_facing(Direction::Right);
        snake.turn(Direction::Up);
        snake.turn(Direction::Left);
        snake.turn(Direction::Down);
        assert_eq!(
            snake.queued_turns().collect::<Vec<_>>(),
            vec![Direction::Left, Direction::Down]
        );

        // LEFT lost the UP it followed and would reverse RIGHT
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Right);
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Down);
    }

    #[test]
    fn test_rapid_taps_never_reverse() {
        let mut field = Field::new(10, 10);
        let mut snake = Snake::new(&mut field, IVec2::new(5, 5), Direction::Right, 3);
        snake.turn(Direction::Up);
        snake.turn(Direction::Left);
        snake.turn(Direction::Down);
        for _ in 0..3 {
            let before = snake.direction;
            snake.change_direction();
            assert_ne!(snake.direction, before.opposite());
            snake.move_on(&field);
        }
        assert_eq!(snake.position, IVec2::new(6, 7));
    }

    #[test]
    fn test_reversal_rejected() {
        let (_, mut snake) = snake_facing(Direction::Right);
        snake.turn(Direction::Left);
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Right);
    }

    #[test]
    fn test_double_tap_turn() {
        let (_, mut snake) = snake_facing(Direction::Right);
        snake.turn(Direction::Up);
        snake.turn(Direction::Left);
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Up);
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Left);
        // Empty queue keeps the direction
        snake.change_direction();
        assert_eq!(snake.direction, Direction::Left);
    }

    #[test]
    fn test_move_wraps() {
        let mut field = Field::new(10, 10);
        let mut snake = Snake::new(&mut field, IVec2::new(9, 0), Direction::Right, 1);
        snake.move_on(&field);
        assert_eq!(snake.position, IVec2::new(0, 0));

        snake.turn(Direction::Up);
        snake.change_direction();
        snake.move_on(&field);
        assert_eq!(snake.position, IVec2::new(0, 9));
        assert_eq!(snake.heading, Direction::Up);
    }

    #[test]
    fn test_spawn_keeps_margin() {
        let mut rng = Pcg32::seed_from_u64(42);
        for _ in 0..50 {
            let mut field = Field::new(20, 16);
            let snake = Snake::spawn(&mut field, 3, &mut rng);
            assert!((4..16).contains(&snake.position.x));
            assert!((4..12).contains(&snake.position.y));
            assert_eq!(field.snake_cells(), 3);
        }
    }
}
