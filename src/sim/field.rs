//! Grid of integer cells
//!
//! Cell encoding:
//! - `0`: empty
//! - `n > 0`: snake segment with `n` ticks left before it clears
//! - `-1`: apple, `-2`/`-3`: bonus in its two blink phases
//!
//! The snake body is never stored as a list. Every tick the head cell is
//! written with the snake's length and `update` decrements all positive
//! cells, so the tail clears itself.

use glam::IVec2;
use serde::{Deserialize, Serialize};

pub const EMPTY: i32 = 0;
pub const APPLE: i32 = -1;
pub const BONUS: i32 = -2;
pub const BONUS_BLINK: i32 = -3;

/// Largest width or height a field accepts
pub const MAX_FIELD_EXTENT: i32 = 1024;

/// Typed view of a cell value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Empty,
    /// Snake segment, value = remaining ticks
    Snake(i32),
    Apple,
    Bonus { blink: bool },
}

impl Tile {
    pub fn from_value(value: i32) -> Self {
        match value {
            v if v > 0 => Tile::Snake(v),
            APPLE => Tile::Apple,
            BONUS => Tile::Bonus { blink: false },
            BONUS_BLINK => Tile::Bonus { blink: true },
            _ => Tile::Empty,
        }
    }
}

/// Pixel rectangle (left, top, right, bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Where the field sits on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    pub origin: IVec2,
    /// Tile edge in pixels
    pub tile: i32,
    /// Inset unit used to shrink tiles when drawing
    pub gap: i32,
}

impl Default for FieldLayout {
    fn default() -> Self {
        Self {
            origin: IVec2::ZERO,
            tile: 16,
            gap: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    width: i32,
    height: i32,
    cells: Vec<i32>,
    pub layout: FieldLayout,
}

impl Field {
    /// Sizes outside `1..=MAX_FIELD_EXTENT` are clamped.
    pub fn new(width: i32, height: i32) -> Self {
        let size = IVec2::new(width, height).clamp(IVec2::ONE, IVec2::splat(MAX_FIELD_EXTENT));
        if size != IVec2::new(width, height) {
            log::warn!("Field size {}x{} clamped to {}x{}", width, height, size.x, size.y);
        }
        let (width, height) = (size.x, size.y);
        Self {
            width,
            height,
            cells: vec![EMPTY; (width * height) as usize],
            layout: FieldLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: FieldLayout) -> Self {
        self.layout = layout;
        self
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn size(&self) -> IVec2 {
        IVec2::new(self.width, self.height)
    }

    #[inline]
    pub fn contains(&self, at: IVec2) -> bool {
        at.x >= 0 && at.x < self.width && at.y >= 0 && at.y < self.height
    }

    /// Map any coordinate onto the torus
    #[inline]
    pub fn wrap(&self, at: IVec2) -> IVec2 {
        IVec2::new(at.x.rem_euclid(self.width), at.y.rem_euclid(self.height))
    }

    #[inline]
    fn index(&self, at: IVec2) -> Option<usize> {
        self.contains(at)
            .then(|| (at.y * self.width + at.x) as usize)
    }

    pub fn get(&self, at: IVec2) -> Option<i32> {
        self.index(at).map(|i| self.cells[i])
    }

    /// Cell value with out-of-bounds reads treated as empty
    pub fn value(&self, at: IVec2) -> i32 {
        self.get(at).unwrap_or(EMPTY)
    }

    pub fn tile(&self, at: IVec2) -> Tile {
        Tile::from_value(self.value(at))
    }

    /// Write a cell; out-of-bounds writes are ignored
    pub fn set(&mut self, at: IVec2, value: i32) {
        if let Some(i) = self.index(at) {
            self.cells[i] = value;
        } else {
            log::warn!("Ignored write of {} outside field at {:?}", value, at);
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    /// Age every snake segment by one tick
    pub fn update(&mut self) {
        for cell in self.cells.iter_mut().filter(|c| **c > 0) {
            *cell -= 1;
        }
    }

    /// All cells with their coordinates, row-major
    pub fn iter(&self) -> impl Iterator<Item = (IVec2, i32)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &v)| (IVec2::new(i as i32 % width, i as i32 / width), v))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.iter().filter(|&(_, v)| v == EMPTY).map(|(at, _)| at)
    }

    /// Number of snake cells
    pub fn snake_cells(&self) -> usize {
        self.cells.iter().filter(|&&v| v > 0).count()
    }

    /// Bounding rectangle in pixels
    pub fn rect(&self) -> Rect {
        let l = self.layout;
        Rect {
            left: l.origin.x,
            top: l.origin.y,
            right: l.origin.x + self.width * l.tile,
            bottom: l.origin.y + self.height * l.tile,
        }
    }

    /// Pixel rectangle of a tile inset by `gap` layout gaps on each side
    pub fn tile_rect(&self, at: IVec2, gap: i32) -> Rect {
        let l = self.layout;
        let inset = l.gap * gap;
        Rect {
            left: at.x * l.tile + inset + l.origin.x,
            top: at.y * l.tile + inset + l.origin.y,
            right: (at.x + 1) * l.tile - inset + l.origin.x,
            bottom: (at.y + 1) * l.tile - inset + l.origin.y,
        }
    }
}
