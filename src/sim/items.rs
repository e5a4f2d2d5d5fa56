//! Apple and bonus items
//!
//! Both claim a uniformly random empty cell. The bonus additionally lives
//! on two timers: its lifetime and its blink animation.

use glam::IVec2;
use rand::Rng;
use rand::seq::IteratorRandom;
use thiserror::Error;

use super::field::{APPLE, BONUS, BONUS_BLINK, EMPTY, Field};
use crate::interface::{Group, Hud, Label};
use crate::time::{Clock, Timer};

/// Blink animation period of the bonus (ms)
pub const BONUS_BLINK_MS: f64 = 120.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("no empty cell left on the {width}x{height} field")]
    FieldFull { width: i32, height: i32 },
}

/// Pick a random empty cell and write `marker` into it
fn place<R: Rng>(field: &mut Field, marker: i32, rng: &mut R) -> Result<IVec2, SimError> {
    let at = field
        .empty_cells()
        .choose(rng)
        .ok_or(SimError::FieldFull {
            width: field.width(),
            height: field.height(),
        })?;
    field.set(at, marker);
    Ok(at)
}

#[derive(Debug, Clone, Default)]
pub struct Apple {
    pub position: IVec2,
}

impl Apple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to a random empty cell
    pub fn repos<R: Rng>(&mut self, field: &mut Field, rng: &mut R) -> Result<(), SimError> {
        self.position = place(field, APPLE, rng)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Bonus {
    pub position: IVec2,
    active: bool,
    lifetime: Timer,
    blink: Timer,
    /// True while showing the `BONUS_BLINK` phase
    blink_phase: bool,
}

impl Bonus {
    /// Inactive bonus with the given lifetime
    pub fn new(clock: &Clock, lifetime_ms: f64) -> Self {
        Self {
            position: IVec2::ZERO,
            active: false,
            lifetime: Timer::one_shot(clock, lifetime_ms),
            blink: Timer::stopped(clock, BONUS_BLINK_MS),
            blink_phase: false,
        }
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn blink_phase(&self) -> bool {
        self.blink_phase
    }

    /// Lifetime scales with the move delay: enough time to cross the field
    /// once along each axis
    pub fn set_lifetime(&mut self, delay_ms: f64, field: &Field) {
        self.lifetime
            .set(delay_ms * (field.width() + field.height()) as f64);
    }

    /// Seconds left before the bonus expires
    pub fn remaining(&self, clock: &Clock) -> f64 {
        self.lifetime.countdown(clock)
    }

    pub fn repos<R: Rng>(&mut self, field: &mut Field, rng: &mut R) -> Result<(), SimError> {
        self.position = place(field, BONUS, rng)?;
        self.blink_phase = false;
        Ok(())
    }

    /// Place the bonus and start its timers
    pub fn activate<R: Rng>(
        &mut self,
        field: &mut Field,
        clock: &Clock,
        hud: &mut dyn Hud,
        rng: &mut R,
    ) -> Result<(), SimError> {
        self.repos(field, rng)?;
        self.active = true;
        self.lifetime.start(clock);
        self.blink.start(clock);
        hud.activate(Group::Bonus);
        log::debug!("Bonus activated at {:?}", self.position);
        Ok(())
    }

    /// Stop the timers and hide the bonus HUD. The caller owns the cell.
    pub fn deactivate(&mut self, hud: &mut dyn Hud) {
        self.active = false;
        self.lifetime.stop();
        self.blink.stop();
        hud.deactivate(Group::Bonus);
    }

    /// Per-logic-tick update: expiry first, then blink animation
    pub fn update(&mut self, field: &mut Field, clock: &Clock, hud: &mut dyn Hud) {
        if self.lifetime.poll(clock) {
            log::debug!("Bonus expired at {:?}", self.position);
            self.deactivate(hud);
            if field.value(self.position) < 0 {
                field.set(self.position, EMPTY);
            }
        }
        if self.active && self.blink.poll(clock) {
            self.blink_phase = !self.blink_phase;
            let marker = if self.blink_phase { BONUS_BLINK } else { BONUS };
            field.set(self.position, marker);
        }
        if self.active {
            let remaining = (self.remaining(clock) * 10.0).round() / 10.0;
            hud.set_label(Label::BonusTimer, format!("{:.1}", remaining));
        }
    }

    /// Keep paused wall-clock time from counting against the bonus
    pub fn freeze(&mut self, clock: &Clock) {
        self.lifetime.freeze(clock);
        self.blink.freeze(clock);
    }
}
