//! One snake move
//!
//! Advances the session by a single logic tick. Called by the `Game` state
//! each time the loop timer fires.

use rand::Rng;

use super::context::GameContext;
use crate::sim::{APPLE, BONUS, BONUS_BLINK};

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Left the field with walls enabled
    Wall,
    /// Head moved onto the body
    SelfBite,
    /// No empty cell left for the apple
    NoSpace,
}

/// What happened during a tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ate_apple: bool,
    pub ate_bonus: bool,
    pub collision: Option<Collision>,
}

impl TickReport {
    pub fn game_over(&self) -> bool {
        self.collision.is_some()
    }
}

/// Advance the session by one move
pub fn tick(ctx: &mut GameContext) -> TickReport {
    let mut report = TickReport::default();

    ctx.snake.change_direction();

    // Walls are checked before anything touches the field
    if ctx.walls && !ctx.field.contains(ctx.snake.next_position()) {
        log::info!("Hit wall at {:?}", ctx.snake.position);
        report.collision = Some(Collision::Wall);
        return report;
    }

    ctx.field.update();
    ctx.bonus
        .update(&mut ctx.field, &ctx.clock, ctx.hud.as_mut());

    ctx.snake.move_on(&ctx.field);
    let head = ctx.snake.position;
    let under = ctx.field.value(head);

    if under > 0 {
        log::info!("Bit own tail at {:?}", head);
        report.collision = Some(Collision::SelfBite);
        return report;
    }
    ctx.field.set(head, ctx.snake.length);

    if under == APPLE {
        report.ate_apple = true;
        ctx.snake.length += 1;
        ctx.snake.stats.apples += 1;
        ctx.score += ctx.settings.apple_score;
        ctx.field.set(head, ctx.snake.length);

        if let Err(e) = ctx.apple.repos(&mut ctx.field, &mut ctx.rng) {
            log::warn!("Run ended: {}", e);
            report.collision = Some(Collision::NoSpace);
        } else if !ctx.bonus.active() && ctx.rng.random::<f64>() < ctx.settings.bonus_chance {
            if let Err(e) =
                ctx.bonus
                    .activate(&mut ctx.field, &ctx.clock, ctx.hud.as_mut(), &mut ctx.rng)
            {
                log::debug!("Bonus skipped: {}", e);
            }
        }
    } else if ctx.bonus.active() && (under == BONUS || under == BONUS_BLINK) {
        report.ate_bonus = true;
        ctx.bonus.deactivate(ctx.hud.as_mut());
        ctx.score += ctx.settings.bonus_score;
        ctx.snake.stats.bonuses += 1;
        log::debug!("Bonus eaten at {:?}", head);
    }

    ctx.publish_score();
    report
}
