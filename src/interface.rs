//! Seams to the host application
//!
//! The core never draws or reads devices itself. It talks to:
//! - `InputState`: held/pressed actions, button clicks, pointer focus
//! - `Hud`: show/hide widget groups and update text labels
//! - `Renderer`: receives the logical field state each frame

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use glam::IVec2;

use crate::sim::{Direction, Field};

/// Logical keys the core reacts to (the host owns the keybinding map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Pause,
    Exit,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Pause,
        Action::Exit,
    ];

    /// Steering direction for movement keys
    pub fn direction(self) -> Option<Direction> {
        match self {
            Action::Up => Some(Direction::Up),
            Action::Down => Some(Direction::Down),
            Action::Left => Some(Direction::Left),
            Action::Right => Some(Direction::Right),
            Action::Pause | Action::Exit => None,
        }
    }
}

/// UI buttons whose press edge drives state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Play,
    Continue,
    Restart,
    Settings,
    KeyConfig,
    Leaderboard,
    Exit,
    Back,
    Menu,
    PlayAgain,
}

/// Per-tick input snapshot.
///
/// Press and click edges are latched until `clear`, which the loop calls
/// once at the end of every iteration. Held keys persist until released.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    pressed: HashSet<Action>,
    /// Press edges in arrival order
    presses: Vec<Action>,
    clicked: HashSet<Button>,
    /// Any key went down this tick (including keys with no action)
    any_key: bool,
    /// Pointer position in window coordinates
    pub focus: IVec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
        self.pressed.insert(action);
        self.presses.push(action);
        self.any_key = true;
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    /// A key without a bound action went down
    pub fn press_unbound(&mut self) {
        self.any_key = true;
    }

    pub fn click(&mut self, button: Button) {
        self.clicked.insert(button);
    }

    pub fn set_focus(&mut self, focus: IVec2) {
        self.focus = focus;
    }

    pub fn pressed(&self, action: Action) -> bool {
        self.pressed.contains(&action)
    }

    /// Actions pressed this tick, oldest first
    pub fn presses(&self) -> impl Iterator<Item = Action> + '_ {
        self.presses.iter().copied()
    }

    pub fn held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    pub fn clicked(&self, button: Button) -> bool {
        self.clicked.contains(&button)
    }

    pub fn any_pressed(&self) -> bool {
        self.any_key
    }

    /// Drop the one-shot latches (press and click edges)
    pub fn clear(&mut self) {
        self.pressed.clear();
        self.presses.clear();
        self.clicked.clear();
        self.any_key = false;
    }
}

/// Widget groups the states show and hide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Menu,
    Start,
    Resume,
    Bonus,
    Settings,
    KeyConfig,
    Leaderboard,
    StartGame,
    GameOver,
}

/// Text labels the core keeps up to date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Score,
    Speed,
    Walls,
    Apples,
    Bonuses,
    BonusTimer,
    /// Leaderboard rank the current score would take, `-` if none
    Rank,
}

/// Widget layer of the host
pub trait Hud {
    fn activate(&mut self, group: Group);
    fn deactivate(&mut self, group: Group);
    fn set_label(&mut self, _label: Label, _text: String) {}
}

/// Hud that ignores everything
#[derive(Debug, Default)]
pub struct NullHud;

impl Hud for NullHud {
    fn activate(&mut self, _group: Group) {}
    fn deactivate(&mut self, _group: Group) {}
}

/// A recorded Hud call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HudEvent {
    Activate(Group),
    Deactivate(Group),
    Label(Label, String),
}

#[derive(Debug, Default)]
struct HudLog {
    visible: HashSet<Group>,
    events: Vec<HudEvent>,
}

/// Hud that keeps the visible groups and a log of calls.
///
/// Cloning yields a handle to the same log, so a copy can be kept for
/// inspection after another handle is boxed into a game context.
#[derive(Debug, Clone, Default)]
pub struct RecordingHud {
    log: Rc<RefCell<HudLog>>,
}

impl RecordingHud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, group: Group) -> bool {
        self.log.borrow().visible.contains(&group)
    }

    /// Most recent text written to `label`
    pub fn label(&self, label: Label) -> Option<String> {
        self.log.borrow().events.iter().rev().find_map(|e| match e {
            HudEvent::Label(l, text) if *l == label => Some(text.clone()),
            _ => None,
        })
    }

    pub fn events(&self) -> Vec<HudEvent> {
        self.log.borrow().events.clone()
    }
}

impl Hud for RecordingHud {
    fn activate(&mut self, group: Group) {
        let mut log = self.log.borrow_mut();
        log.visible.insert(group);
        log.events.push(HudEvent::Activate(group));
    }

    fn deactivate(&mut self, group: Group) {
        let mut log = self.log.borrow_mut();
        log.visible.remove(&group);
        log.events.push(HudEvent::Deactivate(group));
    }

    fn set_label(&mut self, label: Label, text: String) {
        self.log.borrow_mut().events.push(HudEvent::Label(label, text));
    }
}

/// Drawing backend. Only the logical content is handed over; colors,
/// layout and fonts belong to the implementation.
pub trait Renderer {
    /// Draw every tile of the field; `heading` orients the head tile
    fn draw_field(&mut self, field: &Field, head_value: i32, heading: Direction);
    /// Dim everything drawn so far (paused and game-over screens)
    fn fade(&mut self) {}
}

#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn draw_field(&mut self, _field: &Field, _head_value: i32, _heading: Direction) {}
}
