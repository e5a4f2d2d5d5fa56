//! Generic state machine
//!
//! States are trait objects keyed by `K` and operate on a shared context
//! `C` that is lent to every hook. The machine never hands states a
//! reference to itself; whatever a state needs lives in the context.
//!
//! Per loop iteration the host calls `update_states` once (transition
//! check), then `state_events`, `state_logic` and `state_render`.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

use crate::interface::Renderer;

/// Where a state wants to go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<K> {
    To(K),
    /// Back to the state that was active before this one
    Return,
}

/// Contract violations. These are programming errors and end the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error("transition to unregistered state {0}")]
    UnknownState(String),
    #[error("state {0} registered twice")]
    DuplicateState(String),
}

pub trait State<K, C> {
    fn id(&self) -> K;

    /// Transition predicate, evaluated once per iteration before any other
    /// hook. Takes the context immutably so it cannot have side effects.
    fn check_conditions(&self, ctx: &C) -> Option<Transition<K>>;

    fn entry_actions(&mut self, _ctx: &mut C) {}
    fn exit_actions(&mut self, _ctx: &mut C) {}

    /// Input interpretation
    fn events(&mut self, _ctx: &mut C) {}

    /// Simulation step (skipped while the loop is paused)
    fn logic(&mut self, _ctx: &mut C) {}

    fn render(&self, _ctx: &C, _renderer: &mut dyn Renderer) {}
}

pub struct StateMachine<K, C> {
    states: HashMap<K, Box<dyn State<K, C>>>,
    active: K,
    last: K,
}

impl<K, C> StateMachine<K, C>
where
    K: Copy + Eq + Hash + Debug + 'static,
    C: 'static,
{
    /// Register the catalog and enter `initial`
    pub fn new(
        initial: K,
        states: impl IntoIterator<Item = Box<dyn State<K, C>>>,
        ctx: &mut C,
    ) -> Result<Self, MachineError> {
        let mut table: HashMap<K, Box<dyn State<K, C>>> = HashMap::new();
        for state in states {
            let id = state.id();
            if table.insert(id, state).is_some() {
                return Err(MachineError::DuplicateState(format!("{:?}", id)));
            }
        }

        let mut machine = Self {
            states: table,
            active: initial,
            last: initial,
        };
        machine.state_mut(initial)?.entry_actions(ctx);
        log::info!("Initial state: {:?}", initial);
        Ok(machine)
    }

    pub fn current_state(&self) -> K {
        self.active
    }

    /// The state exited most recently
    pub fn last_state(&self) -> K {
        self.last
    }

    pub fn contains(&self, id: K) -> bool {
        self.states.contains_key(&id)
    }

    fn state_mut(&mut self, id: K) -> Result<&mut Box<dyn State<K, C>>, MachineError> {
        self.states
            .get_mut(&id)
            .ok_or_else(|| MachineError::UnknownState(format!("{:?}", id)))
    }

    /// Evaluate the active state's predicate and transition if it asks to.
    /// Returns the new active state when a transition happened.
    pub fn update_states(&mut self, ctx: &mut C) -> Result<Option<K>, MachineError> {
        let state = self
            .states
            .get(&self.active)
            .ok_or_else(|| MachineError::UnknownState(format!("{:?}", self.active)))?;
        let target = match state.check_conditions(ctx) {
            None => return Ok(None),
            Some(Transition::To(id)) => id,
            Some(Transition::Return) => self.last,
        };
        self.change_state(target, ctx)?;
        Ok(Some(target))
    }

    /// Exit the active state and enter `target`
    pub fn change_state(&mut self, target: K, ctx: &mut C) -> Result<(), MachineError> {
        if !self.states.contains_key(&target) {
            return Err(MachineError::UnknownState(format!("{:?}", target)));
        }
        let previous = self.active;
        self.state_mut(previous)?.exit_actions(ctx);
        self.last = previous;
        self.active = target;
        self.state_mut(target)?.entry_actions(ctx);
        log::info!("State: {:?} -> {:?}", previous, target);
        Ok(())
    }

    pub fn state_events(&mut self, ctx: &mut C) {
        if let Some(state) = self.states.get_mut(&self.active) {
            state.events(ctx);
        }
    }

    pub fn state_logic(&mut self, ctx: &mut C) {
        if let Some(state) = self.states.get_mut(&self.active) {
            state.logic(ctx);
        }
    }

    pub fn state_render(&self, ctx: &C, renderer: &mut dyn Renderer) {
        if let Some(state) = self.states.get(&self.active) {
            state.render(ctx, renderer);
        }
    }
}
