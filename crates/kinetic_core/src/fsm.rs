//! State Machine Runtime
//!
//! Small typed state machines for playback and transition phases.
//! Supports:
//! - Flat state machines over caller-defined state/event enums
//! - Entry/exit actions
//! - Transition history for diagnostics

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;

/// Bounds shared by state and event types
pub trait FsmKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> FsmKey for T {}

/// An action executed when a state is entered or exited
pub type Action<S> = Box<dyn FnMut(S)>;

/// A transition in the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from_state: S,
    pub event: E,
    pub to_state: S,
}

impl<S: FsmKey, E: FsmKey> Transition<S, E> {
    pub fn new(from: S, event: E, to: S) -> Self {
        Self {
            from_state: from,
            event,
            to_state: to,
        }
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S: FsmKey, E: FsmKey> {
    initial_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
    exit_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
}

impl<S: FsmKey, E: FsmKey> StateMachineBuilder<S, E> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            transitions: Vec::new(),
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
        }
    }

    /// Add a transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.transitions.push(Transition::new(from, event, to));
        self
    }

    /// Add an entry action for a state. The action receives the state being left.
    pub fn on_enter<F: FnMut(S) + 'static>(mut self, state: S, action: F) -> Self {
        self.entry_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    /// Add an exit action for a state. The action receives the state being entered.
    pub fn on_exit<F: FnMut(S) + 'static>(mut self, state: S, action: F) -> Self {
        self.exit_callbacks
            .entry(state)
            .or_default()
            .push(Box::new(action));
        self
    }

    pub fn build(self) -> StateMachine<S, E> {
        StateMachine {
            current_state: self.initial_state,
            transitions: self.transitions,
            entry_callbacks: self.entry_callbacks,
            exit_callbacks: self.exit_callbacks,
            history: Vec::new(),
        }
    }
}

/// A state machine instance
pub struct StateMachine<S: FsmKey, E: FsmKey> {
    current_state: S,
    transitions: Vec<Transition<S, E>>,
    entry_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
    exit_callbacks: FxHashMap<S, SmallVec<[Action<S>; 1]>>,
    /// History of state transitions (for debugging)
    history: Vec<(S, E, S)>,
}

impl<S: FsmKey, E: FsmKey> StateMachine<S, E> {
    /// Create a state machine with an initial state and transitions
    pub fn new(initial_state: S, transitions: Vec<Transition<S, E>>) -> Self {
        Self {
            current_state: initial_state,
            transitions,
            entry_callbacks: FxHashMap::default(),
            exit_callbacks: FxHashMap::default(),
            history: Vec::new(),
        }
    }

    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    pub fn current_state(&self) -> S {
        self.current_state
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    pub fn history(&self) -> &[(S, E, S)] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an event can trigger a transition from the current state
    pub fn can_send(&self, event: E) -> bool {
        self.find(event).is_some()
    }

    fn find(&self, event: E) -> Option<S> {
        let current = self.current_state;
        self.transitions
            .iter()
            .find(|t| t.from_state == current && t.event == event)
            .map(|t| t.to_state)
    }

    /// Send an event to the state machine.
    ///
    /// Returns the new state if a transition fired, `None` if the event is not
    /// accepted in the current state (the machine is left untouched).
    pub fn send(&mut self, event: E) -> Option<S> {
        let current = self.current_state;
        let to_state = self.find(event)?;

        if let Some(callbacks) = self.exit_callbacks.get_mut(&current) {
            for callback in callbacks.iter_mut() {
                callback(to_state);
            }
        }

        self.current_state = to_state;
        self.history.push((current, event, to_state));
        tracing::trace!("fsm {:?} --{:?}--> {:?}", current, event, to_state);

        if let Some(callbacks) = self.entry_callbacks.get_mut(&to_state) {
            for callback in callbacks.iter_mut() {
                callback(current);
            }
        }

        Some(to_state)
    }
}

impl<S: FsmKey, E: FsmKey> Debug for StateMachine<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateMachine")
            .field("current_state", &self.current_state)
            .field("transitions", &self.transitions.len())
            .field("history", &self.history)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Phase {
        Idle,
        Dragging,
        Settling,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Input {
        Down,
        Up,
        Settled,
    }

    fn drag_machine() -> StateMachine<Phase, Input> {
        StateMachine::new(
            Phase::Idle,
            vec![
                Transition::new(Phase::Idle, Input::Down, Phase::Dragging),
                Transition::new(Phase::Dragging, Input::Up, Phase::Settling),
                Transition::new(Phase::Settling, Input::Settled, Phase::Idle),
                Transition::new(Phase::Settling, Input::Down, Phase::Dragging),
            ],
        )
    }

    #[test]
    fn test_simple_transitions() {
        let mut fsm = drag_machine();
        assert_eq!(fsm.current_state(), Phase::Idle);

        assert_eq!(fsm.send(Input::Down), Some(Phase::Dragging));
        assert_eq!(fsm.send(Input::Up), Some(Phase::Settling));
        assert_eq!(fsm.send(Input::Down), Some(Phase::Dragging));
        fsm.send(Input::Up);
        fsm.send(Input::Settled);
        assert!(fsm.is_in(Phase::Idle));
    }

    #[test]
    fn test_invalid_event_no_transition() {
        let mut fsm = drag_machine();

        assert_eq!(fsm.send(Input::Up), None);
        assert_eq!(fsm.current_state(), Phase::Idle);
        assert!(fsm.history().is_empty());
    }

    #[test]
    fn test_entry_exit_callbacks() {
        let entered = Rc::new(Cell::new(0));
        let exited = Rc::new(Cell::new(0));
        let entered_clone = entered.clone();
        let exited_clone = exited.clone();

        let mut fsm = StateMachine::builder(Phase::Idle)
            .on(Phase::Idle, Input::Down, Phase::Dragging)
            .on(Phase::Dragging, Input::Up, Phase::Idle)
            .on_enter(Phase::Dragging, move |from| {
                assert_eq!(from, Phase::Idle);
                entered_clone.set(entered_clone.get() + 1);
            })
            .on_exit(Phase::Dragging, move |_| {
                exited_clone.set(exited_clone.get() + 1);
            })
            .build();

        fsm.send(Input::Down);
        assert_eq!((entered.get(), exited.get()), (1, 0));

        fsm.send(Input::Up);
        assert_eq!((entered.get(), exited.get()), (1, 1));

        fsm.send(Input::Down);
        assert_eq!(entered.get(), 2);
    }

    #[test]
    fn test_history_and_can_send() {
        let mut fsm = drag_machine();
        assert!(fsm.can_send(Input::Down));
        assert!(!fsm.can_send(Input::Settled));

        fsm.send(Input::Down);
        fsm.send(Input::Up);

        let history = fsm.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], (Phase::Idle, Input::Down, Phase::Dragging));
        assert_eq!(history[1], (Phase::Dragging, Input::Up, Phase::Settling));

        fsm.clear_history();
        assert!(fsm.history().is_empty());
    }
}
