use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::EventIndex;

/// A state of the plant.
pub type PlantState = u32;

/// A state of the supervisor.
pub type SupervisorState = u32;

/// A deterministic automaton with a partial transition function, an undefined
/// transition means that the event is disabled in that state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterministicAutomaton {
    states: BTreeSet<u32>,
    initial_state: u32,
    transitions: BTreeMap<(u32, EventIndex), u32>,
}

impl DeterministicAutomaton {
    /// Creates an automaton without transitions.
    pub fn new(states: impl IntoIterator<Item = u32>, initial_state: u32) -> DeterministicAutomaton {
        DeterministicAutomaton {
            states: states.into_iter().collect(),
            initial_state,
            transitions: BTreeMap::new(),
        }
    }

    /// Adds the transition, when a transition with a different target already
    /// exists for (from, event) that target is returned as error and nothing changes.
    pub fn add_transition(&mut self, from: u32, event: EventIndex, to: u32) -> Result<(), u32> {
        match self.transitions.get(&(from, event)) {
            Some(existing) if *existing != to => Err(*existing),
            _ => {
                self.transitions.insert((from, event), to);
                Ok(())
            }
        }
    }

    /// Returns the target of the transition (state, event), if it is defined.
    pub fn successor(&self, state: u32, event: EventIndex) -> Option<u32> {
        self.transitions.get(&(state, event)).copied()
    }

    /// Iterates over the defined (event, target) pairs of the given state,
    /// ordered by event.
    pub fn enabled_events(&self, state: u32) -> impl Iterator<Item = (EventIndex, u32)> + '_ {
        self.transitions
            .range((state, EventIndex::MIN)..=(state, EventIndex::MAX))
            .map(|((_, event), to)| (*event, *to))
    }

    /// Returns the initial state.
    pub fn initial_state(&self) -> u32 {
        self.initial_state
    }

    /// Returns true iff the state is one of the declared states.
    pub fn contains_state(&self, state: u32) -> bool {
        self.states.contains(&state)
    }

    /// Returns the declared states.
    pub fn states(&self) -> &BTreeSet<u32> {
        &self.states
    }

    /// Returns the number of states.
    pub fn num_of_states(&self) -> usize {
        self.states.len()
    }

    /// Returns the number of transitions.
    pub fn num_of_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Iterates over all transitions (from, event, to) ordered by source state.
    pub fn iter_transitions(&self) -> impl Iterator<Item = (u32, EventIndex, u32)> + '_ {
        self.transitions.iter().map(|((from, event), to)| (*from, *event, *to))
    }
}
