use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// The index type for a label.
pub type LabelIndex = usize;

/// The index for a state.
pub type StateIndex = usize;

/// Represents a labelled transition system consisting of states with directed
/// labelled edges. Every state carries a payload of type `S`, and equal
/// payloads share a single state index.
///
/// The outgoing transitions of every state are kept sorted on (label, target).
#[derive(Clone)]
pub struct LabelledTransitionSystem<S> {
    states: Vec<S>,
    index: FxHashMap<S, StateIndex>,
    outgoing: Vec<Vec<(LabelIndex, StateIndex)>>,

    labels: Vec<String>,

    initial_state: StateIndex,

    num_of_transitions: usize,
}

impl<S: Clone + Eq + Hash> LabelledTransitionSystem<S> {
    /// Returns the index of the initial state
    pub fn initial_state_index(&self) -> StateIndex {
        self.initial_state
    }

    /// Returns a borrow of the initial state.
    pub fn initial_state(&self) -> &S {
        &self.states[self.initial_state]
    }

    /// Returns the payload of the given state.
    pub fn state(&self, index: StateIndex) -> &S {
        &self.states[index]
    }

    /// Returns the index of the state with the given payload, if it exists.
    pub fn find_state(&self, state: &S) -> Option<StateIndex> {
        self.index.get(state).copied()
    }

    /// Returns the set of outgoing transitions for the given state.
    pub fn outgoing_transitions(&self, state_index: StateIndex) -> impl Iterator<Item = (LabelIndex, StateIndex)> + '_ {
        self.outgoing[state_index].iter().copied()
    }

    /// Returns the outgoing transitions of the given state as a sorted slice.
    pub fn outgoing_slice(&self, state_index: StateIndex) -> &[(LabelIndex, StateIndex)] {
        &self.outgoing[state_index]
    }

    /// Returns the target of the first transition with the given label, the
    /// transition systems built in this workspace are deterministic.
    pub fn successor(&self, state_index: StateIndex, label: LabelIndex) -> Option<StateIndex> {
        let outgoing = &self.outgoing[state_index];
        let position = outgoing.partition_point(|(other, _)| *other < label);
        outgoing
            .get(position)
            .filter(|(other, _)| *other == label)
            .map(|(_, to)| *to)
    }

    /// Iterate over all state_index in the labelled transition system
    pub fn iter_states(&self) -> impl Iterator<Item = StateIndex> {
        0..self.states.len()
    }

    /// Returns the number of states.
    pub fn num_of_states(&self) -> StateIndex {
        self.states.len()
    }

    /// Returns the number of transitions.
    pub fn num_of_transitions(&self) -> usize {
        self.num_of_transitions
    }

    /// Returns the list of labels.
    pub fn labels(&self) -> &[String] {
        &self.labels[0..]
    }

    /// Returns the name of the given label.
    pub fn label(&self, label_index: LabelIndex) -> &str {
        &self.labels[label_index]
    }

    /// Iterates over all transitions (from, label, to) in the order of the
    /// source states.
    pub fn iter_transitions(&self) -> impl Iterator<Item = (StateIndex, LabelIndex, StateIndex)> + '_ {
        self.outgoing
            .iter()
            .enumerate()
            .flat_map(|(from, outgoing)| outgoing.iter().map(move |(label, to)| (from, *label, *to)))
    }
}

/// Incrementally constructs a [LabelledTransitionSystem], interning the state
/// payloads as they are inserted.
pub struct LtsBuilder<S> {
    states: Vec<S>,
    index: FxHashMap<S, StateIndex>,
    outgoing: Vec<Vec<(LabelIndex, StateIndex)>>,
    labels: Vec<String>,
    num_of_transitions: usize,
}

impl<S: Clone + Eq + Hash> LtsBuilder<S> {
    /// Creates an empty builder using the given label names.
    pub fn new(labels: Vec<String>) -> Self {
        LtsBuilder {
            states: Vec::new(),
            index: FxHashMap::default(),
            outgoing: Vec::new(),
            labels,
            num_of_transitions: 0,
        }
    }

    /// Inserts the given state, returns its index and whether it was newly added.
    pub fn insert_state(&mut self, state: S) -> (StateIndex, bool) {
        if let Some(index) = self.index.get(&state) {
            return (*index, false);
        }

        let index = self.states.len();
        self.index.insert(state.clone(), index);
        self.states.push(state);
        self.outgoing.push(Vec::new());
        (index, true)
    }

    /// Returns the payload of the given state.
    pub fn state(&self, index: StateIndex) -> &S {
        &self.states[index]
    }

    /// Returns the number of states inserted so far.
    pub fn num_of_states(&self) -> usize {
        self.states.len()
    }

    /// Adds a transition, returns false when it was already present.
    pub fn add_transition(&mut self, from: StateIndex, label: LabelIndex, to: StateIndex) -> bool {
        debug_assert!(label < self.labels.len(), "Label {label} is not a known label");
        debug_assert!(to < self.states.len(), "Target state {to} was never inserted");

        // Make sure to keep the outgoing transitions sorted.
        let outgoing = &mut self.outgoing[from];
        match outgoing.binary_search(&(label, to)) {
            Ok(_) => false,
            Err(pos) => {
                outgoing.insert(pos, (label, to));
                self.num_of_transitions += 1;
                true
            }
        }
    }

    /// Finishes the construction with the given initial state.
    pub fn finish(self, initial_state: StateIndex) -> LabelledTransitionSystem<S> {
        debug_assert!(
            initial_state < self.states.len().max(1),
            "The initial state must be one of the inserted states"
        );

        LabelledTransitionSystem {
            states: self.states,
            index: self.index,
            outgoing: self.outgoing,
            labels: self.labels,
            initial_state,
            num_of_transitions: self.num_of_transitions,
        }
    }
}

// The index is derived from the states.
impl<S: PartialEq> PartialEq for LabelledTransitionSystem<S> {
    fn eq(&self, other: &Self) -> bool {
        self.initial_state == other.initial_state
            && self.labels == other.labels
            && self.states == other.states
            && self.outgoing == other.outgoing
    }
}

impl<S: Eq> Eq for LabelledTransitionSystem<S> {}

impl<S> fmt::Display for LabelledTransitionSystem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Print some information about the LTS.
        writeln!(f, "Number of states: {}", self.states.len())?;
        writeln!(f, "Number of action labels: {}", self.labels.len())?;
        write!(f, "Number of transitions: {}", self.num_of_transitions)
    }
}

impl<S> fmt::Debug for LabelledTransitionSystem<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self)?;
        writeln!(f, "Initial state: {}", self.initial_state)?;

        for (from, outgoing) in self.outgoing.iter().enumerate() {
            for (label, to) in outgoing {
                let label_name = &self.labels[*label];

                writeln!(f, "{from} --[{label_name}]-> {to}")?;
            }
        }

        Ok(())
    }
}
