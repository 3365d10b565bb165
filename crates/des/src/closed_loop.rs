use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fmt;

use itertools::Itertools;
use log::debug;
use log::trace;

use cso_lts::scc_decomposition;
use cso_lts::LabelledTransitionSystem;
use cso_lts::LtsBuilder;
use cso_lts::Partition;

use crate::Alphabet;
use crate::DepthBound;
use crate::EventIndex;
use crate::PlantState;
use crate::SupervisorState;
use crate::SystemAssumptions;

/// A state of the closed-loop system, the supervisor state paired with the
/// plant state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClosedLoopState {
    pub supervisor: SupervisorState,
    pub plant: PlantState,
}

impl fmt::Display for ClosedLoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.supervisor, self.plant)
    }
}

/// The synchronous product of the plant and the supervisor, an event can only
/// occur when both of them define a transition for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedLoopSystem {
    states: Vec<ClosedLoopState>,
    initial_state: ClosedLoopState,
    transitions: BTreeMap<(ClosedLoopState, EventIndex), ClosedLoopState>,
    truncated: bool,
}

impl ClosedLoopSystem {
    /// Computes the reachable part of the closed-loop system in breadth first order.
    pub fn synthesize(assumptions: &SystemAssumptions, bound: &DepthBound) -> ClosedLoopSystem {
        let plant = assumptions.plant();
        let supervisor = assumptions.supervisor();

        let initial_state = ClosedLoopState {
            supervisor: supervisor.initial_state(),
            plant: plant.initial_state(),
        };

        let mut states = vec![initial_state];
        let mut discovered = BTreeSet::from([initial_state]);
        let mut queue = VecDeque::from([(initial_state, 0)]);
        let mut transitions = BTreeMap::new();

        while let Some((state, depth)) = queue.pop_front() {
            if bound.exceeded(depth) {
                continue;
            }

            for (event, plant_target) in plant.enabled_events(state.plant) {
                let Some(supervisor_target) = supervisor.successor(state.supervisor, event) else {
                    trace!("Event {} is disabled in {state}", assumptions.alphabet().name(event));
                    continue;
                };

                let target = ClosedLoopState {
                    supervisor: supervisor_target,
                    plant: plant_target,
                };
                transitions.insert((state, event), target);

                if discovered.insert(target) {
                    states.push(target);
                    queue.push_back((target, depth + 1));
                }
            }
        }

        debug!(
            "Closed-loop system has {} states and {} transitions",
            states.len(),
            transitions.len()
        );

        ClosedLoopSystem {
            states,
            initial_state,
            transitions,
            truncated: bound.truncated(),
        }
    }

    pub fn initial_state(&self) -> ClosedLoopState {
        self.initial_state
    }

    /// Returns the reachable states in the order in which they were discovered.
    pub fn states(&self) -> &[ClosedLoopState] {
        &self.states
    }

    pub fn num_of_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_of_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Returns true iff the depth bound cut off the synthesis.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Returns the target of (state, event), if the event is enabled.
    pub fn successor(&self, state: ClosedLoopState, event: EventIndex) -> Option<ClosedLoopState> {
        self.transitions.get(&(state, event)).copied()
    }

    /// Iterates over the enabled (event, target) pairs of a state, ordered by event.
    pub fn enabled_events(&self, state: ClosedLoopState) -> impl Iterator<Item = (EventIndex, ClosedLoopState)> + '_ {
        self.transitions
            .range((state, EventIndex::MIN)..=(state, EventIndex::MAX))
            .map(|((_, event), target)| (*event, *target))
    }

    /// Iterates over all transitions (from, event, to).
    pub fn iter_transitions(&self) -> impl Iterator<Item = (ClosedLoopState, EventIndex, ClosedLoopState)> + '_ {
        self.transitions.iter().map(|((from, event), to)| (*from, *event, *to))
    }

    /// Returns the words of at most `max_length` events generated from the
    /// initial state, sorted on (length, content). The empty word is always
    /// included and the empty event never occurs in a word.
    pub fn language(&self, alphabet: &Alphabet, max_length: usize) -> Vec<Vec<EventIndex>> {
        let mut words = BTreeSet::from([Vec::new()]);
        let mut frontier = vec![(self.initial_state, Vec::new())];

        for _ in 0..max_length {
            let mut next = Vec::new();

            for (state, word) in &frontier {
                for (event, target) in self.enabled_events(*state) {
                    if alphabet.is_empty_event(event) {
                        continue;
                    }

                    let mut extended = word.clone();
                    extended.push(event);
                    words.insert(extended.clone());
                    next.push((target, extended));
                }
            }

            frontier = next;
        }

        words
            .into_iter()
            .sorted_by(|left, right| left.len().cmp(&right.len()).then_with(|| left.cmp(right)))
            .collect()
    }

    /// Returns for every state that lies on a cycle of non-empty events the
    /// shortest such cycle starting and ending in that state.
    pub fn shortest_cycles(&self, alphabet: &Alphabet) -> BTreeMap<ClosedLoopState, Vec<EventIndex>> {
        let lts = self.to_lts(alphabet);
        let empty = alphabet.empty();
        let partition = scc_decomposition(&lts, &|_, label, _| label != empty);

        let mut result = BTreeMap::new();
        for state_index in lts.iter_states() {
            let block = partition.block_number(state_index);

            // Breadth first search within the component, back to the state itself.
            let mut queue = VecDeque::from([(state_index, Vec::new())]);
            let mut visited = vec![false; lts.num_of_states()];
            visited[state_index] = true;

            'search: while let Some((current, path)) = queue.pop_front() {
                for (label, target) in lts.outgoing_transitions(current) {
                    if label == empty || partition.block_number(target) != block {
                        continue;
                    }

                    let mut extended: Vec<EventIndex> = path.clone();
                    extended.push(label);

                    if target == state_index {
                        result.insert(*lts.state(state_index), extended);
                        break 'search;
                    }

                    if !visited[target] {
                        visited[target] = true;
                        queue.push_back((target, extended));
                    }
                }
            }
        }

        result
    }

    /// Returns the closed-loop system as a labelled transition system whose
    /// labels are the event names.
    pub fn to_lts(&self, alphabet: &Alphabet) -> LabelledTransitionSystem<ClosedLoopState> {
        let mut builder = LtsBuilder::new(alphabet.names().to_vec());
        for state in &self.states {
            builder.insert_state(*state);
        }

        for (from, event, to) in self.iter_transitions() {
            let (from_index, _) = builder.insert_state(from);
            let (to_index, _) = builder.insert_state(to);
            builder.add_transition(from_index, event, to_index);
        }

        builder.finish(0)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn state(supervisor: u32, plant: u32) -> ClosedLoopState {
        ClosedLoopState { supervisor, plant }
    }

    #[test]
    fn test_worked_example_closed_loop() {
        let assumptions = SystemAssumptions::worked_example();
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &DepthBound::unbounded());

        assert_eq!(closed_loop.initial_state(), state(0, 0));
        assert_eq!(closed_loop.num_of_states(), 22);
        assert_eq!(closed_loop.num_of_transitions(), 59);
        assert!(!closed_loop.truncated());

        let alphabet = assumptions.alphabet();
        let o2 = alphabet.index("o2").unwrap();
        assert_eq!(closed_loop.successor(state(0, 0), o2), Some(state(2, 3)));
        assert_eq!(closed_loop.successor(state(0, 1), o2), None);
    }

    #[test]
    fn test_closed_loop_conjunction() {
        let assumptions = SystemAssumptions::worked_example();
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &DepthBound::unbounded());

        for (from, event, to) in closed_loop.iter_transitions() {
            assert_eq!(assumptions.plant().successor(from.plant, event), Some(to.plant));
            assert_eq!(assumptions.supervisor().successor(from.supervisor, event), Some(to.supervisor));
        }

        for from in closed_loop.states() {
            for (event, plant_target) in assumptions.plant().enabled_events(from.plant) {
                if let Some(supervisor_target) = assumptions.supervisor().successor(from.supervisor, event) {
                    assert_eq!(
                        closed_loop.successor(*from, event),
                        Some(state(supervisor_target, plant_target))
                    );
                }
            }
        }
    }

    #[test]
    fn test_truncated_synthesis() {
        let assumptions = SystemAssumptions::worked_example();
        let bound = DepthBound::new(Some(1));
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &bound);

        assert!(closed_loop.truncated());
        assert_eq!(closed_loop.num_of_states(), 5);
    }

    #[test]
    fn test_language() {
        let assumptions = SystemAssumptions::worked_example();
        let alphabet = assumptions.alphabet();
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &DepthBound::unbounded());

        let language = closed_loop.language(alphabet, 2);
        assert_eq!(language.len(), 10);
        assert!(language[0].is_empty());
        assert_eq!(language[1], vec![alphabet.index("o1").unwrap()]);
        assert!(language.iter().all(|word| !word.contains(&alphabet.empty())));
        assert!(language.windows(2).all(|pair| pair[0].len() <= pair[1].len()));
    }

    #[test]
    fn test_shortest_cycles() {
        let assumptions = SystemAssumptions::worked_example();
        let alphabet = assumptions.alphabet();
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &DepthBound::unbounded());

        let cycles = closed_loop.shortest_cycles(alphabet);
        let o4 = alphabet.index("o4").unwrap();
        assert_eq!(cycles.get(&state(0, 0)), Some(&vec![o4, o4]));

        for (start, cycle) in &cycles {
            let end = cycle
                .iter()
                .try_fold(*start, |current, event| closed_loop.successor(current, *event));
            assert_eq!(end, Some(*start));
        }
    }
}
