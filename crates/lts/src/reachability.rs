use std::collections::VecDeque;
use std::hash::Hash;

use crate::LabelIndex;
use crate::LabelledTransitionSystem;
use crate::StateIndex;

/// Returns for every state whether it is reachable from the given state using
/// the transitions accepted by the filter. The state itself is only marked
/// when it lies on a cycle.
#[cfg(test)]
pub fn reachable_states<S, F>(lts: &LabelledTransitionSystem<S>, state_index: StateIndex, filter: &F) -> Vec<bool>
where
    S: Clone + Eq + Hash,
    F: Fn(StateIndex, LabelIndex, StateIndex) -> bool,
{
    let mut stack = vec![state_index];
    let mut visited = vec![false; lts.num_of_states()];

    // Depth first search to find all reachable states.
    while let Some(inner_state_index) = stack.pop() {
        for (label_index, to_index) in lts.outgoing_transitions(inner_state_index) {
            if filter(inner_state_index, label_index, to_index) && !visited[to_index] {
                visited[to_index] = true;
                stack.push(to_index);
            }
        }
    }

    visited
}

/// Returns the states reachable from the initial state in breadth first order,
/// starting with the initial state.
pub fn breadth_first_order<S, F>(lts: &LabelledTransitionSystem<S>, filter: &F) -> Vec<StateIndex>
where
    S: Clone + Eq + Hash,
    F: Fn(StateIndex, LabelIndex, StateIndex) -> bool,
{
    let mut order = Vec::new();
    if lts.num_of_states() == 0 {
        return order;
    }

    let mut visited = vec![false; lts.num_of_states()];
    let mut queue = VecDeque::from([lts.initial_state_index()]);
    visited[lts.initial_state_index()] = true;

    while let Some(state_index) = queue.pop_front() {
        order.push(state_index);

        for (label_index, to_index) in lts.outgoing_transitions(state_index) {
            if filter(state_index, label_index, to_index) && !visited[to_index] {
                visited[to_index] = true;
                queue.push_back(to_index);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use crate::random_lts;

    use super::*;

    #[test]
    fn test_breadth_first_order() {
        let lts = random_lts(10, 3, 3);
        let order = breadth_first_order(&lts, &|_, _, _| true);

        assert_eq!(order.first(), Some(&lts.initial_state_index()));

        let reachable = reachable_states(&lts, lts.initial_state_index(), &|_, _, _| true);
        for state_index in lts.iter_states() {
            if state_index != lts.initial_state_index() {
                assert_eq!(reachable[state_index], order.contains(&state_index));
            }
        }
    }
}
