use std::hash::Hash;

use log::debug;
use log::trace;

use crate::IndexedPartition;
use crate::LabelIndex;
use crate::LabelledTransitionSystem;
use crate::Partition;
use crate::StateIndex;

/// Computes the strongly connected component partitioning of the given LTS.
///
/// The `filter` determines which (from, label, to) edges are considered.
/// Block numbers are assigned in the order in which the components are
/// completed, which is a reverse topological order of the component graph:
/// every edge between two components goes from a higher to a lower (or equal)
/// block number.
pub fn scc_decomposition<S, F>(lts: &LabelledTransitionSystem<S>, filter: &F) -> IndexedPartition
where
    S: Clone + Eq + Hash,
    F: Fn(StateIndex, LabelIndex, StateIndex) -> bool,
{
    let start = std::time::Instant::now();
    trace!("{:?}", lts);

    let mut partition = IndexedPartition::new(lts.num_of_states());

    // The stack of Tarjan's algorithm, containing the states of the components
    // that are not yet completed.
    let mut stack = Vec::new();

    // Replaces the recursion, the position is the next outgoing transition to consider.
    let mut call_stack: Vec<(StateIndex, usize)> = Vec::new();

    // Keep track of already visited states.
    let mut indices: Vec<Option<StateInfo>> = vec![None; lts.num_of_states()];

    let mut smallest_index = 0;
    let mut next_block_number = 0;

    for root_index in lts.iter_states() {
        if indices[root_index].is_some() {
            continue;
        }

        visit(root_index, &mut indices, &mut smallest_index, &mut stack, &mut call_stack);

        while let Some(&(state_index, position)) = call_stack.last() {
            let outgoing = lts.outgoing_slice(state_index);

            if let Some(&(label_index, to_index)) = outgoing.get(position) {
                if let Some(top) = call_stack.last_mut() {
                    top.1 += 1;
                }

                if !filter(state_index, label_index, to_index) {
                    continue;
                }

                match indices[to_index] {
                    None => {
                        // Successor w has not yet been visited; descend into it.
                        visit(to_index, &mut indices, &mut smallest_index, &mut stack, &mut call_stack);
                    }
                    Some(StateInfo {
                        index, on_stack: true, ..
                    }) => {
                        // Successor w is on the stack and hence in the current SCC.
                        let info = indices[state_index].as_mut().expect("This state was added before");
                        info.lowlink = info.lowlink.min(index);
                    }
                    Some(_) => {
                        // Edge pointing to an SCC already found, must be ignored.
                    }
                }
            } else {
                call_stack.pop();

                let info = indices[state_index].expect("This state was added before");
                if info.lowlink == info.index {
                    // The state is the root of a strongly connected component.
                    while let Some(index) = stack.pop() {
                        let member = indices[index].as_mut().expect("This state was on the stack");
                        member.on_stack = false;

                        trace!("Added state {index} to block {}", next_block_number);
                        partition.set_block(index, next_block_number);

                        if index == state_index {
                            break;
                        }
                    }

                    next_block_number += 1;
                }

                // v.lowlink := min(v.lowlink, w.lowlink) for the parent v.
                if let Some(&(parent_index, _)) = call_stack.last() {
                    let parent = indices[parent_index].as_mut().expect("The parent was visited before");
                    parent.lowlink = parent.lowlink.min(info.lowlink);
                }
            }
        }
    }

    trace!("Final partition {partition}");
    debug!("Found {} strongly connected components", partition.num_of_blocks());
    debug!("Time scc_decomposition: {:.3}s", start.elapsed().as_secs_f64());
    partition
}

/// Returns true iff the given state lies on a cycle of the LTS, that is its
/// component has more than one state or it has a self-loop.
pub fn is_cyclic_state<S, P>(lts: &LabelledTransitionSystem<S>, partition: &P, state_index: StateIndex) -> bool
where
    S: Clone + Eq + Hash,
    P: Partition,
{
    let block = partition.block_number(state_index);

    lts.outgoing_transitions(state_index)
        .any(|(_, to_index)| partition.block_number(to_index) == block)
        || lts
            .iter_states()
            .any(|other| other != state_index && partition.block_number(other) == block)
}

#[derive(Clone, Copy, Debug)]
struct StateInfo {
    /// A unique index for every state.
    index: usize,

    /// Keeps track of the lowest state that can be reached on the stack.
    lowlink: usize,

    /// Keeps track of whether this state is on the stack.
    on_stack: bool,
}

/// Assigns the next index to the given state and pushes it on both stacks.
fn visit(
    state_index: StateIndex,
    indices: &mut [Option<StateInfo>],
    smallest_index: &mut usize,
    stack: &mut Vec<StateIndex>,
    call_stack: &mut Vec<(StateIndex, usize)>,
) {
    trace!("Visiting state {state_index}");

    indices[state_index] = Some(StateInfo {
        index: *smallest_index,
        lowlink: *smallest_index,
        on_stack: true,
    });

    *smallest_index += 1;
    stack.push(state_index);
    call_stack.push((state_index, 0));
}
