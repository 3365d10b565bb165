use std::collections::BTreeSet;
use std::collections::VecDeque;

use log::debug;
use log::trace;

use cso_lts::LabelIndex;
use cso_lts::LtsBuilder;
use cso_lts::StateIndex;

use crate::AggregateState;
use crate::AoAcag;

/// Removes every branch of the AO-ACAG that inevitably leads to detection.
///
/// First the tamper transitions into the alarm state are removed. Then, until
/// nothing changes, decision states without remaining tamper transitions are
/// cut off by removing their incoming observation. Finally only the part reachable from the initial aggregate is kept, which
/// makes pruning idempotent.
pub fn prune(ao_acag: &AoAcag) -> AoAcag {
    let mut transitions: BTreeSet<(StateIndex, LabelIndex, StateIndex)> = ao_acag
        .iter_transitions()
        .filter(|(_, _, to)| *ao_acag.state(*to) != AggregateState::Alarm)
        .collect();

    loop {
        let mut num_of_outgoing = vec![0usize; ao_acag.num_of_states()];
        for (from, _, _) in &transitions {
            num_of_outgoing[*from] += 1;
        }

        // Environment aggregates without observations stay, only decisions die.
        let is_dead =
            |state_index: StateIndex| num_of_outgoing[state_index] == 0 && ao_acag.state(state_index).is_decision();

        let before = transitions.len();
        transitions.retain(|(from, _, to)| {
            let keep = !is_dead(*to);
            if !keep {
                trace!("Removed transition {from} -> {to} into a dead state");
            }
            keep
        });

        if transitions.len() == before {
            break;
        }
    }

    // Rebuild the reachable part in breadth first order.
    let initial = ao_acag.initial_state_index();
    let mut builder = LtsBuilder::new(ao_acag.labels().to_vec());
    let mut renumbering = vec![None; ao_acag.num_of_states()];

    let (new_initial, _) = builder.insert_state(ao_acag.initial_state().clone());
    renumbering[initial] = Some(new_initial);

    let mut queue = VecDeque::from([initial]);
    while let Some(state_index) = queue.pop_front() {
        let from = renumbering[state_index].expect("Queued states were renumbered before");

        for (label, to) in ao_acag.outgoing_transitions(state_index) {
            if !transitions.contains(&(state_index, label, to)) {
                continue;
            }

            let target = match renumbering[to] {
                Some(target) => target,
                None => {
                    let state = match ao_acag.state(to) {
                        AggregateState::Decision { event, .. } => AggregateState::Decision {
                            source: from,
                            event: *event,
                        },
                        state => state.clone(),
                    };

                    let (target, _) = builder.insert_state(state);
                    renumbering[to] = Some(target);
                    queue.push_back(to);
                    target
                }
            };

            builder.add_transition(from, label, target);
        }
    }

    let result = builder.finish(new_initial);
    debug!(
        "Pruned AO-ACAG has {} states and {} transitions",
        result.num_of_states(),
        result.num_of_transitions()
    );
    result
}
