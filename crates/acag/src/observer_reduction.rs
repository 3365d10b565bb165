use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use log::debug;
use log::trace;

use cso_des::unobservable_reach;
use cso_des::DepthBound;
use cso_des::EventIndex;
use cso_des::EventSet;
use cso_lts::LabelledTransitionSystem;
use cso_lts::LtsBuilder;
use cso_lts::StateIndex;

use crate::Acag;

/// A state of the AO-ACAG.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AggregateState {
    /// The environment states of the ACAG that the attacker cannot distinguish,
    /// sorted on their index. `secret` holds when one of them reveals the secret.
    Environment { members: Vec<StateIndex>, secret: bool },

    /// The decision of the attacker after observing `event` in the aggregate `source`.
    Decision { source: StateIndex, event: EventIndex },

    /// The single state that represents detection by the supervisor.
    Alarm,
}

impl AggregateState {
    pub fn is_environment(&self) -> bool {
        matches!(self, AggregateState::Environment { .. })
    }

    pub fn is_decision(&self) -> bool {
        matches!(self, AggregateState::Decision { .. })
    }

    pub fn is_secret(&self) -> bool {
        matches!(self, AggregateState::Environment { secret: true, .. })
    }
}

/// The ACAG reduced to the observer of the attacker.
pub type AoAcag = LabelledTransitionSystem<AggregateState>;

/// Returns the environment states reachable from `seed` by a step Ye -> Ya -> Ye'
/// of which both events are silent to the attacker, see [reduce_observer].
fn attacker_closure(
    acag: &Acag,
    seed: impl IntoIterator<Item = StateIndex>,
    unobservable: &EventSet,
    bound: &DepthBound,
) -> Vec<StateIndex> {
    let lts = acag.lts();

    unobservable_reach(
        seed,
        move |state_index| {
            lts.outgoing_transitions(*state_index)
                .filter(move |(event, _)| unobservable.contains(*event))
                .flat_map(move |(event, decision)| {
                    lts.outgoing_transitions(decision)
                        .filter(move |(tampered, _)| unobservable.contains(*tampered))
                        .map(move |(_, target)| (event, target))
                })
        },
        unobservable,
        bound,
    )
    .iter()
    .copied()
    .collect()
}

/// Collapses the ACAG into a graph over the events that the attacker observes.
///
/// Every environment aggregate is closed under attacker unobservable steps.
/// For each observable event the decision states of all members are grouped
/// into a single decision aggregate, and for every tampered event the targets
/// are grouped and closed again. Targets that contain a detected state are
/// replaced by the [AggregateState::Alarm] state.
pub fn reduce_observer(acag: &Acag, unobservable: &EventSet, bound: &DepthBound) -> AoAcag {
    let lts = acag.lts();

    // The attacker learns nothing from the empty event either.
    let silent: EventSet = unobservable.iter().chain([acag.empty_event()]).collect();
    let unobservable = &silent;

    let environment = |members: Vec<StateIndex>| -> AggregateState {
        if members.iter().any(|member| acag.is_alarm(*member)) {
            AggregateState::Alarm
        } else {
            AggregateState::Environment {
                secret: members.iter().any(|member| acag.is_secret(*member)),
                members,
            }
        }
    };

    let mut builder = LtsBuilder::new(lts.labels().to_vec());

    let initial_members = attacker_closure(acag, [lts.initial_state_index()], unobservable, bound);
    let (initial, _) = builder.insert_state(AggregateState::Environment {
        secret: initial_members.iter().any(|member| acag.is_secret(*member)),
        members: initial_members,
    });

    let mut queue = VecDeque::from([initial]);
    while let Some(state_index) = queue.pop_front() {
        let AggregateState::Environment { members, .. } = builder.state(state_index).clone() else {
            continue;
        };

        // Group the decision states of the members by the observed event.
        let mut observations: BTreeMap<EventIndex, BTreeSet<StateIndex>> = BTreeMap::new();
        for member in &members {
            for (event, decision) in lts.outgoing_transitions(*member) {
                if !unobservable.contains(event) {
                    observations.entry(event).or_default().insert(decision);
                }
            }
        }

        for (event, decisions) in observations {
            let (decision_index, _) = builder.insert_state(AggregateState::Decision {
                source: state_index,
                event,
            });
            builder.add_transition(state_index, event, decision_index);

            let mut tampers: BTreeMap<EventIndex, BTreeSet<StateIndex>> = BTreeMap::new();
            for decision in decisions {
                for (tampered, target) in lts.outgoing_transitions(decision) {
                    tampers.entry(tampered).or_default().insert(target);
                }
            }

            for (tampered, targets) in tampers {
                let target_state = environment(attacker_closure(acag, targets, unobservable, bound));
                trace!("Aggregate {state_index} --{event}({tampered})-> {target_state:?}");

                let is_environment = target_state.is_environment();
                let (target, is_new) = builder.insert_state(target_state);
                builder.add_transition(decision_index, tampered, target);

                if is_new && is_environment {
                    queue.push_back(target);
                }
            }
        }
    }

    let result = builder.finish(initial);
    debug!(
        "AO-ACAG has {} states and {} transitions",
        result.num_of_states(),
        result.num_of_transitions()
    );
    result
}

/// Returns the name of an aggregate, for example `{ye0,ye3}` or `AX`. Decision
/// aggregates are named after their source and observed event.
pub fn aggregate_name(acag: &Acag, ao_acag: &AoAcag, state_index: StateIndex) -> String {
    match ao_acag.state(state_index) {
        AggregateState::Environment { members, .. } => {
            let names: Vec<&str> = members.iter().map(|member| acag.name(*member)).collect();
            format!("{{{}}}", names.join(","))
        }
        AggregateState::Decision { source, event } => {
            format!("{}/{}", aggregate_name(acag, ao_acag, *source), ao_acag.label(*event))
        }
        AggregateState::Alarm => "AX".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use cso_des::AttackerObserver;
    use cso_des::ClosedLoopSystem;
    use cso_des::SupervisorObserver;
    use cso_des::SystemAssumptions;

    use super::*;

    #[test]
    fn test_worked_example_reduction() {
        let assumptions = SystemAssumptions::worked_example();
        let bound = DepthBound::unbounded();
        let closed_loop = ClosedLoopSystem::synthesize(&assumptions, &bound);
        let supervisor = SupervisorObserver::build(&assumptions, &closed_loop, &bound);
        let attacker = AttackerObserver::build(&assumptions, &bound);
        let acag = Acag::build(&assumptions, &supervisor, &attacker);

        let ao_acag = reduce_observer(&acag, assumptions.attacker_unobservable(), &bound);

        // The initial aggregate contains the initial environment state.
        let AggregateState::Environment { members, .. } = ao_acag.initial_state() else {
            panic!("The initial aggregate is an environment aggregate");
        };
        assert!(members.contains(&acag.lts().initial_state_index()));
        assert!(aggregate_name(&acag, &ao_acag, ao_acag.initial_state_index()).starts_with("{ye0"));

        for (from, event, to) in ao_acag.iter_transitions() {
            match ao_acag.state(from) {
                AggregateState::Environment { .. } => {
                    assert!(assumptions.attacker_observable().contains(event));
                    assert!(ao_acag.state(to).is_decision());
                }
                AggregateState::Decision { .. } => assert!(!ao_acag.state(to).is_decision()),
                AggregateState::Alarm => panic!("The alarm has no outgoing transitions"),
            }
        }

        assert!(ao_acag.iter_states().any(|state| ao_acag.state(state).is_secret()));
        assert!(ao_acag.find_state(&AggregateState::Alarm).is_some());
    }
}
