use std::fmt;

use itertools::Itertools;
use log::debug;

use cso_lts::is_cyclic_state;
use cso_lts::scc_decomposition;
use cso_lts::Partition;
use cso_lts::StateIndex;

use crate::AoAcag;

/// The kind of a strongly connected component of the pruned AO-ACAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKind {
    /// The attacker can never leave the component.
    Sink,

    /// Every transition that leaves the component enters a decision state.
    Alpha,

    /// Every transition that leaves the component enters an environment aggregate.
    Beta,

    /// Some decision inside the component has a choice of continuations within
    /// it, or the exits are mixed.
    Complex,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Sink => write!(f, "sink"),
            ComponentKind::Alpha => write!(f, "alpha"),
            ComponentKind::Beta => write!(f, "beta"),
            ComponentKind::Complex => write!(f, "complex"),
        }
    }
}

/// A non-trivial strongly connected component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub kind: ComponentKind,
    pub states: Vec<StateIndex>,
}

/// Classifies the components of the graph that contain a cycle, that is with
/// more than one state or with a self-loop.
pub fn classify_components(graph: &AoAcag) -> Vec<Component> {
    let partition = scc_decomposition(graph, &|_, _, _| true);

    let mut result = Vec::new();
    for (block, states) in partition.blocks().into_iter().enumerate() {
        let Some(&representative) = states.first() else {
            continue;
        };

        if !is_cyclic_state(graph, &partition, representative) {
            continue;
        }

        let exits: Vec<StateIndex> = states
            .iter()
            .flat_map(|state_index| graph.outgoing_transitions(*state_index))
            .map(|(_, to)| to)
            .filter(|to| partition.block_number(*to) != block)
            .unique()
            .collect();

        let has_choice = states.iter().any(|state_index| {
            graph.state(*state_index).is_decision()
                && graph
                    .outgoing_transitions(*state_index)
                    .filter(|(_, to)| partition.block_number(*to) == block)
                    .count()
                    != 1
        });

        let kind = if exits.is_empty() {
            ComponentKind::Sink
        } else if has_choice {
            ComponentKind::Complex
        } else if exits.iter().all(|to| graph.state(*to).is_decision()) {
            ComponentKind::Alpha
        } else if exits.iter().all(|to| !graph.state(*to).is_decision()) {
            ComponentKind::Beta
        } else {
            ComponentKind::Complex
        };

        result.push(Component { kind, states });
    }

    debug!("Classified {} cyclic components", result.len());
    result
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use test_log::test;

    use cso_lts::LabelIndex;
    use cso_lts::LtsBuilder;

    use crate::AggregateState;

    use super::*;

    fn environment(member: StateIndex) -> AggregateState {
        AggregateState::Environment {
            members: vec![member],
            secret: false,
        }
    }

    fn decision(source: StateIndex) -> AggregateState {
        AggregateState::Decision { source, event: 0 }
    }

    /// States: 0 env, 1 decision, 2 env, 3 decision, 4 env, 5 decision.
    fn graph(transitions: &[(StateIndex, LabelIndex, StateIndex)]) -> AoAcag {
        let mut builder = LtsBuilder::new(vec!["a".into(), "b".into()]);
        for state in [environment(0), decision(0), environment(2), decision(2), environment(4), decision(4)] {
            builder.insert_state(state);
        }

        for (from, label, to) in transitions {
            builder.add_transition(*from, *label, *to);
        }

        builder.finish(0)
    }

    #[test_case(&[(0, 0, 1), (1, 0, 0)], ComponentKind::Sink ; "closed cycle")]
    #[test_case(&[(0, 0, 1), (1, 0, 0), (0, 1, 3)], ComponentKind::Alpha ; "exit into a decision")]
    #[test_case(&[(0, 0, 1), (1, 0, 0), (1, 1, 2)], ComponentKind::Beta ; "exit into an environment")]
    #[test_case(&[(0, 0, 1), (1, 0, 0), (0, 1, 3), (1, 1, 2)], ComponentKind::Complex ; "mixed exits")]
    #[test_case(&[(0, 0, 1), (1, 0, 0), (1, 1, 2), (2, 0, 3), (3, 0, 0), (2, 1, 5)], ComponentKind::Complex ; "choice inside")]
    fn test_classification(transitions: &[(StateIndex, LabelIndex, StateIndex)], expected: ComponentKind) {
        let components = classify_components(&graph(transitions));

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].kind, expected);
        assert!(components[0].states.contains(&0));
    }

    #[test]
    fn test_acyclic_graph_has_no_components() {
        let components = classify_components(&graph(&[(0, 0, 1), (1, 0, 2)]));
        assert!(components.is_empty());
    }
}
