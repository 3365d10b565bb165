use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use log::trace;

use cso_lts::scc_decomposition;
use cso_lts::LabelIndex;
use cso_lts::Partition;
use cso_lts::StateIndex;

use crate::AoAcag;

/// One step of a strategy: the observed event and the event forwarded to the
/// supervisor instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step {
    pub observed: LabelIndex,
    pub tampered: LabelIndex,
}

/// The fraction of the aggregates on a path that reveal the secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SuccessRatio {
    pub secret: usize,
    pub total: usize,
}

impl SuccessRatio {
    /// Returns the ratio as a percentage.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.secret as f64 / self.total as f64
        }
    }
}

impl Ord for SuccessRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare a/b with c/d as a*d with c*b to avoid rounding.
        (self.secret * other.total)
            .cmp(&(other.secret * self.total))
            .then_with(|| self.total.cmp(&other.total))
    }
}

impl PartialOrd for SuccessRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SuccessRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percentage())
    }
}

/// A path through the pruned AO-ACAG from the initial aggregate. When `cycle`
/// is set, the steps from that position onwards form a cycle that returns to
/// the aggregate reached after `cycle` steps and can be repeated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strategy {
    pub steps: Vec<Step>,
    pub cycle: Option<usize>,
    pub ratio: SuccessRatio,
}

impl Strategy {
    /// Renders the strategy as `o2(o3)o4(o4)`, a cycle is rendered as
    /// `prefix[cycle]...`.
    pub fn render(&self, labels: &[String]) -> String {
        let render_steps = |steps: &[Step]| -> String {
            steps
                .iter()
                .map(|step| format!("{}({})", labels[step.observed], labels[step.tampered]))
                .collect()
        };

        match self.cycle {
            None => render_steps(&self.steps),
            Some(position) => format!(
                "{}[{}]...",
                render_steps(&self.steps[..position]),
                render_steps(&self.steps[position..])
            ),
        }
    }
}

/// Enumerates the strategies of the attacker in the pruned AO-ACAG.
///
/// Every simple path from the initial aggregate is recorded when it arrives at
/// an aggregate that reveals the secret, a path that returns to an aggregate
/// on it is recorded once as a cycle when the cycle reveals the secret. The
/// search never enters aggregates from which no secret can be reached.
pub fn extract_strategies(graph: &AoAcag) -> Vec<Strategy> {
    let can_reach_secret = secret_reachability(graph);

    let mut strategies = Vec::new();
    if graph.num_of_states() == 0 || !can_reach_secret[graph.initial_state_index()] {
        debug!("The secret cannot be reached from the initial aggregate");
        return strategies;
    }

    // The aggregates on the current path, the steps between them, and the
    // position in the path of every aggregate on it.
    let initial = graph.initial_state_index();
    let mut path = vec![initial];
    let mut steps: Vec<Step> = Vec::new();
    let mut position: Vec<Option<usize>> = vec![None; graph.num_of_states()];
    position[initial] = Some(0);
    let mut num_of_secret = usize::from(graph.state(initial).is_secret());

    // Replaces the recursion, every frame holds the remaining moves of an aggregate.
    let mut call_stack = vec![moves(graph, initial, &can_reach_secret)];

    while let Some(frame) = call_stack.last_mut() {
        let Some((step, target)) = frame.pop() else {
            // Backtrack.
            call_stack.pop();
            if let Some(state_index) = path.pop() {
                position[state_index] = None;
                if graph.state(state_index).is_secret() {
                    num_of_secret -= 1;
                }
            }
            steps.pop();
            continue;
        };

        if let Some(cycle_start) = position[target] {
            let cycle_has_secret = path[cycle_start..]
                .iter()
                .any(|state_index| graph.state(*state_index).is_secret());

            if cycle_has_secret {
                let mut cycle_steps = steps.clone();
                cycle_steps.push(step);

                trace!("Found cycle back to aggregate {target}");
                strategies.push(Strategy {
                    steps: cycle_steps,
                    cycle: Some(cycle_start),
                    ratio: SuccessRatio {
                        secret: num_of_secret,
                        total: path.len(),
                    },
                });
            }
            continue;
        }

        // Descend into the target.
        position[target] = Some(path.len());
        path.push(target);
        steps.push(step);

        let target_is_secret = graph.state(target).is_secret();
        if target_is_secret {
            num_of_secret += 1;
            strategies.push(Strategy {
                steps: steps.clone(),
                cycle: None,
                ratio: SuccessRatio {
                    secret: num_of_secret,
                    total: path.len(),
                },
            });
        }

        call_stack.push(moves(graph, target, &can_reach_secret));
    }

    debug!("Found {} strategies", strategies.len());
    strategies
}

/// Returns the (step, target aggregate) pairs of an environment aggregate
/// whose target can still reach the secret, in reverse order so that popping
/// them visits the steps in order.
fn moves(graph: &AoAcag, state_index: StateIndex, can_reach_secret: &[bool]) -> Vec<(Step, StateIndex)> {
    let mut result = Vec::new();

    for (observed, decision) in graph.outgoing_transitions(state_index) {
        for (tampered, target) in graph.outgoing_transitions(decision) {
            if graph.state(target).is_environment() && can_reach_secret[target] {
                result.push((Step { observed, tampered }, target));
            }
        }
    }

    result.reverse();
    result
}

/// Computes for every state whether a secret revealing aggregate is reachable
/// from it, using the components in reverse topological order.
fn secret_reachability(graph: &AoAcag) -> Vec<bool> {
    let partition = scc_decomposition(graph, &|_, _, _| true);

    let mut block_reaches = vec![false; partition.num_of_blocks()];
    for (block, states) in partition.blocks().into_iter().enumerate() {
        // Transitions leaving the component go to blocks that were completed before.
        block_reaches[block] = states.iter().any(|state_index| {
            graph.state(*state_index).is_secret()
                || graph.outgoing_transitions(*state_index).any(|(_, to)| {
                    let other = partition.block_number(to);
                    other != block && block_reaches[other]
                })
        });
    }

    graph
        .iter_states()
        .map(|state_index| block_reaches[partition.block_number(state_index)])
        .collect()
}

/// The strategies indexed by their rendered form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StrategyMap {
    entries: BTreeMap<String, SuccessRatio>,
}

impl StrategyMap {
    pub fn new(strategies: &[Strategy], labels: &[String]) -> StrategyMap {
        StrategyMap {
            entries: strategies
                .iter()
                .map(|strategy| (strategy.render(labels), strategy.ratio))
                .collect(),
        }
    }

    /// Returns the formatted probability of the given strategy.
    pub fn get(&self, strategy: &str) -> Option<String> {
        self.entries.get(strategy).map(|ratio| ratio.to_string())
    }

    /// Iterates over (strategy, probability) ordered by the strategy.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.entries
            .iter()
            .map(|(strategy, ratio)| (strategy.as_str(), ratio.to_string()))
    }

    /// Returns the `k` strategies with the highest probability, ties are
    /// ordered by the strategy.
    pub fn top(&self, k: usize) -> Vec<(&str, String)> {
        let mut entries: Vec<(&String, &SuccessRatio)> = self.entries.iter().collect();
        entries.sort_by(|(left, left_ratio), (right, right_ratio)| {
            right_ratio
                .percentage()
                .total_cmp(&left_ratio.percentage())
                .then_with(|| left.cmp(right))
        });

        entries
            .into_iter()
            .take(k)
            .map(|(strategy, ratio)| (strategy.as_str(), ratio.to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use cso_lts::LtsBuilder;

    use crate::AggregateState;

    use super::*;

    fn environment(member: StateIndex, secret: bool) -> AggregateState {
        AggregateState::Environment {
            members: vec![member],
            secret,
        }
    }

    fn decision(source: StateIndex, event: LabelIndex) -> AggregateState {
        AggregateState::Decision { source, event }
    }

    /// 0 -a-> 1 -a-> 2 (secret) -b-> 3 -b-> 0, and 0 -b-> 4 -b-> 5 (dead end).
    fn cyclic_graph() -> AoAcag {
        let mut builder = LtsBuilder::new(vec!["a".into(), "b".into()]);
        for state in [
            environment(0, false),
            decision(0, 0),
            environment(2, true),
            decision(2, 1),
            decision(0, 1),
            environment(5, false),
        ] {
            builder.insert_state(state);
        }

        builder.add_transition(0, 0, 1);
        builder.add_transition(1, 0, 2);
        builder.add_transition(2, 1, 3);
        builder.add_transition(3, 1, 0);
        builder.add_transition(0, 1, 4);
        builder.add_transition(4, 1, 5);
        builder.finish(0)
    }

    #[test]
    fn test_cyclic_strategies() {
        let graph = cyclic_graph();
        let strategies = extract_strategies(&graph);
        let map = StrategyMap::new(&strategies, graph.labels());

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("a(a)").as_deref(), Some("50.00%"));
        assert_eq!(map.get("[a(a)b(b)]...").as_deref(), Some("50.00%"));
        assert!(map.iter().all(|(strategy, _)| !strategy.starts_with("b(b)")));
    }

    #[test]
    fn test_ratio_ordering() {
        let half = SuccessRatio { secret: 1, total: 2 };
        let third = SuccessRatio { secret: 1, total: 3 };

        assert!(half > third);
        assert_eq!(third.to_string(), "33.33%");
        assert_eq!(SuccessRatio { secret: 0, total: 0 }.percentage(), 0.0);
    }

    #[test]
    fn test_top_strategies() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let step = |observed, tampered| Step { observed, tampered };
        let strategies = vec![
            Strategy {
                steps: vec![step(0, 0)],
                cycle: None,
                ratio: SuccessRatio { secret: 1, total: 2 },
            },
            Strategy {
                steps: vec![step(1, 0)],
                cycle: None,
                ratio: SuccessRatio { secret: 1, total: 2 },
            },
            Strategy {
                steps: vec![step(0, 1), step(1, 1)],
                cycle: None,
                ratio: SuccessRatio { secret: 2, total: 3 },
            },
        ];

        let map = StrategyMap::new(&strategies, &labels);
        let top: Vec<&str> = map.top(2).into_iter().map(|(strategy, _)| strategy).collect();
        assert_eq!(top, vec!["a(b)b(b)", "a(a)"]);
    }

    #[test]
    fn test_unreachable_secret() {
        let mut builder = LtsBuilder::new(vec!["a".into()]);
        builder.insert_state(environment(0, false));
        builder.insert_state(decision(0, 0));
        builder.insert_state(environment(2, false));
        builder.add_transition(0, 0, 1);
        builder.add_transition(1, 0, 2);

        assert!(extract_strategies(&builder.finish(0)).is_empty());
    }
}
