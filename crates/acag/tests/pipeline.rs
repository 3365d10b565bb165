use test_case::test_case;
use test_log::test;

use cso_acag::analyse;
use cso_acag::prune;
use cso_acag::AggregateState;
use cso_acag::Analysis;
use cso_acag::AoAcag;
use cso_acag::Strategy;
use cso_des::AnalysisOptions;
use cso_des::SystemAssumptions;
use cso_des::TamperPolicy;
use cso_lts::breadth_first_order;
use cso_utilities::Timing;

fn run(assumptions: &SystemAssumptions) -> Analysis {
    analyse(assumptions, &mut Timing::new())
}

/// A supervisor that disables u and c initially and b after the first step.
fn restricted(require_supervisor_permission: bool) -> SystemAssumptions {
    SystemAssumptions::from_json(include_str!("../../des/data/restricted_supervisor.json").as_bytes())
        .unwrap()
        .with_options(AnalysisOptions {
            require_supervisor_permission,
            ..AnalysisOptions::default()
        })
}

fn variant(tamper_policy: TamperPolicy, require_supervisor_permission: bool) -> SystemAssumptions {
    SystemAssumptions::worked_example().with_options(AnalysisOptions {
        tamper_policy,
        require_supervisor_permission,
        ..AnalysisOptions::default()
    })
}

/// Replays the steps of a strategy on the pruned graph and returns the visited
/// environment aggregates.
fn replay(pruned: &AoAcag, strategy: &Strategy) -> Vec<usize> {
    let mut visited = vec![pruned.initial_state_index()];

    for step in &strategy.steps {
        let current = *visited.last().unwrap();
        let decision = pruned
            .successor(current, step.observed)
            .unwrap_or_else(|| panic!("Observation {} is not enabled in {current}", pruned.label(step.observed)));
        let target = pruned
            .successor(decision, step.tampered)
            .unwrap_or_else(|| panic!("Tamper {} is not enabled in {decision}", pruned.label(step.tampered)));

        assert!(pruned.state(target).is_environment());
        visited.push(target);
    }

    visited
}

#[test_case(TamperPolicy::Alterable, true ; "default options")]
#[test_case(TamperPolicy::AlterableWithOriginal, true ; "tamper with original")]
#[test_case(TamperPolicy::Alterable, false ; "without permission")]
fn test_pipeline_is_deterministic(tamper_policy: TamperPolicy, require_supervisor_permission: bool) {
    let assumptions = variant(tamper_policy, require_supervisor_permission);

    let first = run(&assumptions);
    let second = run(&assumptions);

    assert_eq!(first.closed_loop.to_lts(assumptions.alphabet()), second.closed_loop.to_lts(assumptions.alphabet()));
    assert_eq!(first.supervisor.labels(), second.supervisor.labels());
    assert_eq!(first.attacker.labels(), second.attacker.labels());
    assert_eq!(first.acag.lts(), second.acag.lts());
    assert_eq!(first.ao_acag, second.ao_acag);
    assert_eq!(first.pruned, second.pruned);
    assert_eq!(first.strategies, second.strategies);
    assert_eq!(first.report, second.report);
}

#[test_case(TamperPolicy::Alterable, true ; "default options")]
#[test_case(TamperPolicy::AlterableWithOriginal, true ; "tamper with original")]
#[test_case(TamperPolicy::Alterable, false ; "without permission")]
fn test_no_alarm_survives_pruning(tamper_policy: TamperPolicy, require_supervisor_permission: bool) {
    let analysis = run(&variant(tamper_policy, require_supervisor_permission));

    assert!(analysis.pruned.find_state(&AggregateState::Alarm).is_none());
    assert_eq!(
        breadth_first_order(&analysis.pruned, &|_, _, _| true).len(),
        analysis.pruned.num_of_states(),
        "Only the reachable part is kept"
    );

    for state_index in analysis.pruned.iter_states() {
        // Every decision that survives has a safe continuation.
        if analysis.pruned.state(state_index).is_decision() {
            assert!(analysis.pruned.outgoing_transitions(state_index).next().is_some());
        }
    }
}

#[test]
fn test_secret_environment_states_are_not_expanded() {
    let analysis = run(&SystemAssumptions::worked_example());
    let acag = &analysis.acag;

    let mut num_of_secret = 0;
    for state_index in acag.lts().iter_states() {
        if acag.is_secret(state_index) {
            num_of_secret += 1;
            assert_eq!(acag.lts().outgoing_transitions(state_index).count(), 0);
        }
    }

    assert!(num_of_secret > 0);
}

#[test_case(TamperPolicy::Alterable, true ; "default options")]
#[test_case(TamperPolicy::AlterableWithOriginal, true ; "tamper with original")]
fn test_pruning_is_idempotent(tamper_policy: TamperPolicy, require_supervisor_permission: bool) {
    let analysis = run(&variant(tamper_policy, require_supervisor_permission));

    assert_eq!(prune(&analysis.pruned), analysis.pruned);
}

#[test]
fn test_worked_example_initial_steps() {
    let assumptions = SystemAssumptions::worked_example();
    let analysis = run(&assumptions);

    let alphabet = assumptions.alphabet();
    let plant = assumptions.plant();
    let lts = analysis.acag.lts();

    let initial = lts.initial_state_index();
    assert_eq!(analysis.acag.name(initial), "ye0");

    let expected = plant
        .enabled_events(plant.initial_state())
        .filter(|(event, _)| assumptions.is_permitted(assumptions.supervisor().initial_state(), *event))
        .count();
    assert_eq!(expected, 5, "o1, o2, o3, o4 and the empty event");
    assert_eq!(lts.outgoing_transitions(initial).count(), expected);

    let o2 = alphabet.index("o2").unwrap();
    let decision = lts.successor(initial, o2).unwrap();
    let tampered: Vec<&str> = lts.outgoing_transitions(decision).map(|(label, _)| lts.label(label)).collect();
    assert_eq!(tampered, vec!["empty", "o2", "o3"]);
}

#[test_case(TamperPolicy::Alterable, true ; "default options")]
#[test_case(TamperPolicy::AlterableWithOriginal, true ; "tamper with original")]
#[test_case(TamperPolicy::Alterable, false ; "without permission")]
fn test_strategies_replay_on_pruned_graph(tamper_policy: TamperPolicy, require_supervisor_permission: bool) {
    let analysis = run(&variant(tamper_policy, require_supervisor_permission));
    let pruned = &analysis.pruned;

    for strategy in &analysis.strategies {
        let visited = replay(pruned, strategy);
        let last = *visited.last().unwrap();

        match strategy.cycle {
            None => assert!(pruned.state(last).is_secret()),
            Some(position) => {
                assert_eq!(visited[position], last, "The cycle returns to where it started");
                assert!(visited[position..].iter().any(|state| pruned.state(*state).is_secret()));
            }
        }

        assert!(strategy.ratio.secret <= strategy.ratio.total);
        assert!(strategy.ratio.secret > 0);
    }

    let map = analysis.strategy_map();
    assert!(map.len() <= analysis.strategies.len());
    assert!(map.top(AnalysisOptions::default().top_strategies).len() <= map.len());
}

#[test]
fn test_worked_example_has_covert_strategy() {
    let analysis = run(&SystemAssumptions::worked_example());
    let map = analysis.strategy_map();

    assert!(!map.is_empty());
    for (strategy, probability) in map.top(10) {
        assert!(!strategy.is_empty());
        assert!(probability.ends_with('%'));
    }
}

#[test]
fn test_depth_bound_is_reported() {
    let assumptions = SystemAssumptions::worked_example().with_options(AnalysisOptions {
        max_depth: Some(1),
        ..AnalysisOptions::default()
    });

    let analysis = run(&assumptions);
    assert!(analysis.report.truncated);
    assert!(analysis.pruned.find_state(&AggregateState::Alarm).is_none());
}

#[test_case(true, 2 ; "with permission")]
#[test_case(false, 3 ; "without permission")]
fn test_restricted_supervisor_initial_steps(require_supervisor_permission: bool, num_of_steps: usize) {
    let assumptions = restricted(require_supervisor_permission);
    let analysis = run(&assumptions);

    let plant = assumptions.plant();
    let permitted = plant
        .enabled_events(plant.initial_state())
        .filter(|(event, _)| assumptions.is_permitted(assumptions.supervisor().initial_state(), *event))
        .count();
    assert_eq!(permitted, num_of_steps);

    let lts = analysis.acag.lts();
    assert_eq!(lts.outgoing_transitions(lts.initial_state_index()).count(), num_of_steps);
}

#[test_case(true ; "with permission")]
#[test_case(false ; "without permission")]
fn test_restricted_supervisor_reveals_secret(require_supervisor_permission: bool) {
    let analysis = run(&restricted(require_supervisor_permission));

    assert!(analysis
        .acag
        .lts()
        .iter_states()
        .any(|state_index| analysis.acag.is_secret(state_index)));

    // Observing b and then c reveals the secret state 5 on the third aggregate.
    let map = analysis.strategy_map();
    assert_eq!(map.iter().collect::<Vec<_>>(), vec![("b(b)c(c)", "33.33%".to_string())]);

    for strategy in &analysis.strategies {
        let visited = replay(&analysis.pruned, strategy);
        assert!(analysis.pruned.state(*visited.last().unwrap()).is_secret());
    }
}
