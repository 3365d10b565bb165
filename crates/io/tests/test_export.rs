use test_case::test_case;

use cso_acag::analyse;
use cso_des::SystemAssumptions;
use cso_io::io_aut::read_aut;
use cso_io::io_aut::write_aut;
use cso_lts::LabelledTransitionSystem;
use cso_utilities::Timing;

fn round_trip<S: Clone + Eq + std::hash::Hash>(lts: &LabelledTransitionSystem<S>) {
    let mut buffer: Vec<u8> = Vec::new();
    write_aut(&mut buffer, lts).unwrap();

    let result = read_aut(&buffer[..]).unwrap();
    assert_eq!(result.initial_state_index(), lts.initial_state_index());
    assert_eq!(result.num_of_states(), lts.num_of_states());
    assert_eq!(result.num_of_transitions(), lts.num_of_transitions());

    for (from, label, to) in lts.iter_transitions() {
        let label_index = result
            .labels()
            .iter()
            .position(|name| name == lts.label(label))
            .unwrap();
        assert!(result.outgoing_transitions(from).any(|transition| transition == (label_index, to)));
    }
}

#[test_case("closed_loop" ; "closed loop")]
#[test_case("acag" ; "acag")]
#[test_case("ao_acag" ; "ao acag")]
#[test_case("pruned_ao_acag" ; "pruned ao acag")]
fn test_export_stage(stage: &str) {
    let _ = env_logger::builder().is_test(true).try_init();

    let assumptions = SystemAssumptions::worked_example();
    let analysis = analyse(&assumptions, &mut Timing::new());

    match stage {
        "closed_loop" => round_trip(&analysis.closed_loop.to_lts(assumptions.alphabet())),
        "acag" => round_trip(analysis.acag.lts()),
        "ao_acag" => round_trip(&analysis.ao_acag),
        "pruned_ao_acag" => round_trip(&analysis.pruned),
        _ => unreachable!("Unknown stage {stage}"),
    }
}
