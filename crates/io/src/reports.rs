//! Plain text reports that give meaning to the state indices of the exported
//! .aut files.

use std::error::Error;
use std::io::Write;

use cso_acag::aggregate_name;
use cso_acag::AcagState;
use cso_acag::Analysis;
use cso_acag::AoAcag;
use cso_des::ClosedLoopSystem;
use cso_des::EventIndex;
use cso_des::LabelMap;
use cso_des::SupervisorEstimate;
use cso_des::SystemAssumptions;

fn estimate_name(labels: &LabelMap, estimate: SupervisorEstimate) -> &str {
    match estimate {
        SupervisorEstimate::Alarm => "AX",
        SupervisorEstimate::Belief(index) => labels.name(index),
    }
}

fn word(assumptions: &SystemAssumptions, events: &[EventIndex]) -> String {
    if events.is_empty() {
        "-".to_string()
    } else {
        let names: Vec<&str> = events.iter().map(|event| assumptions.alphabet().name(*event)).collect();
        names.join(" ")
    }
}

/// Writes the closed-loop language up to `language_length` events and the
/// shortest cycle through every cyclic closed-loop state.
pub fn write_closed_loop(
    writer: &mut impl Write,
    assumptions: &SystemAssumptions,
    closed_loop: &ClosedLoopSystem,
) -> Result<(), Box<dyn Error>> {
    let max_length = assumptions.options().language_length;

    writeln!(writer, "# Language up to {max_length} events")?;
    for events in closed_loop.language(assumptions.alphabet(), max_length) {
        writeln!(writer, "{}", word(assumptions, &events))?;
    }

    writeln!(writer)?;
    writeln!(writer, "# Shortest cycles")?;
    for (state, events) in closed_loop.shortest_cycles(assumptions.alphabet()) {
        writeln!(writer, "{state}: [{}]...", word(assumptions, &events))?;
    }

    Ok(())
}

/// Writes the names of the aggregates of an AO-ACAG, indexed as in its .aut file.
fn write_aggregates(writer: &mut impl Write, analysis: &Analysis, graph: &AoAcag) -> Result<(), Box<dyn Error>> {
    for state_index in graph.iter_states() {
        let secret = if graph.state(state_index).is_secret() { " secret" } else { "" };
        writeln!(
            writer,
            "{state_index} = {}{secret}",
            aggregate_name(&analysis.acag, graph, state_index)
        )?;
    }

    Ok(())
}

/// Writes the label maps: the supervisor beliefs `S{n}`, the attacker beliefs
/// `A{n}` and the observer tables over them, the states of the ACAG and the
/// aggregates of both AO-ACAGs.
pub fn write_labels(
    writer: &mut impl Write,
    assumptions: &SystemAssumptions,
    analysis: &Analysis,
) -> Result<(), Box<dyn Error>> {
    let supervisor_labels = analysis.supervisor.labels();
    let attacker_labels = analysis.attacker.labels();

    writeln!(writer, "# Supervisor beliefs")?;
    for (name, index) in supervisor_labels.iter() {
        writeln!(writer, "{name} = {}", analysis.supervisor.belief(index))?;
    }

    writeln!(writer)?;
    writeln!(writer, "# Attacker beliefs")?;
    for (name, index) in attacker_labels.iter() {
        writeln!(writer, "{name} = {}", analysis.attacker.belief(index))?;
    }

    writeln!(writer)?;
    writeln!(writer, "# Supervisor observer")?;
    for (from, event, to) in analysis.supervisor.iter_table() {
        writeln!(
            writer,
            "{} --{}-> {}",
            supervisor_labels.name(from),
            assumptions.alphabet().name(event),
            supervisor_labels.name(to)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "# Attacker observer")?;
    for (z, from, event, to) in analysis.attacker.iter_tables() {
        writeln!(
            writer,
            "z{z}: {} --{}-> {}",
            attacker_labels.name(from),
            assumptions.alphabet().name(event),
            attacker_labels.name(to)
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "# ACAG states")?;
    let lts = analysis.acag.lts();
    for state_index in lts.iter_states() {
        let name = analysis.acag.name(state_index);
        match lts.state(state_index) {
            AcagState::Environment(state) => writeln!(
                writer,
                "{name} = ({}, {}, {}, x{})",
                estimate_name(&supervisor_labels, state.estimate),
                attacker_labels.name(state.belief),
                state.supervisor,
                state.plant
            )?,
            AcagState::Decision(state) => {
                let options: Vec<&str> = state
                    .options
                    .iter()
                    .map(|event| assumptions.alphabet().name(*event))
                    .collect();

                writeln!(
                    writer,
                    "{name} = ({}, {}, z{}, x{}) after {} options {{{}}}",
                    estimate_name(&supervisor_labels, state.estimate),
                    attacker_labels.name(state.belief),
                    state.supervisor,
                    state.plant,
                    assumptions.alphabet().name(state.event),
                    options.join(", ")
                )?
            }
        }
    }

    writeln!(writer)?;
    writeln!(writer, "# AO-ACAG aggregates")?;
    write_aggregates(writer, analysis, &analysis.ao_acag)?;

    writeln!(writer)?;
    writeln!(writer, "# Pruned AO-ACAG aggregates")?;
    write_aggregates(writer, analysis, &analysis.pruned)?;

    Ok(())
}

/// Writes the `top` strategies with the highest probability, all strategies
/// ordered by their rendered form, and the classified components.
pub fn write_strategies(writer: &mut impl Write, analysis: &Analysis, top: usize) -> Result<(), Box<dyn Error>> {
    let map = analysis.strategy_map();

    writeln!(writer, "# Top {} of {} strategies", top.min(map.len()), map.len())?;
    for (strategy, probability) in map.top(top) {
        writeln!(writer, "{strategy}: {probability}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "# All strategies")?;
    for (strategy, probability) in map.iter() {
        writeln!(writer, "{strategy}: {probability}")?;
    }

    writeln!(writer)?;
    writeln!(writer, "# Components")?;
    for component in &analysis.components {
        let names: Vec<String> = component
            .states
            .iter()
            .map(|state_index| aggregate_name(&analysis.acag, &analysis.pruned, *state_index))
            .collect();
        writeln!(writer, "{}: {}", component.kind, names.join(" "))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use cso_acag::analyse;
    use cso_utilities::Timing;

    use super::*;

    fn report<F>(write: F) -> String
    where
        F: FnOnce(&mut Vec<u8>) -> Result<(), Box<dyn Error>>,
    {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_labels_report() {
        let assumptions = SystemAssumptions::worked_example();
        let analysis = analyse(&assumptions, &mut Timing::new());

        let text = report(|writer| write_labels(writer, &assumptions, &analysis));

        assert!(text.contains("S0 = {"));
        assert!(text.contains("A0 = {}"));
        assert!(text.contains("ye0 = ("));
        assert!(text.contains("# Attacker observer\nz0: A"));
        assert!(text.contains("# Pruned AO-ACAG aggregates\n0 = {ye0"));
    }

    #[test]
    fn test_strategies_report() {
        let assumptions = SystemAssumptions::worked_example();
        let analysis = analyse(&assumptions, &mut Timing::new());

        let text = report(|writer| write_strategies(writer, &analysis, 3));
        let top: Vec<&str> = text
            .lines()
            .skip(1)
            .take_while(|line| !line.is_empty())
            .collect();

        assert!(!top.is_empty() && top.len() <= 3);
        assert!(top.iter().all(|line| line.ends_with('%')));
    }

    #[test]
    fn test_closed_loop_report() {
        let assumptions = SystemAssumptions::worked_example();
        let analysis = analyse(&assumptions, &mut Timing::new());

        let text = report(|writer| write_closed_loop(writer, &assumptions, &analysis.closed_loop));

        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# Language up to 8 events"));
        assert_eq!(lines.next(), Some("-"));
        assert!(text.contains("(0,0): [o4 o4]..."));
    }
}
