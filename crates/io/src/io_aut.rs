use std::collections::HashMap;
use std::error::Error;
use std::hash::Hash;
use std::io::Read;
use std::io::Write;

use log::trace;
use regex::Regex;
use streaming_iterator::StreamingIterator;
use thiserror::Error;

use cso_lts::LabelIndex;
use cso_lts::LabelledTransitionSystem;
use cso_lts::LtsBuilder;

use crate::line_iterator::LineIterator;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid .aut header {0}")]
    InvalidHeader(&'static str),

    #[error("Invalid transition on line {0}")]
    InvalidTransition(usize),

    #[error("The header declares {declared} {kind}, but {found} were found")]
    CountMismatch {
        kind: &'static str,
        declared: usize,
        found: usize,
    },
}

/// Loads a labelled transition system in the Aldebaran format from the given
/// reader. The payload of every state is its index in the file, the labels
/// are numbered in order of appearance.
///
/// The Aldebaran format consists of a header:
///     `des (<initial>: Nat, <num_of_transitions>: Nat, <num_of_states>: Nat)`
///
/// And one line for every transition:
///     `(<from>: Nat, "<label>": Str, <to>: Nat)`
///     `(<from>: Nat, <label>: Str, <to>: Nat)`
pub fn read_aut(reader: impl Read) -> Result<LabelledTransitionSystem<usize>, Box<dyn Error>> {
    let mut lines = LineIterator::new(reader);
    lines.advance();
    let header = lines
        .get()
        .ok_or(IoError::InvalidHeader("The first line should be the header"))?;

    // Regex for des (<initial>: Nat, <num_of_transitions>: Nat, <num_of_states>: Nat)
    let header_regex = Regex::new(r#"des\s*\(\s*([0-9]*)\s*,\s*([0-9]*)\s*,\s*([0-9]*)\s*\)\s*"#)
        .expect("Regex compilation should not fail");

    // Regex for (<from>: Nat, "<label>": str, <to>: Nat)
    let transition_regex = Regex::new(r#"\s*\(\s*([0-9]*)\s*,\s*"(.*)"\s*,\s*([0-9]*)\s*\)\s*"#)
        .expect("Regex compilation should not fail");

    // Regex for (<from>: Nat, label: str, <to>: Nat)
    let unquoted_transition_regex = Regex::new(r#"\s*\(\s*([0-9]*)\s*,\s*(.*)\s*,\s*([0-9]*)\s*\)\s*"#)
        .expect("Regex compilation should not fail");

    let (_, [initial_txt, num_of_transitions_txt, num_of_states_txt]) = header_regex
        .captures(header)
        .ok_or(IoError::InvalidHeader(
            "does not match des (<init>, <num_transitions>, <num_states>)",
        ))?
        .extract();

    let initial_state: usize = initial_txt.parse()?;
    let num_of_transitions: usize = num_of_transitions_txt.parse()?;
    let num_of_states: usize = num_of_states_txt.parse()?;

    // The labels are only known after reading the transitions.
    let mut labels_index: HashMap<String, LabelIndex> = HashMap::new();
    let mut labels: Vec<String> = Vec::new();
    let mut transitions = Vec::with_capacity(num_of_transitions);

    loop {
        lines.advance();
        let line_number = lines.line_number();
        let Some(line) = lines.get() else {
            break;
        };

        if line.trim().is_empty() {
            continue;
        }

        // Try either of the transition regexes and otherwise return an error.
        let (_, [from_txt, label_txt, to_txt]) = transition_regex
            .captures(line)
            .or_else(|| unquoted_transition_regex.captures(line))
            .ok_or(IoError::InvalidTransition(line_number))?
            .extract();

        let from: usize = from_txt.parse()?;
        let to: usize = to_txt.parse()?;
        let label_index = *labels_index.entry(label_txt.to_string()).or_insert_with(|| {
            labels.push(label_txt.to_string());
            labels.len() - 1
        });

        if from >= num_of_states || to >= num_of_states {
            return Err(IoError::InvalidTransition(line_number).into());
        }

        trace!("Read transition {} --[{}]-> {}", from, label_txt, to);
        transitions.push((from, label_index, to));
    }

    if transitions.len() != num_of_transitions {
        return Err(IoError::CountMismatch {
            kind: "transitions",
            declared: num_of_transitions,
            found: transitions.len(),
        }
        .into());
    }

    if initial_state >= num_of_states.max(1) {
        return Err(IoError::InvalidHeader("the initial state is not a state").into());
    }

    let mut builder = LtsBuilder::new(labels);
    for state in 0..num_of_states {
        builder.insert_state(state);
    }

    for (from, label, to) in transitions {
        builder.add_transition(from, label, to);
    }

    Ok(builder.finish(initial_state))
}

/// Writes the labelled transition system in the Aldebaran format to the given
/// writer, see [read_aut] for the format.
pub fn write_aut<S>(writer: &mut impl Write, lts: &LabelledTransitionSystem<S>) -> Result<(), Box<dyn Error>>
where
    S: Clone + Eq + Hash,
{
    writeln!(
        writer,
        "des ({}, {}, {})",
        lts.initial_state_index(),
        lts.num_of_transitions(),
        lts.num_of_states()
    )?;

    for (from, label, to) in lts.iter_transitions() {
        writeln!(writer, "({}, \"{}\", {})", from, lts.label(label), to)?;
    }

    Ok(())
}
