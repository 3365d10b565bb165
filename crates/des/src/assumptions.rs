use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::Alphabet;
use crate::Belief;
use crate::DeterministicAutomaton;
use crate::EventIndex;
use crate::EventSet;
use crate::PlantState;

const WORKED_EXAMPLE: &str = include_str!("../data/worked_example.json");

#[derive(Debug, Error)]
pub enum AssumptionError {
    #[error("Event \"{event}\" used in {context} is not part of the alphabet")]
    UnknownEvent { event: String, context: &'static str },

    #[error("State {state} used in {context} is not a declared state")]
    UnknownState { state: u32, context: &'static str },

    #[error("The {automaton} has transitions from state {state} on \"{event}\" to both {first} and {second}")]
    Nondeterministic {
        automaton: &'static str,
        state: u32,
        event: String,
        first: u32,
        second: u32,
    },

    #[error("The empty event must be a self-loop, but the {automaton} has {from} --{event}-> {to}")]
    NonStutteringEmptyEvent {
        automaton: &'static str,
        event: String,
        from: u32,
        to: u32,
    },

    #[error("The {automaton} must have exactly one initial state, found {count}")]
    AmbiguousInitialState { automaton: &'static str, count: usize },

    #[error("The empty event \"{0}\" cannot be observable")]
    EmptyEventObservable(String),

    #[error("Could not parse the assumptions: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read the assumptions: {0}")]
    Io(#[from] std::io::Error),
}

/// Determines the tamper options of a vulnerable event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TamperPolicy {
    /// Exactly the alterable events.
    #[default]
    Alterable,

    /// The alterable events and the original event.
    AlterableWithOriginal,
}

/// The options that influence the analysis.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    pub tamper_policy: TamperPolicy,

    /// Whether the attacker only observes events that the supervisor permits.
    pub require_supervisor_permission: bool,

    /// Bounds every exploration, `None` explores until the fixpoint.
    pub max_depth: Option<usize>,

    /// The maximum length of the reported closed-loop words.
    pub language_length: usize,

    /// The number of strategies that are reported.
    pub top_strategies: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            tamper_policy: TamperPolicy::default(),
            require_supervisor_permission: true,
            max_depth: None,
            language_length: 8,
            top_strategies: 10,
        }
    }
}

fn default_empty_event() -> String {
    "empty".to_string()
}

/// The serialized form of the system assumptions, transitions are given as
/// `[from, event, to]` triples.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssumptionsDescription {
    pub plant_states: Vec<u32>,
    pub supervisor_states: Vec<u32>,
    pub initial_plant_states: Vec<u32>,
    pub initial_supervisor_states: Vec<u32>,
    pub secret_states: Vec<u32>,

    pub events: Vec<String>,
    #[serde(default = "default_empty_event")]
    pub empty_event: String,

    pub attacker_observable: Vec<String>,
    pub supervisor_observable: Vec<String>,
    #[serde(default)]
    pub supervisor_controllable: Vec<String>,
    #[serde(default)]
    pub vulnerable: Vec<String>,
    #[serde(default)]
    pub alterable: Vec<String>,

    pub plant_transitions: Vec<(u32, String, u32)>,
    pub supervisor_transitions: Vec<(u32, String, u32)>,

    #[serde(default)]
    pub options: AnalysisOptions,
}

/// The validated configuration of a covert attack analysis.
#[derive(Clone, Debug)]
pub struct SystemAssumptions {
    alphabet: Alphabet,
    plant: DeterministicAutomaton,
    supervisor: DeterministicAutomaton,
    secret: BTreeSet<PlantState>,

    attacker_observable: EventSet,
    attacker_unobservable: EventSet,
    supervisor_observable: EventSet,
    supervisor_unobservable: EventSet,
    controllable: EventSet,
    vulnerable: EventSet,
    alterable: EventSet,

    options: AnalysisOptions,
}

impl SystemAssumptions {
    /// Validates the description.
    pub fn new(description: AssumptionsDescription) -> Result<SystemAssumptions, AssumptionError> {
        let alphabet = Alphabet::new(description.events.iter().cloned(), &description.empty_event);

        let event_set = |names: &[String], context: &'static str| -> Result<EventSet, AssumptionError> {
            names
                .iter()
                .map(|name| {
                    alphabet.index(name).ok_or_else(|| AssumptionError::UnknownEvent {
                        event: name.clone(),
                        context,
                    })
                })
                .collect()
        };

        let attacker_observable = event_set(&description.attacker_observable, "attacker_observable")?;
        let supervisor_observable = event_set(&description.supervisor_observable, "supervisor_observable")?;
        let controllable = event_set(&description.supervisor_controllable, "supervisor_controllable")?;
        let vulnerable = event_set(&description.vulnerable, "vulnerable")?;
        let alterable = event_set(&description.alterable, "alterable")?;

        if attacker_observable.contains(alphabet.empty()) || supervisor_observable.contains(alphabet.empty()) {
            return Err(AssumptionError::EmptyEventObservable(description.empty_event));
        }

        let plant = build_automaton(
            &alphabet,
            "plant",
            &description.plant_states,
            &description.initial_plant_states,
            &description.plant_transitions,
        )?;

        let supervisor = build_automaton(
            &alphabet,
            "supervisor",
            &description.supervisor_states,
            &description.initial_supervisor_states,
            &description.supervisor_transitions,
        )?;

        let mut secret = BTreeSet::new();
        for state in &description.secret_states {
            if !plant.contains_state(*state) {
                return Err(AssumptionError::UnknownState {
                    state: *state,
                    context: "secret_states",
                });
            }
            secret.insert(*state);
        }

        debug!(
            "Loaded assumptions with {} events, {} plant states and {} supervisor states",
            alphabet.len(),
            plant.num_of_states(),
            supervisor.num_of_states()
        );

        Ok(SystemAssumptions {
            attacker_unobservable: attacker_observable.complement(&alphabet),
            supervisor_unobservable: supervisor_observable.complement(&alphabet),
            alphabet,
            plant,
            supervisor,
            secret,
            attacker_observable,
            supervisor_observable,
            controllable,
            vulnerable,
            alterable,
            options: description.options,
        })
    }

    /// Parses and validates assumptions in the JSON format.
    pub fn from_json<R: Read>(reader: R) -> Result<SystemAssumptions, AssumptionError> {
        let description: AssumptionsDescription = serde_json::from_reader(reader)?;
        SystemAssumptions::new(description)
    }

    /// Reads the assumptions from the given JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<SystemAssumptions, AssumptionError> {
        let file = File::open(path)?;
        SystemAssumptions::from_json(BufReader::new(file))
    }

    /// The system with nine plant states and three supervisor states that is
    /// used throughout the documentation and tests.
    pub fn worked_example() -> SystemAssumptions {
        SystemAssumptions::from_json(WORKED_EXAMPLE.as_bytes()).expect("The bundled worked example is valid")
    }

    /// Replaces the analysis options.
    pub fn with_options(mut self, options: AnalysisOptions) -> SystemAssumptions {
        self.options = options;
        self
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn plant(&self) -> &DeterministicAutomaton {
        &self.plant
    }

    pub fn supervisor(&self) -> &DeterministicAutomaton {
        &self.supervisor
    }

    pub fn secret_states(&self) -> &BTreeSet<PlantState> {
        &self.secret
    }

    pub fn attacker_observable(&self) -> &EventSet {
        &self.attacker_observable
    }

    pub fn attacker_unobservable(&self) -> &EventSet {
        &self.attacker_unobservable
    }

    pub fn supervisor_observable(&self) -> &EventSet {
        &self.supervisor_observable
    }

    pub fn supervisor_unobservable(&self) -> &EventSet {
        &self.supervisor_unobservable
    }

    pub fn controllable(&self) -> &EventSet {
        &self.controllable
    }

    pub fn vulnerable(&self) -> &EventSet {
        &self.vulnerable
    }

    pub fn alterable(&self) -> &EventSet {
        &self.alterable
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Returns true iff the plant state is secret.
    pub fn is_secret(&self, state: PlantState) -> bool {
        self.secret.contains(&state)
    }

    /// Returns true iff the attacker is certain that the plant is in a secret
    /// state, an empty belief is never a secret belief.
    pub fn is_secret_belief(&self, belief: &Belief<PlantState>) -> bool {
        !belief.is_empty() && belief.is_subset(&self.secret)
    }

    /// Returns true iff the attacker may observe the given event at supervisor
    /// state `supervisor`.
    pub fn is_permitted(&self, supervisor: u32, event: EventIndex) -> bool {
        !self.options.require_supervisor_permission || self.supervisor.successor(supervisor, event).is_some()
    }

    /// Returns the events that the attacker may forward to the supervisor
    /// when the given event occurs, ordered by event index.
    pub fn tamper_options(&self, event: EventIndex) -> Vec<EventIndex> {
        if !self.vulnerable.contains(event) || self.alphabet.is_empty_event(event) {
            return vec![event];
        }

        let mut options: BTreeSet<EventIndex> = self.alterable.iter().collect();
        if self.options.tamper_policy == TamperPolicy::AlterableWithOriginal {
            options.insert(event);
        }

        options.into_iter().collect()
    }
}

/// Builds and validates one of the two automata.
fn build_automaton(
    alphabet: &Alphabet,
    automaton: &'static str,
    states: &[u32],
    initial_states: &[u32],
    transitions: &[(u32, String, u32)],
) -> Result<DeterministicAutomaton, AssumptionError> {
    let initial: BTreeSet<u32> = initial_states.iter().copied().collect();
    let initial_state = match initial.first() {
        Some(state) if initial.len() == 1 => *state,
        _ => {
            return Err(AssumptionError::AmbiguousInitialState {
                automaton,
                count: initial.len(),
            })
        }
    };

    let mut result = DeterministicAutomaton::new(states.iter().copied(), initial_state);
    if !result.contains_state(initial_state) {
        return Err(AssumptionError::UnknownState {
            state: initial_state,
            context: automaton,
        });
    }

    for (from, name, to) in transitions {
        let event = alphabet.index(name).ok_or_else(|| AssumptionError::UnknownEvent {
            event: name.clone(),
            context: automaton,
        })?;

        for state in [from, to] {
            if !result.contains_state(*state) {
                return Err(AssumptionError::UnknownState {
                    state: *state,
                    context: automaton,
                });
            }
        }

        if alphabet.is_empty_event(event) && from != to {
            return Err(AssumptionError::NonStutteringEmptyEvent {
                automaton,
                event: name.clone(),
                from: *from,
                to: *to,
            });
        }

        result
            .add_transition(*from, event, *to)
            .map_err(|first| AssumptionError::Nondeterministic {
                automaton,
                state: *from,
                event: name.clone(),
                first,
                second: *to,
            })?;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;
    use test_log::test;

    use super::*;

    fn small_description() -> AssumptionsDescription {
        serde_json::from_str(
            r#"{
                "plant_states": [0, 1],
                "supervisor_states": [0],
                "initial_plant_states": [0],
                "initial_supervisor_states": [0],
                "secret_states": [1],
                "events": ["a", "b"],
                "attacker_observable": ["a"],
                "supervisor_observable": ["a"],
                "vulnerable": ["a"],
                "alterable": ["b", "empty"],
                "plant_transitions": [[0, "a", 1], [1, "b", 0]],
                "supervisor_transitions": [[0, "a", 0], [0, "b", 0]]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_worked_example() {
        let assumptions = SystemAssumptions::worked_example();
        let alphabet = assumptions.alphabet();

        assert_eq!(alphabet.len(), 8);
        assert_eq!(assumptions.plant().num_of_states(), 9);
        assert_eq!(assumptions.supervisor().num_of_states(), 3);
        assert_eq!(assumptions.plant().initial_state(), 0);
        assert!(assumptions.is_secret(5));

        assert_eq!(
            assumptions.attacker_unobservable().display(alphabet).to_string(),
            "{o1, uo1, uo2, uo3}"
        );
        assert_eq!(
            assumptions.supervisor_unobservable().display(alphabet).to_string(),
            "{o4, uo1, uo2, uo3}"
        );
    }

    #[test_case(TamperPolicy::Alterable, "o2", vec!["empty", "o2", "o3"] ; "vulnerable o2")]
    #[test_case(TamperPolicy::Alterable, "o1", vec!["o1"] ; "not vulnerable")]
    #[test_case(TamperPolicy::AlterableWithOriginal, "o3", vec!["empty", "o2", "o3"] ; "original already alterable")]
    fn test_tamper_options(policy: TamperPolicy, event: &str, expected: Vec<&str>) {
        let assumptions = SystemAssumptions::worked_example().with_options(AnalysisOptions {
            tamper_policy: policy,
            ..AnalysisOptions::default()
        });
        let alphabet = assumptions.alphabet();

        let options: Vec<&str> = assumptions
            .tamper_options(alphabet.index(event).unwrap())
            .into_iter()
            .map(|option| alphabet.name(option))
            .collect();
        assert_eq!(options, expected);
    }

    #[test]
    fn test_tamper_policy_with_original() {
        let assumptions = SystemAssumptions::new(small_description())
            .unwrap()
            .with_options(AnalysisOptions {
                tamper_policy: TamperPolicy::AlterableWithOriginal,
                ..AnalysisOptions::default()
            });
        let alphabet = assumptions.alphabet();

        let a = alphabet.index("a").unwrap();
        assert_eq!(assumptions.tamper_options(a).len(), 3);
        assert!(assumptions.tamper_options(a).contains(&a));
    }

    #[test]
    fn test_secret_belief() {
        let assumptions = SystemAssumptions::worked_example();

        assert!(assumptions.is_secret_belief(&[5].into_iter().collect()));
        assert!(!assumptions.is_secret_belief(&[5, 4].into_iter().collect()));
        assert!(!assumptions.is_secret_belief(&Belief::default()));
    }

    #[test]
    fn test_unknown_event() {
        let mut description = small_description();
        description.plant_transitions.push((0, "c".to_string(), 0));

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::UnknownEvent { .. })
        ));
    }

    #[test]
    fn test_unknown_state() {
        let mut description = small_description();
        description.secret_states.push(7);

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::UnknownState { state: 7, .. })
        ));
    }

    #[test]
    fn test_nondeterministic_plant() {
        let mut description = small_description();
        description.plant_transitions.push((0, "a".to_string(), 0));

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::Nondeterministic { .. })
        ));
    }

    #[test]
    fn test_empty_event_must_stutter() {
        let mut description = small_description();
        description.plant_transitions.push((0, "empty".to_string(), 1));

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::NonStutteringEmptyEvent { .. })
        ));
    }

    #[test]
    fn test_ambiguous_initial_state() {
        let mut description = small_description();
        description.initial_plant_states = vec![0, 1];

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::AmbiguousInitialState { count: 2, .. })
        ));
    }

    #[test]
    fn test_observable_empty_event() {
        let mut description = small_description();
        description.attacker_observable.push("empty".to_string());

        assert!(matches!(
            SystemAssumptions::new(description),
            Err(AssumptionError::EmptyEventObservable(_))
        ));
    }

    #[test]
    fn test_options_are_parsed() {
        let mut json: serde_json::Value = serde_json::from_str(WORKED_EXAMPLE).unwrap();
        json["options"] = serde_json::json!({ "tamper_policy": "alterable_with_original", "max_depth": 4 });

        let assumptions = SystemAssumptions::from_json(json.to_string().as_bytes()).unwrap();
        assert_eq!(assumptions.options().tamper_policy, TamperPolicy::AlterableWithOriginal);
        assert_eq!(assumptions.options().max_depth, Some(4));
        assert!(assumptions.options().require_supervisor_permission);
        assert_eq!(assumptions.options().language_length, 8);
    }
}
