use std::collections::VecDeque;

use log::debug;
use log::trace;

use cso_des::AttackerObserver;
use cso_des::EventIndex;
use cso_des::SupervisorEstimate;
use cso_des::SupervisorObserver;
use cso_des::SystemAssumptions;
use cso_lts::LabelledTransitionSystem;
use cso_lts::LtsBuilder;
use cso_lts::StateIndex;

use crate::AcagState;
use crate::DecisionState;
use crate::EnvironmentState;
use crate::SupervisorLocation;

/// The attack-centric attack graph, a transition system that alternates
/// between environment states and attacker decision states. The labels are
/// the event names of the alphabet.
pub struct Acag {
    lts: LabelledTransitionSystem<AcagState>,
    names: Vec<String>,
    secret: Vec<bool>,
    empty: EventIndex,
}

impl Acag {
    /// Explores the ACAG in breadth first order from the initial environment state.
    pub fn build(assumptions: &SystemAssumptions, supervisor: &SupervisorObserver, attacker: &AttackerObserver) -> Acag {
        let alphabet = assumptions.alphabet();
        let plant = assumptions.plant();
        let automaton = assumptions.supervisor();
        let require_permission = assumptions.options().require_supervisor_permission;

        let mut builder = LtsBuilder::new(alphabet.names().to_vec());

        let initial = EnvironmentState {
            estimate: supervisor.initial(),
            belief: attacker.initial(),
            supervisor: SupervisorLocation::State(automaton.initial_state()),
            plant: plant.initial_state(),
        };
        let (initial_index, _) = builder.insert_state(AcagState::Environment(initial));
        let mut queue = VecDeque::from([initial_index]);

        while let Some(state_index) = queue.pop_front() {
            match builder.state(state_index).clone() {
                AcagState::Environment(state) => {
                    let SupervisorLocation::State(z) = state.supervisor else {
                        continue;
                    };

                    if state.is_alarm() {
                        trace!("Environment state {state_index} is detected");
                        continue;
                    }

                    if assumptions.is_secret_belief(attacker.belief(state.belief)) {
                        trace!("Environment state {state_index} reveals the secret");
                        continue;
                    }

                    // The empty event is a stutter step that the attacker cannot tamper with.
                    for (event, plant_target) in plant.enabled_events(state.plant) {
                        if require_permission && automaton.successor(z, event).is_none() {
                            continue;
                        }

                        let decision = DecisionState {
                            estimate: state.estimate,
                            belief: attacker.update(z, state.belief, event),
                            supervisor: z,
                            plant: plant_target,
                            options: assumptions.tamper_options(event),
                            event,
                        };

                        let (target, is_new) = builder.insert_state(AcagState::Decision(decision));
                        builder.add_transition(state_index, event, target);
                        if is_new {
                            queue.push_back(target);
                        }
                    }
                }
                AcagState::Decision(decision) => {
                    for tampered in decision.options.iter().copied() {
                        let mut estimate = supervisor.update(decision.estimate, tampered);

                        // Erasing the event leaves the supervisor untouched.
                        let location = if alphabet.is_empty_event(tampered) {
                            SupervisorLocation::State(decision.supervisor)
                        } else if let Some(z) = automaton.successor(decision.supervisor, tampered) {
                            SupervisorLocation::State(z)
                        } else {
                            estimate = SupervisorEstimate::Alarm;
                            SupervisorLocation::Detected
                        };

                        let next = EnvironmentState {
                            estimate,
                            belief: decision.belief,
                            supervisor: location,
                            plant: decision.plant,
                        };

                        let (target, is_new) = builder.insert_state(AcagState::Environment(next));
                        builder.add_transition(state_index, tampered, target);
                        if is_new {
                            queue.push_back(target);
                        }
                    }
                }
            }
        }

        let lts = builder.finish(initial_index);

        // States were inserted in breadth first order, so the numbering follows it.
        let mut num_of_environment = 0;
        let mut num_of_decision = 0;
        let names: Vec<String> = lts
            .iter_states()
            .map(|state_index| match lts.state(state_index) {
                AcagState::Environment(_) => {
                    num_of_environment += 1;
                    format!("ye{}", num_of_environment - 1)
                }
                AcagState::Decision(_) => {
                    num_of_decision += 1;
                    format!("ya{}", num_of_decision - 1)
                }
            })
            .collect();

        let secret: Vec<bool> = lts
            .iter_states()
            .map(|state_index| match lts.state(state_index) {
                AcagState::Environment(state) => assumptions.is_secret_belief(attacker.belief(state.belief)),
                AcagState::Decision(_) => false,
            })
            .collect();

        debug!(
            "ACAG has {} environment states, {} decision states and {} transitions",
            num_of_environment,
            num_of_decision,
            lts.num_of_transitions()
        );

        Acag {
            lts,
            names,
            secret,
            empty: alphabet.empty(),
        }
    }

    /// Returns the underlying transition system.
    pub fn lts(&self) -> &LabelledTransitionSystem<AcagState> {
        &self.lts
    }

    /// Returns the symbolic name of a state, `ye{n}` or `ya{n}`.
    pub fn name(&self, state_index: StateIndex) -> &str {
        &self.names[state_index]
    }

    /// Returns the environment state with the given index, if it is one.
    pub fn environment(&self, state_index: StateIndex) -> Option<&EnvironmentState> {
        self.lts.state(state_index).environment()
    }

    /// Returns true iff the state is an environment state in which the attacker
    /// is certain that the plant is in a secret state.
    pub fn is_secret(&self, state_index: StateIndex) -> bool {
        self.secret[state_index]
    }

    /// Returns true iff the state is an environment state in which the
    /// supervisor raised the alarm.
    pub fn is_alarm(&self, state_index: StateIndex) -> bool {
        self.environment(state_index).is_some_and(|state| state.is_alarm())
    }

    /// Returns the label of the empty event.
    pub fn empty_event(&self) -> EventIndex {
        self.empty
    }

    pub fn num_of_environment_states(&self) -> usize {
        self.lts
            .iter_states()
            .filter(|state_index| self.lts.state(*state_index).is_environment())
            .count()
    }
}
