use std::fmt;

use cso_des::BeliefIndex;
use cso_des::EventIndex;
use cso_des::PlantState;
use cso_des::SupervisorEstimate;
use cso_des::SupervisorState;

/// The physical state of the supervisor, which becomes `Detected` once it
/// receives an event that its own automaton rejects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupervisorLocation {
    State(SupervisorState),
    Detected,
}

impl fmt::Display for SupervisorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorLocation::State(z) => write!(f, "z{z}"),
            SupervisorLocation::Detected => write!(f, "z_det"),
        }
    }
}

/// An environment state (Ye) of the ACAG.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnvironmentState {
    pub estimate: SupervisorEstimate,
    pub belief: BeliefIndex,
    pub supervisor: SupervisorLocation,
    pub plant: PlantState,
}

impl EnvironmentState {
    /// Returns true iff the supervisor has raised the alarm.
    pub fn is_alarm(&self) -> bool {
        self.estimate.is_alarm()
    }
}

/// An attacker decision state (Ya) of the ACAG: the plant performed `event`,
/// the attacker already updated its belief and now picks one of the `options`
/// to forward to the supervisor.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecisionState {
    pub estimate: SupervisorEstimate,
    pub belief: BeliefIndex,
    pub supervisor: SupervisorState,
    pub plant: PlantState,
    pub options: Vec<EventIndex>,
    pub event: EventIndex,
}

/// A state of the ACAG, the graph strictly alternates between the two kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AcagState {
    Environment(EnvironmentState),
    Decision(DecisionState),
}

impl AcagState {
    /// Returns the environment state, if this is one.
    pub fn environment(&self) -> Option<&EnvironmentState> {
        match self {
            AcagState::Environment(state) => Some(state),
            AcagState::Decision(_) => None,
        }
    }

    pub fn is_environment(&self) -> bool {
        matches!(self, AcagState::Environment(_))
    }
}
