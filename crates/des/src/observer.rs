use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::fmt;

use log::debug;
use log::trace;

use crate::unobservable_reach;
use crate::Belief;
use crate::BeliefIndex;
use crate::BeliefStore;
use crate::ClosedLoopState;
use crate::ClosedLoopSystem;
use crate::DepthBound;
use crate::EventIndex;
use crate::EventSet;
use crate::LabelMap;
use crate::PlantState;
use crate::SupervisorState;
use crate::SystemAssumptions;

/// The estimate of the supervisor: either a belief over closed-loop states or
/// the alarm that is raised once an inconsistent event sequence is observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SupervisorEstimate {
    Alarm,
    Belief(BeliefIndex),
}

impl SupervisorEstimate {
    pub fn is_alarm(&self) -> bool {
        matches!(self, SupervisorEstimate::Alarm)
    }
}

/// The knowledge automaton of the supervisor, mapping (belief, observable event)
/// to the next belief over closed-loop states.
#[derive(Clone, Debug)]
pub struct SupervisorObserver {
    store: BeliefStore<ClosedLoopState>,
    table: BTreeMap<(BeliefIndex, EventIndex), BeliefIndex>,
    initial: BeliefIndex,

    observable: EventSet,
    empty: EventIndex,
}

impl SupervisorObserver {
    /// Explores all beliefs reachable from the closure of the initial state.
    pub fn build(assumptions: &SystemAssumptions, closed_loop: &ClosedLoopSystem, bound: &DepthBound) -> SupervisorObserver {
        let unobservable = assumptions.supervisor_unobservable();
        let observable = assumptions.supervisor_observable();

        let close = |seed: Vec<ClosedLoopState>| {
            unobservable_reach(seed, move |state| closed_loop.enabled_events(*state), unobservable, bound)
        };

        let mut store = BeliefStore::default();
        let mut table = BTreeMap::new();

        let (initial, _) = store.insert(close(vec![closed_loop.initial_state()]));
        let mut queue = VecDeque::from([initial]);

        while let Some(belief_index) = queue.pop_front() {
            for event in observable.iter() {
                let raw: Vec<ClosedLoopState> = store
                    .get(belief_index)
                    .iter()
                    .filter_map(|state| closed_loop.successor(*state, event))
                    .collect();

                if raw.is_empty() {
                    continue;
                }

                let (next, is_new) = store.insert(close(raw));
                table.insert((belief_index, event), next);
                trace!("Supervisor belief {belief_index} --{event}-> {next}");

                if is_new {
                    queue.push_back(next);
                }
            }
        }

        debug!(
            "Supervisor observer has {} beliefs and {} transitions",
            store.len(),
            table.len()
        );

        SupervisorObserver {
            store,
            table,
            initial,
            observable: observable.clone(),
            empty: assumptions.alphabet().empty(),
        }
    }

    /// Returns the initial estimate of the supervisor.
    pub fn initial(&self) -> SupervisorEstimate {
        SupervisorEstimate::Belief(self.initial)
    }

    /// Returns the estimate after the supervisor receives the given event.
    pub fn update(&self, estimate: SupervisorEstimate, event: EventIndex) -> SupervisorEstimate {
        match estimate {
            SupervisorEstimate::Alarm => SupervisorEstimate::Alarm,
            SupervisorEstimate::Belief(belief) => {
                if event == self.empty || !self.observable.contains(event) {
                    return estimate;
                }

                self.table
                    .get(&(belief, event))
                    .map_or(SupervisorEstimate::Alarm, |next| SupervisorEstimate::Belief(*next))
            }
        }
    }

    pub fn belief(&self, index: BeliefIndex) -> &Belief<ClosedLoopState> {
        self.store.get(index)
    }

    pub fn num_of_beliefs(&self) -> usize {
        self.store.len()
    }

    /// Iterates over the recorded (belief, event, next belief) transitions.
    pub fn iter_table(&self) -> impl Iterator<Item = (BeliefIndex, EventIndex, BeliefIndex)> + '_ {
        self.table.iter().map(|((from, event), to)| (*from, *event, *to))
    }

    /// Names the beliefs `S0`, `S1`, ... ordered by their content.
    pub fn labels(&self) -> LabelMap {
        LabelMap::new("S", &self.store, |left, right| left.cmp(right))
    }
}

/// The knowledge automaton of the attacker. The attacker estimates the plant
/// state, and the beliefs it can reach depend on the events that the current
/// supervisor state permits, so there is one table per supervisor state.
#[derive(Clone, Debug)]
pub struct AttackerObserver {
    store: BeliefStore<PlantState>,
    tables: BTreeMap<SupervisorState, BTreeMap<(BeliefIndex, EventIndex), BeliefIndex>>,
    initial: BeliefIndex,
    impossible: BeliefIndex,

    observable: EventSet,
    empty: EventIndex,
}

impl AttackerObserver {
    pub fn build(assumptions: &SystemAssumptions, bound: &DepthBound) -> AttackerObserver {
        let plant = assumptions.plant();
        let supervisor = assumptions.supervisor();
        let unobservable = assumptions.attacker_unobservable();
        let observable = assumptions.attacker_observable();

        let mut store = BeliefStore::default();
        let (impossible, _) = store.insert(Belief::default());

        // The beliefs of an observer of the plant alone.
        let physical = unobservable_reach([plant.initial_state()], move |x| plant.enabled_events(*x), unobservable, bound);
        let (physical_initial, _) = store.insert(physical);

        let mut queue = VecDeque::from([physical_initial]);
        while let Some(belief_index) = queue.pop_front() {
            for event in observable.iter() {
                let raw: Vec<PlantState> = store
                    .get(belief_index)
                    .iter()
                    .filter_map(|x| plant.successor(*x, event))
                    .collect();

                if raw.is_empty() {
                    continue;
                }

                let (next, is_new) = store.insert(unobservable_reach(
                    raw,
                    move |x| plant.enabled_events(*x),
                    unobservable,
                    bound,
                ));
                if is_new {
                    queue.push_back(next);
                }
            }
        }

        // The closure in which only the events permitted at z are followed.
        let constrained_reach = |seed: Vec<PlantState>, z: SupervisorState| {
            unobservable_reach(
                seed,
                move |x| {
                    plant
                        .enabled_events(*x)
                        .filter(move |(event, _)| assumptions.is_permitted(z, *event))
                },
                unobservable,
                bound,
            )
        };

        let (initial, _) = store.insert(constrained_reach(vec![plant.initial_state()], supervisor.initial_state()));

        let mut tables: BTreeMap<SupervisorState, BTreeMap<(BeliefIndex, EventIndex), BeliefIndex>> =
            supervisor.states().iter().map(|z| (*z, BTreeMap::new())).collect();
        for z in supervisor.states().iter().copied() {
            store.insert(constrained_reach(vec![plant.initial_state()], z));
        }

        // A belief reached in the table of one supervisor state can be the current
        // belief at any other, so every belief is expanded in every table.
        let mut queue: VecDeque<BeliefIndex> = (0..store.len()).collect();
        while let Some(belief_index) = queue.pop_front() {
            for (z, table) in tables.iter_mut() {
                let z = *z;

                for event in observable.iter().filter(|event| assumptions.is_permitted(z, *event)) {
                    let raw: Vec<PlantState> = store
                        .get(belief_index)
                        .iter()
                        .filter_map(|x| plant.successor(*x, event))
                        .collect();

                    if raw.is_empty() {
                        continue;
                    }

                    let (next, is_new) = store.insert(constrained_reach(raw, z));
                    table.insert((belief_index, event), next);
                    trace!("Attacker belief {belief_index} --{event}-> {next} at supervisor state {z}");

                    if is_new {
                        queue.push_back(next);
                    }
                }
            }
        }

        debug!(
            "Attacker observer has {} beliefs over {} supervisor states",
            store.len(),
            tables.len()
        );

        AttackerObserver {
            store,
            tables,
            initial,
            impossible,
            observable: observable.clone(),
            empty: assumptions.alphabet().empty(),
        }
    }

    /// Returns the initial belief of the attacker.
    pub fn initial(&self) -> BeliefIndex {
        self.initial
    }

    /// Returns the empty belief, which means that the observed events are
    /// impossible according to the model of the attacker.
    pub fn impossible(&self) -> BeliefIndex {
        self.impossible
    }

    /// Returns the belief after the attacker observes the event while the
    /// supervisor is in state `z`.
    pub fn update(&self, z: SupervisorState, belief: BeliefIndex, event: EventIndex) -> BeliefIndex {
        if event == self.empty || !self.observable.contains(event) {
            return belief;
        }

        self.tables
            .get(&z)
            .and_then(|table| table.get(&(belief, event)))
            .copied()
            .unwrap_or(self.impossible)
    }

    pub fn belief(&self, index: BeliefIndex) -> &Belief<PlantState> {
        self.store.get(index)
    }

    pub fn num_of_beliefs(&self) -> usize {
        self.store.len()
    }

    /// Iterates over (supervisor state, belief, event, next belief).
    pub fn iter_tables(&self) -> impl Iterator<Item = (SupervisorState, BeliefIndex, EventIndex, BeliefIndex)> + '_ {
        self.tables.iter().flat_map(|(z, table)| {
            table
                .iter()
                .map(move |((from, event), to)| (*z, *from, *event, *to))
        })
    }

    /// Names the beliefs `A0`, `A1`, ... ordered by size and then content, the
    /// empty belief is always `A0`.
    pub fn labels(&self) -> LabelMap {
        LabelMap::new("A", &self.store, |left, right| {
            left.len().cmp(&right.len()).then_with(|| left.cmp(right))
        })
    }
}

impl fmt::Display for SupervisorEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorEstimate::Alarm => write!(f, "AX"),
            SupervisorEstimate::Belief(index) => write!(f, "{index}"),
        }
    }
}
