use std::fmt;

use log::debug;
use log::info;

use cso_des::AttackerObserver;
use cso_des::ClosedLoopSystem;
use cso_des::DepthBound;
use cso_des::SupervisorObserver;
use cso_des::SystemAssumptions;
use cso_utilities::Timing;

use crate::classify_components;
use crate::extract_strategies;
use crate::prune;
use crate::reduce_observer;
use crate::Acag;
use crate::AoAcag;
use crate::Component;
use crate::Strategy;
use crate::StrategyMap;

/// The number of states and transitions of one stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageSize {
    pub states: usize,
    pub transitions: usize,
}

impl fmt::Display for StageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} states and {} transitions", self.states, self.transitions)
    }
}

/// Statistics of every stage of an analysis.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalysisReport {
    pub closed_loop: StageSize,
    pub supervisor_beliefs: usize,
    pub attacker_beliefs: usize,
    pub acag: StageSize,
    pub ao_acag: StageSize,
    pub pruned: StageSize,
    pub secret_aggregates: usize,
    pub cyclic_components: usize,
    pub strategies: usize,

    /// Holds when a depth bound cut off an exploration.
    pub truncated: bool,
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Closed loop system: {}", self.closed_loop)?;
        writeln!(f, "Supervisor beliefs: {}", self.supervisor_beliefs)?;
        writeln!(f, "Attacker beliefs: {}", self.attacker_beliefs)?;
        writeln!(f, "ACAG: {}", self.acag)?;
        writeln!(f, "AO-ACAG: {}", self.ao_acag)?;
        writeln!(f, "Pruned AO-ACAG: {}", self.pruned)?;
        writeln!(f, "Secret aggregates: {}", self.secret_aggregates)?;
        writeln!(f, "Cyclic components: {}", self.cyclic_components)?;
        writeln!(f, "Strategies: {}", self.strategies)?;
        if self.truncated {
            writeln!(f, "Warning: a depth bound truncated the exploration")?;
        }

        Ok(())
    }
}

/// The results of all stages of the attack analysis.
pub struct Analysis {
    pub closed_loop: ClosedLoopSystem,
    pub supervisor: SupervisorObserver,
    pub attacker: AttackerObserver,
    pub acag: Acag,
    pub ao_acag: AoAcag,
    pub pruned: AoAcag,
    pub components: Vec<Component>,
    pub strategies: Vec<Strategy>,
    pub report: AnalysisReport,
}

impl Analysis {
    /// Returns the strategies indexed by their rendered form.
    pub fn strategy_map(&self) -> StrategyMap {
        StrategyMap::new(&self.strategies, self.pruned.labels())
    }
}

/// Runs every stage of the analysis in order, each stage only depends on the
/// assumptions and the results of the stages before it.
pub fn analyse(assumptions: &SystemAssumptions, timing: &mut Timing) -> Analysis {
    let bound = DepthBound::new(assumptions.options().max_depth);

    let mut timer = timing.start("closed_loop");
    let closed_loop = ClosedLoopSystem::synthesize(assumptions, &bound);
    timer.finish();
    info!(
        "Closed loop system has {} states and {} transitions",
        closed_loop.num_of_states(),
        closed_loop.num_of_transitions()
    );

    let mut timer = timing.start("observers");
    let supervisor = SupervisorObserver::build(assumptions, &closed_loop, &bound);
    let attacker = AttackerObserver::build(assumptions, &bound);
    timer.finish();
    debug!(
        "The supervisor has {} beliefs and the attacker {} beliefs",
        supervisor.num_of_beliefs(),
        attacker.num_of_beliefs()
    );

    let mut timer = timing.start("build_acag");
    let acag = Acag::build(assumptions, &supervisor, &attacker);
    timer.finish();
    info!(
        "ACAG has {} states and {} transitions",
        acag.lts().num_of_states(),
        acag.lts().num_of_transitions()
    );

    let mut timer = timing.start("reduce_observer");
    let ao_acag = reduce_observer(&acag, assumptions.attacker_unobservable(), &bound);
    timer.finish();
    info!(
        "AO-ACAG has {} states and {} transitions",
        ao_acag.num_of_states(),
        ao_acag.num_of_transitions()
    );

    let mut timer = timing.start("prune");
    let pruned = prune(&ao_acag);
    timer.finish();
    info!(
        "Pruned AO-ACAG has {} states and {} transitions",
        pruned.num_of_states(),
        pruned.num_of_transitions()
    );

    let mut timer = timing.start("classify_components");
    let components = classify_components(&pruned);
    timer.finish();

    let mut timer = timing.start("extract_strategies");
    let strategies = extract_strategies(&pruned);
    timer.finish();
    info!("Found {} covert attack strategies", strategies.len());

    let report = AnalysisReport {
        closed_loop: StageSize {
            states: closed_loop.num_of_states(),
            transitions: closed_loop.num_of_transitions(),
        },
        supervisor_beliefs: supervisor.num_of_beliefs(),
        attacker_beliefs: attacker.num_of_beliefs(),
        acag: StageSize {
            states: acag.lts().num_of_states(),
            transitions: acag.lts().num_of_transitions(),
        },
        ao_acag: StageSize {
            states: ao_acag.num_of_states(),
            transitions: ao_acag.num_of_transitions(),
        },
        pruned: StageSize {
            states: pruned.num_of_states(),
            transitions: pruned.num_of_transitions(),
        },
        secret_aggregates: pruned
            .iter_states()
            .filter(|state_index| pruned.state(*state_index).is_secret())
            .count(),
        cyclic_components: components.len(),
        strategies: strategies.len(),
        truncated: bound.truncated() || closed_loop.truncated(),
    };

    Analysis {
        closed_loop,
        supervisor,
        attacker,
        acag,
        ao_acag,
        pruned,
        components,
        strategies,
        report,
    }
}
