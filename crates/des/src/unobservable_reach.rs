use std::cell::Cell;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use log::trace;
use log::warn;

use crate::Belief;
use crate::EventIndex;
use crate::EventSet;

/// An optional bound on the exploration depth that is shared by all the
/// explorations of one analysis. Hitting the bound is never silent: it is
/// reported once with a warning and remembered.
#[derive(Debug, Default)]
pub struct DepthBound {
    max_depth: Option<usize>,
    truncated: Cell<bool>,
}

impl DepthBound {
    /// Creates a bound, `None` means exploring to the exact fixpoint.
    pub fn new(max_depth: Option<usize>) -> DepthBound {
        DepthBound {
            max_depth,
            truncated: Cell::new(false),
        }
    }

    /// A bound that never truncates.
    pub fn unbounded() -> DepthBound {
        DepthBound::new(None)
    }

    /// Returns true iff a state at the given depth must not be expanded, and
    /// records the truncation.
    pub fn exceeded(&self, depth: usize) -> bool {
        match self.max_depth {
            Some(max_depth) if depth >= max_depth => {
                if !self.truncated.replace(true) {
                    warn!("Exploration truncated at depth {max_depth}, the results may be incomplete");
                }
                true
            }
            _ => false,
        }
    }

    /// Returns true iff some exploration was cut off by this bound.
    pub fn truncated(&self) -> bool {
        self.truncated.get()
    }

    /// Returns the configured maximum depth.
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }
}

/// Computes the smallest superset of `seed` that is closed under the
/// transitions labelled with an unobservable event.
///
/// The `successors` function yields the (event, target) pairs of a state. The
/// result does not depend on the order in which states are found, so calling
/// it twice on the same input gives equal beliefs.
pub fn unobservable_reach<S, F, I>(
    seed: impl IntoIterator<Item = S>,
    successors: F,
    unobservable: &EventSet,
    bound: &DepthBound,
) -> Belief<S>
where
    S: Ord + Clone,
    F: Fn(&S) -> I,
    I: IntoIterator<Item = (EventIndex, S)>,
{
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();

    for state in seed {
        if visited.insert(state.clone()) {
            queue.push_back((state, 0));
        }
    }

    while let Some((state, depth)) = queue.pop_front() {
        if bound.exceeded(depth) {
            continue;
        }

        for (event, target) in successors(&state) {
            if unobservable.contains(event) && !visited.contains(&target) {
                visited.insert(target.clone());
                queue.push_back((target, depth + 1));
            }
        }
    }

    trace!("Unobservable reach contains {} states", visited.len());
    visited.into_iter().collect()
}
