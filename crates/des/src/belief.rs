use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashMap;

/// The index of an interned belief.
pub type BeliefIndex = usize;

/// An immutable set of states that an observer considers possible. The states
/// are kept ordered, which makes equality, hashing and the ordering of beliefs
/// independent of the order in which the states were found.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Belief<S: Ord>(BTreeSet<S>);

impl<S: Ord> Belief<S> {
    /// Returns true iff the state is considered possible.
    pub fn contains(&self, state: &S) -> bool {
        self.0.contains(state)
    }

    /// Iterates over the states in order.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.0.iter()
    }

    /// Returns the number of states.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true iff no state is considered possible.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true iff every state of the belief is in the given set.
    pub fn is_subset(&self, other: &BTreeSet<S>) -> bool {
        self.0.is_subset(other)
    }
}

impl<S: Ord> FromIterator<S> for Belief<S> {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Belief(iter.into_iter().collect())
    }
}

impl<S: Ord + fmt::Display> fmt::Display for Belief<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, state) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ",")?;
            }
            write!(f, "{state}")?;
        }
        write!(f, "}}")
    }
}

/// Interns beliefs such that every distinct belief has a single index.
#[derive(Clone, Debug)]
pub struct BeliefStore<S: Ord> {
    beliefs: Vec<Belief<S>>,
    index: FxHashMap<Belief<S>, BeliefIndex>,
}

impl<S: Ord> Default for BeliefStore<S> {
    fn default() -> Self {
        BeliefStore {
            beliefs: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<S: Ord + Clone + Hash> BeliefStore<S> {
    /// Inserts the belief, returns its index and whether it was new.
    pub fn insert(&mut self, belief: Belief<S>) -> (BeliefIndex, bool) {
        if let Some(index) = self.index.get(&belief) {
            return (*index, false);
        }

        let index = self.beliefs.len();
        self.index.insert(belief.clone(), index);
        self.beliefs.push(belief);
        (index, true)
    }

    /// Returns the index of the given belief, if it was inserted before.
    pub fn find(&self, belief: &Belief<S>) -> Option<BeliefIndex> {
        self.index.get(belief).copied()
    }

    /// Returns the belief with the given index.
    pub fn get(&self, index: BeliefIndex) -> &Belief<S> {
        &self.beliefs[index]
    }

    /// Returns the number of interned beliefs.
    pub fn len(&self) -> usize {
        self.beliefs.len()
    }

    /// Returns true iff no belief was interned.
    pub fn is_empty(&self) -> bool {
        self.beliefs.is_empty()
    }

    /// Iterates over (index, belief) in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (BeliefIndex, &Belief<S>)> {
        self.beliefs.iter().enumerate()
    }
}

/// Assigns stable symbolic names to beliefs. The names are numbered in a
/// deterministic order of the belief contents, so that two runs on the same
/// assumptions produce the same names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
    order: Vec<BeliefIndex>,
}

impl LabelMap {
    /// Creates the names `{prefix}0`, `{prefix}1`, ... for the beliefs of the
    /// store, numbered in the order given by `compare`.
    pub fn new<S, F>(prefix: &str, store: &BeliefStore<S>, compare: F) -> LabelMap
    where
        S: Ord + Clone + Hash,
        F: Fn(&Belief<S>, &Belief<S>) -> std::cmp::Ordering,
    {
        let mut order: Vec<BeliefIndex> = (0..store.len()).collect();
        order.sort_by(|left, right| compare(store.get(*left), store.get(*right)));

        let mut names = vec![String::new(); store.len()];
        for (position, index) in order.iter().enumerate() {
            names[*index] = format!("{prefix}{position}");
        }

        LabelMap { names, order }
    }

    /// Returns the name of the given belief.
    pub fn name(&self, index: BeliefIndex) -> &str {
        &self.names[index]
    }

    /// Iterates over (name, belief index) in the order of the names.
    pub fn iter(&self) -> impl Iterator<Item = (&str, BeliefIndex)> + '_ {
        self.order.iter().map(|index| (self.names[*index].as_str(), *index))
    }

    /// Returns the number of names.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true iff there are no names.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
