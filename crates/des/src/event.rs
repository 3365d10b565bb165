use std::collections::BTreeSet;
use std::fmt;

/// The index type for an event.
pub type EventIndex = usize;

/// The alphabet of a system, the events are ordered by name so that every
/// iteration over events is deterministic. One event is the distinguished
/// empty event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    names: Vec<String>,
    empty: EventIndex,
}

impl Alphabet {
    /// Creates an alphabet from the given event names, the empty event is
    /// added when it is not part of the names.
    pub fn new(names: impl IntoIterator<Item = String>, empty_event: &str) -> Alphabet {
        let mut names: Vec<String> = names.into_iter().collect();
        names.push(empty_event.to_string());
        names.sort();
        names.dedup();

        let empty = names
            .binary_search_by(|name| name.as_str().cmp(empty_event))
            .expect("The empty event was inserted before");

        Alphabet { names, empty }
    }

    /// Returns the index of the event with the given name.
    pub fn index(&self, name: &str) -> Option<EventIndex> {
        self.names.binary_search_by(|other| other.as_str().cmp(name)).ok()
    }

    /// Returns the name of the given event.
    pub fn name(&self, event: EventIndex) -> &str {
        &self.names[event]
    }

    /// Returns the index of the empty event.
    pub fn empty(&self) -> EventIndex {
        self.empty
    }

    /// Returns true iff the given event is the empty event.
    pub fn is_empty_event(&self, event: EventIndex) -> bool {
        event == self.empty
    }

    /// Returns the number of events, including the empty event.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true iff the alphabet has no events, which never happens since
    /// the empty event is always present.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Iterates over all event indices in order.
    pub fn iter(&self) -> impl Iterator<Item = EventIndex> {
        0..self.names.len()
    }

    /// Returns the names of all events, indexed by event.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// An ordered set of events.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct EventSet(BTreeSet<EventIndex>);

impl EventSet {
    /// Returns true iff the given event is a member of the set.
    pub fn contains(&self, event: EventIndex) -> bool {
        self.0.contains(&event)
    }

    /// Iterates over the events in order.
    pub fn iter(&self) -> impl Iterator<Item = EventIndex> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true iff the set has no events.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Inserts the given event.
    pub fn insert(&mut self, event: EventIndex) -> bool {
        self.0.insert(event)
    }

    /// Returns the events of the alphabet that are not in this set, excluding
    /// the empty event. These are the unobservable events of an observer that
    /// observes this set.
    pub fn complement(&self, alphabet: &Alphabet) -> EventSet {
        alphabet
            .iter()
            .filter(|event| !self.contains(*event) && !alphabet.is_empty_event(*event))
            .collect()
    }

    /// Returns a displayable version of the set using the event names.
    pub fn display<'a>(&'a self, alphabet: &'a Alphabet) -> EventSetDisplay<'a> {
        EventSetDisplay { set: self, alphabet }
    }
}

impl FromIterator<EventIndex> for EventSet {
    fn from_iter<T: IntoIterator<Item = EventIndex>>(iter: T) -> Self {
        EventSet(iter.into_iter().collect())
    }
}

pub struct EventSetDisplay<'a> {
    set: &'a EventSet,
    alphabet: &'a Alphabet,
}

impl fmt::Display for EventSetDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (position, event) in self.set.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.alphabet.name(event))?;
        }
        write!(f, "}}")
    }
}
