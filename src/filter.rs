use std::fmt;

use itertools::Itertools;

use crate::midi_model::{EventKind, MidiEvent};

/// A set of event kinds, stored as a bitmask so membership checks on the
/// ingestion path never allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KindSet(u8);

impl KindSet {
    pub fn empty() -> KindSet {
        KindSet(0)
    }

    pub fn only(kind: EventKind) -> KindSet {
        let mut set = KindSet::empty();
        set.insert(kind);
        set
    }

    fn bit(kind: EventKind) -> u8 {
        1 << kind as u8
    }

    pub fn insert(&mut self, kind: EventKind) {
        self.0 |= KindSet::bit(kind);
    }

    pub fn contains(&self, kind: EventKind) -> bool {
        self.0 & KindSet::bit(kind) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = EventKind> + '_ {
        EventKind::ALL.into_iter().filter(|kind| self.contains(*kind))
    }
}

impl FromIterator<EventKind> for KindSet {
    fn from_iter<T: IntoIterator<Item = EventKind>>(iter: T) -> Self {
        let mut set = KindSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.iter().join(", "))
    }
}

/// Accepts an event iff its kind is in the configured set. Malformed events
/// never match.
#[derive(Debug, Clone, Copy)]
pub struct KindFilter {
    accepted: KindSet,
}

impl KindFilter {
    pub fn new(accepted: KindSet) -> KindFilter {
        KindFilter { accepted }
    }

    pub fn accepted(&self) -> KindSet {
        self.accepted
    }

    pub fn matches(&self, event: &MidiEvent) -> bool {
        self.accepted.contains(event.kind()) && event.is_well_formed()
    }
}
