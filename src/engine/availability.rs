use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::plan::{Participant, TimeSlot};

/// Slots one participant marked available for one proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AvailabilitySet {
    slots: BTreeSet<TimeSlot>,
}

impl AvailabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, slot: &TimeSlot) -> bool {
        self.slots.contains(slot)
    }

    pub fn insert(&mut self, slot: TimeSlot) -> bool {
        self.slots.insert(slot)
    }

    pub fn remove(&mut self, slot: &TimeSlot) -> bool {
        self.slots.remove(slot)
    }

    /// Returns how many slots were newly added.
    pub fn add_all<'a>(&mut self, slots: impl IntoIterator<Item = &'a TimeSlot>) -> usize {
        slots.into_iter().filter(|slot| self.slots.insert(**slot)).count()
    }

    /// Returns how many slots were actually removed.
    pub fn remove_all<'a>(&mut self, slots: impl IntoIterator<Item = &'a TimeSlot>) -> usize {
        slots.into_iter().filter(|slot| self.slots.remove(*slot)).count()
    }

    pub fn contains_all<'a>(&self, slots: impl IntoIterator<Item = &'a TimeSlot>) -> bool {
        slots.into_iter().all(|slot| self.slots.contains(slot))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeSlot> {
        self.slots.iter()
    }

    pub fn to_vec(&self) -> Vec<TimeSlot> {
        self.slots.iter().copied().collect()
    }
}

impl FromIterator<TimeSlot> for AvailabilitySet {
    fn from_iter<I: IntoIterator<Item = TimeSlot>>(iter: I) -> Self {
        Self { slots: iter.into_iter().collect() }
    }
}

impl From<Vec<TimeSlot>> for AvailabilitySet {
    fn from(slots: Vec<TimeSlot>) -> Self {
        slots.into_iter().collect()
    }
}

/// A roster entry joined with that participant's persisted slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Participation {
    pub participant: Participant,
    pub availability: AvailabilitySet,
}

impl Participation {
    pub fn new(participant: Participant, availability: AvailabilitySet) -> Self {
        Self { participant, availability }
    }
}
