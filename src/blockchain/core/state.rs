use crate::vote::Vote;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;

/// Map keyed by barangay that remembers the order units were first seen.
///
/// Serializes as a plain JSON object and keeps document order when read back,
/// so batch mining visits units in the same order before and after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for UnitMap<V> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<V> UnitMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, unit: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == unit).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, unit: &str) -> Option<&mut V> {
        self.entries.iter_mut().find(|(k, _)| k == unit).map(|(_, v)| v)
    }

    pub fn insert(&mut self, unit: impl Into<String>, value: V) {
        let unit = unit.into();
        match self.get_mut(&unit) {
            Some(existing) => *existing = value,
            None => self.entries.push((unit, value)),
        }
    }

    pub fn get_or_insert_default(&mut self, unit: &str) -> &mut V
    where
        V: Default,
    {
        let pos = match self.entries.iter().position(|(k, _)| k == unit) {
            Some(pos) => pos,
            None => {
                self.entries.push((unit.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for UnitMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for UnitMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UnitMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for UnitMapVisitor<V> {
            type Value = UnitMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map keyed by barangay")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = UnitMap::new();
                while let Some((unit, value)) = access.next_entry::<String, V>()? {
                    map.insert(unit, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(UnitMapVisitor(PhantomData))
    }
}

/// Everything about the ledger that is not the chain itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerState {
    pub pending: UnitMap<Vec<Vote>>,
    pub voters: BTreeMap<String, BTreeSet<String>>,
    pub mined: BTreeSet<String>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mined(&self, barangay: &str) -> bool {
        self.mined.contains(barangay)
    }

    /// The barangay a voter has already voted in, if any.
    pub fn registered_barangay(&self, voter_id: &str) -> Option<&str> {
        self.voters
            .iter()
            .find(|(_, ids)| ids.contains(voter_id))
            .map(|(barangay, _)| barangay.as_str())
    }

    pub fn pending_for(&self, barangay: &str) -> &[Vote] {
        self.pending.get(barangay).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn record_vote(&mut self, barangay: &str, vote: Vote) {
        self.voters
            .entry(barangay.to_string())
            .or_default()
            .insert(vote.voter_id.clone());
        self.pending.get_or_insert_default(barangay).push(vote);
    }

    /// Move a barangay's pending votes out and close it. The barangay keeps an
    /// empty pending entry.
    pub fn seal(&mut self, barangay: &str) -> Vec<Vote> {
        self.mined.insert(barangay.to_string());
        self.pending
            .get_mut(barangay)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Barangays with at least one pending vote, in first-seen order.
    pub fn barangays_with_pending(&self) -> Vec<String> {
        self.pending
            .iter()
            .filter(|(_, votes)| !votes.is_empty())
            .map(|(barangay, _)| barangay.to_string())
            .collect()
    }
}
