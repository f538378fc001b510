// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bidirectional name <-> id map, unique in both directions.
///
/// Inserting a pair that conflicts with an existing mapping evicts the old
/// entry on both sides ("force-put", last write wins). Both directions stay
/// injective at all times: no two names share an id, no name maps to two ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, I>", into = "BTreeMap<String, I>")]
pub struct IdMap<I: Copy + Ord> {
    by_name: BTreeMap<String, I>,
    by_id: BTreeMap<I, String>,
}

impl<I: Copy + Ord> IdMap<I> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_name: BTreeMap::new(),
            by_id: BTreeMap::new(),
        }
    }

    /// Insert `name -> id`, evicting any mapping that currently uses either
    /// the name or the id.
    pub fn force_put(&mut self, name: impl Into<String>, id: I) {
        let name = name.into();
        if let Some(old_id) = self.by_name.insert(name.clone(), id) {
            if old_id != id {
                self.by_id.remove(&old_id);
            }
        }
        if let Some(old_name) = self.by_id.insert(id, name.clone()) {
            if old_name != name {
                self.by_name.remove(&old_name);
            }
        }
    }

    #[must_use]
    pub fn id_of(&self, name: &str) -> Option<I> {
        self.by_name.get(name).copied()
    }

    #[must_use]
    pub fn name_of(&self, id: I) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    #[must_use]
    pub fn contains_id(&self, id: I) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate `(name, id)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, I)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = I> + '_ {
        self.by_id.keys().copied()
    }
}

impl<I: Copy + Ord> Default for IdMap<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Copy + Ord> From<BTreeMap<String, I>> for IdMap<I> {
    fn from(entries: BTreeMap<String, I>) -> Self {
        let mut map = Self::new();
        for (name, id) in entries {
            map.force_put(name, id);
        }
        map
    }
}

impl<I: Copy + Ord> From<IdMap<I>> for BTreeMap<String, I> {
    fn from(map: IdMap<I>) -> Self {
        map.by_name
    }
}

impl<I: Copy + Ord> FromIterator<(String, I)> for IdMap<I> {
    fn from_iter<T: IntoIterator<Item = (String, I)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, id) in iter {
            map.force_put(name, id);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_put_overwrites_by_name() {
        let mut map = IdMap::new();
        map.force_put("f1.vcf", 1u32);
        map.force_put("f1.vcf", 2u32);

        assert_eq!(map.id_of("f1.vcf"), Some(2));
        assert_eq!(map.name_of(2), Some("f1.vcf"));
        assert_eq!(map.name_of(1), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn force_put_overwrites_by_id() {
        let mut map = IdMap::new();
        map.force_put("f1.vcf", 1u32);
        map.force_put("f2.vcf", 1u32);

        assert_eq!(map.name_of(1), Some("f2.vcf"));
        assert_eq!(map.id_of("f1.vcf"), None);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn reinserting_same_pair_is_a_no_op() {
        let mut map = IdMap::new();
        map.force_put("s1", 7u32);
        let before = map.clone();
        map.force_put("s1", 7u32);
        assert_eq!(map, before);
    }

    #[test]
    fn serde_round_trip_keeps_both_directions() {
        let mut map = IdMap::new();
        map.force_put("a", 1u32);
        map.force_put("b", 2u32);

        let json = serde_json::to_string(&map).expect("serialize");
        let back: IdMap<u32> = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.id_of("b"), Some(2));
        assert_eq!(back.name_of(1), Some("a"));
    }
}
