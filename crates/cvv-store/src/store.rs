//! Per-key item storage.

use cvv_core::{is_newer, Item, KnowledgeSnapshot, ReplicaId, Version};
use std::collections::BTreeMap;

/// Map from key to the item currently stored for it.
///
/// Ordered by key so transfers are deterministic. Entries are overwritten in
/// place and never removed.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemStore<V> {
    items: BTreeMap<String, Item<V>>,
}

impl<V> ItemStore<V> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Item<V>> {
        self.items.get(key)
    }

    pub fn value(&self, key: &str) -> Option<&V> {
        self.items.get(key).map(|item| &item.value)
    }

    pub fn provenance(&self, key: &str) -> Option<(ReplicaId, Version)> {
        self.items
            .get(key)
            .map(|item| (item.owner.clone(), item.version))
    }

    /// Store `item`, replacing whatever was held for its key.
    pub fn insert(&mut self, item: Item<V>) -> Option<Item<V>> {
        self.items.insert(item.key.clone(), item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item<V>> {
        self.items.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<V: Clone> ItemStore<V> {
    /// Copies of every item whose provenance `remote` has not seen.
    /// With no remote knowledge, every item qualifies.
    pub fn newer_than(&self, remote: Option<&KnowledgeSnapshot>) -> Vec<Item<V>> {
        let known = remote.map(KnowledgeSnapshot::map);
        self.items
            .values()
            .filter(|item| is_newer(&item.owner, item.version, known))
            .cloned()
            .collect()
    }
}

impl<V> Default for ItemStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, value: i32, owner: &str, version: f64) -> Item<i32> {
        Item::from_raw(key, value, owner, version).unwrap()
    }

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut store = ItemStore::new();
        assert!(store.insert(item("k", 1, "a", 1.0)).is_none());
        let previous = store.insert(item("k", 2, "b", 2.0)).unwrap();

        assert_eq!(previous.value, 1);
        assert_eq!(store.value("k"), Some(&2));
        assert_eq!(store.len(), 1);
        let (owner, version) = store.provenance("k").unwrap();
        assert_eq!(owner.as_str(), "b");
        assert_eq!(version.as_f64(), 2.0);
    }

    #[test]
    fn test_newer_than_filters_by_provenance() {
        let mut store = ItemStore::new();
        store.insert(item("x", 1, "a", 5.0));
        store.insert(item("y", 2, "b", 5.0));
        store.insert(item("z", 3, "c", 5.0));

        let remote = KnowledgeSnapshot::from_entries([
            (ReplicaId::new("a").unwrap(), Version::new(5.0).unwrap()),
            (ReplicaId::new("b").unwrap(), Version::new(4.0).unwrap()),
        ]);
        let keys: Vec<_> = store
            .newer_than(Some(&remote))
            .into_iter()
            .map(|i| i.key)
            .collect();
        assert_eq!(keys, vec!["y".to_string(), "z".to_string()]);

        assert_eq!(store.newer_than(None).len(), 3);
    }
}
