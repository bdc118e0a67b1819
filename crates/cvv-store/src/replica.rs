//! A single replica: its item store, its knowledge ledger and the local
//! write paths.
//!
//! Every mutation keeps the ledger dominating the stored items: whenever an
//! item with provenance `(owner, version)` is stored, the ledger entry for
//! `owner` is at least `version` once the call returns.

use crate::config::ReplicaConfig;
use crate::store::ItemStore;
use cvv_core::{
    is_newer, Clock, Item, Knowledge, KnowledgeSnapshot, LastWriterWins, ReplicaId, Result,
    SystemClock, Version, VersionGenerator,
};
use std::fmt;
use tracing::trace;

/// One participant in leaderless replication.
///
/// `R` is the conflict resolver used by [`Replica::merge`]; it defaults to
/// [`LastWriterWins`].
pub struct Replica<V, R = LastWriterWins> {
    pub(crate) id: ReplicaId,
    pub(crate) store: ItemStore<V>,
    pub(crate) knowledge: Knowledge,
    pub(crate) resolver: R,
    versions: VersionGenerator,
    clock: Box<dyn Clock + Send + Sync>,
}

impl<V> Replica<V> {
    /// Create an empty replica using the system clock and last-writer-wins.
    pub fn new(id: ReplicaId) -> Self {
        Self::with_config(id, ReplicaConfig::default())
    }

    pub fn with_config(id: ReplicaId, config: ReplicaConfig) -> Self {
        Replica::with_resolver(id, config, LastWriterWins)
    }
}

impl<V, R> Replica<V, R> {
    /// Create an empty replica with a custom conflict resolver.
    pub fn with_resolver(id: ReplicaId, config: ReplicaConfig, resolver: R) -> Self {
        Replica {
            id,
            store: ItemStore::new(),
            knowledge: Knowledge::new(),
            resolver,
            versions: VersionGenerator::new(config.version_epsilon),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the clock used to stamp local writes.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn id(&self) -> &ReplicaId {
        &self.id
    }

    /// The version of the most recent local write, or zero.
    pub fn latest_version(&self) -> Version {
        self.versions.last_issued()
    }

    pub fn read(&self, key: &str) -> Option<&V> {
        self.store.value(key)
    }

    pub fn item(&self, key: &str) -> Option<&Item<V>> {
        self.store.get(key)
    }

    /// The `(owner, version)` of the write that produced the value at `key`.
    pub fn provenance(&self, key: &str) -> Option<(ReplicaId, Version)> {
        self.store.provenance(key)
    }

    pub fn store(&self) -> &ItemStore<V> {
        &self.store
    }

    pub fn knowledge(&self) -> &Knowledge {
        &self.knowledge
    }

    /// Snapshot of the ledger; `None` until something has been recorded.
    pub fn get_knowledge(&self) -> Option<KnowledgeSnapshot> {
        self.knowledge.snapshot()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Write `value` under `key` as this replica.
    ///
    /// The write is stamped with a version strictly greater than any this
    /// replica has issued or been told about for itself, and greater than the
    /// version of the value it replaces, so every peer resolves in its favour.
    pub fn write_local(&mut self, key: impl Into<String>, value: V) -> Version {
        let key = key.into();
        if let Some(known) = self.knowledge.lookup(self.id.as_str()) {
            self.versions.advance_to(known);
        }
        if let Some(current) = self.store.get(&key) {
            self.versions.advance_to(current.version);
        }
        let version = self.versions.next(self.clock.now_millis());
        let item = Item::new(key, value, self.id.clone(), version);
        trace!(replica = %self.id, key = %item.key, %version, "local write");
        self.store.insert(item);
        self.knowledge.observe(&self.id, version);
        version
    }

    /// Apply a remote-origin write outside of a merge.
    ///
    /// Validates the provenance, then stores the value only if the ledger has
    /// not already seen `(owner, version)`. Returns whether it was applied.
    pub fn write_external(
        &mut self,
        key: impl Into<String>,
        value: V,
        owner: &str,
        version: f64,
    ) -> Result<bool> {
        let item = Item::from_raw(key, value, owner, version)?;
        Ok(self.apply_external(item))
    }

    /// Typed form of [`Replica::write_external`].
    pub fn apply_external(&mut self, item: Item<V>) -> bool {
        if !is_newer(&item.owner, item.version, Some(self.knowledge.map())) {
            trace!(
                replica = %self.id,
                key = %item.key,
                owner = %item.owner,
                "stale external write ignored"
            );
            return false;
        }
        let owner = item.owner.clone();
        let version = item.version;
        self.store.insert(item);
        self.knowledge.observe(&owner, version);
        true
    }
}

impl<V: Clone, R> Replica<V, R> {
    /// The items `remote` has not seen.
    ///
    /// `None` when this replica has recorded nothing or when no item
    /// qualifies. With no remote knowledge every stored item is returned.
    pub fn list_newer_than(&self, remote: Option<&KnowledgeSnapshot>) -> Option<Vec<Item<V>>> {
        if self.knowledge.is_empty() {
            return None;
        }
        let items = self.store.newer_than(remote);
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }

    /// Everything a peer with no knowledge would need.
    pub fn get_newer_values(&self) -> Option<Vec<Item<V>>> {
        self.list_newer_than(None)
    }
}

impl<V: fmt::Debug, R> fmt::Debug for Replica<V, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replica")
            .field("id", &self.id)
            .field("store", &self.store)
            .field("knowledge", &self.knowledge)
            .field("latest_version", &self.versions.last_issued())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvv_core::{ConflictResolver, CvvError, ManualClock};

    fn rid(s: &str) -> ReplicaId {
        ReplicaId::new(s).unwrap()
    }

    fn replica(id: &str, clock: &ManualClock) -> Replica<i32> {
        Replica::new(rid(id)).with_clock(clock.clone())
    }

    #[test]
    fn test_read_unknown_key() {
        let clock = ManualClock::new(1000.0);
        let r = replica("some-id", &clock);
        assert!(r.read("some-key").is_none());
        assert!(r.provenance("some-key").is_none());
        assert_eq!(r.latest_version(), Version::ZERO);
        assert!(r.get_knowledge().is_none());
    }

    #[test]
    fn test_write_local_records_knowledge() {
        let r = {
            let mut r = Replica::new(rid("a"));
            r.write_local("x", 1);
            r
        };
        let k = r.get_knowledge().unwrap();
        assert_eq!(k.count(), 1);
        assert!(k.get("a").unwrap().as_f64() > 0.0);
        assert_eq!(r.read("x"), Some(&1));
    }

    #[test]
    fn test_write_local_versions_increase_within_one_tick() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("some-id", &clock);

        let mut last = Version::ZERO;
        for i in 0..4 {
            r.write_local("some-key", i);
            let (owner, version) = r.provenance("some-key").unwrap();
            assert_eq!(owner.as_str(), "some-id");
            assert!(version > last);
            assert_eq!(r.latest_version(), version);
            last = version;
        }
    }

    #[test]
    fn test_write_local_stays_ahead_of_own_knowledge() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("shared-id", &clock);

        // A peer using the same id wrote at a later time.
        assert!(r.write_external("k", 1, "shared-id", 5000.0).unwrap());
        let version = r.write_local("k", 2);
        assert!(version.as_f64() > 5000.0);
        assert_eq!(r.knowledge().lookup("shared-id"), Some(version));
    }

    #[test]
    fn test_write_local_supersedes_a_later_remote_value() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);

        // A peer with a clock far ahead wrote first.
        assert!(r.write_external("k", 1, "b", 9000.0).unwrap());
        let version = r.write_local("k", 2);
        assert!(version.as_f64() > 9000.0);

        let remote = Item::from_raw("k", 1, "b", 9000.0).unwrap();
        let winner = LastWriterWins.resolve(r.item("k").unwrap(), &remote).unwrap();
        assert_eq!(winner.value, 2);
    }

    #[test]
    fn test_write_external_validates() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);

        assert!(matches!(
            r.write_external("k", 1, "", 1.0),
            Err(CvvError::InvalidArgument(_))
        ));
        assert!(matches!(
            r.write_external("k", 1, "b", f64::NAN),
            Err(CvvError::InvalidArgument(_))
        ));
        assert!(r.is_empty());
        assert!(r.get_knowledge().is_none());
    }

    #[test]
    fn test_versions_stay_finite_at_the_ceiling() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);

        assert!(matches!(
            r.write_external("k", 1, "a", f64::MAX),
            Err(CvvError::InvalidArgument(_))
        ));
        assert!(r.is_empty());

        assert!(r.write_external("k", 1, "a", Version::MAX.as_f64()).unwrap());
        let v1 = r.write_local("k", 2);
        let v2 = r.write_local("k", 3);
        assert!(v1.as_f64().is_finite() && v2.as_f64().is_finite());
        assert_eq!(v2, Version::MAX);

        let encoded = crate::wire::encode_knowledge(r.get_knowledge().as_ref()).unwrap();
        let decoded = crate::wire::decode_knowledge(&encoded).unwrap();
        assert_eq!(decoded, r.get_knowledge());
    }

    #[test]
    fn test_write_external_applies_only_newer() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);

        assert!(r.write_external("k", 1, "b", 10.0).unwrap());
        assert_eq!(r.read("k"), Some(&1));
        assert_eq!(r.knowledge().lookup("b").unwrap().as_f64(), 10.0);

        assert!(!r.write_external("k", 2, "b", 10.0).unwrap());
        assert!(!r.write_external("other", 3, "b", 9.0).unwrap());
        assert_eq!(r.read("k"), Some(&1));
        assert!(r.read("other").is_none());

        assert!(r.write_external("k", 4, "b", 11.0).unwrap());
        assert_eq!(r.read("k"), Some(&4));
    }

    #[test]
    fn test_list_newer_than() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);
        assert!(r.list_newer_than(None).is_none());

        r.write_local("x", 1);
        clock.advance(1.0);
        r.write_local("y", 2);

        assert_eq!(r.list_newer_than(None).unwrap().len(), 2);

        let k = r.get_knowledge().unwrap();
        assert!(r.list_newer_than(Some(&k)).is_none());

        let partial = KnowledgeSnapshot::from_entries([(rid("a"), Version::new(1000.0).unwrap())]);
        let newer = r.list_newer_than(Some(&partial)).unwrap();
        assert_eq!(newer.len(), 1);
        assert_eq!(newer[0].key, "y");

        let stranger = KnowledgeSnapshot::from_entries([(rid("z"), Version::new(1.0).unwrap())]);
        assert_eq!(r.list_newer_than(Some(&stranger)).unwrap().len(), 2);
    }

    #[test]
    fn test_listed_items_are_copies() {
        let clock = ManualClock::new(1000.0);
        let mut r = replica("a", &clock);
        r.write_local("x", 1);

        let mut listed = r.get_newer_values().unwrap();
        listed[0].value = 99;
        assert_eq!(r.read("x"), Some(&1));
    }
}
