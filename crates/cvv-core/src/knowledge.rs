//! The knowledge ledger.
//!
//! Knowledge is a compact summary of how much of every replica's history has
//! been absorbed locally: for each replica id, the highest version observed.
//! Comparing two ledgers tells replicas who owes whom an update without
//! exchanging any item data.

use crate::error::CvvError;
use crate::id::{ReplicaId, Version};
use crate::lattice::Lattice;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Map from replica id to the highest version observed for it.
pub type KnowledgeMap = BTreeMap<ReplicaId, Version>;

/// An owned copy of a ledger, handed to peers for comparison.
///
/// `count` always equals the number of entries in `map`; snapshots decoded
/// from the wire are rejected otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSnapshot")]
pub struct KnowledgeSnapshot {
    count: usize,
    map: KnowledgeMap,
}

#[derive(Deserialize)]
struct RawSnapshot {
    count: usize,
    map: KnowledgeMap,
}

impl TryFrom<RawSnapshot> for KnowledgeSnapshot {
    type Error = CvvError;

    fn try_from(raw: RawSnapshot) -> Result<Self, Self::Error> {
        if raw.count != raw.map.len() {
            return Err(CvvError::InvalidArgument(format!(
                "knowledge count {} does not match {} map entries",
                raw.count,
                raw.map.len()
            )));
        }
        Ok(KnowledgeSnapshot {
            count: raw.count,
            map: raw.map,
        })
    }
}

impl KnowledgeSnapshot {
    /// A snapshot that records nothing. Distinct from having no snapshot.
    pub fn empty() -> Self {
        KnowledgeSnapshot {
            count: 0,
            map: KnowledgeMap::new(),
        }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (ReplicaId, Version)>) -> Self {
        let mut map = KnowledgeMap::new();
        for (id, version) in entries {
            let slot = map.entry(id).or_insert(version);
            if *slot < version {
                *slot = version;
            }
        }
        KnowledgeSnapshot {
            count: map.len(),
            map,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn map(&self) -> &KnowledgeMap {
        &self.map
    }

    pub fn get(&self, id: &str) -> Option<Version> {
        self.map.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// The per-replica knowledge ledger.
///
/// Entries are created on first observation and only ever raised.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Knowledge {
    map: KnowledgeMap,
    count: usize,
}

impl Knowledge {
    pub fn new() -> Self {
        Knowledge {
            map: KnowledgeMap::new(),
            count: 0,
        }
    }

    /// Record that `version` of `id` has been seen.
    ///
    /// Returns true if the ledger changed (new id or higher version).
    pub fn observe(&mut self, id: &ReplicaId, version: Version) -> bool {
        match self.map.get_mut(id) {
            Some(known) if *known < version => {
                *known = version;
                true
            }
            Some(_) => false,
            None => {
                self.map.insert(id.clone(), version);
                self.count += 1;
                true
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Option<Version> {
        self.map.get(id).copied()
    }

    /// An independent copy of the ledger, or `None` if nothing was recorded.
    pub fn snapshot(&self) -> Option<KnowledgeSnapshot> {
        if self.count == 0 {
            return None;
        }
        Some(KnowledgeSnapshot {
            count: self.count,
            map: self.map.clone(),
        })
    }

    /// True if `remote` knows something this ledger does not: an unknown id
    /// or a higher version of a known one.
    pub fn has_older_than(&self, remote: Option<&KnowledgeSnapshot>) -> bool {
        let remote = match remote {
            Some(remote) if !remote.is_empty() => remote,
            _ => return false,
        };
        if self.count == 0 || remote.count > self.count {
            return true;
        }
        remote.map.iter().any(|(id, theirs)| match self.map.get(id) {
            Some(ours) => ours < theirs,
            None => true,
        })
    }

    /// True if this ledger knows something `remote` does not.
    pub fn has_newer_than(&self, remote: Option<&KnowledgeSnapshot>) -> bool {
        if self.count == 0 {
            return false;
        }
        let remote = match remote {
            Some(remote) => remote,
            None => return true,
        };
        if self.count > remote.count {
            return true;
        }
        self.map.iter().any(|(id, ours)| match remote.map.get(id) {
            Some(theirs) => ours > theirs,
            None => true,
        })
    }

    /// Fold a peer's knowledge in: per-id maximum, never lowering an entry.
    ///
    /// Returns true if anything changed.
    pub fn absorb(&mut self, remote: &KnowledgeSnapshot) -> bool {
        self.absorb_map(&remote.map)
    }

    fn absorb_map(&mut self, remote: &KnowledgeMap) -> bool {
        let mut changed = false;
        for (id, &version) in remote {
            changed |= self.observe(id, version);
        }
        changed
    }

    pub fn map(&self) -> &KnowledgeMap {
        &self.map
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ReplicaId, &Version)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl From<&KnowledgeSnapshot> for Knowledge {
    fn from(snapshot: &KnowledgeSnapshot) -> Self {
        Knowledge {
            map: snapshot.map.clone(),
            count: snapshot.count,
        }
    }
}

impl Lattice for Knowledge {
    fn bottom() -> Self {
        Knowledge::new()
    }

    fn join(&self, other: &Self) -> Self {
        let mut joined = self.clone();
        joined.absorb_map(&other.map);
        joined
    }

    fn join_assign(&mut self, other: &Self) -> bool {
        self.absorb_map(&other.map)
    }
}
