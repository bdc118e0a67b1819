//! Sync negotiation.
//!
//! Given a peer's knowledge, `compare` decides in one pass whether the local
//! replica should pull (`requires_update`), push (`contains_update`), both,
//! or neither. Neither is the fixed point of convergence.

use crate::merge::MergeReport;
use crate::replica::Replica;
use cvv_core::{ConflictResolver, Item, KnowledgeSnapshot, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of comparing local knowledge with a peer's.
///
/// Wire form: `{ "k": ..., "requiresUpdate"?: true, "containsUpdate"?: true,
/// "values"?: [...] }`. Unset flags and missing values are omitted rather
/// than sent as `false`/`null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncDecision<V> {
    /// The deciding replica's knowledge. Must accompany any exchange.
    #[serde(rename = "k")]
    pub knowledge: KnowledgeSnapshot,

    /// The peer knows something the local replica does not; request an
    /// update, sending `knowledge` along.
    #[serde(rename = "requiresUpdate", default, skip_serializing_if = "is_false")]
    pub requires_update: bool,

    /// The local replica knows something the peer does not; send
    /// `knowledge` and `values`.
    #[serde(rename = "containsUpdate", default, skip_serializing_if = "is_false")]
    pub contains_update: bool,

    /// Items the peer lacks. May be absent even when `contains_update` is
    /// set: the peer can be behind on knowledge without missing any item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Item<V>>>,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

impl<V> SyncDecision<V> {
    /// Consume the decision into the `(knowledge, items)` pair a merge takes.
    pub fn into_update(self) -> (KnowledgeSnapshot, Vec<Item<V>>) {
        (self.knowledge, self.values.unwrap_or_default())
    }
}

impl<V: Clone, R> Replica<V, R> {
    /// Compare local knowledge against `remote`.
    ///
    /// Returns `None` when neither side has anything the other lacks.
    pub fn compare(&self, remote: Option<&KnowledgeSnapshot>) -> Option<SyncDecision<V>> {
        let requires_update = self.knowledge.has_older_than(remote);
        let contains_update = self.knowledge.has_newer_than(remote);

        if !requires_update && !contains_update {
            return None;
        }

        let values = if contains_update {
            self.list_newer_than(remote)
        } else {
            None
        };

        debug!(
            replica = %self.id,
            requires_update,
            contains_update,
            values = values.as_ref().map_or(0, Vec::len),
            "compared knowledge"
        );

        Some(SyncDecision {
            // Only a replica that has recorded nothing lacks a snapshot, and
            // then it can only be asking for an update.
            knowledge: self
                .knowledge
                .snapshot()
                .unwrap_or_else(KnowledgeSnapshot::empty),
            requires_update,
            contains_update,
            values,
        })
    }
}

impl<V: Clone, R: ConflictResolver<V>> Replica<V, R> {
    /// Merge the knowledge and values carried by a peer's decision.
    pub fn apply_decision(&mut self, decision: SyncDecision<V>) -> Result<MergeReport> {
        let (knowledge, values) = decision.into_update();
        self.merge(&knowledge, values)
    }
}
