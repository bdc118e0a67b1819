//! The merge engine.
//!
//! Integrates a peer's `(knowledge, items)` pair into a replica. For each
//! incoming item:
//!
//! ```text
//! no local item for key            -> adopt remote
//! local ledger already covers it   -> skip
//! remote knowledge covers local    -> adopt remote (it superseded local)
//! otherwise (concurrent writes)    -> resolver(remote, local)
//! ```
//!
//! After the items, the peer's knowledge is joined into the local ledger,
//! even when no items were sent. Every committed item is also observed, so
//! the ledger covers the store even when the sender's knowledge lags its
//! items. The join makes knowledge convergence
//! independent of message order and duplication.
//!
//! Merging is all-or-nothing: decisions are staged first and only committed
//! once every item has been processed without error.

use crate::replica::Replica;
use crate::store::ItemStore;
use cvv_core::{is_newer, ConflictResolver, Item, Knowledge, KnowledgeSnapshot, Result};
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Summary of what a merge changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Items taken from the peer as-is.
    pub adopted: usize,
    /// Items the local ledger had already seen.
    pub skipped: usize,
    /// Concurrent conflicts settled by the resolver.
    pub resolved: usize,
    /// Whether the peer's knowledge raised the local ledger.
    pub knowledge_changed: bool,
}

impl MergeReport {
    /// True if the merge left store and ledger untouched.
    pub fn is_noop(&self) -> bool {
        self.adopted == 0 && self.resolved == 0 && !self.knowledge_changed
    }
}

enum Decision<V> {
    Adopt,
    Skip,
    Resolved(Item<V>),
}

struct MergePlan<V> {
    staged: BTreeMap<String, Item<V>>,
    report: MergeReport,
}

fn plan_merge<V, Q>(
    store: &ItemStore<V>,
    knowledge: &Knowledge,
    remote_knowledge: &KnowledgeSnapshot,
    remote_items: Vec<Item<V>>,
    resolver: &Q,
) -> Result<MergePlan<V>>
where
    Q: ConflictResolver<V> + ?Sized,
{
    let remote_map = remote_knowledge.map();
    let local_map = knowledge.map();
    let mut staged: BTreeMap<String, Item<V>> = BTreeMap::new();
    let mut report = MergeReport::default();

    for incoming in remote_items {
        let decision = {
            let local = staged
                .get(&incoming.key)
                .or_else(|| store.get(&incoming.key));
            match local {
                None => Decision::Adopt,
                Some(_) if !is_newer(&incoming.owner, incoming.version, Some(local_map)) => {
                    Decision::Skip
                }
                Some(local) if !is_newer(&local.owner, local.version, Some(remote_map)) => {
                    Decision::Adopt
                }
                Some(local) => Decision::Resolved(resolver.resolve(&incoming, local)?),
            }
        };

        match decision {
            Decision::Adopt => {
                trace!(key = %incoming.key, owner = %incoming.owner, "adopting remote item");
                report.adopted += 1;
                staged.insert(incoming.key.clone(), incoming);
            }
            Decision::Skip => {
                trace!(key = %incoming.key, owner = %incoming.owner, "remote item already known");
                report.skipped += 1;
            }
            Decision::Resolved(winner) => {
                trace!(key = %winner.key, owner = %winner.owner, "concurrent write resolved");
                report.resolved += 1;
                staged.insert(winner.key.clone(), winner);
            }
        }
    }

    Ok(MergePlan { staged, report })
}

impl<V: Clone, R> Replica<V, R> {
    /// Merge a peer's knowledge and items using an explicit resolver.
    pub fn merge_with<Q>(
        &mut self,
        remote_knowledge: &KnowledgeSnapshot,
        remote_items: Vec<Item<V>>,
        resolver: &Q,
    ) -> Result<MergeReport>
    where
        Q: ConflictResolver<V> + ?Sized,
    {
        let plan = plan_merge(
            &self.store,
            &self.knowledge,
            remote_knowledge,
            remote_items,
            resolver,
        );
        self.commit(plan, remote_knowledge)
    }

    fn commit(
        &mut self,
        plan: Result<MergePlan<V>>,
        remote_knowledge: &KnowledgeSnapshot,
    ) -> Result<MergeReport> {
        let MergePlan { staged, mut report } = match plan {
            Ok(plan) => plan,
            Err(err) => {
                warn!(replica = %self.id, error = %err, "merge rejected, nothing applied");
                return Err(err);
            }
        };

        let mut knowledge_changed = false;
        for item in staged.into_values() {
            knowledge_changed |= self.knowledge.observe(&item.owner, item.version);
            self.store.insert(item);
        }
        knowledge_changed |= self.knowledge.absorb(remote_knowledge);
        report.knowledge_changed = knowledge_changed;

        debug!(
            replica = %self.id,
            adopted = report.adopted,
            skipped = report.skipped,
            resolved = report.resolved,
            knowledge_changed = report.knowledge_changed,
            "merged remote state"
        );
        Ok(report)
    }
}

impl<V: Clone, R: ConflictResolver<V>> Replica<V, R> {
    /// Merge a peer's knowledge and items using this replica's resolver.
    pub fn merge(
        &mut self,
        remote_knowledge: &KnowledgeSnapshot,
        remote_items: Vec<Item<V>>,
    ) -> Result<MergeReport> {
        let plan = plan_merge(
            &self.store,
            &self.knowledge,
            remote_knowledge,
            remote_items,
            &self.resolver,
        );
        self.commit(plan, remote_knowledge)
    }
}
