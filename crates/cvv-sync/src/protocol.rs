//! Anti-entropy message protocol.
//!
//! An exchange opens with an [`SyncMessage::Offer`] carrying the sender's
//! knowledge. The receiver compares it against its own:
//!
//! ```text
//! On Offer(k) from i:
//!   d = compare(k)
//!   if d.containsUpdate:  send Update(d) to i
//!   if d.requiresUpdate:  send Request(own k) to i
//!
//! On Request(k) from i:
//!   d = compare(k)
//!   if d.containsUpdate:  send Update(d) to i
//!
//! On Update(d):
//!   merge(d.k, d.values or [])     // idempotent
//! ```
//!
//! Every message is self-contained, so loss only delays convergence and
//! duplicates or reordering are absorbed by the merge.

use crate::error::{Result, SyncError};
use cvv_core::{ConflictResolver, KnowledgeSnapshot, ReplicaId};
use cvv_store::{Replica, SyncDecision};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Round limit for [`sync_pair`]. A correct exchange settles in one round.
pub const PAIR_ROUND_LIMIT: usize = 8;

/// Messages exchanged between two replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncMessage<V> {
    /// Opening message: here is what I know.
    Offer {
        from: ReplicaId,
        to: ReplicaId,
        knowledge: Option<KnowledgeSnapshot>,
    },
    /// The sender is behind and asks for whatever the receiver has.
    Request {
        from: ReplicaId,
        to: ReplicaId,
        knowledge: Option<KnowledgeSnapshot>,
    },
    /// Knowledge plus the items the receiver lacks.
    Update {
        from: ReplicaId,
        to: ReplicaId,
        decision: SyncDecision<V>,
    },
}

impl<V> SyncMessage<V> {
    pub fn from(&self) -> &ReplicaId {
        match self {
            SyncMessage::Offer { from, .. }
            | SyncMessage::Request { from, .. }
            | SyncMessage::Update { from, .. } => from,
        }
    }

    pub fn to(&self) -> &ReplicaId {
        match self {
            SyncMessage::Offer { to, .. }
            | SyncMessage::Request { to, .. }
            | SyncMessage::Update { to, .. } => to,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            SyncMessage::Offer { .. } => "offer",
            SyncMessage::Request { .. } => "request",
            SyncMessage::Update { .. } => "update",
        }
    }
}

/// Open an exchange from `replica` to `to`.
pub fn offer<V, R>(replica: &Replica<V, R>, to: &ReplicaId) -> SyncMessage<V> {
    SyncMessage::Offer {
        from: replica.id().clone(),
        to: to.clone(),
        knowledge: replica.get_knowledge(),
    }
}

/// Handle one incoming message at `replica`, returning the replies to send.
pub fn respond<V, R>(
    replica: &mut Replica<V, R>,
    msg: SyncMessage<V>,
) -> Result<Vec<SyncMessage<V>>>
where
    V: Clone,
    R: ConflictResolver<V>,
{
    if msg.to() != replica.id() {
        return Err(SyncError::Misrouted {
            to: msg.to().to_string(),
            at: replica.id().to_string(),
        });
    }
    trace!(replica = %replica.id(), from = %msg.from(), kind = msg.kind(), "handling message");

    let mut replies = Vec::new();
    match msg {
        SyncMessage::Offer { from, knowledge, .. } => {
            if let Some(decision) = replica.compare(knowledge.as_ref()) {
                if decision.requires_update {
                    replies.push(SyncMessage::Request {
                        from: replica.id().clone(),
                        to: from.clone(),
                        knowledge: replica.get_knowledge(),
                    });
                }
                if decision.contains_update {
                    replies.push(SyncMessage::Update {
                        from: replica.id().clone(),
                        to: from,
                        decision,
                    });
                }
            }
        }
        SyncMessage::Request { from, knowledge, .. } => {
            if let Some(decision) = replica.compare(knowledge.as_ref()) {
                if decision.contains_update {
                    replies.push(SyncMessage::Update {
                        from: replica.id().clone(),
                        to: from,
                        decision,
                    });
                }
            }
        }
        SyncMessage::Update { from, decision, .. } => {
            let report = replica.apply_decision(decision)?;
            debug!(
                replica = %replica.id(),
                %from,
                adopted = report.adopted,
                resolved = report.resolved,
                "applied update"
            );
        }
    }
    Ok(replies)
}

/// Whether neither replica has anything the other lacks.
pub fn in_sync<V, R>(a: &Replica<V, R>, b: &Replica<V, R>) -> bool {
    let kb = b.get_knowledge();
    !a.knowledge().has_newer_than(kb.as_ref()) && !a.knowledge().has_older_than(kb.as_ref())
}

/// Run offer/request/update exchanges directly between `a` and `b`, with no
/// loss, until they are in sync. Returns the number of rounds taken.
pub fn sync_pair<V, R>(a: &mut Replica<V, R>, b: &mut Replica<V, R>) -> Result<usize>
where
    V: Clone,
    R: ConflictResolver<V>,
{
    for round in 0..PAIR_ROUND_LIMIT {
        if in_sync(a, b) {
            return Ok(round);
        }

        let mut queue = VecDeque::from([offer(a, b.id())]);
        while let Some(msg) = queue.pop_front() {
            let target = if msg.to() == a.id() { &mut *a } else { &mut *b };
            queue.extend(respond(target, msg)?);
        }
    }

    if in_sync(a, b) {
        Ok(PAIR_ROUND_LIMIT)
    } else {
        Err(SyncError::NotConverged {
            rounds: PAIR_ROUND_LIMIT,
        })
    }
}
