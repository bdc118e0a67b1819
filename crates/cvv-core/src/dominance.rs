//! The dominance predicate.
//!
//! `(owner, version)` is *newer* than a knowledge map when the map has never
//! heard of `owner`, or records a strictly smaller version for it.

use crate::error::Result;
use crate::id::{ReplicaId, Version};
use crate::knowledge::KnowledgeMap;

/// True if `version` from `owner` is not yet covered by `knowledge`.
///
/// An absent map knows nothing, so every pair is newer than it.
pub fn is_newer(owner: &ReplicaId, version: Version, knowledge: Option<&KnowledgeMap>) -> bool {
    match knowledge.and_then(|map| map.get(owner)) {
        Some(&known) => known < version,
        None => true,
    }
}

/// Untyped form of [`is_newer`] for caller-supplied provenance.
///
/// Fails with `InvalidArgument` when `version` is not a finite number or
/// `owner` is empty.
pub fn is_newer_raw(owner: &str, version: f64, knowledge: Option<&KnowledgeMap>) -> Result<bool> {
    let version = Version::new(version)?;
    let owner = ReplicaId::new(owner)?;
    Ok(is_newer(&owner, version, knowledge))
}
