//! JSON encoding of the replica-to-replica messages.
//!
//! Transport is out of scope; these helpers only fix the shapes so that any
//! transport carrying the encoded text round-trips them exactly. Decoding
//! validates replica ids, versions and snapshot counts.

use crate::negotiate::SyncDecision;
use cvv_core::{Item, KnowledgeSnapshot, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode_decision<V: Serialize>(decision: &SyncDecision<V>) -> Result<String> {
    Ok(serde_json::to_string(decision)?)
}

pub fn decode_decision<V: DeserializeOwned>(text: &str) -> Result<SyncDecision<V>> {
    Ok(serde_json::from_str(text)?)
}

/// Encode a knowledge snapshot. An absent snapshot encodes as `null`.
pub fn encode_knowledge(knowledge: Option<&KnowledgeSnapshot>) -> Result<String> {
    Ok(serde_json::to_string(&knowledge)?)
}

pub fn decode_knowledge(text: &str) -> Result<Option<KnowledgeSnapshot>> {
    Ok(serde_json::from_str(text)?)
}

pub fn encode_items<V: Serialize>(items: &[Item<V>]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}

pub fn decode_items<V: DeserializeOwned>(text: &str) -> Result<Vec<Item<V>>> {
    Ok(serde_json::from_str(text)?)
}
