//! Error types shared by every CVV crate.

use crate::id::{ReplicaId, Version};
use thiserror::Error;

/// Errors raised by the knowledge, store and merge layers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CvvError {
    /// Caller-supplied provenance or wire data failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two items share `(owner, version)` but carry different values.
    #[error("Conflicting items for key {key:?} share owner {owner} and version {version} but differ in value")]
    ConflictInvariantViolation {
        key: String,
        owner: ReplicaId,
        version: Version,
    },

    #[error("Wire error: {0}")]
    Wire(String),
}

impl From<serde_json::Error> for CvvError {
    fn from(err: serde_json::Error) -> Self {
        CvvError::Wire(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CvvError>;
