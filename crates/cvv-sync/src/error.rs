//! Errors raised while driving replicas to convergence.

use cvv_core::CvvError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    /// A merge or decode inside a replica failed.
    #[error(transparent)]
    Replica(#[from] CvvError),

    #[error("Unknown replica: {0}")]
    UnknownReplica(String),

    /// A message addressed to `to` was handed to replica `at`.
    #[error("Message for {to} delivered to {at}")]
    Misrouted { to: String, at: String },

    /// The exchange was still moving data after the round limit.
    #[error("Replicas did not converge within {rounds} rounds")]
    NotConverged { rounds: usize },
}

pub type Result<T> = std::result::Result<T, SyncError>;
