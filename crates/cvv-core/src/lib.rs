//! # cvv-core
//!
//! Core types for the contextual version vector (CVV) store: a replica-local
//! key/value map that converges with its peers through leaderless,
//! last-writer-wins replication.
//!
//! This crate provides:
//! - [`ReplicaId`] and [`Version`]: validated provenance primitives
//! - [`Item`]: a value tagged with the `(owner, version)` that wrote it
//! - [`Knowledge`]: the per-replica ledger of the highest version seen from
//!   every replica, and [`KnowledgeSnapshot`], its owned copy
//! - [`is_newer`]: the dominance predicate
//! - [`ConflictResolver`] with the default [`LastWriterWins`] strategy
//! - [`VersionGenerator`] and [`Clock`]: strictly increasing local versions
//!
//! The invariant tying these together: a ledger always dominates the items
//! it vouches for.

pub mod clock;
pub mod dominance;
pub mod error;
pub mod id;
pub mod item;
pub mod knowledge;
pub mod lattice;
pub mod resolver;

pub use clock::{Clock, ManualClock, SystemClock, VersionGenerator, DEFAULT_VERSION_EPSILON};
pub use dominance::{is_newer, is_newer_raw};
pub use error::{CvvError, Result};
pub use id::{ReplicaId, Version};
pub use item::Item;
pub use knowledge::{Knowledge, KnowledgeMap, KnowledgeSnapshot};
pub use lattice::Lattice;
pub use resolver::{ConflictResolver, LastWriterWins};
