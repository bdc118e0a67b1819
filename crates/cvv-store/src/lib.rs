//! # cvv-store
//!
//! The replica-local half of the CVV store: an item store guarded by a
//! knowledge ledger, with the merge engine and sync negotiator that let
//! replicas converge without a coordinator.
//!
//! ## Sync in three calls
//!
//! ```rust
//! use cvv_store::Replica;
//! use cvv_core::ReplicaId;
//!
//! let mut a: Replica<i64> = Replica::new(ReplicaId::new("a").unwrap());
//! let mut b: Replica<i64> = Replica::new(ReplicaId::new("b").unwrap());
//! a.write_local("x", 1);
//!
//! // `a` compares against b's knowledge and ships what b lacks.
//! if let Some(decision) = a.compare(b.get_knowledge().as_ref()) {
//!     b.apply_decision(decision).unwrap();
//! }
//! assert_eq!(b.read("x"), Some(&1));
//! assert!(a.compare(b.get_knowledge().as_ref()).is_none());
//! ```
//!
//! - [`replica`] - local and external writes, reads, knowledge
//! - [`merge`] - integrating a peer's knowledge and items
//! - [`negotiate`] - deciding who owes whom an update
//! - [`wire`] - JSON shapes exchanged between replicas

pub mod config;
pub mod merge;
pub mod negotiate;
pub mod replica;
pub mod store;
pub mod wire;

pub use config::{ReplicaConfig, ReplicaConfigBuilder};
pub use merge::MergeReport;
pub use negotiate::SyncDecision;
pub use replica::Replica;
pub use store::ItemStore;
