//! # cvv-sync
//!
//! Drives CVV replicas to convergence with a three-message anti-entropy
//! protocol (offer, request, update), either directly between two replicas
//! with [`sync_pair`] or across a [`ReplicaCluster`] connected by a
//! simulated network that loses, duplicates and reorders messages.
//!
//! ```rust
//! use cvv_sync::{NetworkConfig, ReplicaCluster};
//!
//! let mut cluster: ReplicaCluster<u32> =
//!     ReplicaCluster::new(3, NetworkConfig::chaotic()).unwrap();
//! cluster.write(0, "x", 1);
//! cluster.write(1, "x", 2);
//!
//! cluster.run_until_converged().unwrap();
//! assert_eq!(cluster.replica(2).read("x"), Some(&2));
//! ```

pub mod cluster;
pub mod error;
pub mod network;
pub mod protocol;

pub use cluster::{ClusterConfig, ReplicaCluster};
pub use error::{Result, SyncError};
pub use network::{NetworkConfig, NetworkSimulator};
pub use protocol::{in_sync, offer, respond, sync_pair, SyncMessage};
