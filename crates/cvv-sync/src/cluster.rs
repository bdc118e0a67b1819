//! A cluster of replicas syncing over a simulated network.

use crate::error::{Result, SyncError};
use crate::network::{NetworkConfig, NetworkSimulator};
use crate::protocol::{self, SyncMessage};
use cvv_core::{ManualClock, ReplicaId, Version};
use cvv_store::{Replica, ReplicaConfig};
use tracing::{debug, info};

/// Settings for driving a [`ReplicaCluster`] to convergence.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Sync rounds attempted by [`ReplicaCluster::run_until_converged`].
    pub max_rounds: usize,
    pub replica: ReplicaConfig,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_rounds: 20,
            replica: ReplicaConfig::default(),
        }
    }
}

/// `n` replicas named `replica_0..replica_{n-1}`, sharing one manual clock
/// that advances a millisecond per write.
#[derive(Debug)]
pub struct ReplicaCluster<V> {
    replicas: Vec<Replica<V>>,
    network: NetworkSimulator<SyncMessage<V>>,
    clock: ManualClock,
    config: ClusterConfig,
}

impl<V: Clone + PartialEq> ReplicaCluster<V> {
    pub fn new(n: usize, network: NetworkConfig) -> Result<Self> {
        Self::with_config(n, network, ClusterConfig::default())
    }

    pub fn with_config(n: usize, network: NetworkConfig, config: ClusterConfig) -> Result<Self> {
        let clock = ManualClock::new(0.0);
        let replicas = (0..n)
            .map(|i| -> Result<Replica<V>> {
                let id = ReplicaId::new(format!("replica_{}", i))?;
                Ok(Replica::with_config(id, config.replica.clone()).with_clock(clock.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            replicas,
            network: NetworkSimulator::new(network),
            clock,
            config,
        })
    }

    pub fn replica(&self, idx: usize) -> &Replica<V> {
        &self.replicas[idx]
    }

    pub fn replica_mut(&mut self, idx: usize) -> &mut Replica<V> {
        &mut self.replicas[idx]
    }

    pub fn network(&self) -> &NetworkSimulator<SyncMessage<V>> {
        &self.network
    }

    /// Write locally at replica `idx`, one clock tick after the previous write.
    pub fn write(&mut self, idx: usize, key: impl Into<String>, value: V) -> Version {
        self.clock.advance(1.0);
        self.replicas[idx].write_local(key, value)
    }

    /// Queue an offer from `from_idx` to `to_idx`.
    pub fn initiate_sync(&mut self, from_idx: usize, to_idx: usize) {
        let to = self.replicas[to_idx].id().clone();
        let msg = protocol::offer(&self.replicas[from_idx], &to);
        self.network.send(msg);
    }

    /// Deliver one message. Returns `false` once the network is idle.
    pub fn process_one(&mut self) -> Result<bool> {
        let Some(msg) = self.network.receive() else {
            return Ok(false);
        };

        let replica = self
            .replicas
            .iter_mut()
            .find(|r| r.id() == msg.to())
            .ok_or_else(|| SyncError::UnknownReplica(msg.to().to_string()))?;
        for reply in protocol::respond(replica, msg)? {
            self.network.send(reply);
        }
        Ok(true)
    }

    pub fn drain_network(&mut self) -> Result<()> {
        while self.process_one()? {}
        Ok(())
    }

    /// Offer from one replica to every other one.
    pub fn broadcast(&mut self, from_idx: usize) -> Result<()> {
        for to_idx in 0..self.replicas.len() {
            if from_idx != to_idx {
                self.initiate_sync(from_idx, to_idx);
            }
        }
        self.drain_network()
    }

    /// Every replica offers to every other replica, then the network drains.
    pub fn full_sync_round(&mut self) -> Result<()> {
        let n = self.replicas.len();
        for from_idx in 0..n {
            for to_idx in 0..n {
                if from_idx != to_idx {
                    self.initiate_sync(from_idx, to_idx);
                }
            }
        }
        self.drain_network()
    }

    pub fn retransmit_and_process(&mut self) -> Result<()> {
        self.network.retransmit_lost();
        self.drain_network()
    }

    /// Sync until converged, retransmitting losses between rounds. Returns
    /// the number of rounds taken.
    pub fn run_until_converged(&mut self) -> Result<usize> {
        for round in 0..self.config.max_rounds {
            if self.is_converged() {
                info!(round, replicas = self.replicas.len(), "cluster converged");
                return Ok(round);
            }
            self.full_sync_round()?;
            self.retransmit_and_process()?;
            debug!(
                round,
                delivered = self.network.delivered_count(),
                "sync round finished"
            );
        }

        if self.is_converged() {
            Ok(self.config.max_rounds)
        } else {
            Err(SyncError::NotConverged {
                rounds: self.config.max_rounds,
            })
        }
    }

    /// All replicas hold identical stores and ledgers.
    pub fn is_converged(&self) -> bool {
        match self.replicas.split_first() {
            None => true,
            Some((first, rest)) => rest
                .iter()
                .all(|r| r.store() == first.store() && r.knowledge() == first.knowledge()),
        }
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}
