//! Simulated unreliable network.
//!
//! Messages can be lost, duplicated or reordered according to
//! [`NetworkConfig`]. Randomness comes from a seeded LCG so every run with
//! the same seed delivers messages identically.

use std::collections::VecDeque;
use tracing::trace;

const DEFAULT_SEED: u64 = 12345;

/// Fault rates for the simulated network
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Chance a sent message is dropped (0.0 - 1.0)
    pub loss_rate: f64,
    /// Chance a sent message is queued twice (0.0 - 1.0)
    pub dup_rate: f64,
    /// Chance a message jumps ahead of one already queued (0.0 - 1.0)
    pub reorder_rate: f64,
    /// LCG seed; equal seeds give equal delivery orders
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            loss_rate: 0.0,
            dup_rate: 0.0,
            reorder_rate: 0.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl NetworkConfig {
    pub fn lossy(loss_rate: f64) -> Self {
        Self {
            loss_rate,
            ..Default::default()
        }
    }

    pub fn with_dups(dup_rate: f64) -> Self {
        Self {
            dup_rate,
            ..Default::default()
        }
    }

    /// Loss, duplication and reordering all at once.
    pub fn chaotic() -> Self {
        Self {
            loss_rate: 0.1,
            dup_rate: 0.2,
            reorder_rate: 0.3,
            ..Default::default()
        }
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug)]
pub struct NetworkSimulator<M> {
    in_flight: VecDeque<M>,
    lost: Vec<M>,
    config: NetworkConfig,
    rng_state: u64,
    delivered: usize,
}

impl<M: Clone> NetworkSimulator<M> {
    pub fn new(config: NetworkConfig) -> Self {
        Self {
            in_flight: VecDeque::new(),
            lost: Vec::new(),
            rng_state: config.seed,
            config,
            delivered: 0,
        }
    }

    fn next_random(&mut self) -> f64 {
        self.rng_state = self.rng_state.wrapping_mul(1103515245).wrapping_add(12345);
        ((self.rng_state >> 16) & 0x7fff) as f64 / 32768.0
    }

    pub fn send(&mut self, msg: M) {
        if self.next_random() < self.config.loss_rate {
            trace!(lost = self.lost.len() + 1, "message lost");
            self.lost.push(msg);
            return;
        }

        if self.next_random() < self.config.dup_rate {
            self.in_flight.push_back(msg.clone());
        }

        self.in_flight.push_back(msg);
        if self.next_random() < self.config.reorder_rate && self.in_flight.len() > 1 {
            // Swap the new message with a random earlier one.
            let last = self.in_flight.len() - 1;
            let pos = ((self.next_random() * last as f64) as usize).min(last - 1);
            self.in_flight.swap(pos, last);
        }
    }

    pub fn receive(&mut self) -> Option<M> {
        let msg = self.in_flight.pop_front();
        if msg.is_some() {
            self.delivered += 1;
        }
        msg
    }

    /// Put every lost message back in flight.
    pub fn retransmit_lost(&mut self) {
        self.in_flight.extend(self.lost.drain(..));
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn lost_count(&self) -> usize {
        self.lost.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered
    }
}
