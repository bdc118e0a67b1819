//! Convergence of replica clusters over unreliable networks.
//!
//! Every message is self-contained and merges are idempotent, so loss only
//! delays convergence and duplicates or reordering change nothing.

use cvv_core::ManualClock;
use cvv_core::ReplicaId;
use cvv_store::Replica;
use cvv_sync::{sync_pair, NetworkConfig, ReplicaCluster, SyncMessage};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_all_hold(cluster: &ReplicaCluster<u32>, key: &str, value: u32) {
    for i in 0..cluster.len() {
        assert_eq!(
            cluster.replica(i).read(key),
            Some(&value),
            "replica {} has wrong value for {}",
            i,
            key
        );
    }
}

#[test]
fn test_convergence_under_loss() {
    let mut cluster: ReplicaCluster<u32> =
        ReplicaCluster::new(3, NetworkConfig::lossy(0.5)).unwrap();
    for i in 0..3 {
        cluster.write(i, format!("k{}", i), i as u32 + 1);
    }

    for _ in 0..10 {
        cluster.full_sync_round().unwrap();
        cluster.retransmit_and_process().unwrap();
    }

    assert!(cluster.is_converged());
    for i in 0..3 {
        assert_all_hold(&cluster, &format!("k{}", i), i as u32 + 1);
    }
}

#[test]
fn test_convergence_with_duplicates() {
    let mut cluster: ReplicaCluster<u32> =
        ReplicaCluster::new(2, NetworkConfig::with_dups(0.5)).unwrap();
    cluster.write(0, "a", 1);
    cluster.write(1, "b", 2);
    cluster.write(1, "a", 3);

    for _ in 0..5 {
        cluster.full_sync_round().unwrap();
    }

    assert!(cluster.is_converged());
    assert_all_hold(&cluster, "a", 3);
    assert_all_hold(&cluster, "b", 2);
}

#[test]
fn test_convergence_chaotic_network() {
    let mut cluster: ReplicaCluster<u32> =
        ReplicaCluster::new(4, NetworkConfig::chaotic()).unwrap();
    for i in 0..4 {
        for j in 0..5 {
            cluster.write(i, format!("own-{}-{}", i, j), (i * 10 + j) as u32);
            cluster.write(i, "shared", (i * 10 + j) as u32);
        }
    }

    let rounds = cluster.run_until_converged().unwrap();
    assert!(rounds >= 1);

    for i in 0..4 {
        for j in 0..5 {
            assert_all_hold(&cluster, &format!("own-{}-{}", i, j), (i * 10 + j) as u32);
        }
    }
    // Replica 3 wrote last.
    assert_all_hold(&cluster, "shared", 34);
}

#[test]
fn test_repeated_rounds_are_idempotent() {
    let mut cluster: ReplicaCluster<u32> =
        ReplicaCluster::new(2, NetworkConfig::default()).unwrap();
    cluster.write(0, "k", 42);

    let initial = cluster.replica(1).store().clone();
    cluster.full_sync_round().unwrap();
    let after_one = cluster.replica(1).store().clone();
    for _ in 0..10 {
        cluster.full_sync_round().unwrap();
    }

    assert_eq!(after_one, *cluster.replica(1).store());
    assert_ne!(initial, after_one);
}

#[test]
fn test_interleaved_writes_and_syncs() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut cluster: ReplicaCluster<u32> =
        ReplicaCluster::new(5, NetworkConfig::chaotic().seeded(99)).unwrap();

    for step in 0..200u32 {
        let idx = rng.gen_range(0..cluster.len());
        if rng.gen_bool(0.7) {
            let key = format!("k{}", rng.gen_range(0..10));
            cluster.write(idx, key, step);
        } else {
            let to = rng.gen_range(0..cluster.len());
            if to != idx {
                cluster.initiate_sync(idx, to);
            }
            cluster.process_one().unwrap();
        }
    }

    cluster.run_until_converged().unwrap();
    assert!(cluster.is_converged());
}

#[test]
fn test_messages_survive_json_transport() {
    let clock = ManualClock::new(1000.0);
    let mut a: Replica<String> =
        Replica::new(ReplicaId::new("a").unwrap()).with_clock(clock.clone());
    let mut b: Replica<String> = Replica::new(ReplicaId::new("b").unwrap()).with_clock(clock);
    a.write_local("greeting", "hello".to_string());

    let mut pending = vec![cvv_sync::offer(&b, a.id())];
    while let Some(msg) = pending.pop() {
        let text = serde_json::to_string(&msg).unwrap();
        let received: SyncMessage<String> = serde_json::from_str(&text).unwrap();
        assert_eq!(received, msg);

        let target = if received.to() == a.id() { &mut a } else { &mut b };
        pending.extend(cvv_sync::respond(target, received).unwrap());
    }

    assert_eq!(b.read("greeting"), Some(&"hello".to_string()));
    assert_eq!(sync_pair(&mut a, &mut b).unwrap(), 0);
}

proptest! {
    #[test]
    fn sync_pair_always_converges(
        writes in prop::collection::vec((any::<bool>(), 0u8..6, any::<u32>(), 0u8..3), 0..30)
    ) {
        let clock_a = ManualClock::new(1.0);
        let clock_b = ManualClock::new(1.0);
        let mut a: Replica<u32> =
            Replica::new(ReplicaId::new("a").unwrap()).with_clock(clock_a.clone());
        let mut b: Replica<u32> =
            Replica::new(ReplicaId::new("b").unwrap()).with_clock(clock_b.clone());

        for (on_a, key, value, tick) in writes {
            let key = format!("k{}", key);
            if on_a {
                clock_a.advance(tick as f64);
                a.write_local(key, value);
            } else {
                clock_b.advance(tick as f64);
                b.write_local(key, value);
            }
        }

        let rounds = sync_pair(&mut a, &mut b).unwrap();
        prop_assert!(rounds <= 1);
        prop_assert_eq!(a.store(), b.store());
        prop_assert_eq!(a.knowledge(), b.knowledge());
    }
}
