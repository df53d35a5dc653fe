use rand::{rngs::StdRng, Rng, SeedableRng};
use tgen::{
    policy::{Bernoulli, Uniform},
    InjectionProcess, NodeId, SyntheticWorkload, TrafficPattern, Workload,
};

use crate::helpers::drain;

fn bernoulli(nodes: usize, load: f64, seed: u64) -> SyntheticWorkload<Bernoulli, Uniform> {
    let injection = Bernoulli::new(load, seed).unwrap();
    SyntheticWorkload::new(nodes, injection, Uniform::new(nodes, seed), vec![1, 4], vec![1, 1], seed)
        .unwrap()
}

#[test]
fn offered_load_matches_rate() {
    let _ = tracing_subscriber::fmt::try_init();

    let (nodes, cycles) = (16, 2_000);
    let mut workload = bernoulli(nodes, 0.2, 1);
    let offers = drain(&mut workload, cycles);

    let expected = 0.2 * (nodes as f64) * (cycles as f64);
    let observed = offers.len() as f64;
    assert!((observed - expected).abs() < expected * 0.05, "observed {observed}");
    assert!(offers.windows(2).all(|pair| pair[0].time <= pair[1].time));
}

#[test]
fn same_seed_same_offers() {
    let first = drain(&mut bernoulli(8, 0.3, 42), 300);
    let second = drain(&mut bernoulli(8, 0.3, 42), 300);
    assert_eq!(first, second);

    let other = drain(&mut bernoulli(8, 0.3, 43), 300);
    assert_ne!(first, other);
}

#[test]
fn reset_replays_the_same_offers() {
    let mut workload = bernoulli(8, 0.3, 5);
    let first = drain(&mut workload, 200);
    workload.reset();
    assert_eq!(workload.now(), 0);
    assert_eq!(drain(&mut workload, 200), first);
}

/// A pattern recording every source it was asked about.
#[derive(Debug, Default)]
struct Recording {
    asked: Vec<NodeId>,
}

impl TrafficPattern for Recording {
    fn reset(&mut self) {
        self.asked.clear();
    }

    fn dest(&mut self, source: NodeId) -> NodeId {
        self.asked.push(source);
        0
    }
}

/// Counts tests per node; fires on every test of node 0 only.
#[derive(Debug, Default)]
struct CountingNodeZero {
    tests: Vec<usize>,
}

impl InjectionProcess for CountingNodeZero {
    fn reset(&mut self) {
        self.tests = vec![0; 3];
    }

    fn test(&mut self, source: NodeId) -> bool {
        self.tests[source] += 1;
        source == 0
    }
}

#[test]
fn held_offer_keeps_its_time() {
    let mut workload = SyntheticWorkload::new(
        3,
        CountingNodeZero::default(),
        Recording::default(),
        vec![2],
        vec![1],
        0,
    )
    .unwrap();

    // The driver refuses node 0's offer for ten cycles.
    for _ in 0..10 {
        assert_eq!(workload.source(), 0);
        assert_eq!(workload.time(), 0);
        workload.defer();
        assert!(workload.is_empty());
        workload.advance_time();
    }

    let offer = workload.offer().unwrap();
    assert_eq!((offer.time, offer.source, offer.size), (0, 0, 2));
    workload.inject(0);

    // Accepting it replays the ten ticks node 0 missed, firing on the first.
    workload.advance_time();
    assert_eq!(workload.now(), 11);
    assert_eq!(workload.time(), 1);
    assert_eq!(workload.queue_time(0), 1);
}

#[test]
fn random_driving_never_repeats_a_node_within_a_cycle() {
    let nodes = 12;
    let mut workload = bernoulli(nodes, 0.5, 77);
    let mut choice = StdRng::seed_from_u64(78);

    for _ in 0..500 {
        let mut seen = vec![false; nodes];
        while let Some(offer) = workload.offer() {
            assert!(!seen[offer.source], "node {} offered twice at {}", offer.source, workload.now());
            seen[offer.source] = true;
            assert!(offer.time <= workload.now());
            assert!(offer.size == 1 || offer.size == 4);

            if choice.gen_bool(0.5) {
                workload.inject(0);
            } else {
                workload.defer();
            }
        }
        workload.advance_time();
    }
}
