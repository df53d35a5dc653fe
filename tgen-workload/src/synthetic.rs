use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, trace};

use tgen_common::{NodeId, PacketId, Tick};
use tgen_policy::{InjectionProcess, TrafficPattern};

use crate::{ConfigError, Result, Workload};

/// Offset applied to the seed of the packet size stream.
const SIZE_STREAM: u64 = 0x5eed_0003;

/// A workload driven by an injection process and a traffic pattern.
///
/// Every node lives in exactly one of three queues:
/// - `ready`: tested against the injection process on every tick it has not seen yet,
/// - `pending`: has an offer waiting to be queried,
/// - `deferred`: its offer was declined this cycle and returns to `pending` next cycle.
///
/// Offers are not stored. The source and time come from the queue and the node's queue
/// time, while destination and size are drawn when queried.
#[derive(Debug)]
pub struct SyntheticWorkload<I = Box<dyn InjectionProcess>, P = Box<dyn TrafficPattern>> {
    nodes: usize,
    time: Tick,
    injection: I,
    traffic: P,
    sizes: Vec<u32>,
    /// Relative weight of each entry of `sizes`.
    rates: Vec<u32>,
    total_rate: u64,
    seed: u64,
    rng: StdRng,
    /// Last tick at which each node was tested.
    qtime: Vec<Tick>,
    ready: VecDeque<NodeId>,
    pending: VecDeque<NodeId>,
    deferred: VecDeque<NodeId>,
}

impl<I: InjectionProcess, P: TrafficPattern> SyntheticWorkload<I, P> {
    /// Creates a reset workload over `nodes` nodes.
    ///
    /// `rates` weighs `sizes` one to one. With a single size the weights are ignored;
    /// otherwise they must not all be zero.
    pub fn new(
        nodes: usize,
        injection: I,
        traffic: P,
        sizes: Vec<u32>,
        rates: Vec<u32>,
        seed: u64,
    ) -> Result<Self> {
        if nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if sizes.is_empty() {
            return Err(ConfigError::NoPacketSizes);
        }
        if sizes.contains(&0) {
            return Err(ConfigError::InvalidPacketSize(0));
        }
        if rates.len() != sizes.len() {
            return Err(ConfigError::RateCountMismatch { expected: sizes.len(), got: rates.len() });
        }
        let total_rate = rates.iter().map(|&rate| u64::from(rate)).sum();
        if sizes.len() > 1 && total_rate == 0 {
            return Err(ConfigError::ZeroTotalRate);
        }

        let seed = seed.wrapping_add(SIZE_STREAM);
        let mut workload = Self {
            nodes,
            time: 0,
            injection,
            traffic,
            sizes,
            rates,
            total_rate,
            seed,
            rng: StdRng::seed_from_u64(seed),
            qtime: vec![0; nodes],
            ready: VecDeque::with_capacity(nodes),
            pending: VecDeque::with_capacity(nodes),
            deferred: VecDeque::with_capacity(nodes),
        };
        workload.reset();
        Ok(workload)
    }

    /// Returns the number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Returns the last tick at which `node` was tested against the injection process.
    pub fn queue_time(&self, node: NodeId) -> Tick {
        self.qtime[node]
    }

    /// Returns the node at the front of the pending queue.
    ///
    /// # Panics
    /// Panics if there is no pending node.
    fn head(&self) -> NodeId {
        match self.pending.front() {
            Some(&node) => node,
            None => panic!("queried an empty synthetic workload at tick {}", self.time),
        }
    }
}

impl<I: InjectionProcess, P: TrafficPattern> Workload for SyntheticWorkload<I, P> {
    fn reset(&mut self) {
        self.time = 0;
        self.qtime.fill(0);
        self.injection.reset();
        self.traffic.reset();
        self.rng = StdRng::seed_from_u64(self.seed);

        self.ready.clear();
        self.pending.clear();
        self.deferred.clear();
        for source in 0..self.nodes {
            if self.injection.test(source) {
                self.pending.push_back(source);
            } else {
                self.ready.push_back(source);
            }
        }

        debug!(
            nodes = self.nodes,
            pending = self.pending.len(),
            "reset synthetic workload"
        );
    }

    fn advance_time(&mut self) {
        self.time += 1;

        let retried = self.deferred.len();
        self.pending.extend(self.deferred.drain(..));

        // Every ready node replays each tick it has not seen, stopping at the first hit.
        let mut generated = 0;
        for _ in 0..self.ready.len() {
            let Some(source) = self.ready.pop_front() else { break };
            let mut fired = false;
            while self.qtime[source] < self.time {
                self.qtime[source] += 1;
                if self.injection.test(source) {
                    fired = true;
                    break;
                }
            }

            if fired {
                self.pending.push_back(source);
                generated += 1;
            } else {
                self.ready.push_back(source);
            }
        }

        trace!(time = self.time, retried, generated, pending = self.pending.len(), "advanced");
    }

    fn now(&self) -> Tick {
        self.time
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Synthetic traffic never runs out.
    fn is_completed(&self) -> bool {
        false
    }

    fn source(&self) -> NodeId {
        self.head()
    }

    fn dest(&mut self) -> NodeId {
        let source = self.head();
        let dest = self.traffic.dest(source);
        assert!(dest < self.nodes, "traffic pattern sent {source} to out of range node {dest}");
        dest
    }

    fn size(&mut self) -> u32 {
        self.head();
        if self.sizes.len() == 1 {
            return self.sizes[0];
        }

        let mut draw = self.rng.gen_range(0..self.total_rate);
        let last = self.sizes.len() - 1;
        for (&size, &rate) in self.sizes[..last].iter().zip(&self.rates) {
            let rate = u64::from(rate);
            if rate > draw {
                return size;
            }
            draw -= rate;
        }

        // The draw range is exactly the rate sum, so the last bucket covers what is left.
        assert!(u64::from(self.rates[last]) > draw);
        self.sizes[last]
    }

    fn time(&self) -> Tick {
        self.qtime[self.head()]
    }

    fn inject(&mut self, pid: PacketId) {
        let source = self.head();
        self.pending.pop_front();
        self.ready.push_back(source);
        trace!(pid, source, time = self.time, "injected");
    }

    fn defer(&mut self) {
        let source = self.head();
        self.pending.pop_front();
        self.deferred.push_back(source);
    }
}
