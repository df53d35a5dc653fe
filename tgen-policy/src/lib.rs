//! Policy collaborators consulted by synthetic workloads.
//!
//! An [`InjectionProcess`] decides, once per node and tick, whether a new packet is
//! generated. A [`TrafficPattern`] maps a source node to a destination. Both are selected
//! by name through [`injection_process`] and [`traffic_pattern`].

use std::fmt::Debug;

use thiserror::Error;

use tgen_common::NodeId;

mod injection;
pub use injection::*;

mod pattern;
pub use pattern::*;

/// Seeds are offset per component so that the injection process and the traffic pattern
/// built from the same options draw from different streams.
const INJECTION_STREAM: u64 = 0x5eed_0001;
const PATTERN_STREAM: u64 = 0x5eed_0002;

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Unknown injection process: {0}")]
    UnknownInjection(String),
    #[error("Unknown traffic pattern: {0}")]
    UnknownPattern(String),
    #[error("Invalid probability for {name}: {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("Traffic pattern {pattern} requires a power-of-two node count, got {nodes}")]
    NotPowerOfTwo { pattern: &'static str, nodes: usize },
    #[error("Traffic pattern transpose requires an even number of address bits, got {nodes} nodes")]
    OddBitCount { nodes: usize },
    #[error("Torus dimensions k={k}, n={n} do not cover {nodes} nodes")]
    InvalidDimensions { k: usize, n: usize, nodes: usize },
    #[error("A policy needs at least one node")]
    NoNodes,
}

pub type Result<T> = std::result::Result<T, PolicyError>;

/// Decides, per node and per tick, whether a new packet is generated.
///
/// Callers must consult the process exactly once per (node, tick) pair, in chronological
/// order; stateful processes rely on that.
pub trait InjectionProcess: Debug {
    /// Restores the initial state, including the random stream.
    fn reset(&mut self);

    /// Advances `source` by one tick and returns whether it generates a packet.
    fn test(&mut self, source: NodeId) -> bool;
}

/// Maps a source node to a destination node.
pub trait TrafficPattern: Debug {
    /// Restores the initial state, including the random stream.
    fn reset(&mut self);

    /// Returns the destination for a packet sent by `source`.
    fn dest(&mut self, source: NodeId) -> NodeId;
}

impl<T: InjectionProcess + ?Sized> InjectionProcess for Box<T> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn test(&mut self, source: NodeId) -> bool {
        (**self).test(source)
    }
}

impl<T: TrafficPattern + ?Sized> TrafficPattern for Box<T> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn dest(&mut self, source: NodeId) -> NodeId {
        (**self).dest(source)
    }
}

#[derive(Debug, Clone)]
pub struct PolicyOptions {
    /// Seed for every random stream owned by a policy.
    pub seed: u64,
    /// Probability that an `on_off` node in the off state turns on at a tick.
    pub burst_alpha: f64,
    /// Probability that an `on_off` node in the on state turns off at a tick.
    pub burst_beta: f64,
    /// Injection rate while on. Negative means derive it from the offered load.
    pub burst_r1: f64,
    /// Torus radix for `neighbor` and `tornado`.
    pub k: Option<usize>,
    /// Torus dimension count for `neighbor` and `tornado`.
    pub n: Option<usize>,
}

impl Default for PolicyOptions {
    fn default() -> Self {
        Self { seed: 0, burst_alpha: 0.5, burst_beta: 0.5, burst_r1: -1.0, k: None, n: None }
    }
}

impl PolicyOptions {
    /// Sets the seed of the random streams.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the off-to-on transition probability of the `on_off` process.
    pub fn burst_alpha(mut self, alpha: f64) -> Self {
        self.burst_alpha = alpha;
        self
    }

    /// Sets the on-to-off transition probability of the `on_off` process.
    pub fn burst_beta(mut self, beta: f64) -> Self {
        self.burst_beta = beta;
        self
    }

    /// Sets the on-state injection rate of the `on_off` process. A negative rate is derived
    /// from the offered load.
    pub fn burst_r1(mut self, r1: f64) -> Self {
        self.burst_r1 = r1;
        self
    }

    /// Sets the torus shape used by `neighbor` and `tornado`. Either value may be left
    /// unset and is derived from the node count.
    pub fn torus(mut self, k: Option<usize>, n: Option<usize>) -> Self {
        self.k = k;
        self.n = n;
        self
    }
}

/// Builds the injection process registered under `name`.
pub fn injection_process(
    name: &str,
    nodes: usize,
    load: f64,
    options: &PolicyOptions,
) -> Result<Box<dyn InjectionProcess>> {
    if nodes == 0 {
        return Err(PolicyError::NoNodes);
    }

    let seed = options.seed.wrapping_add(INJECTION_STREAM);
    tracing::debug!(name, nodes, load, "building injection process");

    match name {
        "bernoulli" => Ok(Box::new(Bernoulli::new(load, seed)?)),
        "on_off" => Ok(Box::new(OnOff::new(
            nodes,
            load,
            options.burst_alpha,
            options.burst_beta,
            options.burst_r1,
            seed,
        )?)),
        _ => Err(PolicyError::UnknownInjection(name.to_string())),
    }
}

/// Builds the traffic pattern registered under `name`.
pub fn traffic_pattern(
    name: &str,
    nodes: usize,
    options: &PolicyOptions,
) -> Result<Box<dyn TrafficPattern>> {
    if nodes == 0 {
        return Err(PolicyError::NoNodes);
    }

    let seed = options.seed.wrapping_add(PATTERN_STREAM);
    tracing::debug!(name, nodes, "building traffic pattern");

    match name {
        "uniform" => Ok(Box::new(Uniform::new(nodes, seed))),
        "randperm" => Ok(Box::new(RandPerm::new(nodes, seed))),
        "bitcomp" => Ok(Box::new(BitComp::new(nodes)?)),
        "bitrev" => Ok(Box::new(BitRev::new(nodes)?)),
        "shuffle" => Ok(Box::new(Shuffle::new(nodes)?)),
        "transpose" => Ok(Box::new(Transpose::new(nodes)?)),
        "neighbor" => Ok(Box::new(Neighbor::new(nodes, options.k, options.n)?)),
        "tornado" => Ok(Box::new(Tornado::new(nodes, options.k, options.n)?)),
        _ => Err(PolicyError::UnknownPattern(name.to_string())),
    }
}
