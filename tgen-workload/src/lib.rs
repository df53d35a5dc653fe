//! Packet offer workloads.
//!
//! A [`Workload`] answers, once per simulated cycle, which nodes have a packet to offer and
//! what those packets look like. The driver protocol is:
//!
//! 1. [`Workload::reset`] once (construction already performs one). The workload is now at
//!    tick 0 and its tick 0 offers are already visible.
//! 2. Every cycle, while [`Workload::is_empty`] is `false`, query the head offer and either
//!    [`Workload::inject`] or [`Workload::defer`] it.
//! 3. End the cycle with [`Workload::advance_time`].
//!
//! Querying an empty workload, or advancing time while offers of the current cycle are still
//! unvisited, is a protocol violation and panics.

use std::{fmt::Debug, path::PathBuf};

use thiserror::Error;

use tgen_common::params::ParamError;
pub use tgen_common::{NodeId, PacketId, PacketOffer, Tick};
use tgen_policy::{PolicyError, PolicyOptions};

mod null;
pub use null::NullWorkload;

mod synthetic;
pub use synthetic::SyntheticWorkload;

mod trace;
pub use trace::{TraceLimits, TraceWorkload};

mod spec;
pub use spec::{build_workload, WorkloadSpec};

/// The default injection process used when a synthetic workload names none.
const DEFAULT_INJECTION_PROCESS: &str = "bernoulli";

/// The default packet size, in flits, used when a synthetic workload names none.
const DEFAULT_PACKET_SIZE: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing parameter in workload specification: {0}")]
    MissingParameter(String),
    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),
    #[error("Invalid parameter: {0}")]
    Param(#[from] ParamError),
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("Unable to read trace file {path:?}: {source}")]
    Trace {
        path: PathBuf,
        #[source]
        source: tgen_trace::Error,
    },
    #[error("A workload needs at least one node")]
    NoNodes,
    #[error("No trace files configured")]
    NoTraceFiles,
    #[error("No packet sizes configured")]
    NoPacketSizes,
    #[error("Packet size must be positive, got {0}")]
    InvalidPacketSize(i64),
    #[error("Packet size weight must be non-negative, got {0}")]
    InvalidRate(i64),
    #[error("Expected {expected} packet size weights, got {got}")]
    RateCountMismatch { expected: usize, got: usize },
    #[error("Packet size weights sum to zero")]
    ZeroTotalRate,
    #[error("Trace for node {node} references unknown packet type {kind}")]
    UnknownPacketType { node: NodeId, kind: i64 },
    #[error("Trace for node {node} sends to out of range node {dest}")]
    DestOutOfRange { node: NodeId, dest: i64 },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A source of packet offers, advanced one simulated cycle at a time.
pub trait Workload: Debug {
    /// Rewinds the workload to tick 0 and rebuilds every queue from scratch.
    fn reset(&mut self);

    /// Advances the workload by one tick.
    ///
    /// # Panics
    /// Trace workloads panic if offers of the previous cycle were left unvisited.
    fn advance_time(&mut self);

    /// Returns the current tick.
    fn now(&self) -> Tick;

    /// Returns `true` if no offer is available in the current cycle.
    fn is_empty(&self) -> bool;

    /// Returns `true` if the workload will never offer another packet.
    fn is_completed(&self) -> bool;

    /// Source of the head offer.
    fn source(&self) -> NodeId;

    /// Destination of the head offer. May consult a stateful traffic pattern.
    fn dest(&mut self) -> NodeId;

    /// Size of the head offer in flits. May draw from a size distribution.
    fn size(&mut self) -> u32;

    /// Tick at which the head offer became available.
    fn time(&self) -> Tick;

    /// Accepts the head offer as packet `pid` and moves on to the next offer.
    fn inject(&mut self, pid: PacketId);

    /// Declines the head offer; it is offered again in a later cycle.
    fn defer(&mut self);

    /// Returns the head offer, or `None` if the cycle has no more offers.
    fn offer(&mut self) -> Option<PacketOffer> {
        if self.is_empty() {
            return None;
        }
        Some(PacketOffer::new(self.time(), self.source(), self.dest(), self.size()))
    }
}

impl<W: Workload + ?Sized> Workload for Box<W> {
    fn reset(&mut self) {
        (**self).reset()
    }

    fn advance_time(&mut self) {
        (**self).advance_time()
    }

    fn now(&self) -> Tick {
        (**self).now()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn is_completed(&self) -> bool {
        (**self).is_completed()
    }

    fn source(&self) -> NodeId {
        (**self).source()
    }

    fn dest(&mut self) -> NodeId {
        (**self).dest()
    }

    fn size(&mut self) -> u32 {
        (**self).size()
    }

    fn time(&self) -> Tick {
        (**self).time()
    }

    fn inject(&mut self, pid: PacketId) {
        (**self).inject(pid)
    }

    fn defer(&mut self) {
        (**self).defer()
    }
}

/// Defaults and policy settings applied when building workloads from specification strings.
#[derive(Debug, Clone)]
pub struct WorkloadOptions {
    /// Injection process of synthetic workloads that do not name one.
    pub injection_process: String,
    /// Packet size of synthetic workloads that do not list sizes.
    pub packet_size: u32,
    /// Settings handed to injection processes and traffic patterns. Its seed also drives
    /// packet size draws.
    pub policy: PolicyOptions,
}

impl Default for WorkloadOptions {
    fn default() -> Self {
        Self {
            injection_process: DEFAULT_INJECTION_PROCESS.to_string(),
            packet_size: DEFAULT_PACKET_SIZE,
            policy: PolicyOptions::default(),
        }
    }
}

impl WorkloadOptions {
    /// Sets the default injection process.
    pub fn injection_process(mut self, name: impl Into<String>) -> Self {
        self.injection_process = name.into();
        self
    }

    /// Sets the default packet size.
    pub fn packet_size(mut self, size: u32) -> Self {
        self.packet_size = size;
        self
    }

    /// Sets the seed of every random stream.
    pub fn seed(mut self, seed: u64) -> Self {
        self.policy.seed = seed;
        self
    }

    /// Replaces the policy settings.
    pub fn policy(mut self, policy: PolicyOptions) -> Self {
        self.policy = policy;
        self
    }
}

/// Converts configured packet sizes, rejecting non-positive ones.
pub(crate) fn packet_sizes(sizes: &[i64]) -> Result<Vec<u32>> {
    sizes
        .iter()
        .map(|&size| match u32::try_from(size) {
            Ok(s) if s > 0 => Ok(s),
            _ => Err(ConfigError::InvalidPacketSize(size)),
        })
        .collect()
}
