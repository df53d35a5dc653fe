use std::{path::PathBuf, sync::Arc};

use tracing::{debug, trace};

use tgen_common::{params::broadcast, scale_time, NodeId, PacketId, Tick};
use tgen_trace::{TraceCache, TraceRecord};

use crate::{ConfigError, Result, Workload};

/// Per-node replay bounds of a trace workload.
///
/// Each list is indexed by node. An empty list takes the default (unlimited, no skip,
/// scale 1) and a short list repeats its last value for the remaining nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceLimits {
    /// Maximum number of records a node consumes. Negative means unlimited.
    pub limits: Vec<i64>,
    /// Number of leading records that only advance logical time.
    pub skips: Vec<i64>,
    /// Logical time to tick conversion, see [`scale_time`].
    pub scales: Vec<i64>,
}

impl TraceLimits {
    /// Fills in defaults and extends every list to `nodes` entries.
    pub fn broadcast(mut self, nodes: usize) -> Self {
        for (list, default) in
            [(&mut self.limits, -1), (&mut self.skips, 0), (&mut self.scales, 1)]
        {
            if list.is_empty() {
                list.push(default);
            }
            broadcast(list, nodes);
        }
        self
    }
}

/// The next packet of a node. Only meaningful while the node is in `ready` or `waiting`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TraceOffer {
    /// Unscaled trace time.
    logical: Tick,
    dest: NodeId,
    size: u32,
}

/// A node's position in its trace.
#[derive(Debug)]
struct NodeTrace {
    records: Arc<[TraceRecord]>,
    consumed: usize,
    limit: Option<usize>,
    skip: usize,
    scale: i64,
}

impl NodeTrace {
    /// Returns the records the node may consume.
    fn window(&self) -> &[TraceRecord] {
        let end = self.limit.map_or(self.records.len(), |limit| limit.min(self.records.len()));
        &self.records[..end]
    }

    /// Walks forward from `logical` to the next record that offers a packet from `node`.
    /// Every consumed record adds its delay, including skipped and foreign ones.
    fn next_offer(&mut self, node: NodeId, mut logical: Tick, sizes: &[u32]) -> Option<TraceOffer> {
        while self.consumed < self.window().len() {
            let record = self.records[self.consumed];
            self.consumed += 1;
            logical += record.delay;

            if self.consumed > self.skip && record.offers_from(node) {
                // Destinations and packet types inside the window were validated on construction.
                return Some(TraceOffer {
                    logical,
                    dest: record.dest as NodeId,
                    size: sizes[record.kind as usize],
                });
            }
        }
        None
    }
}

/// A workload replaying recorded packet traces, one trace stream per node.
///
/// Every node with a remaining packet has exactly one offer, held in `offers[node]`, and
/// appears in either `ready` (offer time has passed) or `waiting`. Within a cycle `ready`
/// is walked once from the front by `head`. Deferred entries stay put and are revisited
/// in the next cycle.
#[derive(Debug)]
pub struct TraceWorkload {
    nodes: usize,
    time: Tick,
    packet_sizes: Vec<u32>,
    traces: Vec<NodeTrace>,
    offers: Vec<TraceOffer>,
    ready: Vec<NodeId>,
    waiting: Vec<NodeId>,
    /// Position of the current offer in `ready`.
    head: usize,
}

impl TraceWorkload {
    /// Creates a reset workload with one trace per node.
    ///
    /// Record types index `packet_sizes`.
    pub fn new(
        traces: Vec<Arc<[TraceRecord]>>,
        packet_sizes: Vec<u32>,
        limits: TraceLimits,
    ) -> Result<Self> {
        let nodes = traces.len();
        if nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if packet_sizes.is_empty() {
            return Err(ConfigError::NoPacketSizes);
        }
        if packet_sizes.contains(&0) {
            return Err(ConfigError::InvalidPacketSize(0));
        }

        let limits = limits.broadcast(nodes);
        let traces: Vec<NodeTrace> = traces
            .into_iter()
            .enumerate()
            .map(|(node, records)| NodeTrace {
                records,
                consumed: 0,
                limit: usize::try_from(limits.limits[node]).ok(),
                skip: usize::try_from(limits.skips[node]).unwrap_or(0),
                scale: limits.scales[node],
            })
            .collect();

        // Only records past the skip prefix can become offers.
        for (node, trace) in traces.iter().enumerate() {
            let offerable = trace.window().iter().skip(trace.skip);
            for record in offerable.filter(|record| record.offers_from(node)) {
                if record.kind as usize >= packet_sizes.len() {
                    return Err(ConfigError::UnknownPacketType { node, kind: record.kind });
                }
                if usize::try_from(record.dest).map_or(true, |dest| dest >= nodes) {
                    return Err(ConfigError::DestOutOfRange { node, dest: record.dest });
                }
            }
        }

        let mut workload = Self {
            nodes,
            time: 0,
            packet_sizes,
            traces,
            offers: vec![TraceOffer::default(); nodes],
            ready: Vec::with_capacity(nodes),
            waiting: Vec::with_capacity(nodes),
            head: 0,
        };
        workload.reset();
        Ok(workload)
    }

    /// Loads one trace file per node. A short `files` list repeats its last file; files
    /// shared by several nodes are decoded once.
    pub fn from_files(
        files: &[PathBuf],
        nodes: usize,
        packet_sizes: Vec<u32>,
        limits: TraceLimits,
    ) -> Result<Self> {
        if nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        let mut files = files.to_vec();
        if files.is_empty() {
            return Err(ConfigError::NoTraceFiles);
        }
        broadcast(&mut files, nodes);

        let mut cache = TraceCache::new();
        let traces = files
            .into_iter()
            .map(|path| {
                cache.get_or_load(&path).map_err(|source| ConfigError::Trace { path, source })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(nodes, files = cache.len(), "loaded trace files");

        Self::new(traces, packet_sizes, limits)
    }

    /// Returns the number of nodes.
    pub fn nodes(&self) -> usize {
        self.nodes
    }

    /// Returns the tick of `node`'s current offer.
    fn offer_tick(&self, node: NodeId) -> Tick {
        scale_time(self.offers[node].logical, self.traces[node].scale)
    }

    /// Returns the node under the cursor.
    ///
    /// # Panics
    /// Panics if the cursor is past the end of the ready list.
    fn head(&self) -> NodeId {
        match self.ready.get(self.head) {
            Some(&node) => node,
            None => panic!("queried an empty trace workload at tick {}", self.time),
        }
    }
}

impl Workload for TraceWorkload {
    fn reset(&mut self) {
        self.time = 0;
        self.ready.clear();
        self.waiting.clear();
        self.head = 0;

        for node in 0..self.nodes {
            let trace = &mut self.traces[node];
            trace.consumed = 0;
            let Some(offer) = trace.next_offer(node, 0, &self.packet_sizes) else {
                continue;
            };

            self.offers[node] = offer;
            if self.offer_tick(node) > 0 {
                self.waiting.push(node);
            } else {
                self.ready.push(node);
            }
        }

        debug!(
            nodes = self.nodes,
            ready = self.ready.len(),
            waiting = self.waiting.len(),
            "reset trace workload"
        );
    }

    fn advance_time(&mut self) {
        assert!(
            self.head >= self.ready.len(),
            "advance_time called with {} unvisited offers at tick {}",
            self.ready.len() - self.head,
            self.time
        );
        self.time += 1;

        let waiting = std::mem::take(&mut self.waiting);
        for node in waiting {
            if self.offer_tick(node) <= self.time {
                self.ready.push(node);
            } else {
                self.waiting.push(node);
            }
        }
        self.head = 0;

        trace!(time = self.time, ready = self.ready.len(), waiting = self.waiting.len(), "advanced");
    }

    fn now(&self) -> Tick {
        self.time
    }

    fn is_empty(&self) -> bool {
        self.head >= self.ready.len()
    }

    fn is_completed(&self) -> bool {
        self.ready.is_empty() && self.waiting.is_empty()
    }

    fn source(&self) -> NodeId {
        self.head()
    }

    fn dest(&mut self) -> NodeId {
        self.offers[self.head()].dest
    }

    fn size(&mut self) -> u32 {
        self.offers[self.head()].size
    }

    fn time(&self) -> Tick {
        self.offer_tick(self.head())
    }

    fn inject(&mut self, pid: PacketId) {
        let node = self.head();
        let logical = self.offers[node].logical;

        match self.traces[node].next_offer(node, logical, &self.packet_sizes) {
            None => {
                self.ready.remove(self.head);
                trace!(pid, node, "trace exhausted");
            }
            Some(offer) => {
                self.offers[node] = offer;
                if self.offer_tick(node) > self.time {
                    self.ready.remove(self.head);
                    self.waiting.push(node);
                } else {
                    self.head += 1;
                }
                trace!(pid, node, next = offer.logical, "injected");
            }
        }
    }

    fn defer(&mut self) {
        self.head();
        self.head += 1;
    }
}
