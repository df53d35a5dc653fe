use std::fmt;

pub mod params;

/// Index of a node in the simulated network, in `[0, nodes)`.
pub type NodeId = usize;

/// One discrete simulated time step. Trace logical time uses the same representation.
pub type Tick = i64;

/// Identifier the simulation driver assigns to a packet when it accepts an offer.
pub type PacketId = u64;

/// A candidate packet presented by a workload, not yet admitted to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketOffer {
    /// The tick at which the packet became available.
    pub time: Tick,
    pub source: NodeId,
    pub dest: NodeId,
    /// Packet size in flits. Always positive.
    pub size: u32,
}

impl PacketOffer {
    #[inline]
    pub fn new(time: Tick, source: NodeId, dest: NodeId, size: u32) -> Self {
        Self { time, source, dest, size }
    }
}

impl fmt::Display for PacketOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({} flits @ {})", self.source, self.dest, self.size, self.time)
    }
}

/// Converts a logical trace time into a simulated tick.
///
/// A positive `scale` divides (rounding down), a non-positive one multiplies by its
/// magnitude: `scale_time(10, 2) == 5`, `scale_time(10, -3) == 30`, and a scale of zero
/// collapses every time onto tick 0. Products beyond the tick range saturate.
#[inline]
pub fn scale_time(logical: Tick, scale: i64) -> Tick {
    if scale > 0 {
        logical.div_euclid(scale)
    } else {
        logical.saturating_mul(scale.saturating_neg())
    }
}
