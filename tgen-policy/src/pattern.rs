use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use tgen_common::NodeId;

use crate::{PolicyError, Result, TrafficPattern};

/// Returns the address width of a power-of-two node count.
fn address_bits(pattern: &'static str, nodes: usize) -> Result<u32> {
    if nodes.is_power_of_two() {
        Ok(nodes.trailing_zeros())
    } else {
        Err(PolicyError::NotPowerOfTwo { pattern, nodes })
    }
}

/// Resolves the radix `k` and dimension count `n` of a `k`-ary `n`-cube with `nodes`
/// nodes. Missing values are derived; with neither given the network is a single ring.
fn torus_dims(nodes: usize, k: Option<usize>, n: Option<usize>) -> Result<(usize, usize)> {
    let (k, n) = match (k, n) {
        (Some(k), Some(n)) => (k, n),
        (Some(k), None) => {
            let mut n = 0;
            let mut covered = 1usize;
            while covered < nodes && k > 1 {
                covered = covered.saturating_mul(k);
                n += 1;
            }
            (k, n)
        }
        (None, Some(n)) => {
            let k = (1..=nodes).find(|k| k.checked_pow(n as u32).map_or(true, |c| c >= nodes));
            (k.unwrap_or(nodes), n)
        }
        (None, None) => (nodes, 1),
    };

    match k.checked_pow(n as u32) {
        Some(covered) if covered == nodes && k > 0 => Ok((k, n)),
        _ => Err(PolicyError::InvalidDimensions { k, n, nodes }),
    }
}

/// Every destination, including the source itself, is equally likely.
#[derive(Debug)]
pub struct Uniform {
    nodes: usize,
    seed: u64,
    rng: StdRng,
}

impl Uniform {
    pub fn new(nodes: usize, seed: u64) -> Self {
        Self { nodes, seed, rng: StdRng::seed_from_u64(seed) }
    }
}

impl TrafficPattern for Uniform {
    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn dest(&mut self, _source: NodeId) -> NodeId {
        self.rng.gen_range(0..self.nodes)
    }
}

/// A fixed random permutation, redrawn on every reset.
#[derive(Debug)]
pub struct RandPerm {
    seed: u64,
    perm: Vec<NodeId>,
}

impl RandPerm {
    pub fn new(nodes: usize, seed: u64) -> Self {
        let mut pattern = Self { seed, perm: (0..nodes).collect() };
        pattern.reset();
        pattern
    }
}

impl TrafficPattern for RandPerm {
    fn reset(&mut self) {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.perm.sort_unstable();
        self.perm.shuffle(&mut rng);
    }

    fn dest(&mut self, source: NodeId) -> NodeId {
        self.perm[source]
    }
}

/// Destination is the bitwise complement of the source address.
#[derive(Debug)]
pub struct BitComp {
    mask: usize,
}

impl BitComp {
    pub fn new(nodes: usize) -> Result<Self> {
        address_bits("bitcomp", nodes)?;
        Ok(Self { mask: nodes - 1 })
    }
}

impl TrafficPattern for BitComp {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        !source & self.mask
    }
}

/// Destination is the source address with its bits reversed.
#[derive(Debug)]
pub struct BitRev {
    bits: u32,
}

impl BitRev {
    pub fn new(nodes: usize) -> Result<Self> {
        Ok(Self { bits: address_bits("bitrev", nodes)? })
    }
}

impl TrafficPattern for BitRev {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        (0..self.bits).fold(0, |dest, bit| (dest << 1) | ((source >> bit) & 1))
    }
}

/// Destination is the source address rotated left by one bit (perfect shuffle).
#[derive(Debug)]
pub struct Shuffle {
    bits: u32,
}

impl Shuffle {
    pub fn new(nodes: usize) -> Result<Self> {
        Ok(Self { bits: address_bits("shuffle", nodes)? })
    }
}

impl TrafficPattern for Shuffle {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        if self.bits == 0 {
            return 0;
        }
        let mask = (1 << self.bits) - 1;
        ((source << 1) & mask) | (source >> (self.bits - 1))
    }
}

/// Destination swaps the upper and lower halves of the source address.
#[derive(Debug)]
pub struct Transpose {
    shift: u32,
}

impl Transpose {
    pub fn new(nodes: usize) -> Result<Self> {
        let bits = address_bits("transpose", nodes)?;
        if bits % 2 != 0 {
            return Err(PolicyError::OddBitCount { nodes });
        }
        Ok(Self { shift: bits / 2 })
    }
}

impl TrafficPattern for Transpose {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        let half = (1 << self.shift) - 1;
        ((source >> self.shift) & half) | ((source & half) << self.shift)
    }
}

/// Applies `step` to every radix-`k` digit of `source`.
fn map_digits(source: NodeId, k: usize, n: usize, step: usize) -> NodeId {
    let mut offset = 1;
    let mut dest = 0;
    for _ in 0..n {
        let digit = (source / offset) % k;
        dest += offset * ((digit + step) % k);
        offset *= k;
    }
    dest
}

/// Each node sends to its next neighbor in every dimension of a `k`-ary `n`-cube.
#[derive(Debug)]
pub struct Neighbor {
    k: usize,
    n: usize,
}

impl Neighbor {
    pub fn new(nodes: usize, k: Option<usize>, n: Option<usize>) -> Result<Self> {
        let (k, n) = torus_dims(nodes, k, n)?;
        Ok(Self { k, n })
    }
}

impl TrafficPattern for Neighbor {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        map_digits(source, self.k, self.n, 1)
    }
}

/// Each node sends just under halfway around every ring of a `k`-ary `n`-cube.
#[derive(Debug)]
pub struct Tornado {
    k: usize,
    n: usize,
}

impl Tornado {
    pub fn new(nodes: usize, k: Option<usize>, n: Option<usize>) -> Result<Self> {
        let (k, n) = torus_dims(nodes, k, n)?;
        Ok(Self { k, n })
    }
}

impl TrafficPattern for Tornado {
    fn reset(&mut self) {}

    fn dest(&mut self, source: NodeId) -> NodeId {
        let step = ((self.k + 1) / 2).saturating_sub(1);
        map_digits(source, self.k, self.n, step)
    }
}
