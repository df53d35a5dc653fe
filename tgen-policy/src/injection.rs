use rand::{rngs::StdRng, Rng, SeedableRng};

use tgen_common::NodeId;

use crate::{InjectionProcess, PolicyError, Result};

fn check_probability(name: &'static str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PolicyError::InvalidProbability { name, value })
    }
}

/// Every node independently generates a packet with probability `rate` at each tick.
#[derive(Debug)]
pub struct Bernoulli {
    rate: f64,
    seed: u64,
    rng: StdRng,
}

impl Bernoulli {
    pub fn new(rate: f64, seed: u64) -> Result<Self> {
        let rate = check_probability("load", rate)?;
        Ok(Self { rate, seed, rng: StdRng::seed_from_u64(seed) })
    }
}

impl InjectionProcess for Bernoulli {
    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn test(&mut self, _source: NodeId) -> bool {
        self.rng.gen_bool(self.rate)
    }
}

/// Markov-modulated bursty injection.
///
/// Each node alternates between an off state, which never injects, and an on state, which
/// injects with probability `r1`. An off node turns on with probability `alpha` per tick
/// and an on node turns off with probability `beta`, giving a long-run on fraction of
/// `alpha / (alpha + beta)`.
#[derive(Debug)]
pub struct OnOff {
    alpha: f64,
    beta: f64,
    r1: f64,
    seed: u64,
    rng: StdRng,
    on: Vec<bool>,
}

impl OnOff {
    /// Creates the process for `nodes` nodes. A negative `r1` is derived so that the
    /// long-run rate equals `load`.
    pub fn new(nodes: usize, load: f64, alpha: f64, beta: f64, r1: f64, seed: u64) -> Result<Self> {
        let load = check_probability("load", load)?;
        let alpha = check_probability("burst_alpha", alpha)?;
        let beta = check_probability("burst_beta", beta)?;
        if alpha == 0.0 {
            // Nodes could never turn on.
            return Err(PolicyError::InvalidProbability { name: "burst_alpha", value: alpha });
        }
        let r1 = if r1 < 0.0 { load * (alpha + beta) / alpha } else { r1 };
        let r1 = check_probability("burst_r1", r1)?;

        let mut process =
            Self { alpha, beta, r1, seed, rng: StdRng::seed_from_u64(seed), on: vec![false; nodes] };
        process.reset();
        Ok(process)
    }

    /// Returns the injection rate used while a node is on.
    pub fn on_rate(&self) -> f64 {
        self.r1
    }
}

impl InjectionProcess for OnOff {
    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        let p_on = self.alpha / (self.alpha + self.beta);
        for state in self.on.iter_mut() {
            *state = self.rng.gen_bool(p_on);
        }
    }

    fn test(&mut self, source: NodeId) -> bool {
        let on = if self.on[source] { !self.rng.gen_bool(self.beta) } else { self.rng.gen_bool(self.alpha) };
        self.on[source] = on;
        on && self.rng.gen_bool(self.r1)
    }
}
