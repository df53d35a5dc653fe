//! Workload specification strings.
//!
//! ```text
//! null()
//! synthetic(load, traffic[, injection[, {sizes}[, {rates}]]])
//! trace({files}, {sizes}[, {limits}[, {skips}[, {scales}]]])
//! ```

use std::path::PathBuf;

use tgen_common::params::{broadcast, parse_float, split_call, tokenize, tokenize_int};

use crate::{
    packet_sizes, ConfigError, NullWorkload, Result, SyntheticWorkload, TraceLimits,
    TraceWorkload, Workload, WorkloadOptions,
};

/// A parsed workload specification with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkloadSpec {
    Null,
    Synthetic {
        load: f64,
        traffic: String,
        injection: String,
        sizes: Vec<u32>,
        /// One weight per entry of `sizes`.
        rates: Vec<u32>,
    },
    Trace {
        /// One file per node.
        files: Vec<PathBuf>,
        packet_sizes: Vec<u32>,
        /// Broadcast to one entry per node.
        limits: TraceLimits,
    },
}

impl WorkloadSpec {
    /// Parses `spec` for a network of `nodes` nodes, filling gaps from `options`.
    pub fn parse(spec: &str, nodes: usize, options: &WorkloadOptions) -> Result<Self> {
        let (name, params) =
            split_call(spec).ok_or_else(|| ConfigError::MissingParameter(spec.to_string()))?;
        let params = tokenize(params);

        match name {
            "null" => Ok(Self::Null),
            "synthetic" => Self::parse_synthetic(spec, &params, options),
            "trace" => Self::parse_trace(spec, &params, nodes),
            _ => Err(ConfigError::UnknownWorkload(name.to_string())),
        }
    }

    fn parse_synthetic(spec: &str, params: &[String], options: &WorkloadOptions) -> Result<Self> {
        if params.len() < 2 {
            return Err(ConfigError::MissingParameter(spec.to_string()));
        }

        let load = parse_float(&params[0])?;
        let traffic = params[1].clone();
        let injection = params.get(2).cloned().unwrap_or_else(|| options.injection_process.clone());
        let sizes = match params.get(3) {
            Some(sizes) => packet_sizes(&tokenize_int(sizes)?)?,
            None => vec![options.packet_size],
        };
        let mut rates = match params.get(4) {
            Some(rates) => tokenize_int(rates)?
                .into_iter()
                .map(|rate| u32::try_from(rate).map_err(|_| ConfigError::InvalidRate(rate)))
                .collect::<Result<Vec<_>>>()?,
            None => vec![1],
        };
        broadcast(&mut rates, sizes.len());

        Ok(Self::Synthetic { load, traffic, injection, sizes, rates })
    }

    fn parse_trace(spec: &str, params: &[String], nodes: usize) -> Result<Self> {
        if params.len() < 2 {
            return Err(ConfigError::MissingParameter(spec.to_string()));
        }

        let mut files: Vec<PathBuf> = tokenize(&params[0]).into_iter().map(PathBuf::from).collect();
        if files.is_empty() {
            return Err(ConfigError::NoTraceFiles);
        }
        broadcast(&mut files, nodes);

        let packet_sizes = packet_sizes(&tokenize_int(&params[1])?)?;
        let list = |index: usize| -> Result<Vec<i64>> {
            Ok(match params.get(index) {
                Some(values) => tokenize_int(values)?,
                None => Vec::new(),
            })
        };
        let limits = TraceLimits { limits: list(2)?, skips: list(3)?, scales: list(4)? }.broadcast(nodes);

        Ok(Self::Trace { files, packet_sizes, limits })
    }

    /// Builds the workload described by this specification.
    pub fn build(self, nodes: usize, options: &WorkloadOptions) -> Result<Box<dyn Workload>> {
        if nodes == 0 {
            return Err(ConfigError::NoNodes);
        }

        match self {
            Self::Null => Ok(Box::new(NullWorkload::new())),
            Self::Synthetic { load, traffic, injection, sizes, rates } => {
                let injection =
                    tgen_policy::injection_process(&injection, nodes, load, &options.policy)?;
                let traffic = tgen_policy::traffic_pattern(&traffic, nodes, &options.policy)?;
                let workload = SyntheticWorkload::new(
                    nodes,
                    injection,
                    traffic,
                    sizes,
                    rates,
                    options.policy.seed,
                )?;
                Ok(Box::new(workload))
            }
            Self::Trace { files, packet_sizes, limits } => {
                Ok(Box::new(TraceWorkload::from_files(&files, nodes, packet_sizes, limits)?))
            }
        }
    }
}

/// Parses `spec` and builds the workload it describes.
pub fn build_workload(
    spec: &str,
    nodes: usize,
    options: &WorkloadOptions,
) -> Result<Box<dyn Workload>> {
    let parsed = WorkloadSpec::parse(spec, nodes, options)?;
    tracing::debug!(spec, nodes, "building workload");
    parsed.build(nodes, options)
}
