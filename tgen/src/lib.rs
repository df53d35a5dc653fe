#![doc(issue_tracker_base_url = "https://github.com/tgen-rs/tgen/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub use tgen_common::{params, scale_time, NodeId, PacketId, PacketOffer, Tick};
pub use tgen_policy::{self as policy, InjectionProcess, PolicyError, PolicyOptions, TrafficPattern};
pub use tgen_trace::{self as trace, TraceRecord};
pub use tgen_workload::*;
