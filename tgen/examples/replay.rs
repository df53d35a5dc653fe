//! Drives a workload described on the command line and reports what it offered.
//!
//! ```text
//! cargo run --example replay -- "synthetic(0.2,transpose,on_off,{1,8},{3,1})" 64 1000
//! cargo run --example replay -- "trace(app.trace,{4,16},{},{},{-2})" 16 100000
//! ```

use std::env;

use tgen::{build_workload, Workload, WorkloadOptions};

fn main() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut args = env::args().skip(1);
    let spec = args.next().unwrap_or_else(|| "synthetic(0.1,uniform)".to_string());
    let nodes: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(16);
    let cycles: i64 = args.next().and_then(|n| n.parse().ok()).unwrap_or(1_000);

    let mut workload = match build_workload(&spec, nodes, &WorkloadOptions::default()) {
        Ok(workload) => workload,
        Err(e) => {
            tracing::error!(spec = %spec, "invalid workload: {e}");
            std::process::exit(1);
        }
    };

    // Accept at most one packet per destination per cycle, like a single ejection port.
    let mut pid = 0;
    let mut flits = 0u64;
    let mut latency = 0i64;
    while workload.now() < cycles && !workload.is_completed() {
        let mut busy = vec![false; nodes];
        while let Some(offer) = workload.offer() {
            if busy[offer.dest] {
                workload.defer();
                continue;
            }
            busy[offer.dest] = true;
            flits += u64::from(offer.size);
            latency += workload.now() - offer.time;
            workload.inject(pid);
            pid += 1;
        }
        workload.advance_time();
    }

    let cycles = workload.now().max(1);
    tracing::info!(
        cycles,
        packets = pid,
        flits,
        accepted = flits as f64 / (cycles as f64 * nodes as f64),
        mean_wait = latency as f64 / pid.max(1) as f64,
        completed = workload.is_completed(),
        "done"
    );
}
