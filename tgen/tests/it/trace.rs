use std::path::PathBuf;

use tgen::{TraceLimits, TraceWorkload, Workload};

use crate::helpers::{drain, TempTrace};

fn summary(workload: &mut dyn Workload, cycles: i64) -> Vec<(i64, usize, usize, u32)> {
    drain(workload, cycles)
        .into_iter()
        .map(|offer| (offer.time, offer.source, offer.dest, offer.size))
        .collect()
}

#[test]
fn per_node_files() {
    let _ = tracing_subscriber::fmt::try_init();

    let a = TempTrace::new("node-a", "2 0 1 0\n3 0 2 1\n");
    let b = TempTrace::new("node-b", "1 1 2 1\n1 1 0 0\n");
    // The last file is repeated for node 2, which never appears as a source in it.
    let files: Vec<PathBuf> = vec![a.path().to_path_buf(), b.path().to_path_buf()];

    let mut workload =
        TraceWorkload::from_files(&files, 3, vec![1, 3], TraceLimits::default()).unwrap();
    assert_eq!(workload.nodes(), 3);
    assert_eq!(
        summary(&mut workload, 20),
        vec![(1, 1, 2, 3), (2, 0, 1, 1), (2, 1, 0, 1), (5, 0, 2, 3)]
    );
    assert!(workload.is_completed());
}

#[test]
fn shared_file_with_per_node_bounds() {
    let text = "1 0 1 0\n1 1 0 0\n1 0 1 0\n1 1 0 0\n1 0 1 0\n1 1 0 0\n";
    let file = TempTrace::new("bounds", text);
    let limits = TraceLimits { limits: vec![-1, 4], skips: vec![2, 0], scales: vec![1, 2] };

    let mut workload =
        TraceWorkload::from_files(&[file.path().to_path_buf()], 2, vec![4], limits).unwrap();
    // Node 0 skips its first two records (logical 1 and 2) and keeps 3 and 5.
    // Node 1 reads four records, keeping logical 2 and 4, halved.
    assert_eq!(
        summary(&mut workload, 20),
        vec![(1, 1, 0, 4), (2, 1, 0, 4), (3, 0, 1, 4), (5, 0, 1, 4)]
    );
}

#[test]
fn deferral_does_not_lose_packets() {
    let text = "0 0 1 0\n0 1 0 0\n1 0 1 0\n1 1 0 0\n";
    let file = TempTrace::new("deferral", text);
    let mut workload = TraceWorkload::from_files(
        &[file.path().to_path_buf()],
        2,
        vec![2],
        TraceLimits::default(),
    )
    .unwrap();

    // Decline everything for a few cycles, then accept everything.
    for _ in 0..3 {
        while !workload.is_empty() {
            workload.defer();
        }
        workload.advance_time();
    }
    let offers = summary(&mut workload, 20);
    let mut times: Vec<_> = offers.iter().map(|&(time, source, ..)| (source, time)).collect();
    times.sort_unstable();
    assert_eq!(times, vec![(0, 0), (0, 1), (1, 0), (1, 2)]);
    assert!(workload.is_completed());
}

#[test]
fn reset_replays_the_trace() {
    let file = TempTrace::new("reset", "0 0 1 0\n4 1 0 0\n4 0 1 0\n");
    let mut workload = TraceWorkload::from_files(
        &[file.path().to_path_buf()],
        2,
        vec![1],
        TraceLimits::default(),
    )
    .unwrap();

    let first = summary(&mut workload, 50);
    assert_eq!(first.len(), 3);
    workload.reset();
    assert_eq!(workload.now(), 0);
    assert_eq!(summary(&mut workload, 50), first);
}
