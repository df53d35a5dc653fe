use tgen::{build_workload, ConfigError, PolicyError, PolicyOptions, WorkloadOptions, WorkloadSpec};

use crate::helpers::{drain, TempTrace};

#[test]
fn null_workload_from_string() {
    let _ = tracing_subscriber::fmt::try_init();

    let mut workload = build_workload("null()", 16, &WorkloadOptions::default()).unwrap();
    for _ in 0..5 {
        workload.advance_time();
        assert!(workload.is_empty());
        assert!(workload.offer().is_none());
    }
    assert_eq!(workload.now(), 5);
    assert!(workload.is_completed());
}

#[test]
fn synthetic_uses_option_defaults() {
    let options = WorkloadOptions::default().packet_size(5).seed(21);
    let mut workload = build_workload("synthetic(0.5,bitcomp)", 8, &options).unwrap();

    let offers = drain(workload.as_mut(), 50);
    assert!(!offers.is_empty());
    for offer in offers {
        assert_eq!(offer.size, 5);
        assert_eq!(offer.dest, !offer.source & 7);
    }
}

#[test]
fn synthetic_size_list() {
    let options = WorkloadOptions::default().seed(2);
    let mut workload =
        build_workload("synthetic(1.0,uniform,bernoulli,{2,6},{1,0})", 4, &options).unwrap();
    let offers = drain(workload.as_mut(), 20);
    assert_eq!(offers.len(), 4 * 20);
    assert!(offers.iter().all(|offer| offer.size == 2));
}

#[test]
fn on_off_injection_by_name() {
    let options = WorkloadOptions::default()
        .policy(PolicyOptions::default().seed(8).burst_alpha(0.1).burst_beta(0.1));
    let mut workload = build_workload("synthetic(0.3,tornado,on_off)", 8, &options).unwrap();

    let offers = drain(workload.as_mut(), 4_000);
    let rate = offers.len() as f64 / (8.0 * 4_000.0);
    assert!((rate - 0.3).abs() < 0.05, "observed rate {rate}");
}

#[test]
fn trace_from_string() {
    let file = TempTrace::new("factory", "0 0 1 0\n5 1 0 1\n10 0 1 0\n");
    let spec = format!("trace({},{{4,8}},{{}},{{}},{{-2}})", file.path().display());

    let mut workload = build_workload(&spec, 2, &WorkloadOptions::default()).unwrap();
    let offers: Vec<_> = drain(workload.as_mut(), 100)
        .into_iter()
        .map(|offer| (offer.time, offer.source, offer.dest, offer.size))
        .collect();
    // Logical times 0, 5 and 15, doubled.
    assert_eq!(offers, vec![(0, 0, 1, 4), (10, 1, 0, 8), (30, 0, 1, 4)]);
    assert!(workload.is_completed());
}

#[test]
fn parse_then_build() {
    let options = WorkloadOptions::default();
    let spec = WorkloadSpec::parse("synthetic(0.1,randperm)", 4, &options).unwrap();
    assert!(matches!(spec, WorkloadSpec::Synthetic { ref injection, .. } if injection == "bernoulli"));

    let workload = spec.build(4, &options).unwrap();
    assert!(!workload.is_completed());
}

#[test]
fn configuration_errors() {
    let options = WorkloadOptions::default();

    let err = build_workload("poisson(0.1,uniform)", 4, &options).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownWorkload(ref name) if name == "poisson"));
    assert_eq!(err.to_string(), "Unknown workload: poisson");

    let err = build_workload("synthetic(0.1,bitrev)", 6, &options).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Policy(PolicyError::NotPowerOfTwo { pattern: "bitrev", nodes: 6 })
    ));

    let err = build_workload("synthetic(1.5,uniform)", 4, &options).unwrap_err();
    assert!(matches!(err, ConfigError::Policy(PolicyError::InvalidProbability { .. })));

    let missing = std::env::temp_dir().join("tgen-it-no-such-trace.txt");
    let err = build_workload(&format!("trace({},{{1}})", missing.display()), 4, &options)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Trace { ref path, .. } if *path == missing));
}

#[test]
fn malformed_trace_is_reported() {
    let file = TempTrace::new("malformed", "0 0 1 0\n3 0 x 0\n");
    let spec = format!("trace({},{{1}})", file.path().display());
    let err = build_workload(&spec, 2, &WorkloadOptions::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Trace { source: tgen::trace::Error::InvalidToken { .. }, .. }));
}
