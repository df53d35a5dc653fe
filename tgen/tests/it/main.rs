mod factory;
mod synthetic;
mod trace;

/// Helper functions.
mod helpers {
    use std::path::{Path, PathBuf};

    use tgen::{PacketOffer, Tick, Workload};

    /// A trace file in the system temp directory, removed on drop.
    pub struct TempTrace {
        path: PathBuf,
    }

    impl TempTrace {
        pub fn new(name: &str, contents: &str) -> Self {
            let path = std::env::temp_dir()
                .join(format!("tgen-it-{}-{}.trace", std::process::id(), name));
            std::fs::write(&path, contents).unwrap();
            Self { path }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TempTrace {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    /// Drives `workload` for `cycles` cycles, injecting every offer.
    pub fn drain(workload: &mut dyn Workload, cycles: Tick) -> Vec<PacketOffer> {
        let mut offers = Vec::new();
        let mut pid = 0;
        for _ in 0..cycles {
            while let Some(offer) = workload.offer() {
                offers.push(offer);
                workload.inject(pid);
                pid += 1;
            }
            if workload.is_completed() {
                break;
            }
            workload.advance_time();
        }
        offers
    }
}
