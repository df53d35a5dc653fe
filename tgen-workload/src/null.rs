use tgen_common::{NodeId, PacketId, Tick};

use crate::Workload;

/// A workload that never offers a packet.
#[derive(Debug, Default)]
pub struct NullWorkload {
    time: Tick,
}

impl NullWorkload {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Workload for NullWorkload {
    fn reset(&mut self) {
        self.time = 0;
    }

    fn advance_time(&mut self) {
        self.time += 1;
    }

    fn now(&self) -> Tick {
        self.time
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn is_completed(&self) -> bool {
        true
    }

    fn source(&self) -> NodeId {
        panic!("source() called on a null workload")
    }

    fn dest(&mut self) -> NodeId {
        panic!("dest() called on a null workload")
    }

    fn size(&mut self) -> u32 {
        panic!("size() called on a null workload")
    }

    fn time(&self) -> Tick {
        panic!("time() called on a null workload")
    }

    fn inject(&mut self, _pid: PacketId) {
        panic!("inject() called on a null workload")
    }

    fn defer(&mut self) {
        panic!("defer() called on a null workload")
    }
}
