//! Packet trace format.
//!
//! A trace is a sequence of whitespace-separated ASCII integers, four per record:
//! `delay source dest type`. `delay` is added to the running logical time of whoever walks
//! the trace, and a negative `type` marks a record that never yields a packet.

use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use bytes::BytesMut;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio_util::codec::Decoder;

mod codec;
pub use codec::TraceCodec;

/// Size of the chunks read from a trace source.
const READ_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0:?}")]
    Io(#[from] io::Error),
    #[error("Invalid token {token:?} in trace record {record}")]
    InvalidToken { token: String, record: usize },
    #[error("Truncated trace record {record}: expected 4 fields, got {fields}")]
    Truncated { record: usize, fields: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

/// A decoded trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    /// Logical time elapsed since the previous record.
    pub delay: i64,
    /// The recorded source node.
    pub source: i64,
    /// The recorded destination node.
    pub dest: i64,
    /// Index into the packet size list, or negative for a non-packet record.
    pub kind: i64,
}

impl TraceRecord {
    pub fn new(delay: i64, source: i64, dest: i64, kind: i64) -> Self {
        Self { delay, source, dest, kind }
    }

    /// Returns the packet type of this record, or `None` for a sentinel record.
    #[inline]
    pub fn packet_type(&self) -> Option<usize> {
        usize::try_from(self.kind).ok()
    }

    /// Returns `true` if this record offers a packet from `node`.
    #[inline]
    pub fn offers_from(&self, node: usize) -> bool {
        self.packet_type().is_some() && usize::try_from(self.source).map_or(false, |s| s == node)
    }
}

/// Decodes every record from `reader`.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<TraceRecord>> {
    let mut codec = TraceCodec::new();
    let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut records = Vec::new();

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            while let Some(record) = codec.decode_eof(&mut buf)? {
                records.push(record);
            }
            return Ok(records);
        }

        buf.extend_from_slice(&chunk[..n]);
        while let Some(record) = codec.decode(&mut buf)? {
            records.push(record);
        }
    }
}

/// Opens and decodes the trace file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TraceRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_records(file)?;
    tracing::debug!(path = %path.display(), records = records.len(), "loaded trace");
    Ok(records)
}

/// Decoded traces keyed by path, so that nodes sharing a file share its records.
#[derive(Debug, Default)]
pub struct TraceCache {
    traces: FxHashMap<PathBuf, Arc<[TraceRecord]>>,
}

impl TraceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records of the trace at `path`, decoding the file on first use.
    pub fn get_or_load(&mut self, path: impl AsRef<Path>) -> Result<Arc<[TraceRecord]>> {
        let path = path.as_ref();
        if let Some(trace) = self.traces.get(path) {
            return Ok(Arc::clone(trace));
        }

        let trace: Arc<[TraceRecord]> = load(path)?.into();
        self.traces.insert(path.to_path_buf(), Arc::clone(&trace));
        Ok(trace)
    }

    /// Returns the number of distinct traces loaded.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
