use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::{Error, TraceRecord};

/// Number of integers in one trace record.
const FIELDS: usize = 4;

#[derive(Debug, Default)]
struct Partial {
    fields: [i64; FIELDS],
    filled: usize,
}

/// Decodes [`TraceRecord`]s from whitespace-separated text.
///
/// A token is only consumed once the whitespace that terminates it has been buffered, so a
/// number split across two reads is never parsed early. At end of input the last token is
/// terminated implicitly.
#[derive(Debug, Default)]
pub struct TraceCodec {
    /// The record currently being assembled.
    partial: Partial,
    /// Number of records emitted so far, for error reporting.
    decoded: usize,
}

impl TraceCodec {
    pub fn new() -> Self {
        Self::default()
    }

    fn parse_token(&self, token: &[u8]) -> Result<i64, Error> {
        std::str::from_utf8(token).ok().and_then(|s| s.parse::<i64>().ok()).ok_or_else(|| {
            Error::InvalidToken {
                token: String::from_utf8_lossy(token).into_owned(),
                record: self.decoded,
            }
        })
    }

    /// Stores a field, returning the record if it is now complete.
    fn push(&mut self, value: i64) -> Option<TraceRecord> {
        self.partial.fields[self.partial.filled] = value;
        self.partial.filled += 1;
        if self.partial.filled < FIELDS {
            return None;
        }

        let [delay, source, dest, kind] = self.partial.fields;
        self.partial = Partial::default();
        self.decoded += 1;
        Some(TraceRecord { delay, source, dest, kind })
    }
}

impl Decoder for TraceCodec {
    type Item = TraceRecord;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let skip = src.iter().take_while(|b| b.is_ascii_whitespace()).count();
            src.advance(skip);

            let Some(end) = src.iter().position(|b| b.is_ascii_whitespace()) else {
                // Empty, or the token may continue in the next read.
                return Ok(None);
            };

            let value = self.parse_token(&src[..end])?;
            src.advance(end);

            if let Some(record) = self.push(value) {
                return Ok(Some(record));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }

        if !src.is_empty() {
            let value = self.parse_token(&src[..])?;
            src.clear();
            if let Some(record) = self.push(value) {
                return Ok(Some(record));
            }
        }

        match self.partial.filled {
            0 => Ok(None),
            fields => Err(Error::Truncated { record: self.decoded, fields }),
        }
    }
}
