//! Server-push response bodies.
//!
//! Subscription endpoints write one self-contained JSON object per event over a
//! single long-lived response. Objects may be split across body frames or share
//! a frame, with or without newline separators.

use std::io;

use bytes::{Buf as _, Bytes, BytesMut};
use futures_util::{stream, Stream, StreamExt as _, TryStreamExt as _};
use http_body_util::{BodyDataStream, BodyExt as _};
use serde_json::Value;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tracing::trace;

use crate::{
    client::{LndError, RemoteError},
    document::{reported_error, Document},
    models::Invoice,
    transport::Body,
};

/// An open streaming response.
///
/// Single owner: dropping it releases the underlying connection.
pub struct EventStream {
    body: Body,
    buf: BytesMut,
    scanner: RecordScanner,
}

/// Where the first top-level record in the buffer ends, if known yet.
#[derive(Debug, PartialEq, Eq)]
enum Scan {
    Complete(usize),
    Partial,
    /// A bare number or literal; its end is only known to the JSON parser.
    Scalar,
}

/// Bracket and string state carried across frames, so each buffered byte is
/// examined once no matter how many frames a record spans.
#[derive(Debug, Default)]
struct RecordScanner {
    offset: usize,
    depth: usize,
    in_string: bool,
    escaped: bool,
}

impl RecordScanner {
    fn scan(&mut self, buf: &[u8]) -> Scan {
        while let Some(&b) = buf.get(self.offset) {
            if self.depth == 0
                && !self.in_string
                && !b.is_ascii_whitespace()
                && !matches!(b, b'{' | b'[' | b'"')
            {
                return Scan::Scalar;
            }
            self.offset += 1;
            if self.in_string {
                if self.escaped {
                    self.escaped = false;
                } else if b == b'\\' {
                    self.escaped = true;
                } else if b == b'"' {
                    self.in_string = false;
                    if self.depth == 0 {
                        return Scan::Complete(self.offset);
                    }
                }
                continue;
            }
            match b {
                b'"' => self.in_string = true,
                b'{' | b'[' => self.depth += 1,
                b'}' | b']' => {
                    self.depth -= 1;
                    if self.depth == 0 {
                        return Scan::Complete(self.offset);
                    }
                }
                _ => {}
            }
        }
        Scan::Partial
    }

    /// True while nothing but whitespace has been scanned.
    fn is_idle(&self) -> bool {
        self.depth == 0 && !self.in_string
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("buffered", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl EventStream {
    pub(crate) fn new(body: Body) -> Self {
        Self {
            body,
            buf: BytesMut::new(),
            scanner: RecordScanner::default(),
        }
    }

    /// Wait for the next complete JSON event.
    ///
    /// Returns `Ok(None)` once the server closes the stream cleanly.
    ///
    /// # Errors
    /// - [`LndError::Transport`] when reading from the connection fails.
    /// - [`LndError::Decode`] for malformed records or a record cut off by end of stream.
    /// - [`RemoteError::Reported`] for an event carrying a non-empty `error` field.
    pub async fn next_event(&mut self) -> Result<Option<Document>, LndError> {
        loop {
            if let Some(value) = self.take_buffered()? {
                return event(value).map(Some);
            }
            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        trace!(target: "lnd_rest::stream", len = data.len(), "frame received");
                        self.buf.extend_from_slice(&data);
                    }
                }
                Some(Err(e)) => return Err(e.into()),
                None => return self.finish(),
            }
        }
    }

    /// Wait for the next invoice update, unwrapping the `result` envelope.
    ///
    /// # Errors
    /// Same as [`next_event`](Self::next_event), plus [`LndError::Decode`] when the
    /// event is not an invoice.
    pub async fn next_invoice(&mut self) -> Result<Option<Invoice>, LndError> {
        match self.next_event().await? {
            Some(doc) => doc.into_result().parse().map(Some),
            None => Ok(None),
        }
    }

    /// Adapt into a [`Stream`] of decoded events; the stream ends after the first error.
    pub fn into_events(self) -> impl Stream<Item = Result<Document, LndError>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut events = state?;
            match events.next_event().await {
                Ok(Some(doc)) => Some((Ok(doc), Some(events))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Hand back the raw byte stream for callers that frame records themselves.
    ///
    /// Bytes already buffered by [`next_event`](Self::next_event) are yielded first.
    pub fn into_reader(self) -> impl AsyncBufRead + Send + Unpin {
        let buffered = self.buf.freeze();
        let head = stream::iter((!buffered.is_empty()).then(|| Ok::<Bytes, io::Error>(buffered)));
        let rest = BodyDataStream::new(self.body).map_err(io::Error::other);
        StreamReader::new(head.chain(rest))
    }

    fn take_buffered(&mut self) -> Result<Option<Value>, LndError> {
        match self.scanner.scan(&self.buf) {
            Scan::Complete(end) => {
                self.scanner = RecordScanner::default();
                let record = self.buf.split_to(end);
                serde_json::from_slice(&record)
                    .map(Some)
                    .map_err(|source| LndError::decode(source, &record))
            }
            Scan::Partial => {
                if self.scanner.is_idle() {
                    self.scanner = RecordScanner::default();
                    self.buf.clear();
                }
                Ok(None)
            }
            Scan::Scalar => self.take_scalar(),
        }
    }

    fn take_scalar(&mut self) -> Result<Option<Value>, LndError> {
        let (next, consumed) = {
            let mut values = serde_json::Deserializer::from_slice(&self.buf).into_iter::<Value>();
            let next = values.next();
            (next, values.byte_offset())
        };
        match next {
            Some(Ok(value)) => {
                self.scanner = RecordScanner::default();
                self.buf.advance(consumed);
                Ok(Some(value))
            }
            Some(Err(e)) if e.is_eof() => Ok(None),
            Some(Err(source)) => Err(LndError::decode(source, &self.buf)),
            None => Ok(None),
        }
    }

    fn finish(&mut self) -> Result<Option<Document>, LndError> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            trace!(target: "lnd_rest::stream", "stream closed");
            return Ok(None);
        }
        let value = serde_json::from_slice::<Value>(&self.buf)
            .map_err(|source| LndError::decode(source, &self.buf))?;
        self.buf.clear();
        self.scanner = RecordScanner::default();
        event(value).map(Some)
    }
}

fn event(value: Value) -> Result<Document, LndError> {
    match reported_error(&value) {
        Some(message) => Err(RemoteError::Reported(message).into()),
        None => Ok(Document::new(value)),
    }
}
