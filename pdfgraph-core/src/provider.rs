//! Deferred stream content.
//!
//! A stream may hold a [`StreamDataProvider`] instead of resident bytes. The
//! writer calls the provider once per write pass and collects whatever it
//! pushes into a [`StreamSink`]. The provider must call
//! [`StreamSink::finish`] before returning.

use crate::error::{PdfError, Result};
use crate::objects::ObjectId;
use std::io;

/// Supplies the raw (unfiltered) bytes of a stream at write time.
pub trait StreamDataProvider {
    /// Writes the stream content for object `id` into `sink`, then finishes it.
    fn provide_stream_data(&self, id: ObjectId, sink: &mut StreamSink) -> Result<()>;

    /// Expected number of bytes, used only to pre-size buffers.
    fn declared_length(&self) -> Option<u64> {
        None
    }
}

impl<F> StreamDataProvider for F
where
    F: Fn(ObjectId, &mut StreamSink) -> Result<()>,
{
    fn provide_stream_data(&self, id: ObjectId, sink: &mut StreamSink) -> Result<()> {
        self(id, sink)
    }
}

/// Byte accumulator handed to providers.
#[derive(Debug, Default)]
pub struct StreamSink {
    buffer: Vec<u8>,
    finished: bool,
}

impl StreamSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            finished: false,
        }
    }

    /// Appends bytes. Fails once the sink is finished.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.push(data)
    }

    /// Marks the end of content. May only be called once.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Err(PdfError::SinkFinished);
        }
        self.finished = true;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub(crate) fn into_data(self) -> Vec<u8> {
        self.buffer
    }

    fn push(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(PdfError::SinkFinished);
        }
        self.buffer.extend_from_slice(data);
        Ok(())
    }
}

impl io::Write for StreamSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e.to_string()))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Upper bound on the buffer reserved from a declared length.
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Runs `provider` for `id` and returns the collected bytes.
///
/// Fails with [`PdfError::StreamIncomplete`] when the provider returns
/// without finishing the sink.
pub(crate) fn collect_stream_data(
    provider: &dyn StreamDataProvider,
    id: ObjectId,
) -> Result<Vec<u8>> {
    let capacity = provider
        .declared_length()
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0)
        .min(MAX_PREALLOCATION);
    let mut sink = StreamSink::with_capacity(capacity);

    tracing::trace!(object = %id, declared = capacity, "invoking stream provider");
    provider.provide_stream_data(id, &mut sink)?;

    if !sink.is_finished() {
        return Err(PdfError::StreamIncomplete(id.number(), id.generation()));
    }
    if let Some(declared) = provider.declared_length() {
        if declared != sink.len() as u64 {
            tracing::debug!(
                object = %id,
                declared,
                actual = sink.len(),
                "provider length differs from its declared length"
            );
        }
    }
    Ok(sink.into_data())
}
