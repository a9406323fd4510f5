//! Record-splitting writers for FastCGI streams.
//!
//! A FastCGI stream (`Params`, `Stdin`, ...) is an unbounded byte sequence sent
//! as consecutive records of one `(type, request id)` and terminated by an
//! empty record.
//!
//! - [`StreamWriter`] issues one record per chunk of at most
//!   [`MAX_WRITE`] bytes.
//! - [`BufferedStreamWriter`] coalesces small writes so that, for example, a
//!   whole params set becomes a single record.

use std::io;

use bytes::BytesMut;
use tokio::io::AsyncWrite;
use tracing::{trace, warn};

use crate::connection::Connection;
use crate::protocol::{RecordType, SendError, MAX_WRITE};

/// Splits a byte stream into records for a fixed `(type, request id)`.
#[derive(Debug)]
pub struct StreamWriter<'conn, W> {
    connection: &'conn Connection<W>,
    record_type: RecordType,
    request_id: u16,
    written: usize,
}

impl<'conn, W> StreamWriter<'conn, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(connection: &'conn Connection<W>, record_type: RecordType, request_id: u16) -> Self {
        debug_assert!(record_type.is_stream(), "{record_type:?} is not a stream record type");
        Self { connection, record_type, request_id, written: 0 }
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    #[inline]
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    /// Total bytes that made it into complete records so far.
    ///
    /// After a failed [`write`](Self::write) this tells how much of the input was
    /// sent; the failed chunk may already be partially on the wire and must not be retried.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Writes `data` as one record per [`MAX_WRITE`] sized chunk, in order.
    ///
    /// Returns the number of bytes written, which is `data.len()` on success.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize, SendError> {
        let start = self.written;
        for chunk in data.chunks(MAX_WRITE) {
            self.connection.write_record(self.record_type, self.request_id, chunk).await?;
            self.written += chunk.len();
        }
        Ok(self.written - start)
    }

    /// Ends the stream with an empty record, required even if nothing was written.
    pub async fn close(self) -> Result<(), SendError> {
        trace!(record_type = ?self.record_type, request_id = self.request_id, written = self.written, "close stream");
        self.connection.write_record(self.record_type, self.request_id, &[]).await
    }
}

/// A [`StreamWriter`] with a [`MAX_WRITE`] sized buffer in front of it.
///
/// The buffered writer owns the stream writer it wraps; [`close`](Self::close)
/// always closes it, even when flushing the buffer failed.
///
/// A failed write is sticky: the bytes involved are dropped, never sent
/// again, and every later `write` or `flush` fails without touching the wire.
#[derive(Debug)]
pub struct BufferedStreamWriter<'conn, W> {
    inner: StreamWriter<'conn, W>,
    buffer: BytesMut,
    failed: bool,
}

impl<'conn, W> BufferedStreamWriter<'conn, W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: StreamWriter<'conn, W>) -> Self {
        Self { inner, buffer: BytesMut::with_capacity(MAX_WRITE), failed: false }
    }

    /// Returns true once a write to the stream writer has failed.
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Number of bytes currently held back in the buffer.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    fn available(&self) -> usize {
        MAX_WRITE - self.buffer.len()
    }

    /// Buffers `data`, emitting a full record each time the buffer fills up.
    ///
    /// Input larger than the buffer goes straight to the stream writer when
    /// nothing is buffered.
    pub async fn write(&mut self, mut data: &[u8]) -> Result<usize, SendError> {
        self.check_failed()?;
        let mut written = 0;

        while data.len() > self.available() {
            if self.buffer.is_empty() {
                let n = self.inner.write(data).await.inspect_err(|_| self.failed = true)?;
                return Ok(written + n);
            }

            let (head, tail) = data.split_at(self.available());
            self.buffer.extend_from_slice(head);
            self.flush().await?;
            written += head.len();
            data = tail;
        }

        self.buffer.extend_from_slice(data);
        Ok(written + data.len())
    }

    /// Sends all buffered bytes as one record.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.check_failed()?;
        if self.buffer.is_empty() {
            return Ok(());
        }

        let result = self.inner.write(&self.buffer).await;
        self.buffer.clear();
        if result.is_err() {
            self.failed = true;
        }
        result.map(|_| ())
    }

    /// Flushes the buffer, then closes the stream writer.
    ///
    /// The close is attempted whatever the flush outcome; the first error wins.
    /// After an earlier failed write only the terminating record is sent.
    pub async fn close(mut self) -> Result<(), SendError> {
        if self.failed {
            warn!(record_type = ?self.inner.record_type(), request_id = self.inner.request_id(), "close stream after failed write");
            return self.inner.close().await;
        }

        let flushed = self.flush().await;
        let closed = self.inner.close().await;
        flushed.and(closed)
    }

    fn check_failed(&self) -> Result<(), SendError> {
        if self.failed {
            return Err(SendError::io(io::Error::new(io::ErrorKind::BrokenPipe, "stream writer failed earlier")));
        }
        Ok(())
    }
}
