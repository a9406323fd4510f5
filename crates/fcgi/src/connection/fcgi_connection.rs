use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio_util::codec::Encoder;
use tracing::{debug, trace};

use crate::codec::pairs::encode_size;
use crate::codec::{OutRecord, RecordEncoder};
use crate::connection::{BufferedStreamWriter, StreamWriter};
use crate::protocol::{BeginRequestBody, EndRequestBody, ProtocolStatus, RecordType, Role, SendError, HEADER_LEN, MAX_PAD, MAX_WRITE};

/// The write side of a FastCGI connection.
///
/// `Connection` exclusively owns the writable half of the transport together
/// with a scratch buffer the record is assembled in. Both live behind one
/// async mutex that is held for the whole header + content + padding write,
/// so records written from concurrent tasks never interleave on the wire.
///
/// Share it between tasks by reference or through an `Arc`.
///
/// # Type Parameters
///
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct Connection<W> {
    inner: Mutex<Inner<W>>,
}

#[derive(Debug)]
struct Inner<W> {
    writer: W,
    encoder: RecordEncoder,
    buffer: BytesMut,
}

impl<W> Connection<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(writer: W) -> Self {
        let inner = Inner { writer, encoder: RecordEncoder::new(), buffer: BytesMut::with_capacity(HEADER_LEN + MAX_WRITE + MAX_PAD) };
        Self { inner: Mutex::new(inner) }
    }

    /// Writes and flushes one record.
    ///
    /// # Panics
    ///
    /// Panics if `content` is longer than [`MAX_WRITE`]. Use a [`StreamWriter`]
    /// for content of arbitrary length.
    pub async fn write_record(&self, record_type: RecordType, request_id: u16, content: &[u8]) -> Result<(), SendError> {
        let mut inner = self.inner.lock().await;
        let Inner { writer, encoder, buffer } = &mut *inner;

        buffer.clear();
        encoder.encode(OutRecord::new(record_type, request_id, content), buffer)?;
        writer.write_all(buffer).await?;
        writer.flush().await?;

        trace!(record_type = ?record_type, request_id, content_length = content.len(), "sent record");
        Ok(())
    }

    pub async fn write_begin_request(&self, request_id: u16, role: Role, flags: u8) -> Result<(), SendError> {
        let body = BeginRequestBody::new(role, flags);
        self.write_record(RecordType::BeginRequest, request_id, &body.encode()).await
    }

    pub async fn write_end_request(&self, request_id: u16, app_status: u32, protocol_status: ProtocolStatus) -> Result<(), SendError> {
        let body = EndRequestBody::new(app_status, protocol_status);
        self.write_record(RecordType::EndRequest, request_id, &body.encode()).await
    }

    /// Asks the application to abort `request_id`; it still answers with an `EndRequest`.
    pub async fn write_abort_request(&self, request_id: u16) -> Result<(), SendError> {
        self.write_record(RecordType::AbortRequest, request_id, &[]).await
    }

    /// Writes `pairs` as a name-value stream of `record_type`, terminated by an empty record.
    ///
    /// The pairs are coalesced through a [`BufferedStreamWriter`], so a typical
    /// params set goes out as one record followed by the terminator.
    pub async fn write_pairs<I, K, V>(&self, record_type: RecordType, request_id: u16, pairs: I) -> Result<(), SendError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut writer = BufferedStreamWriter::new(StreamWriter::new(self, record_type, request_id));
        let mut lengths = [0u8; 8];

        for (name, value) in pairs {
            let (name, value) = (name.as_ref(), value.as_ref());

            let mut dst = &mut lengths[..];
            let n = encode_size(&mut dst, name.len())? + encode_size(&mut dst, value.len())?;

            writer.write(&lengths[..n]).await?;
            writer.write(name.as_bytes()).await?;
            writer.write(value.as_bytes()).await?;
        }

        writer.close().await
    }

    /// Shuts the transport down.
    ///
    /// Waits for any in-flight record write to finish first. Calling `close`
    /// more than once is not supported.
    pub async fn close(&self) -> Result<(), SendError> {
        let mut inner = self.inner.lock().await;
        inner.writer.shutdown().await?;
        debug!("fcgi connection closed");
        Ok(())
    }

    /// Consumes the connection, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().writer
    }
}
