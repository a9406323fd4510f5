//! Record encoder writing header, content and padding into one buffer.

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::protocol::{RecordHeader, RecordType, SendError, MAX_PAD};

/// Zero bytes used for padding. Immutable, so sharing it needs no synchronization.
const PADDING: [u8; MAX_PAD] = [0; MAX_PAD];

/// An outgoing record: type, request id and content.
///
/// The content may be any [`Buf`] holding at most [`MAX_WRITE`](crate::protocol::MAX_WRITE) bytes.
#[derive(Debug)]
pub struct OutRecord<D> {
    pub record_type: RecordType,
    pub request_id: u16,
    pub content: D,
}

impl<D: Buf> OutRecord<D> {
    pub fn new(record_type: RecordType, request_id: u16, content: D) -> Self {
        Self { record_type, request_id, content }
    }
}

#[derive(Debug, Default)]
pub struct RecordEncoder;

impl RecordEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl<D: Buf> Encoder<OutRecord<D>> for RecordEncoder {
    type Error = SendError;

    /// Appends one complete record to `dst`.
    ///
    /// # Panics
    ///
    /// Panics if the content is larger than one record may carry.
    fn encode(&mut self, item: OutRecord<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let OutRecord { record_type, request_id, mut content } = item;
        let header = RecordHeader::new(record_type, request_id, content.remaining());

        dst.reserve(crate::protocol::HEADER_LEN + header.body_length());
        header.encode_into(dst);
        while content.has_remaining() {
            let chunk = content.chunk();
            let len = chunk.len();
            dst.extend_from_slice(chunk);
            content.advance(len);
        }
        dst.extend_from_slice(&PADDING[..header.padding_length()]);

        trace!(record_type = ?record_type, request_id, content_length = header.content_length(), "encoded record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_encode_with_padding() {
        let mut dst = BytesMut::new();
        RecordEncoder.encode(OutRecord::new(RecordType::Stdin, 1, &b"hello"[..]), &mut dst).unwrap();

        assert_eq!(&dst[..], b"\x01\x05\x00\x01\x00\x05\x03\x00hello\x00\x00\x00");
    }

    #[test]
    fn test_encode_aligned_content_has_no_padding() {
        let mut dst = BytesMut::new();
        RecordEncoder.encode(OutRecord::new(RecordType::Stdout, 2, Bytes::from_static(b"12345678")), &mut dst).unwrap();

        assert_eq!(dst.len(), 16);
        assert_eq!(dst[6], 0);
    }

    #[test]
    fn test_encode_empty_record() {
        let mut dst = BytesMut::new();
        RecordEncoder.encode(OutRecord::new(RecordType::Params, 1, Bytes::new()), &mut dst).unwrap();

        assert_eq!(&dst[..], &[1, 4, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_chained_buf() {
        let content = Buf::chain(&b"abc"[..], &b"defg"[..]);
        let mut dst = BytesMut::new();
        RecordEncoder.encode(OutRecord::new(RecordType::Data, 9, content), &mut dst).unwrap();

        assert_eq!(&dst[8..15], b"abcdefg");
        assert_eq!(dst.len(), 16);
    }
}
