//! FastCGI record framing.
//!
//! Every unit exchanged over a FastCGI connection is a record: a fixed 8-byte
//! header followed by `content_length` bytes of content and `padding_length`
//! zero bytes that align the record to a multiple of 8.
//!
//! ```text
//! offset 0:  version            = 1
//! offset 1:  type               (see RecordType)
//! offset 2:  request id         u16 BE
//! offset 4:  content length     u16 BE
//! offset 6:  padding length     u8
//! offset 7:  reserved           = 0
//! offset 8:  content, then padding
//! ```

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::ensure;
use crate::protocol::ParseError;

/// The only protocol version ever put on the wire.
pub const FCGI_VERSION: u8 = 1;

/// Size of the fixed record header.
pub const HEADER_LEN: usize = 8;

/// Maximum content length of a single record.
pub const MAX_WRITE: usize = 65535;

/// Maximum padding length representable in the header.
pub const MAX_PAD: usize = 255;

/// Request id reserved for management records such as `GetValues`.
pub const MANAGEMENT_REQUEST_ID: u16 = 0;

/// Record type, as defined in section 8 of the FastCGI specification.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    BeginRequest = 1,
    AbortRequest = 2,
    EndRequest = 3,
    Params = 4,
    Stdin = 5,
    Stdout = 6,
    Stderr = 7,
    Data = 8,
    GetValues = 9,
    GetValuesResult = 10,
    UnknownType = 11,
}

impl RecordType {
    /// Returns true for the record types that carry a stream terminated by an empty record.
    #[inline]
    pub fn is_stream(self) -> bool {
        matches!(self, RecordType::Params | RecordType::Stdin | RecordType::Stdout | RecordType::Stderr | RecordType::Data)
    }
}

impl TryFrom<u8> for RecordType {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let record_type = match value {
            1 => RecordType::BeginRequest,
            2 => RecordType::AbortRequest,
            3 => RecordType::EndRequest,
            4 => RecordType::Params,
            5 => RecordType::Stdin,
            6 => RecordType::Stdout,
            7 => RecordType::Stderr,
            8 => RecordType::Data,
            9 => RecordType::GetValues,
            10 => RecordType::GetValuesResult,
            11 => RecordType::UnknownType,
            other => return Err(ParseError::UnknownRecordType(other)),
        };
        Ok(record_type)
    }
}

impl From<RecordType> for u8 {
    fn from(record_type: RecordType) -> Self {
        record_type as u8
    }
}

/// Decoded fixed-size record header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    version: u8,
    record_type: RecordType,
    request_id: u16,
    content_length: u16,
    padding_length: u8,
    reserved: u8,
}

impl RecordHeader {
    /// Builds the header of an outgoing record and computes its padding.
    ///
    /// # Panics
    ///
    /// Panics if `content_length` exceeds [`MAX_WRITE`]. Stream writers always
    /// split their input first, so reaching this is a bug in the caller.
    pub fn new(record_type: RecordType, request_id: u16, content_length: usize) -> Self {
        assert!(content_length <= MAX_WRITE, "record content of {content_length} bytes exceeds the maximum of {MAX_WRITE}");
        #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_WRITE above")]
        let content_length = content_length as u16;
        Self {
            version: FCGI_VERSION,
            record_type,
            request_id,
            content_length,
            padding_length: padding_for(content_length),
            reserved: 0,
        }
    }

    /// Decodes a header from its 8 wire bytes.
    ///
    /// The version byte is checked first, so a foreign or corrupted stream is
    /// rejected before its type or lengths are trusted.
    pub fn decode(buf: &[u8; HEADER_LEN]) -> Result<Self, ParseError> {
        ensure!(buf[0] == FCGI_VERSION, ParseError::InvalidVersion(buf[0]));
        Ok(Self {
            version: buf[0],
            record_type: RecordType::try_from(buf[1])?,
            request_id: u16::from_be_bytes([buf[2], buf[3]]),
            content_length: u16::from_be_bytes([buf[4], buf[5]]),
            padding_length: buf[6],
            reserved: buf[7],
        })
    }

    /// Appends the 8 header bytes to `dst`.
    pub fn encode_into<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.version);
        dst.put_u8(self.record_type.into());
        dst.put_u16(self.request_id);
        dst.put_u16(self.content_length);
        dst.put_u8(self.padding_length);
        dst.put_u8(self.reserved);
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        self.encode_into(&mut &mut buf[..]);
        buf
    }

    #[inline]
    pub fn version(&self) -> u8 {
        self.version
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    #[inline]
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    #[inline]
    pub fn content_length(&self) -> usize {
        usize::from(self.content_length)
    }

    #[inline]
    pub fn padding_length(&self) -> usize {
        usize::from(self.padding_length)
    }

    /// Number of bytes following the header: content plus padding.
    #[inline]
    pub fn body_length(&self) -> usize {
        self.content_length() + self.padding_length()
    }
}

/// Padding that aligns `content_length` to the next multiple of 8.
#[inline]
pub fn padding_for(content_length: u16) -> u8 {
    #[allow(clippy::cast_possible_truncation, reason = "result is always below 8")]
    let padding = ((8 - content_length % 8) % 8) as u8;
    padding
}

/// A complete record read from the peer.
///
/// The body buffer holds content and padding, bounded by
/// `MAX_WRITE + MAX_PAD` bytes since both lengths are fixed-width fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    header: RecordHeader,
    body: Bytes,
}

impl Record {
    pub(crate) fn from_parts(header: RecordHeader, body: Bytes) -> Self {
        debug_assert_eq!(body.len(), header.body_length());
        Self { header, body }
    }

    /// Reads exactly one record from `reader`.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Io`] if the transport fails or ends mid-record
    /// - [`ParseError::InvalidVersion`] if the version byte is not 1; nothing past
    ///   the header has been consumed in that case
    /// - [`ParseError::UnknownRecordType`] for type bytes outside the known range
    pub async fn read<R>(reader: &mut R) -> Result<Self, ParseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header_buf = [0u8; HEADER_LEN];
        reader.read_exact(&mut header_buf).await?;
        let header = RecordHeader::decode(&header_buf)?;

        let mut body = BytesMut::zeroed(header.body_length());
        reader.read_exact(&mut body).await?;

        Ok(Self { header, body: body.freeze() })
    }

    #[inline]
    pub fn header(&self) -> &RecordHeader {
        &self.header
    }

    #[inline]
    pub fn record_type(&self) -> RecordType {
        self.header.record_type
    }

    #[inline]
    pub fn request_id(&self) -> u16 {
        self.header.request_id
    }

    /// Returns true for the zero-length record that terminates a stream.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.header.content_length == 0
    }

    /// The logical payload, padding excluded.
    #[inline]
    pub fn content(&self) -> &[u8] {
        &self.body[..self.header.content_length()]
    }

    /// Consumes the record and returns its payload without copying.
    pub fn into_content(self) -> Bytes {
        self.body.slice(..self.header.content_length())
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("type", &self.header.record_type)
            .field("request_id", &self.header.request_id)
            .field("content_length", &self.header.content_length)
            .field("padding_length", &self.header.padding_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_keeps_alignment() {
        for content_length in 0..=u16::MAX {
            let padding = padding_for(content_length);
            assert!(padding < 8);
            assert_eq!((usize::from(content_length) + usize::from(padding)) % 8, 0);
        }
    }

    #[test]
    fn test_header_roundtrip_every_length() {
        for content_length in 0..=MAX_WRITE {
            let header = RecordHeader::new(RecordType::Stdout, 0xBEEF, content_length);
            let decoded = RecordHeader::decode(&header.encode()).unwrap();

            assert_eq!(decoded.record_type(), RecordType::Stdout);
            assert_eq!(decoded.request_id(), 0xBEEF);
            assert_eq!(decoded.content_length(), content_length);
            assert_eq!(decoded.body_length() % 8, 0);
            assert!(decoded.padding_length() <= 7);
        }
    }

    #[test]
    fn test_stream_record_types() {
        for value in 1..=11u8 {
            let record_type = RecordType::try_from(value).unwrap();
            assert_eq!(u8::from(record_type), value);
            assert_eq!(record_type.is_stream(), matches!(value, 4..=8));
        }
    }

    #[test]
    fn test_header_big_endian_layout() {
        let header = RecordHeader::new(RecordType::Params, 0x0102, 0x0304);
        assert_eq!(header.encode(), [1, 4, 0x01, 0x02, 0x03, 0x04, 4, 0]);
    }

    #[test]
    fn test_decode_rejects_bad_version() {
        let bytes = [2, 6, 0, 1, 0, 0, 0, 0];
        assert!(matches!(RecordHeader::decode(&bytes), Err(ParseError::InvalidVersion(2))));
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let bytes = [1, 12, 0, 1, 0, 0, 0, 0];
        assert!(matches!(RecordHeader::decode(&bytes), Err(ParseError::UnknownRecordType(12))));

        let bytes = [1, 0, 0, 1, 0, 0, 0, 0];
        assert!(matches!(RecordHeader::decode(&bytes), Err(ParseError::UnknownRecordType(0))));
    }

    #[test]
    #[should_panic(expected = "exceeds the maximum")]
    fn test_oversized_content_panics() {
        let _ = RecordHeader::new(RecordType::Stdin, 1, MAX_WRITE + 1);
    }

    #[tokio::test]
    async fn test_read_record_excludes_padding() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&RecordHeader::new(RecordType::Stdout, 1, 5).encode());
        wire.extend_from_slice(b"hello\0\0\0");

        let record = Record::read(&mut &wire[..]).await.unwrap();
        assert_eq!(record.record_type(), RecordType::Stdout);
        assert_eq!(record.request_id(), 1);
        assert_eq!(record.content(), b"hello");
        assert_eq!(record.into_content(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn test_read_bad_version_consumes_only_header() {
        let mut wire: Vec<u8> = vec![2, 6, 0, 1, 0, 3, 5, 0];
        wire.extend_from_slice(b"abc\0\0\0\0\0");

        let mut reader = &wire[..];
        let result = Record::read(&mut reader).await;
        assert!(matches!(result, Err(ParseError::InvalidVersion(2))));
        assert_eq!(reader, b"abc\0\0\0\0\0");
    }

    #[tokio::test]
    async fn test_read_short_body_is_io_error() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&RecordHeader::new(RecordType::Stdout, 1, 16).encode());
        wire.extend_from_slice(b"too short");

        let result = Record::read(&mut &wire[..]).await;
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }

    #[tokio::test]
    async fn test_read_short_header_is_io_error() {
        let wire = [1u8, 6, 0];
        let result = Record::read(&mut &wire[..]).await;
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }
}
