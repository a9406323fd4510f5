//! Incremental record decoder.
//!
//! Used with [`FramedRead`](tokio_util::codec::FramedRead), it turns a byte
//! stream into [`Record`]s. The read buffer belongs to the `FramedRead` and is
//! reused across records.
//!
//! # Example
//!
//! ```no_run
//! use micro_fcgi::codec::RecordDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = RecordDecoder::new();
//! let mut buffer = BytesMut::new();
//! // ... add record bytes to buffer ...
//! let result = decoder.decode(&mut buffer);
//! ```

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::ensure;
use crate::protocol::{ParseError, Record, RecordHeader, FCGI_VERSION, HEADER_LEN};

/// A decoder for FastCGI records.
///
/// # State Machine
///
/// - `header == None`: waiting for a complete 8-byte header
/// - `header == Some(_)`: header consumed, waiting for content and padding
#[derive(Debug, Default)]
pub struct RecordDecoder {
    header: Option<RecordHeader>,
}

impl RecordDecoder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Decoder for RecordDecoder {
    type Item = Record;
    type Error = ParseError;

    /// Attempts to decode one record from the buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: a complete record
    /// - `Ok(None)`: need more data
    /// - `Err(_)`: the stream is not a valid FastCGI stream; on a bad version byte
    ///   nothing is consumed from `src`
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let header = match self.header {
            Some(header) => header,
            None => {
                let Some(&version) = src.first() else {
                    return Ok(None);
                };
                if version != FCGI_VERSION {
                    warn!(version, "received record with invalid version");
                }
                ensure!(version == FCGI_VERSION, ParseError::InvalidVersion(version));

                if src.len() < HEADER_LEN {
                    return Ok(None);
                }

                let mut header_bytes = [0u8; HEADER_LEN];
                header_bytes.copy_from_slice(&src[..HEADER_LEN]);
                let header = RecordHeader::decode(&header_bytes)?;
                src.advance(HEADER_LEN);
                self.header = Some(header);
                header
            }
        };

        let body_length = header.body_length();
        if src.len() < body_length {
            src.reserve(body_length - src.len());
            return Ok(None);
        }

        self.header = None;
        let body = src.split_to(body_length).freeze();
        trace!(record_type = ?header.record_type(), request_id = header.request_id(), content_length = header.content_length(), "decoded record");
        Ok(Some(Record::from_parts(header, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{OutRecord, RecordEncoder};
    use crate::protocol::RecordType;
    use tokio_util::codec::Encoder;

    fn encode(record_type: RecordType, request_id: u16, content: &[u8]) -> BytesMut {
        let mut dst = BytesMut::new();
        RecordEncoder.encode(OutRecord::new(record_type, request_id, content), &mut dst).unwrap();
        dst
    }

    #[test]
    fn test_basic() {
        let mut buffer = encode(RecordType::Stdout, 1, b"pool: www\n");
        buffer.extend_from_slice(b"trailing");

        let record = RecordDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert_eq!(record.record_type(), RecordType::Stdout);
        assert_eq!(record.request_id(), 1);
        assert_eq!(record.content(), b"pool: www\n");
        assert_eq!(&buffer[..], b"trailing");
    }

    #[test]
    fn test_byte_by_byte() {
        let wire = encode(RecordType::Stderr, 3, b"warning: something");
        let mut decoder = RecordDecoder::new();
        let mut buffer = BytesMut::new();

        for (i, byte) in wire.iter().enumerate() {
            buffer.extend_from_slice(&[*byte]);
            let result = decoder.decode(&mut buffer).unwrap();
            if i + 1 < wire.len() {
                assert!(result.is_none());
            } else {
                assert_eq!(result.unwrap().content(), b"warning: something");
            }
        }
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_multiple_records() {
        let mut buffer = encode(RecordType::Stdout, 1, b"hello");
        buffer.extend_from_slice(&encode(RecordType::Stdout, 1, b""));
        buffer.extend_from_slice(&encode(RecordType::EndRequest, 1, &[0; 8]));

        let mut decoder = RecordDecoder::new();
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().content(), b"hello");
        assert!(decoder.decode(&mut buffer).unwrap().unwrap().is_empty());
        assert_eq!(decoder.decode(&mut buffer).unwrap().unwrap().record_type(), RecordType::EndRequest);
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn test_bad_version_consumes_nothing() {
        let mut buffer = BytesMut::from(&[2u8, 6, 0, 1, 0, 0, 0, 0][..]);
        let result = RecordDecoder::new().decode(&mut buffer);

        assert!(matches!(result, Err(ParseError::InvalidVersion(2))));
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_bad_version_detected_on_first_byte() {
        let mut buffer = BytesMut::from(&[2u8][..]);
        assert!(matches!(RecordDecoder::new().decode(&mut buffer), Err(ParseError::InvalidVersion(2))));
    }

    #[test]
    fn test_max_record() {
        let content = vec![b'x'; crate::protocol::MAX_WRITE];
        let mut buffer = encode(RecordType::Stdout, 1, &content);

        let record = RecordDecoder::new().decode(&mut buffer).unwrap().unwrap();
        assert_eq!(record.content().len(), crate::protocol::MAX_WRITE);
        assert_eq!(record.header().padding_length(), 1);
        assert!(buffer.is_empty());
    }
}
