//! FastCGI codec module for encoding and decoding records
//!
//! This module provides the byte-level building blocks used by the connection
//! layer, expressed as `tokio_util` [`Encoder`](tokio_util::codec::Encoder) and
//! [`Decoder`](tokio_util::codec::Decoder) implementations.
//!
//! # Components
//!
//! - [`RecordEncoder`]: serializes an [`OutRecord`] (header, content, padding)
//! - [`RecordDecoder`]: reassembles [`Record`](crate::protocol::Record)s from a byte stream
//! - [`pairs`]: the name-value pair format of `Params` and `GetValues`
//!
//! # Example
//!
//! ```
//! use micro_fcgi::codec::{OutRecord, RecordDecoder, RecordEncoder};
//! use micro_fcgi::protocol::RecordType;
//! use tokio_util::codec::{Decoder, Encoder};
//! use bytes::BytesMut;
//!
//! let mut buffer = BytesMut::new();
//! RecordEncoder::new().encode(OutRecord::new(RecordType::Stdout, 1, &b"pool: www"[..]), &mut buffer).unwrap();
//!
//! let record = RecordDecoder::new().decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(record.content(), b"pool: www");
//! ```

pub mod pairs;
mod record_decoder;
mod record_encoder;

pub use pairs::PairsDecoder;
pub use record_decoder::RecordDecoder;
pub use record_encoder::{OutRecord, RecordEncoder};
