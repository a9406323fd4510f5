//! Core FastCGI protocol types.
//!
//! This module holds the wire-level data model shared by the codec and
//! connection layers. Nothing in here performs I/O except [`Record::read`].
//!
//! # Architecture
//!
//! - **Records**: framing of every unit on the wire
//!   - [`RecordHeader`]: the fixed 8-byte header with padding arithmetic
//!   - [`Record`]: a header plus its content, padding stripped on access
//!   - [`RecordType`]: the 11 record types
//!
//! - **Fixed bodies**: the 8-byte payloads of request begin/end
//!   - [`BeginRequestBody`], [`Role`]
//!   - [`EndRequestBody`], [`ProtocolStatus`]
//!
//! - **Exchange**: per-request ordering rules
//!   - [`Exchange`]: validates sent and received records for one request id
//!
//! - **Response**: the collected stdout/stderr and end status
//!
//! - **Error Handling**:
//!   - [`FcgiError`]: Top-level error type
//!   - [`ParseError`]: malformed or unexpected data from the peer
//!   - [`SendError`]: failures while producing a request

mod record;
pub use record::padding_for;
pub use record::Record;
pub use record::RecordHeader;
pub use record::RecordType;
pub use record::{FCGI_VERSION, HEADER_LEN, MANAGEMENT_REQUEST_ID, MAX_PAD, MAX_WRITE};

mod body;
pub use body::BeginRequestBody;
pub use body::EndRequestBody;
pub use body::ProtocolStatus;
pub use body::Role;
pub use body::{BODY_LEN, FLAG_KEEP_CONN};

mod exchange;
pub use exchange::Exchange;
pub use exchange::ExchangeState;

mod response;
pub use response::Response;

mod error;
pub use error::FcgiError;
pub use error::ParseError;
pub use error::SendError;
