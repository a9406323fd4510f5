//! An asynchronous micro FastCGI client implementation
//!
//! This crate provides the client side of the FastCGI protocol, the way a web
//! server talks to an application server such as php-fpm. It is built on top
//! of tokio and keeps the protocol layers small and separately usable.
//!
//! # Features
//!
//! - Record framing with padding to 8-byte alignment
//! - Streams of any length split into records
//! - Name-value pairs for params and management queries
//! - Record writes shared safely between tasks
//! - Per-request ordering checks
//! - Keep-alive connections
//!
//!
//! # Example
//!
//! ```no_run
//! use micro_fcgi::connection::{ClientConfig, FcgiClient};
//! use tokio::net::TcpStream;
//! use tracing::{error, info, Level};
//! use tracing_subscriber::FmtSubscriber;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Initialize logging
//!     let subscriber = FmtSubscriber::builder()
//!         .with_max_level(Level::INFO)
//!         .finish();
//!     tracing::subscriber::set_global_default(subscriber)
//!         .expect("setting default subscriber failed");
//!
//!     let tcp_stream = match TcpStream::connect("127.0.0.1:9000").await {
//!         Ok(tcp_stream) => tcp_stream,
//!         Err(e) => {
//!             error!(cause = %e, "connect php-fpm error");
//!             return;
//!         }
//!     };
//!
//!     let (reader, writer) = tcp_stream.into_split();
//!     let config = ClientConfig { keep_conn: true, ..ClientConfig::default() };
//!     let mut client = FcgiClient::with_config(reader, writer, config);
//!
//!     let params = [
//!         ("SCRIPT_NAME", "/status"),
//!         ("SCRIPT_FILENAME", "/status"),
//!         ("REQUEST_METHOD", "GET"),
//!     ];
//!     match client.request(params, b"").await {
//!         Ok(response) => {
//!             info!(app_status = response.app_status(), "request finished");
//!             println!("{}", String::from_utf8_lossy(response.stdout()));
//!         }
//!         Err(e) => error!(cause = %e, "request failed"),
//!     }
//! }
//! ```
//!
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`connection`]: The client, the shared write side and stream writers
//! - [`protocol`]: Record, body and exchange types
//! - [`codec`]: Record and name-value encoding/decoding
//!
//!
//! # Core Components
//!
//! ## Records
//!
//! Every unit on the wire is a [`protocol::Record`]: an 8-byte
//! [`protocol::RecordHeader`] followed by up to 65535 bytes of content and up
//! to 255 bytes of padding. [`codec::RecordEncoder`] writes them and
//! [`codec::RecordDecoder`] reads them back from a `FramedRead`.
//!
//! ## Writing
//!
//! [`connection::Connection`] holds the transport behind an async mutex, so a
//! record is always written whole. [`connection::StreamWriter`] and
//! [`connection::BufferedStreamWriter`] turn a byte stream into records and end
//! it with the mandatory empty record.
//!
//! ## Exchanges
//!
//! [`connection::FcgiClient`] sends `BeginRequest`, the params stream and the
//! stdin stream, then collects stdout and stderr until `EndRequest`. Each step
//! is checked by a [`protocol::Exchange`].
//!
//! ## Error Handling
//!
//! The crate uses custom error types that implement `std::error::Error`:
//!
//! - [`protocol::FcgiError`]: Top-level error type
//! - [`protocol::ParseError`]: malformed or out-of-order data from the application
//! - [`protocol::SendError`]: failures while writing a request
//!
//! # Limitations
//!
//! - One request at a time per client; the write side supports multiplexing
//!   but the client does not
//! - Only the Responder role is driven end to end
//! - No server side (accepting connections from a web server)

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
