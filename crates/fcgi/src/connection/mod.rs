//! FastCGI connection handling module
//!
//! This module provides the client side of a FastCGI connection: writing
//! records without interleaving, splitting streams into records, and driving
//! a complete Responder exchange.
//!
//! # Components
//!
//! - [`Connection`]: the shared write side
//!   - Serializes record writes from any number of tasks
//!   - Sends begin, end and abort requests
//!   - Writes name-value streams
//! - [`StreamWriter`] and [`BufferedStreamWriter`]: split a byte stream into
//!   records of one type and request id
//! - [`FcgiClient`]: runs a request from `BeginRequest` to `EndRequest` and
//!   collects the [`Response`](crate::protocol::Response)
//!   - Supports keep-alive connections
//!   - Queries management variables with `GetValues`

mod client;
mod fcgi_connection;
mod stream_writer;

pub use client::ClientConfig;
pub use client::FcgiClient;
pub use client::DEFAULT_READ_BUFFER_CAPACITY;
pub use fcgi_connection::Connection;
pub use stream_writer::BufferedStreamWriter;
pub use stream_writer::StreamWriter;
