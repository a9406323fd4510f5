use std::collections::HashMap;
use std::io;
use std::io::ErrorKind;

use bytes::BytesMut;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Decoder, FramedRead};
use tracing::{debug, error, info, warn};

use crate::codec::pairs::encode_pair;
use crate::codec::{PairsDecoder, RecordDecoder};
use crate::connection::{Connection, StreamWriter};
use crate::ensure;
use crate::protocol::{
    EndRequestBody, Exchange, FcgiError, ParseError, Record, RecordType, Response, Role, SendError, FLAG_KEEP_CONN, MANAGEMENT_REQUEST_ID,
    MAX_WRITE,
};

/// Default capacity of the read buffer, enough for a typical status page.
pub const DEFAULT_READ_BUFFER_CAPACITY: usize = 8 * 1024;

/// Settings of a [`FcgiClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Request id of the first exchange; must not be the management id 0.
    pub request_id: u16,
    /// Ask the application to keep the connection open between requests.
    pub keep_conn: bool,
    /// Role requested in `BeginRequest`. Only the responder role is driven by this client.
    pub role: Role,
    /// Initial capacity of the record read buffer.
    pub read_buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { request_id: 1, keep_conn: false, role: Role::Responder, read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY }
    }
}

/// A FastCGI client driving one request at a time over a connection.
///
/// `FcgiClient` writes the request through a [`Connection`] and reads the
/// reply records with a [`FramedRead`] over a [`RecordDecoder`]:
///
/// 1. `BeginRequest` with the configured role and flags
/// 2. the `Params` stream
/// 3. the `Stdin` stream
/// 4. `Stdout` / `Stderr` records until `EndRequest`
///
/// Without keep-alive the write half is shut down once the exchange is over,
/// and the client refuses further requests.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct FcgiClient<R, W> {
    framed_read: FramedRead<R, RecordDecoder>,
    connection: Connection<W>,
    config: ClientConfig,
    next_request_id: u16,
    closed: bool,
}

impl<R, W> FcgiClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, ClientConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: ClientConfig) -> Self {
        let next_request_id = if config.request_id == MANAGEMENT_REQUEST_ID { 1 } else { config.request_id };
        Self {
            framed_read: FramedRead::with_capacity(reader, RecordDecoder::new(), config.read_buffer_capacity),
            connection: Connection::new(writer),
            config,
            next_request_id,
            closed: false,
        }
    }

    /// The write side, e.g. to abort the current request from another task.
    #[inline]
    pub fn connection(&self) -> &Connection<W> {
        &self.connection
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Request id the next call to [`request`](Self::request) will use.
    #[inline]
    pub fn next_request_id(&self) -> u16 {
        self.next_request_id
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Runs one complete Responder exchange.
    ///
    /// `params` become the CGI environment of the request, `stdin` its body.
    /// Stdout and stderr are collected until the application ends the request.
    ///
    /// # Errors
    ///
    /// - [`SendError::ConnectionClosed`] if a previous exchange closed the connection
    /// - any [`SendError`] raised while writing the request
    /// - [`ParseError`] for malformed or out-of-order replies, including a
    ///   transport EOF before `EndRequest`
    pub async fn request<I, K, V>(&mut self, params: I, stdin: &[u8]) -> Result<Response, FcgiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        ensure!(!self.closed, SendError::ConnectionClosed.into());

        let mut exchange = Exchange::new(self.next_request_id, self.config.keep_conn);
        let request_id = exchange.request_id();
        debug!(request_id, keep_conn = self.config.keep_conn, "begin fcgi request");

        let result = self.do_request(&mut exchange, params, stdin).await;

        // a failed exchange is never reused, even if it reached `EndRequest`
        if result.is_ok() && exchange.is_reusable() {
            self.next_request_id = exchange.next_request_id();
        } else {
            self.shutdown().await;
        }

        if let Err(e) = &result {
            error!(request_id, cause = %e, "fcgi request failed");
        }
        result
    }

    async fn do_request<I, K, V>(&mut self, exchange: &mut Exchange, params: I, stdin: &[u8]) -> Result<Response, FcgiError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request_id = exchange.request_id();
        let flags = if self.config.keep_conn { FLAG_KEEP_CONN } else { 0 };

        self.connection.write_begin_request(request_id, self.config.role, flags).await?;
        exchange.on_send(RecordType::BeginRequest, false)?;

        self.connection.write_pairs(RecordType::Params, request_id, params).await?;
        exchange.on_send(RecordType::Params, true)?;

        let mut stdin_writer = StreamWriter::new(&self.connection, RecordType::Stdin, request_id);
        stdin_writer.write(stdin).await?;
        stdin_writer.close().await?;
        exchange.on_send(RecordType::Stdin, true)?;

        let mut stdout = BytesMut::new();
        let mut stderr = BytesMut::new();
        loop {
            let record = self.next_record().await?;
            exchange.on_receive(record.header())?;

            match record.record_type() {
                RecordType::Stdout => stdout.extend_from_slice(record.content()),
                RecordType::Stderr => {
                    if !record.is_empty() {
                        warn!(request_id, len = record.content().len(), "fcgi application wrote to stderr");
                    }
                    stderr.extend_from_slice(record.content());
                }
                RecordType::EndRequest => {
                    let end = EndRequestBody::decode(record.content())?;
                    debug!(request_id, app_status = end.app_status(), protocol_status = ?end.protocol_status(), "end fcgi request");
                    return Ok(Response::new(request_id, stdout.freeze(), stderr.freeze(), end));
                }
                other => return Err(ParseError::unexpected_record(format!("{other:?} in responder reply")).into()),
            }
        }
    }

    /// Queries management variables such as `FCGI_MAX_CONNS` with a `GetValues` record.
    ///
    /// Variables the application does not know are simply absent from the result.
    pub async fn get_values<I, S>(&mut self, names: I) -> Result<HashMap<String, String>, FcgiError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ensure!(!self.closed, SendError::ConnectionClosed.into());

        let mut content = BytesMut::new();
        for name in names {
            encode_pair(&mut content, name.as_ref(), "")?;
        }
        ensure!(
            content.len() <= MAX_WRITE,
            SendError::invalid_params(format!("get values query of {} bytes exceeds one record", content.len())).into()
        );

        self.connection.write_record(RecordType::GetValues, MANAGEMENT_REQUEST_ID, &content).await?;

        let record = self.next_record().await?;
        if record.request_id() != MANAGEMENT_REQUEST_ID || record.record_type() != RecordType::GetValuesResult {
            return Err(ParseError::unexpected_record(format!(
                "{:?} for request {} while waiting for get values result",
                record.record_type(),
                record.request_id()
            ))
            .into());
        }

        let mut src = BytesMut::from(record.content());
        let mut values = HashMap::new();
        let mut decoder = PairsDecoder::new();
        while let Some((name, value)) = decoder.decode(&mut src)? {
            values.insert(name, value);
        }
        if !src.is_empty() {
            warn!(remaining = src.len(), "truncated pair in get values result");
        }

        Ok(values)
    }

    /// Shuts the write half down and marks the client closed.
    pub async fn close(mut self) -> Result<(), SendError> {
        ensure!(!self.closed, SendError::ConnectionClosed);
        self.closed = true;
        self.connection.close().await
    }

    async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.connection.close().await {
            warn!(cause = %e, "failed to close fcgi connection");
        } else {
            info!("fcgi exchange finished, connection shutdown");
        }
    }

    async fn next_record(&mut self) -> Result<Record, ParseError> {
        match self.framed_read.next().await {
            Some(result) => result,
            None => Err(ParseError::io(io::Error::new(ErrorKind::UnexpectedEof, "connection closed before end of request"))),
        }
    }
}
