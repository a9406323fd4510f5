//! Per-request ordering rules of a Responder exchange.
//!
//! A request moves strictly forward:
//!
//! ```text
//! Begin -> Params -> Stdin -> AwaitingResponse -> End
//! ```
//!
//! `Params` and `Stdin` are left by sending the empty record that terminates the
//! stream. While awaiting the response, `Stdout` and `Stderr` are independent
//! streams, each closed by its own empty record, and `EndRequest` finishes the
//! exchange. There is no transition back to an earlier state.

use crate::protocol::{ParseError, RecordHeader, RecordType, SendError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExchangeState {
    /// Nothing sent yet.
    Begin,
    /// `BeginRequest` sent, params stream open.
    Params,
    /// Params stream closed, stdin stream open.
    Stdin,
    /// All input sent, reading stdout/stderr.
    AwaitingResponse,
    /// `EndRequest` received.
    End,
}

#[derive(Debug, Clone)]
pub struct Exchange {
    request_id: u16,
    keep_conn: bool,
    state: ExchangeState,
    stdout_closed: bool,
    stderr_closed: bool,
}

impl Exchange {
    pub fn new(request_id: u16, keep_conn: bool) -> Self {
        Self { request_id, keep_conn, state: ExchangeState::Begin, stdout_closed: false, stderr_closed: false }
    }

    #[inline]
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    #[inline]
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.state == ExchangeState::End
    }

    /// True once the exchange has ended and the peer keeps the connection for another request.
    #[inline]
    pub fn is_reusable(&self) -> bool {
        self.is_finished() && self.keep_conn
    }

    /// Request id for the next exchange on a kept-alive connection, skipping the management id 0.
    pub fn next_request_id(&self) -> u16 {
        match self.request_id.wrapping_add(1) {
            0 => 1,
            id => id,
        }
    }

    /// Validates an outgoing record and advances the state.
    pub fn on_send(&mut self, record_type: RecordType, is_empty: bool) -> Result<(), SendError> {
        use ExchangeState::{AwaitingResponse, Begin, Params, Stdin};

        self.state = match (self.state, record_type, is_empty) {
            (Begin, RecordType::BeginRequest, _) => Params,
            (Params, RecordType::Params, false) => Params,
            (Params, RecordType::Params, true) => Stdin,
            (Stdin, RecordType::Stdin, false) => Stdin,
            (Stdin, RecordType::Stdin, true) => AwaitingResponse,
            (state @ (Params | Stdin | AwaitingResponse), RecordType::AbortRequest, _) => state,
            (state, record_type, _) => {
                return Err(SendError::out_of_order(format!(
                    "can't send {record_type:?} for request {} in state {state:?}",
                    self.request_id
                )));
            }
        };
        Ok(())
    }

    /// Validates an incoming record and advances the state.
    pub fn on_receive(&mut self, header: &RecordHeader) -> Result<(), ParseError> {
        if header.request_id() != self.request_id {
            return Err(ParseError::unexpected_record(format!(
                "{:?} for unknown request {}, expecting {}",
                header.record_type(),
                header.request_id(),
                self.request_id
            )));
        }

        if self.state != ExchangeState::AwaitingResponse {
            return Err(ParseError::unexpected_record(format!(
                "{:?} for request {} in state {:?}",
                header.record_type(),
                self.request_id,
                self.state
            )));
        }

        let is_empty = header.content_length() == 0;
        match header.record_type() {
            RecordType::Stdout => Self::advance_stream(&mut self.stdout_closed, "stdout", is_empty),
            RecordType::Stderr => Self::advance_stream(&mut self.stderr_closed, "stderr", is_empty),
            RecordType::EndRequest => {
                self.state = ExchangeState::End;
                Ok(())
            }
            other => Err(ParseError::unexpected_record(format!("{other:?} is not a responder reply"))),
        }
    }

    fn advance_stream(closed: &mut bool, name: &str, is_empty: bool) -> Result<(), ParseError> {
        if *closed {
            return Err(ParseError::unexpected_record(format!("{name} record after end of stream")));
        }
        *closed = is_empty;
        Ok(())
    }
}
