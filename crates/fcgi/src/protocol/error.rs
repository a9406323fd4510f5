use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FcgiError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: SendError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: ParseError,
    },
}

impl FcgiError {
    /// Returns true if the failure came from the underlying transport.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::RequestError { source: SendError::Io { .. } } | Self::ResponseError { source: ParseError::Io { .. } })
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid fcgi header version: {0}")]
    InvalidVersion(u8),

    #[error("unknown fcgi record type: {0}")]
    UnknownRecordType(u8),

    #[error("invalid record body: {reason}")]
    InvalidBody { reason: String },

    #[error("unexpected record: {reason}")]
    UnexpectedRecord { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn unexpected_record<S: ToString>(str: S) -> Self {
        Self::UnexpectedRecord { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid params: {reason}")]
    InvalidParams { reason: String },

    #[error("record out of order: {reason}")]
    OutOfOrder { reason: String },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_params<S: ToString>(str: S) -> Self {
        Self::InvalidParams { reason: str.to_string() }
    }

    pub fn out_of_order<S: ToString>(str: S) -> Self {
        Self::OutOfOrder { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
