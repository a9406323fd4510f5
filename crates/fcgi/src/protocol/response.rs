use bytes::Bytes;

use crate::protocol::{EndRequestBody, ProtocolStatus};

/// The collected reply of one Responder exchange.
///
/// Stdout carries the CGI response (headers and body) exactly as the application
/// produced it; interpreting it is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    request_id: u16,
    stdout: Bytes,
    stderr: Bytes,
    end: EndRequestBody,
}

impl Response {
    pub fn new(request_id: u16, stdout: Bytes, stderr: Bytes, end: EndRequestBody) -> Self {
        Self { request_id, stdout, stderr, end }
    }

    #[inline]
    pub fn request_id(&self) -> u16 {
        self.request_id
    }

    #[inline]
    pub fn stdout(&self) -> &Bytes {
        &self.stdout
    }

    #[inline]
    pub fn stderr(&self) -> &Bytes {
        &self.stderr
    }

    #[inline]
    pub fn app_status(&self) -> u32 {
        self.end.app_status()
    }

    #[inline]
    pub fn protocol_status(&self) -> ProtocolStatus {
        self.end.protocol_status()
    }

    /// Returns true if the application completed the request normally.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.end.protocol_status() == ProtocolStatus::RequestComplete
    }

    /// Consumes the response, returning `(stdout, stderr)`.
    pub fn into_parts(self) -> (Bytes, Bytes) {
        (self.stdout, self.stderr)
    }
}
