//! Fixed-size record bodies of `BeginRequest` and `EndRequest`.

use crate::ensure;
use crate::protocol::ParseError;

/// Wire size of both fixed bodies.
pub const BODY_LEN: usize = 8;

/// Keep the connection open after the request ends.
pub const FLAG_KEEP_CONN: u8 = 1;

/// The role the application is asked to play for a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Role {
    Responder = 1,
    Authorizer = 2,
    Filter = 3,
}

impl TryFrom<u16> for Role {
    type Error = ParseError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Role::Responder),
            2 => Ok(Role::Authorizer),
            3 => Ok(Role::Filter),
            other => Err(ParseError::invalid_body(format!("unknown role {other}"))),
        }
    }
}

/// Protocol-level outcome reported in an `EndRequest` record.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolStatus {
    RequestComplete = 0,
    CantMultiplex = 1,
    Overloaded = 2,
    UnknownRole = 3,
}

impl TryFrom<u8> for ProtocolStatus {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProtocolStatus::RequestComplete),
            1 => Ok(ProtocolStatus::CantMultiplex),
            2 => Ok(ProtocolStatus::Overloaded),
            3 => Ok(ProtocolStatus::UnknownRole),
            other => Err(ParseError::invalid_body(format!("unknown protocol status {other}"))),
        }
    }
}

/// Body of a `BeginRequest` record: role u16, flags u8, 5 reserved bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BeginRequestBody {
    role: Role,
    flags: u8,
}

impl BeginRequestBody {
    pub fn new(role: Role, flags: u8) -> Self {
        Self { role, flags }
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    #[inline]
    pub fn keep_conn(&self) -> bool {
        self.flags & FLAG_KEEP_CONN != 0
    }

    pub fn encode(&self) -> [u8; BODY_LEN] {
        let role = (self.role as u16).to_be_bytes();
        [role[0], role[1], self.flags, 0, 0, 0, 0, 0]
    }

    pub fn decode(content: &[u8]) -> Result<Self, ParseError> {
        ensure!(content.len() == BODY_LEN, ParseError::invalid_body("invalid begin request record"));
        let role = Role::try_from(u16::from_be_bytes([content[0], content[1]]))?;
        Ok(Self { role, flags: content[2] })
    }
}

/// Body of an `EndRequest` record: app status u32, protocol status u8, 3 reserved bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EndRequestBody {
    app_status: u32,
    protocol_status: ProtocolStatus,
}

impl EndRequestBody {
    pub fn new(app_status: u32, protocol_status: ProtocolStatus) -> Self {
        Self { app_status, protocol_status }
    }

    #[inline]
    pub fn app_status(&self) -> u32 {
        self.app_status
    }

    #[inline]
    pub fn protocol_status(&self) -> ProtocolStatus {
        self.protocol_status
    }

    pub fn encode(&self) -> [u8; BODY_LEN] {
        let status = self.app_status.to_be_bytes();
        [status[0], status[1], status[2], status[3], self.protocol_status as u8, 0, 0, 0]
    }

    pub fn decode(content: &[u8]) -> Result<Self, ParseError> {
        ensure!(content.len() == BODY_LEN, ParseError::invalid_body("invalid end request record"));
        let app_status = u32::from_be_bytes([content[0], content[1], content[2], content[3]]);
        let protocol_status = ProtocolStatus::try_from(content[4])?;
        Ok(Self { app_status, protocol_status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_request_layout() {
        let body = BeginRequestBody::new(Role::Responder, FLAG_KEEP_CONN);
        assert_eq!(body.encode(), [0, 1, 1, 0, 0, 0, 0, 0]);

        let decoded = BeginRequestBody::decode(&body.encode()).unwrap();
        assert_eq!(decoded.role(), Role::Responder);
        assert!(decoded.keep_conn());
    }

    #[test]
    fn test_begin_request_wrong_length() {
        assert!(matches!(BeginRequestBody::decode(&[0, 1, 0]), Err(ParseError::InvalidBody { .. })));
        assert!(matches!(BeginRequestBody::decode(&[0; 9]), Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn test_end_request_layout() {
        let body = EndRequestBody::new(0x0102_0304, ProtocolStatus::Overloaded);
        assert_eq!(body.encode(), [1, 2, 3, 4, 2, 0, 0, 0]);

        let decoded = EndRequestBody::decode(&body.encode()).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_end_request_rejects_bad_input() {
        assert!(matches!(EndRequestBody::decode(&[0; 7]), Err(ParseError::InvalidBody { .. })));
        assert!(matches!(EndRequestBody::decode(&[0, 0, 0, 0, 9, 0, 0, 0]), Err(ParseError::InvalidBody { .. })));
    }
}
