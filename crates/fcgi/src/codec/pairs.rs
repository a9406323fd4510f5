//! Name-value pair codec used by `Params`, `GetValues` and `GetValuesResult`.
//!
//! Each pair is written as `(name length, value length, name, value)`. A
//! length up to 127 takes one byte; a larger one takes four bytes, big-endian,
//! with the top bit set as the long form marker. Lengths must fit in 31 bits.
//!
//! Decoding never treats a truncated buffer as an error: [`read_size`] returns
//! `(0, 0)`, [`read_string`] returns an empty string and [`PairsDecoder`]
//! returns `Ok(None)`, so the caller appends more input and tries again.

use std::borrow::Cow;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::protocol::{ParseError, SendError};

/// Largest length that fits in the single byte form.
const MAX_SHORT_SIZE: u32 = 127;

/// Largest length representable in the four byte form.
pub const MAX_PAIR_SIZE: u32 = (1 << 31) - 1;

const LONG_FORM_MARKER: u32 = 1 << 31;

/// Appends the encoded form of `size`, returning the number of bytes written.
///
/// # Errors
///
/// Returns [`SendError::InvalidParams`] if `size` does not fit in 31 bits.
pub fn encode_size<B: BufMut>(dst: &mut B, size: usize) -> Result<usize, SendError> {
    let size = u32::try_from(size)
        .ok()
        .filter(|size| *size <= MAX_PAIR_SIZE)
        .ok_or_else(|| SendError::invalid_params(format!("pair length {size} exceeds the limit {MAX_PAIR_SIZE}")))?;

    if size > MAX_SHORT_SIZE {
        dst.put_u32(size | LONG_FORM_MARKER);
        Ok(4)
    } else {
        #[allow(clippy::cast_possible_truncation, reason = "size is at most 127 here")]
        let byte = size as u8;
        dst.put_u8(byte);
        Ok(1)
    }
}

/// Appends one complete pair.
pub fn encode_pair<B: BufMut>(dst: &mut B, name: &str, value: &str) -> Result<(), SendError> {
    encode_size(dst, name.len())?;
    encode_size(dst, value.len())?;
    dst.put_slice(name.as_bytes());
    dst.put_slice(value.as_bytes());
    Ok(())
}

/// Reads a length field, returning `(size, bytes consumed)`.
///
/// `(0, 0)` means the buffer does not yet hold the whole field.
pub fn read_size(src: &[u8]) -> (u32, usize) {
    let Some(&first) = src.first() else {
        return (0, 0);
    };

    if u32::from(first) & 0x80 == 0 {
        return (u32::from(first), 1);
    }

    if src.len() < 4 {
        return (0, 0);
    }
    let size = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) & !LONG_FORM_MARKER;
    (size, 4)
}

/// Reads `size` bytes as a string, or an empty string if `src` is shorter than that.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
pub fn read_string(src: &[u8], size: u32) -> Cow<'_, str> {
    match usize::try_from(size).ok().and_then(|size| src.get(..size)) {
        Some(bytes) => String::from_utf8_lossy(bytes),
        None => Cow::Borrowed(""),
    }
}

/// Decodes a stream of pairs, one `(name, value)` per call.
#[derive(Debug, Default)]
pub struct PairsDecoder;

impl PairsDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for PairsDecoder {
    type Item = (String, String);
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let (name_len, name_field) = read_size(src);
        if name_field == 0 {
            return Ok(None);
        }

        let (value_len, value_field) = read_size(&src[name_field..]);
        if value_field == 0 {
            return Ok(None);
        }

        let head = name_field + value_field;
        let (name_len, value_len) = (name_len as usize, value_len as usize);
        if src.len() < head + name_len + value_len {
            return Ok(None);
        }

        src.advance(head);
        let name = src.split_to(name_len);
        let value = src.split_to(value_len);
        let pair = (String::from_utf8_lossy(&name).into_owned(), String::from_utf8_lossy(&value).into_owned());

        trace!(name = %pair.0, value_len, "decoded pair");
        Ok(Some(pair))
    }
}
