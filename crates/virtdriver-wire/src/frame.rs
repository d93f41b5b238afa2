//! Length-prefixed framing: a 4-byte big-endian, self-inclusive length word
//! followed by a header and payload already encoded by the caller.
//!
//! Grounded on the multiplexer frame codec elsewhere in this workspace
//! (stream-id/type/flags/length header over [`bytes::BytesMut`]), adapted to
//! the single self-inclusive length word this protocol uses instead of a
//! fixed-size typed header.

use crate::WireError;
use bytes::{BufMut, Bytes, BytesMut};

pub const LENGTH_PREFIX_LEN: usize = 4;

/// Ceiling on a frame's total encoded size, length word included.
pub const MAX_MESSAGE: u32 = 262_144;

/// Encode a complete frame: length prefix (self-inclusive) followed by `body`.
///
/// `body` is expected to already contain the encoded header plus payload.
pub fn encode_frame(body: &[u8]) -> Result<Bytes, WireError> {
    let length = body.len() as u32 + LENGTH_PREFIX_LEN as u32;
    if length > MAX_MESSAGE {
        return Err(WireError::FrameTooLarge(length));
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body.len());
    buf.put_u32(length);
    buf.put_slice(body);
    Ok(buf.freeze())
}

/// Decode a length prefix already read off the wire into a payload length.
///
/// Returns the number of bytes that remain to be read after the length word
/// (i.e. `length - 4`). Rejects `length < 4` (the word cannot even describe
/// itself) and `length > MAX_MESSAGE`.
pub fn decode_length_prefix(raw: [u8; LENGTH_PREFIX_LEN]) -> Result<u32, WireError> {
    let length = u32::from_be_bytes(raw);
    if length < LENGTH_PREFIX_LEN as u32 || length > MAX_MESSAGE {
        return Err(WireError::InvalidLength(length));
    }
    Ok(length - LENGTH_PREFIX_LEN as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_prefix_is_self_inclusive() {
        let body = vec![0u8; 20];
        let frame = encode_frame(&body).unwrap();
        let prefix: [u8; 4] = frame[0..4].try_into().unwrap();
        let total = u32::from_be_bytes(prefix);
        assert_eq!(total as usize, frame.len());
        assert_eq!(total, 24);
    }

    #[test]
    fn rejects_length_below_minimum() {
        assert_eq!(
            decode_length_prefix(3u32.to_be_bytes()),
            Err(WireError::InvalidLength(3))
        );
    }

    #[test]
    fn rejects_length_above_ceiling() {
        let raw = (MAX_MESSAGE + 1).to_be_bytes();
        assert_eq!(
            decode_length_prefix(raw),
            Err(WireError::InvalidLength(MAX_MESSAGE + 1))
        );
    }

    #[test]
    fn round_trips_valid_length() {
        let raw = 100u32.to_be_bytes();
        assert_eq!(decode_length_prefix(raw).unwrap(), 96);
    }

    #[test]
    fn frame_over_max_message_is_rejected() {
        let body = vec![0u8; MAX_MESSAGE as usize];
        assert_eq!(
            encode_frame(&body).unwrap_err(),
            WireError::FrameTooLarge(MAX_MESSAGE + 4)
        );
    }
}
