//! Primitive encode/decode helpers for the fixed external data representation.
//!
//! Strings and opaque byte arrays are length-prefixed with a `u32` and padded
//! with zero bytes up to the next 4-byte boundary, mirroring the framing
//! style of [`bytes::BufMut`]-based codecs elsewhere in this workspace.

use crate::WireError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

fn pad_len(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

pub fn put_string(buf: &mut BytesMut, s: &str) {
    put_opaque(buf, s.as_bytes());
}

pub fn get_string(buf: &mut Bytes, max_len: u32) -> Result<String, WireError> {
    let raw = get_opaque(buf, max_len)?;
    String::from_utf8(raw).map_err(|_| WireError::InvalidUtf8)
}

pub fn put_opaque(buf: &mut BytesMut, data: &[u8]) {
    buf.put_u32(data.len() as u32);
    buf.put_slice(data);
    buf.put_bytes(0, pad_len(data.len()));
}

pub fn get_opaque(buf: &mut Bytes, max_len: u32) -> Result<Vec<u8>, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::IncompleteFrame);
    }
    let declared = buf.get_u32();
    if declared > max_len {
        return Err(WireError::OpaqueTooLong {
            declared,
            max: max_len,
        });
    }
    let total = declared as usize + pad_len(declared as usize);
    if buf.remaining() < total {
        return Err(WireError::IncompleteFrame);
    }
    let data = buf.split_to(declared as usize).to_vec();
    buf.advance(pad_len(declared as usize));
    Ok(data)
}

/// Validate a declared list length against the protocol ceiling for that list.
///
/// Used by procedure stubs per spec rule 4.5/4: a declared length above the
/// ceiling is rejected before any element is decoded.
pub fn check_list_len(declared: u32, ceiling: u32) -> Result<(), WireError> {
    if declared > ceiling {
        Err(WireError::ListTooLong { declared, ceiling })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_round_trip_with_padding() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "qemu");
        // 4 bytes len + 4 bytes payload ("qemu" is already a multiple of 4)
        assert_eq!(buf.len(), 8);

        let mut frozen = buf.freeze();
        let s = get_string(&mut frozen, 256).unwrap();
        assert_eq!(s, "qemu");
        assert_eq!(frozen.remaining(), 0);
    }

    #[test]
    fn string_round_trip_needs_padding() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "abc"); // 3 bytes -> 1 byte pad
        assert_eq!(buf.len(), 4 + 4);

        let mut frozen = buf.freeze();
        assert_eq!(get_string(&mut frozen, 256).unwrap(), "abc");
    }

    #[test]
    fn string_over_declared_max_is_rejected() {
        let mut buf = BytesMut::new();
        put_string(&mut buf, "this string is too long");
        let mut frozen = buf.freeze();
        assert_eq!(
            get_string(&mut frozen, 4).unwrap_err(),
            WireError::OpaqueTooLong {
                declared: 24,
                max: 4
            }
        );
    }

    #[test]
    fn list_len_ceiling() {
        assert!(check_list_len(10, 16).is_ok());
        assert_eq!(
            check_list_len(17, 16).unwrap_err(),
            WireError::ListTooLong {
                declared: 17,
                ceiling: 16
            }
        );
    }
}
