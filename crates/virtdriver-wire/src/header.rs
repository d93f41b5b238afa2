//! The fixed 24-byte call/reply header.

use crate::WireError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const HEADER_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Direction {
    Call = 0,
    Reply = 1,
}

impl TryFrom<u32> for Direction {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Call),
            1 => Ok(Direction::Reply),
            other => Err(WireError::UnknownDirection(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    Error = 1,
}

impl TryFrom<u32> for Status {
    type Error = WireError;

    fn try_from(value: u32) -> Result<Self, <Status as TryFrom<u32>>::Error> {
        match value {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Error),
            other => Err(WireError::UnknownStatus(other)),
        }
    }
}

/// The header present in every call and every reply.
///
/// `direction` and `status` are kept as raw `u32` here rather than the typed
/// enums above: an unrecognised value must still round-trip through encoding
/// so the RPC layer can report "unknown status (received %x)" with the raw
/// value, matching the upstream driver's diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub program: u32,
    pub version: u32,
    pub procedure: u32,
    pub direction: u32,
    pub serial: u32,
    pub status: u32,
}

impl Header {
    pub fn call(program: u32, version: u32, procedure: u32, serial: u32) -> Self {
        Header {
            program,
            version,
            procedure,
            direction: Direction::Call as u32,
            serial,
            status: Status::Ok as u32,
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.program);
        buf.put_u32(self.version);
        buf.put_u32(self.procedure);
        buf.put_u32(self.direction);
        buf.put_u32(self.serial);
        buf.put_u32(self.status);
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        if buf.remaining() < HEADER_LEN {
            return Err(WireError::IncompleteFrame);
        }
        Ok(Header {
            program: buf.get_u32(),
            version: buf.get_u32(),
            procedure: buf.get_u32(),
            direction: buf.get_u32(),
            serial: buf.get_u32(),
            status: buf.get_u32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let header = Header::call(0x2000_0000, 1, 42, 7);
        let mut buf = BytesMut::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);

        let mut frozen = buf.freeze();
        let decoded = Header::decode(&mut frozen).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn direction_try_from_rejects_unknown() {
        assert_eq!(Direction::try_from(0), Ok(Direction::Call));
        assert_eq!(Direction::try_from(1), Ok(Direction::Reply));
        assert_eq!(
            Direction::try_from(2),
            Err(WireError::UnknownDirection(2))
        );
    }
}
