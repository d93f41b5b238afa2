//! The structured error record carried in a reply body when `status = Error`.

use crate::xdr::{get_opaque, get_string, put_opaque, put_string};
use crate::WireError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

const MAX_ERROR_STRING: u32 = 1024;

/// Mirrors the upstream driver's `remote_error`: a subsystem tag, a numeric
/// code and severity level, up to three free-form strings, two integers, a
/// human-readable message, and optional identifiers for the domain/network
/// the error concerns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredError {
    pub domain: i32,
    pub code: i32,
    pub level: i32,
    pub str1: Option<String>,
    pub str2: Option<String>,
    pub str3: Option<String>,
    pub int1: i32,
    pub int2: i32,
    pub message: Option<String>,
    pub dom_name: Option<String>,
    pub dom_uuid: Option<Vec<u8>>,
    pub net_name: Option<String>,
    pub net_uuid: Option<Vec<u8>>,
}

fn put_optional_string(buf: &mut BytesMut, s: &Option<String>) {
    match s {
        Some(s) => {
            buf.put_u32(1);
            put_string(buf, s);
        }
        None => buf.put_u32(0),
    }
}

fn get_optional_string(buf: &mut Bytes) -> Result<Option<String>, WireError> {
    if buf.remaining() < 4 {
        return Err(WireError::IncompleteFrame);
    }
    if buf.get_u32() == 0 {
        Ok(None)
    } else {
        Ok(Some(get_string(buf, MAX_ERROR_STRING)?))
    }
}

impl StructuredError {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32(self.domain);
        buf.put_i32(self.code);
        buf.put_i32(self.level);
        put_optional_string(buf, &self.str1);
        put_optional_string(buf, &self.str2);
        put_optional_string(buf, &self.str3);
        buf.put_i32(self.int1);
        buf.put_i32(self.int2);
        put_optional_string(buf, &self.message);
        put_optional_string(buf, &self.dom_name);
        match &self.dom_uuid {
            Some(uuid) => {
                buf.put_u32(1);
                put_opaque(buf, uuid);
            }
            None => buf.put_u32(0),
        }
        put_optional_string(buf, &self.net_name);
        match &self.net_uuid {
            Some(uuid) => {
                buf.put_u32(1);
                put_opaque(buf, uuid);
            }
            None => buf.put_u32(0),
        }
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        if buf.remaining() < 12 {
            return Err(WireError::IncompleteFrame);
        }
        let domain = buf.get_i32();
        let code = buf.get_i32();
        let level = buf.get_i32();
        let str1 = get_optional_string(buf)?;
        let str2 = get_optional_string(buf)?;
        let str3 = get_optional_string(buf)?;
        if buf.remaining() < 8 {
            return Err(WireError::IncompleteFrame);
        }
        let int1 = buf.get_i32();
        let int2 = buf.get_i32();
        let message = get_optional_string(buf)?;
        let dom_name = get_optional_string(buf)?;
        if buf.remaining() < 4 {
            return Err(WireError::IncompleteFrame);
        }
        let dom_uuid = if buf.get_u32() == 0 {
            None
        } else {
            Some(get_opaque(buf, 64)?)
        };
        let net_name = get_optional_string(buf)?;
        if buf.remaining() < 4 {
            return Err(WireError::IncompleteFrame);
        }
        let net_uuid = if buf.get_u32() == 0 {
            None
        } else {
            Some(get_opaque(buf, 64)?)
        };

        Ok(StructuredError {
            domain,
            code,
            level,
            str1,
            str2,
            str3,
            int1,
            int2,
            message,
            dom_name,
            dom_uuid,
            net_name,
            net_uuid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_full_record() {
        let err = StructuredError {
            domain: 5,
            code: 42,
            level: 2,
            str1: Some("detail".into()),
            str2: None,
            str3: None,
            int1: 1,
            int2: 0,
            message: Some("domain not found".into()),
            dom_name: Some("web01".into()),
            dom_uuid: Some(vec![9, 8, 7, 6]),
            net_name: Some("default".into()),
            net_uuid: Some(vec![1, 2, 3, 4]),
        };
        let mut buf = BytesMut::new();
        err.encode(&mut buf);
        let mut frozen = buf.freeze();
        assert_eq!(StructuredError::decode(&mut frozen).unwrap(), err);
    }

    #[test]
    fn round_trips_minimal_record() {
        let err = StructuredError {
            domain: 0,
            code: 1,
            level: 1,
            ..Default::default()
        };
        let mut buf = BytesMut::new();
        err.encode(&mut buf);
        let mut frozen = buf.freeze();
        assert_eq!(StructuredError::decode(&mut frozen).unwrap(), err);
    }
}
