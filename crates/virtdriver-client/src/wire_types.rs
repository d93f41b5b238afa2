//! On-wire identity tuples for domain and network objects, and the vCPU info
//! record `domain_get_vcpus` returns. These are the shapes procedure stubs
//! marshal/unmarshal; in-process handle objects are produced from them via
//! [`crate::HandleFactory`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use virtdriver_wire::xdr::{get_opaque, get_string, put_opaque, put_string};
use virtdriver_wire::{WireError, STRING_MAX, UUID_MAX};

/// A remote domain's on-wire identity: `(id, name, uuid)`. `id` is `-1` on
/// the wire when the domain has no active id (e.g. it is defined but not
/// running).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnWireDomain {
    pub id: Option<i32>,
    pub name: String,
    pub uuid: [u8; 16],
}

impl OnWireDomain {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32(self.id.unwrap_or(-1));
        put_string(buf, &self.name);
        put_opaque(buf, &self.uuid);
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        if buf.remaining() < 4 {
            return Err(WireError::IncompleteFrame);
        }
        let raw_id = buf.get_i32();
        let name = get_string(buf, STRING_MAX)?;
        let uuid = decode_uuid(buf)?;
        Ok(OnWireDomain {
            id: if raw_id < 0 { None } else { Some(raw_id) },
            name,
            uuid,
        })
    }
}

/// A remote network's on-wire identity: `(name, uuid)`. Networks have no
/// numeric id in this protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnWireNetwork {
    pub name: String,
    pub uuid: [u8; 16],
}

impl OnWireNetwork {
    pub fn encode(&self, buf: &mut BytesMut) {
        put_string(buf, &self.name);
        put_opaque(buf, &self.uuid);
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        let name = get_string(buf, STRING_MAX)?;
        let uuid = decode_uuid(buf)?;
        Ok(OnWireNetwork { name, uuid })
    }
}

fn decode_uuid(buf: &mut Bytes) -> Result<[u8; 16], WireError> {
    let raw = get_opaque(buf, UUID_MAX)?;
    let len = raw.len();
    raw.try_into()
        .map_err(|_| WireError::InvalidUuidLength(len))
}

/// One entry of a `domain_get_vcpus` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcpuInfo {
    pub number: u32,
    pub state: i32,
    pub cpu_time: u64,
    pub cpu: i32,
}

impl VcpuInfo {
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32(self.number);
        buf.put_i32(self.state);
        buf.put_u64(self.cpu_time);
        buf.put_i32(self.cpu);
    }

    pub fn decode(buf: &mut Bytes) -> Result<Self, WireError> {
        if buf.remaining() < 20 {
            return Err(WireError::IncompleteFrame);
        }
        Ok(VcpuInfo {
            number: buf.get_u32(),
            state: buf.get_i32(),
            cpu_time: buf.get_u64(),
            cpu: buf.get_i32(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_identity_round_trips_with_active_id() {
        let domain = OnWireDomain {
            id: Some(7),
            name: "web01".into(),
            uuid: [1; 16],
        };
        let mut buf = BytesMut::new();
        domain.encode(&mut buf);
        let mut frozen = buf.freeze();
        assert_eq!(OnWireDomain::decode(&mut frozen).unwrap(), domain);
    }

    #[test]
    fn domain_identity_round_trips_with_no_active_id() {
        let domain = OnWireDomain {
            id: None,
            name: "web01".into(),
            uuid: [0; 16],
        };
        let mut buf = BytesMut::new();
        domain.encode(&mut buf);
        let mut frozen = buf.freeze();
        let decoded = OnWireDomain::decode(&mut frozen).unwrap();
        assert_eq!(decoded.id, None);
    }

    #[test]
    fn vcpu_info_round_trips() {
        let info = VcpuInfo {
            number: 2,
            state: 1,
            cpu_time: 123_456,
            cpu: 3,
        };
        let mut buf = BytesMut::new();
        info.encode(&mut buf);
        let mut frozen = buf.freeze();
        assert_eq!(VcpuInfo::decode(&mut frozen).unwrap(), info);
    }
}
