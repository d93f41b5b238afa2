//! Procedure stubs: bound-check, marshal, call, unmarshal, translate.
//!
//! Every stub follows the same shape and no other logic — see each
//! function's body rather than a shared abstraction; there are only a
//! handful of these and a generic "marshal/unmarshal" trait would hide more
//! than it would save.

use crate::connection::Connection;
use crate::error::DriverError;
use crate::handles::HandleFactory;
use crate::wire_types::{OnWireDomain, OnWireNetwork, VcpuInfo};
use bytes::{Buf, BufMut, BytesMut};
use virtdriver_wire::xdr::{check_list_len, get_string, put_string};
use virtdriver_wire::{procedure, CPUMAPS_MAX, DOMAIN_LIST_MAX, STRING_MAX, VCPUINFO_MAX};

impl Connection {
    /// List up to `maxids` domain names. `maxids` above the protocol
    /// ceiling is rejected before any network traffic; a reply declaring
    /// more names than either bound is rejected too and its storage
    /// released.
    pub async fn list_domains(&mut self, maxids: u32) -> Result<Vec<String>, DriverError> {
        if maxids > DOMAIN_LIST_MAX {
            return Err(DriverError::InvalidArg(format!(
                "maxids {maxids} exceeds protocol ceiling {DOMAIN_LIST_MAX}"
            )));
        }

        let mut args = BytesMut::new();
        args.put_u32(maxids);
        let mut reply = self.rpc_call(procedure::LIST_DOMAINS, &args).await?;

        if reply.remaining() < 4 {
            return Err(DriverError::Rpc("truncated list_domains reply".to_string()));
        }
        let declared = reply.get_u32();
        check_list_len(declared, maxids.min(DOMAIN_LIST_MAX))
            .map_err(|e| DriverError::Rpc(e.to_string()))?;

        let mut names = Vec::with_capacity(declared as usize);
        for _ in 0..declared {
            names.push(get_string(&mut reply, STRING_MAX)?);
        }
        Ok(names)
    }

    /// Look up a domain by name and translate its on-wire identity into a
    /// host-library handle via `factory`.
    pub async fn domain_lookup_by_name<F: HandleFactory>(
        &mut self,
        factory: &F,
        name: &str,
    ) -> Result<F::Domain, DriverError> {
        let mut args = BytesMut::new();
        put_string(&mut args, name);
        let mut reply = self
            .rpc_call(procedure::DOMAIN_LOOKUP_BY_NAME, &args)
            .await?;
        let domain = OnWireDomain::decode(&mut reply)?;
        Ok(factory.domain_handle(domain.name, domain.uuid, domain.id))
    }

    /// Look up a virtual network by name and translate it via `factory`.
    pub async fn network_lookup_by_name<F: HandleFactory>(
        &mut self,
        factory: &F,
        name: &str,
    ) -> Result<F::Network, DriverError> {
        let mut args = BytesMut::new();
        put_string(&mut args, name);
        let mut reply = self
            .rpc_call(procedure::NETWORK_LOOKUP_BY_NAME, &args)
            .await?;
        let network = OnWireNetwork::decode(&mut reply)?;
        Ok(factory.network_handle(network.name, network.uuid))
    }

    /// Per-vCPU state for up to `maxinfo` vCPUs, plus a CPU affinity bitmap
    /// of `maxinfo * maplen` bytes. Both `maxinfo` and the product are
    /// bounds-checked against the protocol ceiling before any network
    /// traffic, mirroring the upstream driver's own doubled check.
    pub async fn domain_get_vcpus(
        &mut self,
        domain: &OnWireDomain,
        maxinfo: u32,
        maplen: u32,
    ) -> Result<(Vec<VcpuInfo>, Vec<u8>), DriverError> {
        if maxinfo > VCPUINFO_MAX {
            return Err(DriverError::InvalidArg(format!(
                "maxinfo {maxinfo} exceeds protocol ceiling {VCPUINFO_MAX}"
            )));
        }
        let total_map_bytes = maxinfo.checked_mul(maplen).ok_or_else(|| {
            DriverError::InvalidArg("maxinfo * maplen overflows u32".to_string())
        })?;
        if total_map_bytes > CPUMAPS_MAX {
            return Err(DriverError::InvalidArg(format!(
                "maxinfo * maplen {total_map_bytes} exceeds protocol ceiling {CPUMAPS_MAX}"
            )));
        }

        let mut args = BytesMut::new();
        domain.encode(&mut args);
        args.put_u32(maxinfo);
        args.put_u32(maplen);
        let mut reply = self.rpc_call(procedure::DOMAIN_GET_VCPUS, &args).await?;

        if reply.remaining() < 4 {
            return Err(DriverError::Rpc("truncated domain_get_vcpus reply".to_string()));
        }
        let declared_nr = reply.get_u32();
        check_list_len(declared_nr, maxinfo).map_err(|e| DriverError::Rpc(e.to_string()))?;
        let mut infos = Vec::with_capacity(declared_nr as usize);
        for _ in 0..declared_nr {
            infos.push(VcpuInfo::decode(&mut reply)?);
        }

        if reply.remaining() < 4 {
            return Err(DriverError::Rpc("truncated cpumaps in domain_get_vcpus reply".to_string()));
        }
        let declared_map_len = reply.get_u32();
        check_list_len(declared_map_len, total_map_bytes)
            .map_err(|e| DriverError::Rpc(e.to_string()))?;
        if reply.remaining() < declared_map_len as usize {
            return Err(DriverError::Rpc("truncated cpumaps in domain_get_vcpus reply".to_string()));
        }
        let cpumaps = reply.split_to(declared_map_len as usize).to_vec();

        Ok((infos, cpumaps))
    }

    pub async fn domain_suspend(&mut self, domain: &OnWireDomain) -> Result<(), DriverError> {
        let mut args = BytesMut::new();
        domain.encode(&mut args);
        self.rpc_call(procedure::DOMAIN_SUSPEND, &args).await?;
        Ok(())
    }

    pub async fn domain_resume(&mut self, domain: &OnWireDomain) -> Result<(), DriverError> {
        let mut args = BytesMut::new();
        domain.encode(&mut args);
        self.rpc_call(procedure::DOMAIN_RESUME, &args).await?;
        Ok(())
    }
}
