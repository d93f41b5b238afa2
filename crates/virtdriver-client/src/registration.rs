//! Driver registration: two dispatch tables published to the host library
//! at process startup, one for hypervisor operations and one for virtual
//! network operations.
//!
//! The upstream driver publishes these as structs of C function pointers
//! with absent entries left null. The Rust shape for "a fixed set of
//! operations, some of which this crate doesn't implement yet" is a trait
//! with default methods: an unimplemented operation simply keeps the
//! trait's default body, which fails with `InvalidArg` rather than being
//! reached through a null check. `Connection` implements both traits.
//!
//! These traits hand back on-wire identities (`OnWireDomain`/
//! `OnWireNetwork`), not host-translated handles — a real embedding chooses
//! its own point to call `Connection::domain_lookup_by_name` (or the
//! network equivalent) with a concrete `HandleFactory` when it wants a
//! handle object instead of an identity tuple.

use crate::connection::Connection;
use crate::error::DriverError;
use crate::wire_types::{OnWireDomain, OnWireNetwork, VcpuInfo};
use async_trait::async_trait;
use bytes::BytesMut;
use virtdriver_wire::procedure;
use virtdriver_wire::xdr::put_string;

fn unsupported(op: &'static str) -> DriverError {
    DriverError::InvalidArg(format!("operation not supported: {op}"))
}

#[async_trait]
pub trait HypervisorDriver: Send {
    async fn get_type(&mut self) -> Result<&str, DriverError>;
    async fn list_domains(&mut self, maxids: u32) -> Result<Vec<String>, DriverError>;
    async fn domain_lookup_by_name(&mut self, name: &str) -> Result<OnWireDomain, DriverError>;
    async fn domain_get_vcpus(
        &mut self,
        domain: &OnWireDomain,
        maxinfo: u32,
        maplen: u32,
    ) -> Result<(Vec<VcpuInfo>, Vec<u8>), DriverError>;
    async fn domain_suspend(&mut self, domain: &OnWireDomain) -> Result<(), DriverError>;
    async fn domain_resume(&mut self, domain: &OnWireDomain) -> Result<(), DriverError>;

    async fn domain_create(&mut self, _xml: &str) -> Result<OnWireDomain, DriverError> {
        Err(unsupported("domain_create"))
    }
    async fn domain_destroy(&mut self, _domain: &OnWireDomain) -> Result<(), DriverError> {
        Err(unsupported("domain_destroy"))
    }
    async fn domain_save(&mut self, _domain: &OnWireDomain, _path: &str) -> Result<(), DriverError> {
        Err(unsupported("domain_save"))
    }
}

#[async_trait]
pub trait NetworkDriver: Send {
    async fn network_lookup_by_name(&mut self, name: &str) -> Result<OnWireNetwork, DriverError>;

    async fn network_create(&mut self, _xml: &str) -> Result<OnWireNetwork, DriverError> {
        Err(unsupported("network_create"))
    }
    async fn network_destroy(&mut self, _network: &OnWireNetwork) -> Result<(), DriverError> {
        Err(unsupported("network_destroy"))
    }
}

#[async_trait]
impl HypervisorDriver for Connection {
    async fn get_type(&mut self) -> Result<&str, DriverError> {
        Connection::get_type(self).await
    }

    async fn list_domains(&mut self, maxids: u32) -> Result<Vec<String>, DriverError> {
        Connection::list_domains(self, maxids).await
    }

    async fn domain_lookup_by_name(&mut self, name: &str) -> Result<OnWireDomain, DriverError> {
        let mut args = BytesMut::new();
        put_string(&mut args, name);
        let mut reply = self
            .rpc_call(procedure::DOMAIN_LOOKUP_BY_NAME, &args)
            .await?;
        Ok(OnWireDomain::decode(&mut reply)?)
    }

    async fn domain_get_vcpus(
        &mut self,
        domain: &OnWireDomain,
        maxinfo: u32,
        maplen: u32,
    ) -> Result<(Vec<VcpuInfo>, Vec<u8>), DriverError> {
        Connection::domain_get_vcpus(self, domain, maxinfo, maplen).await
    }

    async fn domain_suspend(&mut self, domain: &OnWireDomain) -> Result<(), DriverError> {
        Connection::domain_suspend(self, domain).await
    }

    async fn domain_resume(&mut self, domain: &OnWireDomain) -> Result<(), DriverError> {
        Connection::domain_resume(self, domain).await
    }
}

#[async_trait]
impl NetworkDriver for Connection {
    async fn network_lookup_by_name(&mut self, name: &str) -> Result<OnWireNetwork, DriverError> {
        let mut args = BytesMut::new();
        put_string(&mut args, name);
        let mut reply = self
            .rpc_call(procedure::NETWORK_LOOKUP_BY_NAME, &args)
            .await?;
        Ok(OnWireNetwork::decode(&mut reply)?)
    }
}
