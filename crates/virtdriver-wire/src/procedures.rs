//! Protocol constants: program number, protocol version, procedure numbers,
//! and the list-length ceilings each list-returning procedure enforces.
//!
//! Values are arbitrary but fixed for this protocol family — they only need
//! to agree between this crate and whatever speaks the other end of the
//! wire, the same way the upstream driver's own `REMOTE_PROGRAM` and
//! `remote_procedure` enum are fixed by the `.x` protocol description they
//! were compiled from.

pub const PROGRAM: u32 = 0x2000_0000;
pub const PROTOCOL_VERSION: u32 = 1;

pub mod procedure {
    pub const OPEN: u32 = 1;
    pub const CLOSE: u32 = 2;
    pub const GET_TYPE: u32 = 3;
    pub const LIST_DOMAINS: u32 = 4;
    pub const DOMAIN_LOOKUP_BY_NAME: u32 = 5;
    pub const DOMAIN_GET_VCPUS: u32 = 6;
    pub const DOMAIN_SUSPEND: u32 = 7;
    pub const DOMAIN_RESUME: u32 = 8;
    pub const NETWORK_LOOKUP_BY_NAME: u32 = 9;
}

/// Ceiling on the number of domain names a single `list_domains` reply may
/// declare.
pub const DOMAIN_LIST_MAX: u32 = 16_384;

/// Ceiling on `maxinfo` (the number of `vir_vcpu_info` records) a single
/// `domain_get_vcpus` call may request.
pub const VCPUINFO_MAX: u32 = 2_048;

/// Ceiling on the total size, in bytes, of the CPU affinity bitmap
/// (`maxinfo * maplen`) a single `domain_get_vcpus` call may request.
pub const CPUMAPS_MAX: u32 = 16_384;

/// Maximum length, in bytes, of a single name string (domain, network,
/// hypervisor type) carried anywhere in this protocol.
pub const STRING_MAX: u32 = 1_024;

/// Maximum length, in bytes, of a UUID opaque field.
pub const UUID_MAX: u32 = 16;
