//! Connection state machine, procedure stubs, and driver registration for
//! the remote virtualization management protocol's client core.
//!
//! This is the crate a host management library links against: it owns
//! nothing about `url`, `rustls`, or raw sockets directly — those live one
//! layer down, in `virtdriver-uri`, `virtdriver-tls`, `virtdriver-transport`,
//! and `virtdriver-rpc`. This crate's job is the connection lifecycle and
//! the error taxonomy every caller actually sees.

mod connection;
mod error;
mod handles;
mod registration;
mod stubs;
mod wire_types;

pub use connection::{Connection, OpenOutcome};
pub use error::DriverError;
pub use handles::HandleFactory;
pub use registration::{HypervisorDriver, NetworkDriver};
pub use wire_types::{OnWireDomain, OnWireNetwork, VcpuInfo};

pub use virtdriver_tls::TlsPaths;
