//! Fixed external data representation used by the remote driver wire protocol.
//!
//! Every integer is big-endian. Variable-length data (strings, opaque byte
//! arrays) is length-prefixed and padded to a 4-byte boundary. This module has
//! no knowledge of sockets or async I/O — it only encodes and decodes bytes
//! already in memory. Framing on top of a byte stream lives in [`frame`].

pub mod error;
pub mod frame;
pub mod header;
pub mod procedures;
pub mod xdr;

pub use error::StructuredError;
pub use frame::{decode_length_prefix, encode_frame, LENGTH_PREFIX_LEN, MAX_MESSAGE};
pub use header::{Direction, Header, Status, HEADER_LEN};
pub use procedures::{procedure, CPUMAPS_MAX, DOMAIN_LIST_MAX, PROGRAM, PROTOCOL_VERSION, STRING_MAX, UUID_MAX, VCPUINFO_MAX};

use thiserror::Error;

/// Errors raised while encoding or decoding the wire representation itself.
///
/// Distinct from the RPC-level errors in `virtdriver-rpc`: this crate only
/// ever sees bytes already read from (or about to be written to) a channel.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("frame too large: {0} bytes exceeds MAX_MESSAGE")]
    FrameTooLarge(u32),

    #[error("invalid frame length word: {0}")]
    InvalidLength(u32),

    #[error("incomplete frame: need more bytes than were supplied")]
    IncompleteFrame,

    #[error("string exceeds declared maximum: {declared} > {max}")]
    StringTooLong { declared: u32, max: u32 },

    #[error("opaque data exceeds declared maximum: {declared} > {max}")]
    OpaqueTooLong { declared: u32, max: u32 },

    #[error("list length {declared} exceeds ceiling {ceiling}")]
    ListTooLong { declared: u32, ceiling: u32 },

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("uuid field is {0} bytes, expected 16")]
    InvalidUuidLength(usize),

    #[error("unknown direction value: {0}")]
    UnknownDirection(u32),

    #[error("unknown status value: {0}")]
    UnknownStatus(u32),
}
