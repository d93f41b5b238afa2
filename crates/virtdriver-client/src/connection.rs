//! Connection state machine: one per open connection, exclusively owning its
//! channel and RPC engine.

use crate::error::{is_framing_fault, DriverError};
use bytes::{Bytes, BytesMut};
use once_cell::sync::OnceCell;
use tokio::io::AsyncWriteExt;
use virtdriver_rpc::RpcEngine;
use virtdriver_tls::TlsPaths;
use virtdriver_transport::Channel;
use virtdriver_uri::ParseOutcome;
use virtdriver_wire::xdr::{get_string, put_string};
use virtdriver_wire::{procedure, PROGRAM, PROTOCOL_VERSION, STRING_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Open,
    Closed,
}

/// Outcome of [`Connection::open`], mirroring the three-way contract of
/// [`virtdriver_uri::parse`]: declining a URI is not an error, it just means
/// another driver owns it.
pub enum OpenOutcome {
    Decline,
    Connected(Connection),
}

impl std::fmt::Debug for OpenOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpenOutcome::Decline => f.write_str("OpenOutcome::Decline"),
            OpenOutcome::Connected(_) => f.write_str("OpenOutcome::Connected(..)"),
        }
    }
}

pub struct Connection {
    engine: RpcEngine<Box<dyn Channel>>,
    uses_tls: bool,
    cached_type: OnceCell<String>,
    liveness: Liveness,
}

impl Connection {
    /// Parse `uri`, dial the selected transport, and perform the open-time
    /// call. The connection's private state is installed on the returned
    /// handle only after that call succeeds; an error here refers to no
    /// handle at all, since none yet exists.
    pub async fn open(uri: &str, tls_paths: &TlsPaths) -> Result<OpenOutcome, DriverError> {
        let params = match virtdriver_uri::parse(uri)? {
            ParseOutcome::Decline => return Ok(OpenOutcome::Decline),
            ParseOutcome::Accept(params) => params,
        };

        let dialed = virtdriver_transport::dial(&params, tls_paths).await?;
        let mut engine = RpcEngine::new(dialed.channel);

        let mut args = BytesMut::new();
        put_string(&mut args, &params.forwarded_name);
        engine
            .call(PROGRAM, PROTOCOL_VERSION, procedure::OPEN, &args)
            .await
            .map_err(DriverError::from)?;

        Ok(OpenOutcome::Connected(Connection {
            engine,
            uses_tls: dialed.uses_tls,
            cached_type: OnceCell::new(),
            liveness: Liveness::Open,
        }))
    }

    pub fn uses_encryption(&self) -> bool {
        self.uses_tls
    }

    pub fn is_open(&self) -> bool {
        self.liveness == Liveness::Open
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.liveness == Liveness::Closed {
            return Err(DriverError::InvalidArg("closed handle".to_string()));
        }
        Ok(())
    }

    /// Issue one RPC call on this connection's program/version, applying the
    /// "framing faults close the connection" rule uniformly. Every
    /// procedure stub goes through this instead of calling the engine
    /// directly.
    pub(crate) async fn rpc_call(
        &mut self,
        procedure: u32,
        args: &[u8],
    ) -> Result<Bytes, DriverError> {
        self.ensure_open()?;
        match self.engine.call(PROGRAM, PROTOCOL_VERSION, procedure, args).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                if is_framing_fault(&e) {
                    self.liveness = Liveness::Closed;
                }
                Err(DriverError::from(e))
            }
        }
    }

    /// The server's hypervisor type string. Fetched on first call and
    /// retained for the life of the connection — the accessor's contract is
    /// a stable reference, which forces caching.
    pub async fn get_type(&mut self) -> Result<&str, DriverError> {
        self.ensure_open()?;
        if self.cached_type.get().is_none() {
            let mut reply = self.rpc_call(procedure::GET_TYPE, &[]).await?;
            let type_str = get_string(&mut reply, STRING_MAX)?;
            // Another call can't have raced this one in: Connection methods
            // never run concurrently with each other (see the crate's
            // concurrency model), so `set` cannot fail here.
            let _ = self.cached_type.set(type_str);
        }
        Ok(self
            .cached_type
            .get()
            .expect("populated immediately above"))
    }

    /// Best-effort close: issue the close RPC, shut down the channel
    /// (rustls sends `close_notify` as part of its `AsyncWrite::shutdown`),
    /// and drop the cached type. Every step runs even if an earlier one
    /// failed; the first error is what's reported.
    pub async fn close(&mut self) -> Result<(), DriverError> {
        if self.liveness == Liveness::Closed {
            return Ok(());
        }

        let mut first_err = None;
        if let Err(e) = self.rpc_call(procedure::CLOSE, &[]).await {
            first_err.get_or_insert(e);
        }
        if let Err(e) = self.engine.stream_mut().shutdown().await {
            first_err.get_or_insert(DriverError::SystemError(e.to_string()));
        }

        self.cached_type = OnceCell::new();
        self.liveness = Liveness::Closed;

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
