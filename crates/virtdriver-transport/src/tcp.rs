//! TCP and TLS-over-TCP dialing: resolve, iterate addresses in order, retry
//! the next address on any failure (connect or handshake).

use crate::TransportError;
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::client::TlsStream;
use virtdriver_tls::TlsPaths;
use virtdriver_uri::ConnectParams;

fn target(params: &ConnectParams) -> Result<(String, u16), TransportError> {
    let host = params.host.clone().ok_or(TransportError::HostRequired)?;
    // Tcp and Tls both declare a default_port(), so this always resolves.
    let port = params
        .port
        .or_else(|| params.transport.default_port())
        .expect("Tcp and Tls transports always have a default port");
    Ok((host, port))
}

async fn resolved_addrs(host: &str, port: u16) -> Result<Vec<std::net::SocketAddr>, TransportError> {
    let addrs: Vec<_> = lookup_host((host, port)).await?.collect();
    if addrs.is_empty() {
        return Err(TransportError::NoAddressesResolved(format!(
            "{host}:{port}"
        )));
    }
    Ok(addrs)
}

pub async fn connect(params: &ConnectParams) -> Result<TcpStream, TransportError> {
    let (host, port) = target(params)?;
    let addrs = resolved_addrs(&host, port).await?;

    let mut last_err = None;
    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%addr, error = %e, "tcp connect failed, trying next address");
                last_err = Some(e);
            }
        }
    }
    Err(last_err
        .map(TransportError::Io)
        .unwrap_or_else(|| TransportError::NoAddressesResolved(format!("{host}:{port}"))))
}

pub async fn connect_tls(
    params: &ConnectParams,
    tls_paths: &TlsPaths,
) -> Result<TlsStream<TcpStream>, TransportError> {
    let (host, port) = target(params)?;
    let addrs = resolved_addrs(&host, port).await?;
    let no_verify = params.reserved.no_verify;

    let mut last_err: Option<TransportError> = None;
    for addr in addrs {
        let stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::debug!(%addr, error = %e, "tcp connect failed, trying next address");
                last_err = Some(e.into());
                continue;
            }
        };
        stream.set_nodelay(true)?;

        match virtdriver_tls::connect(stream, &host, tls_paths, no_verify).await {
            Ok(mut tls_stream) => match virtdriver_tls::read_server_ack(&mut tls_stream).await {
                Ok(()) => return Ok(tls_stream),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "server acknowledgement failed, trying next address");
                    last_err = Some(e.into());
                }
            },
            Err(e) => {
                tracing::debug!(%addr, error = %e, "tls handshake failed, trying next address");
                last_err = Some(e.into());
            }
        }
    }

    Err(last_err.unwrap_or_else(|| TransportError::NoAddressesResolved(format!("{host}:{port}"))))
}
