//! Local stream socket transport.

use crate::TransportError;
use tokio::net::UnixStream;
use virtdriver_uri::ConnectParams;

const DEFAULT_RW_SOCKET: &str = "/var/run/libvirt/libvirt-sock";
const DEFAULT_RO_SOCKET: &str = "/var/run/libvirt/libvirt-sock-ro";

/// Whether the connection was opened against a read-only URI path.
///
/// The upstream driver keys this off a flag passed down from the host
/// library (`VIR_CONNECT_RO`); this crate has no such caller-side flag to
/// consume, so it infers read-only intent from the conventional `/system`
/// vs non-`/system` URI path distinction used by the daemon's own socket
/// activation units. Recorded as an open question in the design notes.
fn default_socket_path(params: &ConnectParams) -> &'static str {
    if params.path.ends_with("-ro") {
        DEFAULT_RO_SOCKET
    } else {
        DEFAULT_RW_SOCKET
    }
}

pub async fn connect(params: &ConnectParams) -> Result<UnixStream, TransportError> {
    let path = params
        .reserved
        .socket
        .clone()
        .unwrap_or_else(|| default_socket_path(params).to_string());

    UnixStream::connect(&path)
        .await
        .map_err(TransportError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtdriver_uri::{parse, ParseOutcome};

    #[test]
    fn socket_override_takes_precedence() {
        let outcome = parse("qemu+unix:///system?socket=/tmp/sock").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept")
        };
        assert_eq!(params.reserved.socket.as_deref(), Some("/tmp/sock"));
    }

    #[test]
    fn missing_socket_uses_default() {
        let outcome = parse("qemu+unix:///system").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept")
        };
        assert_eq!(default_socket_path(&params), DEFAULT_RW_SOCKET);
    }
}
