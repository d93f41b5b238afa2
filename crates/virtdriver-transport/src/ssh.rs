//! SSH transport: build the `ssh` argv, then reuse the external-command
//! transport's spawn logic verbatim. There is no separate SSH spawn path.

use crate::ext::{self, ExtChannel};
use crate::TransportError;
use virtdriver_uri::{ConnectParams, DEFAULT_SSH_PORT};

const DEFAULT_RW_SOCKET: &str = "/var/run/libvirt/libvirt-sock";

pub fn build_argv(params: &ConnectParams) -> Result<Vec<String>, TransportError> {
    let host = params.host.clone().ok_or(TransportError::HostRequired)?;
    let port = params.port.unwrap_or(DEFAULT_SSH_PORT);
    let netcat = params
        .reserved
        .netcat
        .clone()
        .unwrap_or_else(|| "nc".to_string());
    let sockname = params
        .reserved
        .socket
        .clone()
        .unwrap_or_else(|| DEFAULT_RW_SOCKET.to_string());

    let mut argv = vec!["ssh".to_string(), "-p".to_string(), port.to_string()];
    if let Some(user) = &params.user {
        argv.push("-l".to_string());
        argv.push(user.clone());
    }
    argv.push(host);
    argv.push(netcat);
    argv.push("-U".to_string());
    argv.push(sockname);
    Ok(argv)
}

pub async fn connect(params: &ConnectParams) -> Result<ExtChannel, TransportError> {
    let argv = build_argv(params)?;
    ext::spawn(&argv).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use virtdriver_uri::{parse, ParseOutcome};

    #[test]
    fn argv_matches_expected_shape() {
        let outcome = parse("qemu+ssh://alice@host/system?netcat=ncat").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept")
        };
        let argv = build_argv(&params).unwrap();
        assert_eq!(
            argv,
            vec!["ssh", "-p", "22", "-l", "alice", "host", "ncat", "-U", DEFAULT_RW_SOCKET]
        );
    }

    #[test]
    fn argv_without_user_omits_dash_l() {
        let outcome = parse("qemu+ssh://host/system").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept")
        };
        let argv = build_argv(&params).unwrap();
        assert_eq!(
            argv,
            vec!["ssh", "-p", "22", "host", "nc", "-U", DEFAULT_RW_SOCKET]
        );
    }
}
