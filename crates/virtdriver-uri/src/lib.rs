//! Composite-URI parsing for the remote driver: `driver+transport://user@host:port/path?query`.
//!
//! Grounded on the transport-selection and config-builder patterns used by
//! the connection-discovery code this workspace is descended from, adapted
//! to the exact three-way `Decline` / `Accept` / `Error` contract and the
//! reserved-query-key handling the upstream driver implements.

mod query;

pub use query::{encode_query, parse_query, QueryField};

use thiserror::Error;
use url::Url;

pub const DEFAULT_TLS_PORT: u16 = 16514;
pub const DEFAULT_TCP_PORT: u16 = 16509;
pub const DEFAULT_SSH_PORT: u16 = 22;

pub const RESERVED_KEYS: [&str; 5] = ["name", "command", "socket", "netcat", "no_verify"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tls,
    Tcp,
    Unix,
    Ssh,
    Ext,
}

impl Transport {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "tls" => Some(Transport::Tls),
            "tcp" => Some(Transport::Tcp),
            "unix" => Some(Transport::Unix),
            "ssh" => Some(Transport::Ssh),
            "ext" => Some(Transport::Ext),
            _ => None,
        }
    }

    pub fn default_port(self) -> Option<u16> {
        match self {
            Transport::Tls => Some(DEFAULT_TLS_PORT),
            Transport::Tcp => Some(DEFAULT_TCP_PORT),
            Transport::Ssh => Some(DEFAULT_SSH_PORT),
            Transport::Unix | Transport::Ext => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum UriError {
    #[error("unrecognised transport suffix: {0}")]
    UnrecognisedTransport(String),

    #[error("command is required")]
    CommandRequired,

    #[error("malformed URI: {0}")]
    Malformed(String),
}

/// Reserved query keys, extracted and typed. Everything else passes through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservedQuery {
    pub name: Option<String>,
    pub command: Option<String>,
    pub socket: Option<String>,
    pub netcat: Option<String>,
    pub no_verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub driver: String,
    pub transport: Transport,
    pub user: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub reserved: ReservedQuery,
    pub passthrough: Vec<QueryField>,
    /// The sanitised name forwarded to the server as the logical resource name.
    pub forwarded_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Not a URI this driver owns; another driver may claim it.
    Decline,
    Accept(ConnectParams),
}

pub fn parse(uri: &str) -> Result<ParseOutcome, UriError> {
    let url = match Url::parse(uri) {
        Ok(url) => url,
        Err(_) => return Ok(ParseOutcome::Decline),
    };

    let scheme = url.scheme();
    let (driver, transport_suffix) = match scheme.split_once('+') {
        Some((driver, suffix)) => (driver.to_string(), Some(suffix)),
        None => (scheme.to_string(), None),
    };

    if transport_suffix.is_none() && url.host().is_none() {
        return Ok(ParseOutcome::Decline);
    }

    let transport = match transport_suffix {
        None => Transport::Tls,
        Some(suffix) => Transport::from_suffix(suffix)
            .ok_or_else(|| UriError::UnrecognisedTransport(suffix.to_string()))?,
    };

    let fields = parse_query(url.query().unwrap_or(""));
    let mut reserved = ReservedQuery::default();
    let mut passthrough = Vec::with_capacity(fields.len());
    for field in fields {
        match field.name.as_str() {
            "name" => reserved.name = Some(field.value),
            "command" => reserved.command = Some(field.value),
            "socket" => reserved.socket = Some(field.value),
            "netcat" => reserved.netcat = Some(field.value),
            "no_verify" => {
                reserved.no_verify = field.value.parse::<i64>().map(|v| v != 0).unwrap_or(false)
            }
            _ => passthrough.push(field),
        }
    }

    if matches!(transport, Transport::Ext) && reserved.command.is_none() {
        return Err(UriError::CommandRequired);
    }

    let user = {
        let u = url.username();
        if u.is_empty() {
            None
        } else {
            Some(u.to_string())
        }
    };
    let host = url.host_str().map(|h| h.to_string());
    let port = url.port();
    let path = url.path().to_string();

    let forwarded_name = match &reserved.name {
        Some(name) => name.clone(),
        None => build_forwarded_name(&driver, &path, &passthrough),
    };

    Ok(ParseOutcome::Accept(ConnectParams {
        driver,
        transport,
        user,
        host,
        port,
        path,
        reserved,
        passthrough,
        forwarded_name,
    }))
}

fn build_forwarded_name(driver: &str, path: &str, passthrough: &[QueryField]) -> String {
    let query_suffix = if passthrough.is_empty() {
        String::new()
    } else {
        format!("?{}", encode_query(passthrough))
    };
    format!("{driver}://{path}{query_suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declines_uri_without_scheme() {
        assert_eq!(parse("not-a-uri").unwrap(), ParseOutcome::Decline);
    }

    #[test]
    fn declines_bare_scheme_without_host() {
        // No transport suffix and no authority at all: another (local)
        // driver may own it.
        assert_eq!(parse("test:isbn:0451450523").unwrap(), ParseOutcome::Decline);
    }

    #[test]
    fn missing_suffix_defaults_to_tls() {
        let outcome = parse("qemu://example.com/system").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert_eq!(params.transport, Transport::Tls);
    }

    #[test]
    fn unrecognised_transport_is_an_error() {
        let err = parse("qemu+bogus://example.com/system").unwrap_err();
        assert!(matches!(err, UriError::UnrecognisedTransport(s) if s == "bogus"));
    }

    #[test]
    fn tcp_forwards_sanitised_name() {
        let outcome = parse("qemu+tcp://localhost/system").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert_eq!(params.transport, Transport::Tcp);
        assert_eq!(params.forwarded_name, "qemu:///system");
    }

    #[test]
    fn name_override_wins() {
        let outcome = parse("qemu+tcp://localhost/system?name=qemu:///other").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert_eq!(params.forwarded_name, "qemu:///other");
    }

    #[test]
    fn ext_requires_command() {
        let err = parse("qemu+ext:///system").unwrap_err();
        assert!(matches!(err, UriError::CommandRequired));
        let outcome = parse("qemu+ext:///system?command=/bin/true").unwrap();
        assert!(matches!(outcome, ParseOutcome::Accept(_)));
    }

    #[test]
    fn ssh_argv_inputs_are_extracted() {
        let outcome = parse("qemu+ssh://alice@host/system?netcat=ncat").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert_eq!(params.transport, Transport::Ssh);
        assert_eq!(params.user.as_deref(), Some("alice"));
        assert_eq!(params.reserved.netcat.as_deref(), Some("ncat"));
        assert_eq!(params.port, None);
        assert_eq!(Transport::Ssh.default_port(), Some(DEFAULT_SSH_PORT));
    }

    #[test]
    fn passthrough_preserves_order_and_drops_reserved() {
        let outcome =
            parse("qemu+tls://example.com:16514/system?no_verify=1&foo=bar&baz=qux").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert!(params.reserved.no_verify);
        assert_eq!(
            params
                .passthrough
                .iter()
                .map(|f| (f.name.as_str(), f.value.as_str()))
                .collect::<Vec<_>>(),
            vec![("foo", "bar"), ("baz", "qux")]
        );
    }

    #[test]
    fn unix_socket_query_key_is_reserved() {
        let outcome = parse("qemu+unix:///system?socket=/tmp/sock").unwrap();
        let ParseOutcome::Accept(params) = outcome else {
            panic!("expected Accept");
        };
        assert_eq!(params.reserved.socket.as_deref(), Some("/tmp/sock"));
        assert!(params.passthrough.is_empty());
    }
}
