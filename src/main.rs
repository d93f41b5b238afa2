//! virtdriver-shell - exercise the remote driver core from the command line
//!
//! Dials a `driver+transport://...` URI, opens a connection, and runs one
//! hypervisor operation. Exists to drive the crate end to end against a real
//! daemon; it is not the host management library this crate is meant to be
//! linked into.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use virtdriver_client::{Connection, HandleFactory, OpenOutcome, TlsPaths};

/// virtdriver-shell - talk to a remote driver daemon
#[derive(Parser, Debug)]
#[command(name = "virtdriver-shell")]
#[command(about = "Exercise the remote virtualization driver core from the command line")]
#[command(version = concat!(env!("GIT_TAG"), " (", env!("GIT_HASH"), ", ", env!("BUILD_TIME"), ")"))]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Connection URI, e.g. qemu+tcp://localhost/system
    #[arg(long, global = true, env = "VIRTDRIVER_URI")]
    uri: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the connection and print the hypervisor type string
    GetType,
    /// List up to `--max` domain names
    ListDomains {
        #[arg(long, default_value_t = 1024)]
        max: u32,
    },
    /// Look up one domain by name and print its identity
    DomainLookup {
        name: String,
    },
}

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// A `HandleFactory` that just prints the identity tuple; this binary has no
/// real host-library object model to translate into.
struct PrintingHandleFactory;

impl HandleFactory for PrintingHandleFactory {
    type Domain = String;
    type Network = String;

    fn domain_handle(&self, name: String, uuid: [u8; 16], id: Option<i32>) -> Self::Domain {
        format!(
            "domain {name} uuid={} id={}",
            hex_uuid(&uuid),
            id.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string())
        )
    }

    fn network_handle(&self, name: String, uuid: [u8; 16]) -> Self::Network {
        format!("network {name} uuid={}", hex_uuid(&uuid))
    }
}

fn hex_uuid(uuid: &[u8; 16]) -> String {
    uuid.iter().map(|b| format!("{b:02x}")).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let tls_paths = TlsPaths::default();
    info!(uri = %cli.uri, "opening connection");
    let outcome = Connection::open(&cli.uri, &tls_paths)
        .await
        .context("failed to open connection")?;

    let mut conn = match outcome {
        OpenOutcome::Connected(conn) => conn,
        OpenOutcome::Decline => {
            anyhow::bail!("{} is not a remote driver URI this crate handles", cli.uri);
        }
    };

    match cli.command {
        Commands::GetType => {
            let hv_type = conn.get_type().await.context("get_type failed")?;
            println!("{hv_type}");
        }
        Commands::ListDomains { max } => {
            let names = conn.list_domains(max).await.context("list_domains failed")?;
            for name in names {
                println!("{name}");
            }
        }
        Commands::DomainLookup { name } => {
            let factory = PrintingHandleFactory;
            let described = conn
                .domain_lookup_by_name(&factory, &name)
                .await
                .context("domain_lookup_by_name failed")?;
            println!("{described}");
        }
    }

    conn.close().await.context("close failed")?;
    Ok(())
}
