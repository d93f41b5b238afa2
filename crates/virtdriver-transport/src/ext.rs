//! External-command transport: spawn the user-supplied command with a
//! socket pair wired to its standard input and standard output.

use crate::TransportError;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use virtdriver_uri::ConnectParams;

/// The parent-side end of the socket pair, plus the spawned child.
///
/// The child is not reaped eagerly: closing the socket pair is enough to
/// make a well-behaved child exit on its next I/O. `Drop` makes one
/// best-effort, non-blocking `try_wait` so a child that has already exited
/// doesn't linger as a zombie.
pub struct ExtChannel {
    stream: UnixStream,
    child: Child,
}

impl Drop for ExtChannel {
    fn drop(&mut self) {
        let _ = self.child.try_wait();
    }
}

impl AsyncRead for ExtChannel {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for ExtChannel {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        Pin::new(&mut this.stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.stream).poll_shutdown(cx)
    }
}

/// Spawn `argv[0]` with `argv[1..]` as arguments, wiring the child end of a
/// fresh socket pair onto its stdin and stdout.
pub async fn spawn(argv: &[String]) -> Result<ExtChannel, TransportError> {
    let (child_sock, parent_sock) = StdUnixStream::pair()?;
    child_sock.set_nonblocking(true)?;
    parent_sock.set_nonblocking(true)?;

    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    command.stdin(Stdio::from(std::os::fd::OwnedFd::from(
        child_sock.try_clone()?,
    )));
    command.stdout(Stdio::from(std::os::fd::OwnedFd::from(child_sock)));
    command.stderr(Stdio::null());
    command.kill_on_drop(false);

    let child = command.spawn().map_err(TransportError::Spawn)?;
    let stream = UnixStream::from_std(parent_sock)?;

    Ok(ExtChannel { stream, child })
}

pub async fn connect(params: &ConnectParams) -> Result<ExtChannel, TransportError> {
    // virtdriver_uri::parse already rejected an Ext URI without `command`.
    let command = params
        .reserved
        .command
        .clone()
        .expect("command is required for the ext transport, enforced by virtdriver_uri::parse");
    let argv: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    spawn(&argv).await
}
