//! The per-call sequence: allocate a serial, frame the request, write it,
//! read the reply frame, validate the reply header against the request, and
//! dispatch on status.
//!
//! Partial reads/writes and `EINTR`-style retries are the runtime's problem,
//! not this module's: `tokio::io::AsyncReadExt::read_exact` and
//! `AsyncWriteExt::write_all` already loop until the buffer is satisfied or a
//! genuine error surfaces. What this module still has to do by hand is turn
//! an early close (`UnexpectedEof`) into the fatal, specific error the
//! procedure stubs expect instead of a generic I/O error.

use crate::RpcError;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use virtdriver_wire::{decode_length_prefix, encode_frame, Direction, Header, Status, StructuredError, HEADER_LEN};

fn map_read_error(e: std::io::Error) -> RpcError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        RpcError::UnexpectedEof
    } else {
        RpcError::Io(e)
    }
}

/// Drives a single RPC channel: owns the serial counter and the call
/// sequence. Carries no knowledge of any particular procedure's argument or
/// return shape — that marshalling lives one layer up, in the procedure
/// stubs.
pub struct RpcEngine<S> {
    stream: S,
    next_serial: u32,
}

impl<S> RpcEngine<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        RpcEngine {
            stream,
            next_serial: 0,
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Direct access to the underlying stream, for operations the engine
    /// itself has no opinion about (e.g. a graceful `shutdown()` on close).
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Issue one call and return the decoded reply body (header already
    /// stripped). `args` must already be XDR-encoded by the caller.
    pub async fn call(
        &mut self,
        program: u32,
        version: u32,
        procedure: u32,
        args: &[u8],
    ) -> Result<Bytes, RpcError> {
        let serial = self.next_serial;
        self.next_serial = self.next_serial.wrapping_add(1);

        let request_header = Header::call(program, version, procedure, serial);
        let mut body = BytesMut::with_capacity(HEADER_LEN + args.len());
        request_header.encode(&mut body);
        body.extend_from_slice(args);

        let frame = encode_frame(&body)?;
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        let mut length_buf = [0u8; 4];
        self.stream
            .read_exact(&mut length_buf)
            .await
            .map_err(map_read_error)?;
        let payload_len = decode_length_prefix(length_buf)?;

        let mut payload = vec![0u8; payload_len as usize];
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(map_read_error)?;

        let mut reply = Bytes::from(payload);
        let reply_header = Header::decode(&mut reply)?;
        validate_reply(&request_header, &reply_header)?;

        match Status::try_from(reply_header.status) {
            Ok(Status::Ok) => Ok(reply),
            Ok(Status::Error) => {
                let err = StructuredError::decode(&mut reply)
                    .map_err(|_| RpcError::UnmarshalFailed("remote_error"))?;
                Err(RpcError::Server(err))
            }
            Err(_) => Err(RpcError::UnknownStatus(reply_header.status)),
        }
    }
}

fn validate_reply(request: &Header, reply: &Header) -> Result<(), RpcError> {
    if reply.program != request.program {
        return Err(RpcError::HeaderMismatch {
            field: "program",
            expected: request.program,
            received: reply.program,
        });
    }
    if reply.version != request.version {
        return Err(RpcError::HeaderMismatch {
            field: "version",
            expected: request.version,
            received: reply.version,
        });
    }
    if reply.procedure != request.procedure {
        return Err(RpcError::HeaderMismatch {
            field: "procedure",
            expected: request.procedure,
            received: reply.procedure,
        });
    }
    if reply.direction != Direction::Reply as u32 {
        return Err(RpcError::HeaderMismatch {
            field: "direction",
            expected: Direction::Reply as u32,
            received: reply.direction,
        });
    }
    if reply.serial != request.serial {
        return Err(RpcError::HeaderMismatch {
            field: "serial",
            expected: request.serial,
            received: reply.serial,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BufMut;
    use tokio::io::duplex;
    use virtdriver_wire::Header;

    fn server_reply(request: &Header, status: Status, extra: &[u8]) -> Bytes {
        let reply_header = Header {
            direction: Direction::Reply as u32,
            status: status as u32,
            ..*request
        };
        let mut body = BytesMut::new();
        reply_header.encode(&mut body);
        body.extend_from_slice(extra);
        encode_frame(&body).unwrap()
    }

    #[tokio::test]
    async fn successful_call_returns_body_after_header() {
        let (client, mut server) = duplex(4096);
        let mut engine = RpcEngine::new(client);

        let call_task = tokio::spawn(async move { engine.call(0x2000_0000, 1, 66, &[]).await });

        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let payload_len = decode_length_prefix(len_buf).unwrap();
        let mut payload = vec![0u8; payload_len as usize];
        server.read_exact(&mut payload).await.unwrap();
        let mut request = Bytes::from(payload);
        let request_header = Header::decode(&mut request).unwrap();
        assert_eq!(request_header.procedure, 66);
        assert_eq!(request_header.direction, Direction::Call as u32);

        let mut ret = BytesMut::new();
        ret.put_u32(1);
        let reply = server_reply(&request_header, Status::Ok, &ret);
        server.write_all(&reply).await.unwrap();
        server.flush().await.unwrap();

        let body = call_task.await.unwrap().unwrap();
        assert_eq!(body.len(), 4);
    }

    #[tokio::test]
    async fn server_error_status_decodes_structured_error() {
        let (client, mut server) = duplex(4096);
        let mut engine = RpcEngine::new(client);

        let call_task = tokio::spawn(async move { engine.call(0x2000_0000, 1, 66, &[]).await });

        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let payload_len = decode_length_prefix(len_buf).unwrap();
        let mut payload = vec![0u8; payload_len as usize];
        server.read_exact(&mut payload).await.unwrap();
        let mut request = Bytes::from(payload);
        let request_header = Header::decode(&mut request).unwrap();

        let mut err_buf = BytesMut::new();
        let err = StructuredError {
            domain: 10,
            code: 42,
            level: 2,
            message: Some("no domain with matching name".into()),
            ..Default::default()
        };
        err.encode(&mut err_buf);
        let reply = server_reply(&request_header, Status::Error, &err_buf);
        server.write_all(&reply).await.unwrap();
        server.flush().await.unwrap();

        let result = call_task.await.unwrap();
        match result {
            Err(RpcError::Server(err)) => {
                assert_eq!(err.message.as_deref(), Some("no domain with matching name"));
            }
            other => panic!("expected RpcError::Server, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mismatched_serial_is_rejected() {
        let (client, mut server) = duplex(4096);
        let mut engine = RpcEngine::new(client);

        let call_task = tokio::spawn(async move { engine.call(0x2000_0000, 1, 66, &[]).await });

        let mut len_buf = [0u8; 4];
        server.read_exact(&mut len_buf).await.unwrap();
        let payload_len = decode_length_prefix(len_buf).unwrap();
        let mut payload = vec![0u8; payload_len as usize];
        server.read_exact(&mut payload).await.unwrap();
        let mut request = Bytes::from(payload);
        let request_header = Header::decode(&mut request).unwrap();

        let bad_header = Header {
            serial: request_header.serial.wrapping_add(1),
            ..request_header
        };
        let mut body = BytesMut::new();
        let reply_header = Header {
            direction: Direction::Reply as u32,
            status: Status::Ok as u32,
            ..bad_header
        };
        reply_header.encode(&mut body);
        let reply = encode_frame(&body).unwrap();
        server.write_all(&reply).await.unwrap();
        server.flush().await.unwrap();

        let result = call_task.await.unwrap();
        assert!(matches!(
            result,
            Err(RpcError::HeaderMismatch { field: "serial", .. })
        ));
    }

    #[tokio::test]
    async fn closed_socket_before_reply_is_unexpected_eof() {
        let (client, server) = duplex(4096);
        let mut engine = RpcEngine::new(client);
        drop(server);

        let result = engine.call(0x2000_0000, 1, 66, &[]).await;
        assert!(matches!(result, Err(RpcError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn serial_increments_across_calls() {
        let (client, mut server) = duplex(4096);
        let mut engine = RpcEngine::new(client);

        for expected_serial in 0..3u32 {
            let (call_result, _) = tokio::join!(engine.call(0x2000_0000, 1, 1, &[]), async {
                let mut len_buf = [0u8; 4];
                server.read_exact(&mut len_buf).await.unwrap();
                let payload_len = decode_length_prefix(len_buf).unwrap();
                let mut payload = vec![0u8; payload_len as usize];
                server.read_exact(&mut payload).await.unwrap();
                let mut request = Bytes::from(payload);
                let request_header = Header::decode(&mut request).unwrap();
                assert_eq!(request_header.serial, expected_serial);

                let reply = server_reply(&request_header, Status::Ok, &[]);
                server.write_all(&reply).await.unwrap();
                server.flush().await.unwrap();
            });
            call_result.unwrap();
        }
    }
}
