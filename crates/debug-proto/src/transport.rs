// Copyright (C) 2025 Monarch Contributors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A narrow point-to-point transport: length-prefixed bincode frames over
//! TCP. The actor-mesh runtime's real messaging substrate (reliable
//! addressed delivery, per-actor mailboxes, undeliverable callbacks) is an
//! external collaborator out of scope for this crate (§1); this module is
//! the concrete stand-in we need so the controller, worker shim and CLI
//! can actually talk to each other over a socket.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

const MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("connection closed by peer")]
    Closed,
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES} byte limit")]
    FrameTooLarge(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] bincode::error::DecodeError),
    #[error(transparent)]
    Encode(#[from] bincode::error::EncodeError),
}

fn bincode_config() -> bincode::config::Configuration {
    bincode::config::standard()
}

/// Write one length-prefixed bincode frame.
pub async fn write_frame<T: Serialize>(
    stream: &mut (impl tokio::io::AsyncWrite + Unpin),
    msg: &T,
) -> Result<(), TransportError> {
    let bytes = bincode::serde::encode_to_vec(msg, bincode_config())?;
    let len: u32 = bytes
        .len()
        .try_into()
        .map_err(|_| TransportError::FrameTooLarge(u32::MAX))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&bytes).await?;
    stream.flush().await?;
    Ok(())
}

/// Read one length-prefixed bincode frame, returning `Closed` on a clean EOF
/// before any bytes of the length prefix arrive (the common "peer hung up").
pub async fn read_frame<T: DeserializeOwned>(
    stream: &mut (impl tokio::io::AsyncRead + Unpin),
) -> Result<T, TransportError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(TransportError::Closed),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await?;
    let (msg, _) = bincode::serde::decode_from_slice(&body, bincode_config())?;
    Ok(msg)
}

/// A persistent request/reply connection to the controller, serializing
/// concurrent callers behind a mutex the same way the daemon's RPC clients
/// serialize requests over one ZMQ REQ socket.
pub struct RpcClient {
    stream: Arc<Mutex<TcpStream>>,
}

impl RpcClient {
    pub async fn connect(addr: std::net::SocketAddr) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true).ok();
        Ok(Self { stream: Arc::new(Mutex::new(stream)) })
    }

    pub async fn call<Req: Serialize, Reply: DeserializeOwned>(&self, req: &Req) -> Result<Reply, TransportError> {
        let mut stream = self.stream.lock().await;
        write_frame(&mut *stream, req).await?;
        read_frame(&mut *stream).await
    }
}

impl Clone for RpcClient {
    fn clone(&self) -> Self {
        Self { stream: self.stream.clone() }
    }
}
