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

//! `PdbWrapper`: replaces an interactive debugger's stdin/stdout reads and
//! writes with RPC calls to the controller (§4.6 steps 3-6).

use std::net::SocketAddr;

use async_trait::async_trait;
use monarch_debug_common::{Coords, DebugFrame, SessionError};
use monarch_debug_proto::{
    ActorId, ControllerReply, ControllerRequest, ControllerToWorkerReply, RpcClient, WorkerToControllerMessage,
};

use crate::breakpoint::{check_enterable, BreakpointFrame};

/// A connection to the controller speaking the worker half of the wire
/// protocol, mirroring the `mk_*_msg` builder convention of the message
/// module this stands in for.
#[derive(Clone)]
pub struct WorkerClient {
    rpc: RpcClient,
}

impl WorkerClient {
    pub async fn connect(addr: SocketAddr) -> eyre::Result<Self> {
        Ok(Self { rpc: RpcClient::connect(addr).await? })
    }

    async fn call(&self, msg: WorkerToControllerMessage) -> eyre::Result<ControllerToWorkerReply> {
        let reply: ControllerReply = self.rpc.call(&ControllerRequest::Worker(msg)).await?;
        match reply {
            ControllerReply::Worker(reply) => Ok(reply),
            ControllerReply::Cli(_) => Err(eyre::eyre!("controller sent a CLI reply to a worker request")),
        }
    }

    pub async fn session_start(&self, rank: i64, coords: Coords, hostname: String, actor_name: String) -> eyre::Result<()> {
        self.call(monarch_debug_proto::mk_session_start(rank, coords, hostname, actor_name)).await?;
        Ok(())
    }

    pub async fn session_end(&self, actor_name: String, rank: i64) -> eyre::Result<()> {
        self.call(monarch_debug_proto::mk_session_end(actor_name, rank)).await?;
        Ok(())
    }

    pub async fn debugger_read(&self, actor_name: String, rank: i64, size: usize) -> Result<Vec<u8>, SessionError> {
        match self.call(WorkerToControllerMessage::DebuggerRead { actor_name, rank, size }).await {
            Ok(ControllerToWorkerReply::ReadBytes(bytes)) => Ok(bytes),
            Ok(ControllerToWorkerReply::Error(err)) => Err(err),
            Ok(ControllerToWorkerReply::Ack) | Err(_) => Ok(Vec::new()),
        }
    }

    pub async fn debugger_write(&self, actor_name: String, rank: i64, frame: DebugFrame) -> Result<(), SessionError> {
        match self.call(WorkerToControllerMessage::DebuggerWrite { actor_name, rank, frame }).await {
            Ok(ControllerToWorkerReply::Error(err)) => Err(err),
            _ => Ok(()),
        }
    }
}

/// Installed in the worker's per-task debug context once a breakpoint
/// opens a session. Every interactive-debugger read/write the wrapped
/// debugger performs is funneled through here instead of the real stdio.
pub struct PdbWrapper {
    client: WorkerClient,
    actor_name: String,
    rank: i64,
}

impl PdbWrapper {
    pub fn new(client: WorkerClient, actor_name: String, rank: i64) -> Self {
        Self { client, actor_name, rank }
    }

    pub async fn read(&self, size: usize) -> eyre::Result<Vec<u8>> {
        Ok(self.client.debugger_read(self.actor_name.clone(), self.rank, size).await?)
    }

    pub async fn write(&self, payload: Vec<u8>, function: Option<String>, lineno: Option<i64>) -> eyre::Result<()> {
        let frame = match (function, lineno) {
            (Some(function), Some(lineno)) => DebugFrame::with_location(payload, function, lineno),
            _ => DebugFrame::new(payload),
        };
        Ok(self.client.debugger_write(self.actor_name.clone(), self.rank, frame).await?)
    }
}

/// The interactive debugger being wrapped. A real binding would drive an
/// actual `pdb`-equivalent; the demo binary in this crate drives a toy
/// stand-in for integration testing.
#[async_trait]
pub trait InteractiveDebugger: Send {
    async fn run(&mut self, io: &PdbWrapper) -> eyre::Result<()>;
}

/// Implements §4.6 steps 1-6: validate the frame, announce the session,
/// hand control to `debugger`, then announce its end regardless of how
/// `debugger` returned.
pub async fn enter_breakpoint(
    client: WorkerClient,
    rank: i64,
    coords: Coords,
    hostname: String,
    actor_name: String,
    frame: BreakpointFrame,
    mut debugger: impl InteractiveDebugger,
) -> eyre::Result<()> {
    check_enterable(&frame)?;

    client.session_start(rank, coords, hostname, actor_name.clone()).await?;
    let wrapper = PdbWrapper::new(client.clone(), actor_name.clone(), rank);
    let result = debugger.run(&wrapper).await;
    client.session_end(actor_name, rank).await?;
    result
}

/// Re-enters `enter_breakpoint` on the traceback when an exception
/// escapes to the actor boundary (§4.6 "post-mortem"), so the faulting
/// frame's function/line become the session's `function_lineno` as soon
/// as the first write lands.
pub async fn enter_post_mortem(
    client: WorkerClient,
    rank: i64,
    coords: Coords,
    hostname: String,
    actor_name: String,
    faulting_frame: BreakpointFrame,
    debugger: impl InteractiveDebugger,
) -> eyre::Result<()> {
    enter_breakpoint(client, rank, coords, hostname, actor_name, faulting_frame, debugger).await
}

/// Claims an `ActorId` for this worker's wrapper once, at process start
/// (§4.6 step 2's "obtain or spawn the controller by a well-known name"
/// becomes, in this transport, "obtain a client connection and an id").
pub fn new_worker_actor_id() -> ActorId {
    ActorId::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// A debugger that writes one frame then immediately continues,
    /// exercising the read/write RPC path end to end against a server
    /// that echoes a canned reply.
    struct OneShot;

    #[async_trait]
    impl InteractiveDebugger for OneShot {
        async fn run(&mut self, io: &PdbWrapper) -> eyre::Result<()> {
            io.write(b"(Pdb) ".to_vec(), Some("to_debug".to_string()), Some(7)).await?;
            let _ = io.read(64).await?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn breakpoint_in_entrypoint_without_source_fails_before_any_rpc() {
        let frame = BreakpointFrame::new("/nonexistent/entry.py", 3, "main", true);
        let err = check_enterable(&frame).unwrap_err();
        assert!(err.to_string().contains("entrypoint module"));
    }

    #[tokio::test]
    async fn enter_breakpoint_round_trips_session_start_read_write_end() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            for _ in 0..4 {
                let req: ControllerRequest = monarch_debug_proto::transport::read_frame(&mut stream).await.unwrap();
                let reply = match req {
                    ControllerRequest::Worker(WorkerToControllerMessage::DebuggerSessionStart { .. }) => {
                        ControllerReply::Worker(ControllerToWorkerReply::Ack)
                    }
                    ControllerRequest::Worker(WorkerToControllerMessage::DebuggerWrite { .. }) => {
                        ControllerReply::Worker(ControllerToWorkerReply::Ack)
                    }
                    ControllerRequest::Worker(WorkerToControllerMessage::DebuggerRead { .. }) => {
                        ControllerReply::Worker(ControllerToWorkerReply::ReadBytes(b"c\n".to_vec()))
                    }
                    ControllerRequest::Worker(WorkerToControllerMessage::DebuggerSessionEnd { .. }) => {
                        ControllerReply::Worker(ControllerToWorkerReply::Ack)
                    }
                    ControllerRequest::Cli(_) => panic!("unexpected cli request"),
                };
                monarch_debug_proto::transport::write_frame(&mut stream, &reply).await.unwrap();
            }
        });

        let client = WorkerClient::connect(addr).await.unwrap();
        let frame = BreakpointFrame::new("lib.py", 10, "to_debug", false);
        enter_breakpoint(client, 0, Coords::new(), "hostA".to_string(), "debugee".to_string(), frame, OneShot)
            .await
            .unwrap();

        server.await.unwrap();
    }
}
