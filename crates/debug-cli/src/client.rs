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

//! The CLI half of the wire protocol (§4.7).

use std::net::SocketAddr;

use monarch_debug_common::CliMessage;
use monarch_debug_proto::{ActorId, CliToControllerMessage, ControllerReply, ControllerRequest, ControllerToCliReply, RpcClient};

#[derive(Clone)]
pub struct CliClient {
    rpc: RpcClient,
}

impl CliClient {
    pub async fn connect(addr: SocketAddr) -> eyre::Result<Self> {
        Ok(Self { rpc: RpcClient::connect(addr).await? })
    }

    async fn call(&self, msg: CliToControllerMessage) -> eyre::Result<ControllerToCliReply> {
        let reply: ControllerReply = self.rpc.call(&ControllerRequest::Cli(msg)).await?;
        match reply {
            ControllerReply::Cli(reply) => Ok(reply),
            ControllerReply::Worker(_) => Err(eyre::eyre!("controller sent a worker reply to a CLI request")),
        }
    }

    pub async fn enter(&self, cli_actor_id: ActorId) -> eyre::Result<()> {
        match self.call(CliToControllerMessage::Enter { cli_actor_id }).await? {
            ControllerToCliReply::Entered => Ok(()),
            other => Err(eyre::eyre!("unexpected reply to enter: {other:?}")),
        }
    }

    pub async fn debug_cli_input(&self, line: String, cli_actor_id: ActorId) -> eyre::Result<()> {
        match self.call(CliToControllerMessage::DebugCliInput { line, cli_actor_id }).await? {
            ControllerToCliReply::Ack => Ok(()),
            ControllerToCliReply::Error(err) => Err(eyre::eyre!(err)),
            other => Err(eyre::eyre!("unexpected reply to debug_cli_input: {other:?}")),
        }
    }

    pub async fn debug_cli_output(&self, cli_actor_id: ActorId) -> eyre::Result<Vec<CliMessage>> {
        match self.call(CliToControllerMessage::DebugCliOutputPoll { cli_actor_id }).await? {
            ControllerToCliReply::Messages(messages) => Ok(messages),
            ControllerToCliReply::Error(err) => Err(eyre::eyre!(err)),
            other => Err(eyre::eyre!("unexpected reply to debug_cli_output: {other:?}")),
        }
    }
}
