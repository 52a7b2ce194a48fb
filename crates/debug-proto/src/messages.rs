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

//! Message builders for the two request/reply streams the controller
//! serves: one from remote pdb shims (workers), one from the CLI
//! front-end. Mirrors the daemon/worker and daemon/host message split of
//! the actor-mesh runtime this crate stands in for (§6).

use monarch_debug_common::{CliMessage, Coords, DebugFrame, SessionError};

use crate::actor_id::ActorId;

/// `HostClientToDaemon`-equivalent: everything a worker's pdb shim can ask
/// the controller to do.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum WorkerToControllerMessage {
    DebuggerSessionStart { rank: i64, coords: Coords, hostname: String, actor_name: String },
    DebuggerSessionEnd { actor_name: String, rank: i64 },
    DebuggerRead { actor_name: String, rank: i64, size: usize },
    DebuggerWrite { actor_name: String, rank: i64, frame: DebugFrame },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ControllerToWorkerReply {
    Ack,
    ReadBytes(Vec<u8>),
    Error(SessionError),
}

/// Everything the external CLI front-end can ask the controller to do (§4.7).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum CliToControllerMessage {
    Enter { cli_actor_id: ActorId },
    DebugCliInput { line: String, cli_actor_id: ActorId },
    DebugCliOutputPoll { cli_actor_id: ActorId },
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ControllerToCliReply {
    Entered,
    Ack,
    Messages(Vec<CliMessage>),
    Error(String),
}

/// The one request envelope the controller's listener actually reads off
/// the wire: either stream, multiplexed onto the same TCP connection type
/// since our stand-in transport (§1, §6) has no separate worker/host
/// listen sockets the way the actor-mesh runtime's daemon does.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ControllerRequest {
    Worker(WorkerToControllerMessage),
    Cli(CliToControllerMessage),
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ControllerReply {
    Worker(ControllerToWorkerReply),
    Cli(ControllerToCliReply),
}

/// Builds a `DebuggerSessionStart` message.
pub fn mk_session_start(
    rank: i64,
    coords: Coords,
    hostname: String,
    actor_name: String,
) -> WorkerToControllerMessage {
    WorkerToControllerMessage::DebuggerSessionStart { rank, coords, hostname, actor_name }
}

/// Builds a `DebuggerSessionEnd` message.
pub fn mk_session_end(actor_name: String, rank: i64) -> WorkerToControllerMessage {
    WorkerToControllerMessage::DebuggerSessionEnd { actor_name, rank }
}
