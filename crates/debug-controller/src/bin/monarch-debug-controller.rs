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

//! The debug controller daemon: accepts worker and CLI connections on one
//! listen address and routes their requests to a single in-process
//! `DebugController`.

use std::sync::Arc;

use eyre::{eyre, Result};
use monarch_debug_common::parse_channel_addr;
use monarch_debug_controller::{ControllerConfig, DebugController};
use monarch_debug_proto::{ControllerReply, ControllerRequest, ControllerToCliReply, ControllerToWorkerReply};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = ControllerConfig::load()?;

    let main_subscriber = tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_line_number(true)
        .with_max_level(if config.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(main_subscriber).map_err(|e| eyre!("unable to configure logging: {e}"))?;

    let addr = parse_channel_addr(&config.listen_addr)?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "monarch-debug-controller listening");

    let controller = DebugController::new();

    loop {
        let (stream, peer) = listener.accept().await?;
        let controller = controller.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_connection(controller, stream).await {
                warn!(%peer, ?err, "connection ended");
            }
        });
    }
}

async fn serve_connection(controller: Arc<DebugController>, mut stream: TcpStream) -> Result<()> {
    loop {
        let request: ControllerRequest = match monarch_debug_proto::transport::read_frame(&mut stream).await {
            Ok(req) => req,
            Err(monarch_debug_proto::TransportError::Closed) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        let reply = handle_request(&controller, request).await;
        monarch_debug_proto::transport::write_frame(&mut stream, &reply).await?;
    }
}

async fn handle_request(controller: &Arc<DebugController>, request: ControllerRequest) -> ControllerReply {
    match request {
        ControllerRequest::Worker(msg) => ControllerReply::Worker(handle_worker_message(controller, msg).await),
        ControllerRequest::Cli(msg) => ControllerReply::Cli(handle_cli_message(controller, msg).await),
    }
}

async fn handle_worker_message(
    controller: &Arc<DebugController>,
    msg: monarch_debug_proto::WorkerToControllerMessage,
) -> ControllerToWorkerReply {
    use monarch_debug_proto::WorkerToControllerMessage as M;
    match msg {
        M::DebuggerSessionStart { rank, coords, hostname, actor_name } => {
            controller.debugger_session_start(rank, coords, hostname, actor_name).await;
            ControllerToWorkerReply::Ack
        }
        M::DebuggerSessionEnd { actor_name, rank } => match controller.debugger_session_end(&actor_name, rank).await {
            Ok(()) => ControllerToWorkerReply::Ack,
            // An undeliverable-equivalent: the worker's own session is
            // already gone. Log and swallow rather than propagate (§4.5).
            Err(err) => {
                warn!(%actor_name, rank, %err, "previous debug session was already closed");
                ControllerToWorkerReply::Ack
            }
        },
        M::DebuggerRead { actor_name, rank, size } => match controller.debugger_read(&actor_name, rank, size).await {
            Ok(bytes) => ControllerToWorkerReply::ReadBytes(bytes),
            Err(err) => ControllerToWorkerReply::Error(to_session_error(err)),
        },
        M::DebuggerWrite { actor_name, rank, frame } => {
            match controller.debugger_write(&actor_name, rank, frame).await {
                Ok(()) => ControllerToWorkerReply::Ack,
                Err(err) => ControllerToWorkerReply::Error(to_session_error(err)),
            }
        }
    }
}

async fn handle_cli_message(
    controller: &Arc<DebugController>,
    msg: monarch_debug_proto::CliToControllerMessage,
) -> ControllerToCliReply {
    use monarch_debug_proto::CliToControllerMessage as M;
    match msg {
        M::Enter { cli_actor_id } => {
            controller.enter(cli_actor_id).await;
            ControllerToCliReply::Entered
        }
        M::DebugCliInput { line, cli_actor_id } => match controller.debug_cli_input(line, cli_actor_id).await {
            Ok(()) => ControllerToCliReply::Ack,
            Err(err) => ControllerToCliReply::Error(err.to_string()),
        },
        M::DebugCliOutputPoll { cli_actor_id } => match controller.debug_cli_output(cli_actor_id).await {
            Ok(messages) => ControllerToCliReply::Messages(messages),
            Err(err) => ControllerToCliReply::Error(err.to_string()),
        },
    }
}

/// `debugger_read`/`debugger_write` surface `eyre::Report` (they can fail
/// for reasons beyond a missing session), but the wire reply only carries
/// `SessionError`. Anything else collapses to `NoSuchActor` with the
/// report's text folded into the actor name field would be misleading, so
/// we log it and report the closest fit instead.
fn to_session_error(err: eyre::Report) -> monarch_debug_common::SessionError {
    if let Some(session_err) = err.downcast_ref::<monarch_debug_common::SessionError>() {
        return session_err.clone();
    }
    warn!(%err, "debugger read/write failed for a reason other than a missing session");
    monarch_debug_common::SessionError::NoSuchActor { actor: err.to_string() }
}
