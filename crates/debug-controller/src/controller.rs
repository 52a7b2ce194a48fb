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

//! The single actor that owns every live session, runs the console REPL,
//! and admits at most one CLI at a time. Component E (§4.5).

use std::sync::Arc;
use std::time::Duration;

use monarch_debug_common::{format_coords, CliMessage, ControllerError, Coords, DebugFrame, SessionError, SessionInfo};
use monarch_debug_proto::ActorId;

use crate::grammar::{self, Command};
use crate::io::{DebugIo, LocalStdio, RemoteCliIo};
use crate::registry::{Selection, SessionRegistry};
use crate::session::DebugSession;

const BANNER: &str = "\
=== MONARCH DEBUGGER ===
Enter 'help' for a list of commands, 'list' to list all sessions.
";

const HELP_TEXT: &str = "\
Commands:
  attach|a <actor_name> <rank>   attach to a paused session
  list|l                        list all live sessions
  cast <actor_name> ranks(...) <pdb_command>
                                 send one pdb command to a filtered set of ranks
  continue|c                    continue every paused session
  help|h                        show this message
  quit|q                        exit the console
";

/// Everything that belongs to the currently running console task, guarded
/// by one lock (§5: "no mutex beyond the one task-lock is required").
struct ConsoleState {
    task: Option<tokio::task::JoinHandle<()>>,
    io: Arc<dyn DebugIo>,
    current_cli: Option<ActorId>,
    cli_output_rx: Option<flume::Receiver<CliMessage>>,
    cli_input_tx: Option<flume::Sender<String>>,
}

impl ConsoleState {
    fn local() -> Self {
        Self {
            task: None,
            io: Arc::new(LocalStdio::new()),
            current_cli: None,
            cli_output_rx: None,
            cli_input_tx: None,
        }
    }
}

enum DispatchOutcome {
    Continue,
    Quit,
}

pub struct DebugController {
    registry: std::sync::Mutex<SessionRegistry>,
    console: tokio::sync::Mutex<ConsoleState>,
}

impl DebugController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: std::sync::Mutex::new(SessionRegistry::new()),
            console: tokio::sync::Mutex::new(ConsoleState::local()),
        })
    }

    /// Returns once the registry holds at least one session. Polled at a
    /// ~1s interval (§4.5) rather than signalled, since a session can be
    /// inserted from any worker connection.
    pub async fn wait_pending_session(&self) {
        loop {
            if !self.registry.lock().unwrap().is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    pub async fn list(&self, print_output: bool) -> Vec<SessionInfo> {
        let infos = self.registry.lock().unwrap().info();
        if print_output {
            let io = self.console.lock().await.io.clone();
            if let Err(err) = io.output(&render_table(&infos)).await {
                tracing::warn!(?err, "failed to render session table");
            }
        }
        infos
    }

    /// Called when a CLI connects. Pre-empts whatever console task is
    /// currently running (local stdio or a previous CLI) and starts a
    /// fresh one bound to `cli_actor_id`.
    pub async fn enter(self: &Arc<Self>, cli_actor_id: ActorId) {
        let mut state = self.console.lock().await;
        if let Some(task) = state.task.take() {
            task.abort();
            let _ = task.await;
        }

        let (out_tx, out_rx) = flume::unbounded();
        let (in_tx, in_rx) = flume::unbounded();
        let io: Arc<dyn DebugIo> = Arc::new(RemoteCliIo::new(out_tx, in_rx));

        state.io = io.clone();
        state.current_cli = Some(cli_actor_id);
        state.cli_output_rx = Some(out_rx);
        state.cli_input_tx = Some(in_tx);

        let controller = self.clone();
        state.task = Some(tokio::spawn(async move {
            if let Err(err) = controller.repl_loop(io).await {
                tracing::warn!(?err, "console task exited with an error");
            }
        }));
    }

    pub async fn debugger_session_start(&self, rank: i64, coords: Coords, hostname: String, actor_name: String) {
        let mut registry = self.registry.lock().unwrap();
        if !registry.contains(&actor_name, rank) {
            // Idempotent: a retried announce for a key that already exists
            // is not an error (§4.5).
            let _ = registry.insert(DebugSession::new(rank, coords, hostname, actor_name));
        }
    }

    pub async fn debugger_session_end(&self, actor_name: &str, rank: i64) -> Result<(), SessionError> {
        let session = self.registry.lock().unwrap().remove(actor_name, rank)?;
        session.detach().await;
        Ok(())
    }

    pub async fn debugger_read(&self, actor_name: &str, rank: i64, size: usize) -> eyre::Result<Vec<u8>> {
        let session = self.registry.lock().unwrap().get(actor_name, rank)?;
        session.debugger_read(size).await
    }

    pub async fn debugger_write(&self, actor_name: &str, rank: i64, frame: DebugFrame) -> eyre::Result<()> {
        let session = self.registry.lock().unwrap().get(actor_name, rank)?;
        session.debugger_write(frame).await
    }

    pub async fn debug_cli_output(&self, cli_actor_id: ActorId) -> Result<Vec<CliMessage>, ControllerError> {
        let state = self.console.lock().await;
        self.check_binding(&state, cli_actor_id)?;
        let rx = state.cli_output_rx.clone().ok_or(ControllerError::NoCliBound)?;
        drop(state);

        let first = rx.recv_async().await.map_err(|_| ControllerError::NoCliBound)?;
        let mut messages = vec![first];
        while let Ok(m) = rx.try_recv() {
            messages.push(m);
        }
        Ok(messages)
    }

    pub async fn debug_cli_input(&self, line: String, cli_actor_id: ActorId) -> Result<(), ControllerError> {
        let state = self.console.lock().await;
        self.check_binding(&state, cli_actor_id)?;
        let tx = state.cli_input_tx.clone().ok_or(ControllerError::NoCliBound)?;
        drop(state);
        tx.send_async(line).await.map_err(|_| ControllerError::NoCliBound)
    }

    fn check_binding(&self, state: &ConsoleState, cli_actor_id: ActorId) -> Result<(), ControllerError> {
        match state.current_cli {
            Some(bound) if bound == cli_actor_id => Ok(()),
            Some(bound) => Err(ControllerError::CliBindingMismatch {
                expected: bound.to_string(),
                actual: cli_actor_id.to_string(),
            }),
            None => Err(ControllerError::NoCliBound),
        }
    }

    async fn repl_loop(self: Arc<Self>, io: Arc<dyn DebugIo>) -> eyre::Result<()> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        io.output(BANNER).await?;

        loop {
            let line = match io.input("(debug) ").await {
                Ok(line) => line,
                Err(_) => return Ok(()),
            };

            match self.dispatch(io.as_ref(), &line).await {
                Ok(DispatchOutcome::Continue) => {}
                Ok(DispatchOutcome::Quit) => return Ok(()),
                Err(err) => {
                    let _ = io.output(&format!("Error processing command: {err}\n")).await;
                }
            }
        }
    }

    async fn dispatch(&self, io: &dyn DebugIo, line: &str) -> eyre::Result<DispatchOutcome> {
        match grammar::parse(line) {
            None => {
                io.output(&format!("Error parsing input: {line}\n")).await?;
            }
            Some(Command::Help) => {
                io.output(HELP_TEXT).await?;
            }
            Some(Command::List) => {
                self.list(true).await;
            }
            Some(Command::Attach { actor_name, rank }) => {
                let session = self.registry.lock().unwrap().get(&actor_name, rank);
                match session {
                    Ok(session) => session.attach(io, None, false).await?,
                    Err(err) => io.output(&format!("{err}\n")).await?,
                }
            }
            Some(Command::Continue) => {
                self.cast_all(io, &Selection::All, "clear").await;
                self.cast_all(io, &Selection::All, "c").await;
            }
            Some(Command::Cast { actor_name, ranks, pdb_command }) => {
                let selection = Selection::actor_ranks(actor_name, ranks);
                self.cast_all(io, &selection, &pdb_command).await;
            }
            Some(Command::Quit) => {
                io.quit().await?;
                return Ok(DispatchOutcome::Quit);
            }
        }
        Ok(DispatchOutcome::Continue)
    }

    /// Sends `cmd` to every session in `selection`, concurrently, with
    /// output suppressed on the console (§4.3, §4.5). `io` is passed
    /// through only to satisfy `attach`'s signature: with a preset line
    /// and suppressed output, the per-session coroutine never actually
    /// touches it.
    async fn cast_all(&self, io: &dyn DebugIo, selection: &Selection, cmd: &str) {
        let sessions = self.registry.lock().unwrap().iter(selection);
        let attaches = sessions.iter().map(|session| session.attach(io, Some(cmd.to_string()), true));
        for result in futures::future::join_all(attaches).await {
            if let Err(err) = result {
                tracing::warn!(?err, "cast to a session failed");
            }
        }
    }
}

#[derive(tabled::Tabled)]
struct SessionRow {
    #[tabled(rename = "Actor Name")]
    actor_name: String,
    #[tabled(rename = "Rank")]
    rank: i64,
    #[tabled(rename = "Coords")]
    coords: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Line No.")]
    lineno: String,
}

fn render_table(infos: &[SessionInfo]) -> String {
    let rows: Vec<SessionRow> = infos
        .iter()
        .map(|info| SessionRow {
            actor_name: info.actor_name.clone(),
            rank: info.rank,
            coords: format_coords(&info.coords),
            hostname: info.hostname.clone(),
            function: info.function_lineno.as_ref().map(|(f, _)| f.clone()).unwrap_or_default(),
            lineno: info.function_lineno.as_ref().map(|(_, l)| l.to_string()).unwrap_or_default(),
        })
        .collect();
    format!("{}\n", tabled::Table::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_support::RecordingIo;

    #[tokio::test]
    async fn session_start_is_idempotent() {
        let controller = DebugController::new();
        controller
            .debugger_session_start(0, Coords::new(), "host".to_string(), "debugee".to_string())
            .await;
        controller
            .debugger_session_start(0, Coords::new(), "host".to_string(), "debugee".to_string())
            .await;
        assert_eq!(controller.list(false).await.len(), 1);
    }

    #[tokio::test]
    async fn session_end_removes_and_detaches() {
        let controller = DebugController::new();
        controller
            .debugger_session_start(0, Coords::new(), "host".to_string(), "debugee".to_string())
            .await;
        controller.debugger_session_end("debugee", 0).await.unwrap();
        assert_eq!(controller.list(false).await.len(), 0);
        let err = controller.debugger_session_end("debugee", 0).await.unwrap_err();
        assert_eq!(err.to_string(), "No debug sessions for actor debugee");
    }

    #[tokio::test]
    async fn s7_post_mortem_reports_faulting_frame() {
        let controller = DebugController::new();
        for rank in 0..4 {
            controller
                .debugger_session_start(rank, Coords::new(), "host".to_string(), "debugee".to_string())
                .await;
        }
        controller
            .debugger_write(
                "debugee",
                2,
                DebugFrame::with_location(b"Traceback...\n".to_vec(), "_bad_rank", 42),
            )
            .await
            .unwrap();

        let infos = controller.list(false).await;
        assert_eq!(infos.len(), 4);
        let rank2 = infos.iter().find(|i| i.rank == 2).unwrap();
        assert_eq!(rank2.function_lineno.as_ref().unwrap().0, "_bad_rank");
    }

    #[tokio::test]
    async fn cli_binding_rejects_unbound_actor() {
        let controller = DebugController::new();
        let other = ActorId::new();
        let err = controller.debug_cli_input("n".to_string(), other).await.unwrap_err();
        assert_eq!(err.to_string(), "attempting to retrieve debugger output, but not in a debug session");
    }

    #[tokio::test]
    async fn quit_ends_the_repl_loop() {
        let controller = DebugController::new();
        let io = RecordingIo::with_inputs(vec!["quit".to_string()]);
        let outcome = controller.dispatch(&io, "quit").await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Quit));
    }
}
