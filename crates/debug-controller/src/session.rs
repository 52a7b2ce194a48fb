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

//! The per-rank state machine that proxies one remote interactive
//! debugger. Component C (§4.3).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use monarch_debug_common::{Coords, DebugFrame, SessionInfo};

use crate::io::DebugIo;

/// Tokens driving a session's event loop, fed by `detach`/`debugger_read`/
/// `debugger_write`.
enum MessageToken {
    Detach,
    Read,
    Write(DebugFrame),
}

/// Sets `need_read` on drop unless explicitly disarmed. This is the Rust
/// shape of the cancellation-safety contract in §4.3: if the future
/// driving a `Read` token is dropped (the console task was cancelled by a
/// new `enter`, or by the line-reader being torn down) anywhere between
/// consuming the token and successfully pushing into
/// `pending_send_to_actor`, the outstanding read must be re-served on the
/// next attach rather than lost.
struct NeedReadGuard<'a> {
    session: &'a DebugSession,
    armed: bool,
}

impl<'a> NeedReadGuard<'a> {
    fn new(session: &'a DebugSession) -> Self {
        Self { session, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for NeedReadGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.need_read.store(true, Ordering::SeqCst);
        }
    }
}

pub struct DebugSession {
    pub rank: i64,
    pub coords: Coords,
    pub hostname: String,
    pub actor_name: String,

    active: AtomicBool,
    need_read: AtomicBool,
    function_lineno: Mutex<Option<(String, i64)>>,
    outputs_since_last_input: Mutex<Vec<DebugFrame>>,

    message_tx: flume::Sender<MessageToken>,
    message_rx: flume::Receiver<MessageToken>,
    pending_tx: flume::Sender<Vec<u8>>,
    pending_rx: flume::Receiver<Vec<u8>>,
}

impl DebugSession {
    pub fn new(rank: i64, coords: Coords, hostname: String, actor_name: String) -> Self {
        let (message_tx, message_rx) = flume::unbounded();
        let (pending_tx, pending_rx) = flume::unbounded();
        Self {
            rank,
            coords,
            hostname,
            actor_name,
            active: AtomicBool::new(false),
            need_read: AtomicBool::new(false),
            function_lineno: Mutex::new(None),
            outputs_since_last_input: Mutex::new(Vec::new()),
            message_tx,
            message_rx,
            pending_tx,
            pending_rx,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// `need_read` is exposed read-only for tests; invariant 3 (§8) only
    /// needs to observe it, never set it directly.
    pub fn needs_read(&self) -> bool {
        self.need_read.load(Ordering::SeqCst)
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            actor_name: self.actor_name.clone(),
            rank: self.rank,
            coords: self.coords.clone(),
            hostname: self.hostname.clone(),
            function_lineno: self.function_lineno.lock().unwrap().clone(),
        }
    }

    /// Starts the per-session coroutine and blocks until it returns
    /// (§4.3). `preset_line` is used by `cast`/`continue` to pump exactly
    /// one command in without reading the console; `suppress_output`
    /// keeps that command's output out of the console but still appended
    /// to the replay buffer.
    pub async fn attach(
        &self,
        io: &dyn DebugIo,
        preset_line: Option<String>,
        suppress_output: bool,
    ) -> eyre::Result<()> {
        self.active.store(true, Ordering::SeqCst);
        if !suppress_output {
            io.output(&format!(
                "Attached to debug session for {} {} ({})\n",
                self.actor_name, self.rank, self.hostname
            ))
            .await?;
        }

        let result = self.event_loop(io, preset_line, suppress_output).await;

        if !suppress_output {
            io.output(&format!(
                "Detached from debug session for {} {} ({})\n",
                self.actor_name, self.rank, self.hostname
            ))
            .await?;
        }
        self.active.store(false, Ordering::SeqCst);
        result
    }

    async fn event_loop(
        &self,
        io: &dyn DebugIo,
        mut preset_line: Option<String>,
        suppress_output: bool,
    ) -> eyre::Result<()> {
        if !suppress_output {
            let outputs = self.outputs_since_last_input.lock().unwrap().clone();
            if !outputs.is_empty() {
                io.output(&format!(
                    "<last pdb output for {} {} follows>\n",
                    self.actor_name, self.rank
                ))
                .await?;
                for frame in &outputs {
                    io.output(&frame.payload_str()).await?;
                }
            }
        }

        loop {
            let token = if self.need_read.swap(false, Ordering::SeqCst) {
                MessageToken::Read
            } else {
                self.message_rx
                    .recv_async()
                    .await
                    .map_err(|_| eyre::eyre!("debug session for {} {} was dropped", self.actor_name, self.rank))?
            };

            match token {
                MessageToken::Detach => break,
                MessageToken::Read => {
                    let break_after = preset_line.is_some();
                    let mut guard = NeedReadGuard::new(self);
                    let line = match preset_line.take() {
                        Some(l) => l,
                        None => io.input("").await?,
                    };
                    if line.trim_end_matches('\n') == "detach" {
                        // Leave the guard armed: dropping it below sets
                        // need_read so the next attach re-serves this read.
                        break;
                    }
                    self.pending_tx
                        .send_async((line + "\n").into_bytes())
                        .await
                        .map_err(|_| eyre::eyre!("worker for {} {} is gone", self.actor_name, self.rank))?;
                    self.outputs_since_last_input.lock().unwrap().clear();
                    guard.disarm();
                    if break_after {
                        break;
                    }
                }
                MessageToken::Write(frame) => {
                    self.outputs_since_last_input.lock().unwrap().push(frame.clone());
                    if !suppress_output {
                        io.output(&frame.payload_str()).await?;
                    }
                }
            }
        }
        if !suppress_output {
            io.output(&format!(
                "Detaching from debug session for {} {} ({})\n",
                self.actor_name, self.rank, self.hostname
            ))
            .await?;
        }
        Ok(())
    }

    /// Posts `Detach` if a console is currently attached.
    pub async fn detach(&self) {
        if self.is_active() {
            let _ = self.message_tx.send_async(MessageToken::Detach).await;
        }
    }

    /// Called by the worker-facing endpoint. Posts `Read`, then awaits the
    /// next forwarded input line, truncated to `size` bytes (invariant 6, §8).
    pub async fn debugger_read(&self, size: usize) -> eyre::Result<Vec<u8>> {
        self.message_tx
            .send_async(MessageToken::Read)
            .await
            .map_err(|_| eyre::eyre!("console for {} {} is gone", self.actor_name, self.rank))?;
        let mut data = self
            .pending_rx
            .recv_async()
            .await
            .map_err(|_| eyre::eyre!("console for {} {} is gone", self.actor_name, self.rank))?;
        data.truncate(size);
        Ok(data)
    }

    /// Called by the worker-facing endpoint.
    pub async fn debugger_write(&self, frame: DebugFrame) -> eyre::Result<()> {
        if let (Some(function), Some(lineno)) = (frame.function.clone(), frame.lineno) {
            *self.function_lineno.lock().unwrap() = Some((function, lineno));
        }
        self.message_tx
            .send_async(MessageToken::Write(frame))
            .await
            .map_err(|_| eyre::eyre!("console for {} {} is gone", self.actor_name, self.rank))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::test_support::RecordingIo;

    fn mk() -> DebugSession {
        DebugSession::new(0, Coords::new(), "host".to_string(), "debugee".to_string())
    }

    #[tokio::test]
    async fn invariant_never_read_never_need_read() {
        let session = mk();
        assert!(!session.needs_read());
    }

    #[tokio::test]
    async fn active_is_false_after_attach_returns() {
        let session = mk();
        let io = RecordingIo::with_inputs(vec!["detach".to_string()]);
        session.attach(&io, None, false).await.unwrap();
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn successful_push_clears_replay_buffer() {
        let session = mk();
        session.debugger_write(DebugFrame::new(b"--Return--\n".to_vec())).await.unwrap();

        let io = RecordingIo::with_inputs(vec!["n".to_string(), "detach".to_string()]);
        let attach_session = &session;
        let attach_fut = attach_session.attach(&io, None, false);
        let read_fut = session.debugger_read(1024);
        let (attach_res, read_res) = tokio::join!(attach_fut, read_fut);
        attach_res.unwrap();
        assert_eq!(read_res.unwrap(), b"n\n".to_vec());
    }

    #[tokio::test]
    async fn debugger_read_is_truncated_to_size() {
        let session = mk();
        let io = RecordingIo::with_inputs(vec!["abcdef".to_string()]);
        let attach_fut = session.attach(&io, None, false);
        let read_fut = session.debugger_read(3);
        let (attach_res, read_res) = tokio::join!(async {
            // Detach once the one preset read has been served so attach returns.
            let r = read_fut.await;
            session.detach().await;
            r
        }, attach_fut);
        let _ = attach_res;
        assert_eq!(read_res.unwrap().len(), 3);
    }
}
