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

//! `DebugIo` abstracts the console a session is attached to: the
//! controller process's own stdio, or a remote CLI polling over RPC
//! (§4.4). `DebugSession::attach` is generic over this trait so the
//! event loop doesn't know or care which is in play.

use async_trait::async_trait;
use monarch_debug_common::CliMessage;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[async_trait]
pub trait DebugIo: Send + Sync {
    /// Writes `text` verbatim (no trailing newline is added).
    async fn output(&self, text: &str) -> eyre::Result<()>;

    /// Reads one line, without its trailing newline. `prompt` is shown to
    /// the human or forwarded as part of a `CliInput` message; a local
    /// stdio implementation may ignore it since the shell already echoes
    /// input.
    async fn input(&self, prompt: &str) -> eyre::Result<String>;

    /// Tells this console it is being torn down (`quit` command). A local
    /// terminal has nothing to do; a remote CLI enqueues `CliQuit` so the
    /// front-end can exit cleanly.
    async fn quit(&self) -> eyre::Result<()> {
        Ok(())
    }
}

/// The controller's own terminal. Only ever bound when no CLI is
/// attached (§4.4: "at most one `DebugIo` is live at a time").
pub struct LocalStdio {
    stdin: tokio::sync::Mutex<BufReader<tokio::io::Stdin>>,
}

impl LocalStdio {
    pub fn new() -> Self {
        Self { stdin: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin())) }
    }
}

impl Default for LocalStdio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DebugIo for LocalStdio {
    async fn output(&self, text: &str) -> eyre::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }

    async fn input(&self, prompt: &str) -> eyre::Result<String> {
        if !prompt.is_empty() {
            self.output(prompt).await?;
        }
        let mut line = String::new();
        let mut stdin = self.stdin.lock().await;
        let n = stdin.read_line(&mut line).await?;
        if n == 0 {
            eyre::bail!("stdin closed");
        }
        Ok(line.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }
}

/// Bound to exactly one remote CLI front-end (§4.4, §4.7). `output`
/// enqueues a `CliOutput` message for the next `debug_cli_output_poll`;
/// `input` enqueues a `CliInput` prompt and then waits for the matching
/// `debug_cli_input` line to arrive on `from_cli`.
pub struct RemoteCliIo {
    to_cli: flume::Sender<CliMessage>,
    from_cli: flume::Receiver<String>,
}

impl RemoteCliIo {
    pub fn new(to_cli: flume::Sender<CliMessage>, from_cli: flume::Receiver<String>) -> Self {
        Self { to_cli, from_cli }
    }
}

#[async_trait]
impl DebugIo for RemoteCliIo {
    async fn output(&self, text: &str) -> eyre::Result<()> {
        self.to_cli
            .send_async(CliMessage::CliOutput { msg: text.to_string() })
            .await
            .map_err(|_| eyre::eyre!("cli front-end disconnected"))
    }

    async fn input(&self, prompt: &str) -> eyre::Result<String> {
        self.to_cli
            .send_async(CliMessage::CliInput { prompt: prompt.to_string() })
            .await
            .map_err(|_| eyre::eyre!("cli front-end disconnected"))?;
        self.from_cli.recv_async().await.map_err(|_| eyre::eyre!("cli front-end disconnected"))
    }

    async fn quit(&self) -> eyre::Result<()> {
        self.to_cli
            .send_async(CliMessage::CliQuit)
            .await
            .map_err(|_| eyre::eyre!("cli front-end disconnected"))
    }
}

#[cfg(test)]
pub mod test_support {
    use std::sync::Mutex;

    use super::*;

    /// A scripted `DebugIo` for unit tests: replays canned input lines and
    /// records everything written to `output`.
    pub struct RecordingIo {
        inputs: Mutex<std::collections::VecDeque<String>>,
        pub outputs: Mutex<Vec<String>>,
    }

    impl RecordingIo {
        pub fn with_inputs(inputs: Vec<String>) -> Self {
            Self { inputs: Mutex::new(inputs.into()), outputs: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl DebugIo for RecordingIo {
        async fn output(&self, text: &str) -> eyre::Result<()> {
            self.outputs.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn input(&self, _prompt: &str) -> eyre::Result<String> {
            self.inputs
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| eyre::eyre!("RecordingIo ran out of scripted input"))
        }
    }
}
