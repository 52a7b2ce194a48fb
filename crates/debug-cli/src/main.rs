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

//! A thin executable that takes over as the human console for whatever
//! controller it connects to, and gets out of the way cleanly on `quit`
//! (§4.7). Abrupt termination (a signal) is expected and left to the OS;
//! the controller's next `enter` pre-empts the stale binding on its own.

mod client;

use clap_derive::Parser;
use eyre::Result;
use monarch_debug_common::{parse_channel_addr, CliMessage, DEFAULT_DEBUG_SERVER_ADDR};
use monarch_debug_proto::ActorId;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use client::CliClient;

#[derive(Parser, Debug)]
#[command(name = "monarch-debug-cli")]
struct Args {
    /// Address of the debug controller, overridable with
    /// `MONARCH_DEBUG_SERVER_ADDR`.
    #[arg(long, env = "MONARCH_DEBUG_SERVER_ADDR", default_value = DEFAULT_DEBUG_SERVER_ADDR)]
    controller_addr: String,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let main_subscriber = tracing_subscriber::fmt().with_target(false).with_writer(std::io::stderr).finish();
    let _ = tracing::subscriber::set_global_default(main_subscriber);

    use clap::Parser;
    let args = Args::parse();
    let addr = parse_channel_addr(&args.controller_addr)?;

    let client = CliClient::connect(addr).await?;
    let cli_actor_id = ActorId::new();
    client.enter(cli_actor_id).await?;

    let input_task = tokio::spawn(forward_stdin(client.clone(), cli_actor_id));
    let output_task = tokio::spawn(drain_output(client.clone(), cli_actor_id));

    tokio::select! {
        res = input_task => res??,
        res = output_task => res??,
    }
    Ok(())
}

async fn forward_stdin(client: CliClient, cli_actor_id: ActorId) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        client.debug_cli_input(line, cli_actor_id).await?;
    }
    Ok(())
}

async fn drain_output(client: CliClient, cli_actor_id: ActorId) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    loop {
        let messages = client.debug_cli_output(cli_actor_id).await?;
        for message in messages {
            match message {
                CliMessage::CliOutput { msg } => {
                    stdout.write_all(msg.as_bytes()).await?;
                    stdout.flush().await?;
                }
                CliMessage::CliInput { prompt } => {
                    stdout.write_all(prompt.as_bytes()).await?;
                    stdout.flush().await?;
                }
                CliMessage::CliQuit => std::process::exit(0),
            }
        }
    }
}
