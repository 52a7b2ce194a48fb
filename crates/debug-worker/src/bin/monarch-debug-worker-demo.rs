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

//! Spawns a handful of fake worker ranks that each hit a breakpoint and
//! hand control to a `ToyPdb`, for exercising a live controller by hand.

use clap_derive::Parser;
use eyre::Result;
use monarch_debug_common::{parse_channel_addr, Coords, DEFAULT_DEBUG_SERVER_ADDR};
use monarch_debug_worker::{enter_breakpoint, BreakpointFrame, ToyPdb, WorkerClient};

#[derive(Parser, Debug)]
#[command(name = "monarch-debug-worker-demo")]
struct Args {
    #[arg(long, default_value = DEFAULT_DEBUG_SERVER_ADDR)]
    controller_addr: String,

    /// How many fake ranks to break, each at line `10 + 5 * rank`.
    #[arg(long, default_value_t = 4)]
    ranks: i64,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    use clap::Parser;
    tracing_subscriber::fmt().with_target(false).init();

    let args = Args::parse();
    let addr = parse_channel_addr(&args.controller_addr)?;

    let mut handles = Vec::new();
    for rank in 0..args.ranks {
        let addr = addr;
        handles.push(tokio::spawn(async move {
            let client = WorkerClient::connect(addr).await?;
            let mut coords = Coords::new();
            coords.insert("hosts".to_string(), rank / 8);
            coords.insert("gpus".to_string(), rank % 8);
            let frame = BreakpointFrame::new("debugee.py", 10 + 5 * rank, "to_debug", false);
            let debugger = ToyPdb::new(10 + 5 * rank, 5);
            enter_breakpoint(client, rank, coords, "localhost".to_string(), "debugee".to_string(), frame, debugger)
                .await
        }));
    }

    for handle in handles {
        handle.await??;
    }
    Ok(())
}
