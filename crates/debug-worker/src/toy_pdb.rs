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

//! A toy stand-in for an interactive debugger, used by the demo binary
//! and by higher-level integration tests that need something on the
//! worker side of `PdbWrapper` to actually drive. Not meant to resemble
//! any particular real debugger's output byte-for-byte.

use async_trait::async_trait;

use crate::wrapper::{InteractiveDebugger, PdbWrapper};

pub struct ToyPdb {
    line: i64,
    return_value: i64,
}

impl ToyPdb {
    pub fn new(start_line: i64, return_value: i64) -> Self {
        Self { line: start_line, return_value }
    }

    fn return_banner(&self) -> String {
        format!(
            "--Return--\n> <string>({})->{}\n-> return _debugee_actor_internal(rank)\n(Pdb) ",
            self.line, self.return_value
        )
    }
}

#[async_trait]
impl InteractiveDebugger for ToyPdb {
    async fn run(&mut self, io: &PdbWrapper) -> eyre::Result<()> {
        io.write(self.return_banner().into_bytes(), None, Some(self.line)).await?;
        loop {
            let line = io.read(1024).await?;
            let cmd = String::from_utf8_lossy(&line).trim().to_string();
            match cmd.as_str() {
                "c" | "continue" | "clear" => return Ok(()),
                "n" | "next" => {
                    self.line += 1;
                    io.write(format!("> <string>({})\n(Pdb) ", self.line).into_bytes(), None, Some(self.line))
                        .await?;
                }
                other if other.starts_with("up") => {
                    io.write(b"(Pdb) ".to_vec(), None, Some(self.line)).await?;
                }
                other => {
                    io.write(format!("*** Unknown syntax: {other}\n(Pdb) ", ).into_bytes(), None, Some(self.line))
                        .await?;
                }
            }
        }
    }
}
