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

use thiserror::Error;

/// Errors raised by the session registry and by a session's own state
/// machine. These propagate to remote callers as actor errors; the REPL
/// prints them and stays alive (§7).
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionError {
    #[error("No debug sessions for actor {actor}")]
    NoSuchActor { actor: String },

    #[error("No debug session for rank {rank} for actor {actor}")]
    NoSuchRank { actor: String, rank: i64 },

    #[error("Debug session for rank {rank} already exists for actor {actor}")]
    AlreadyExists { actor: String, rank: i64 },
}

/// Errors specific to the controller's single-CLI invariant and to the
/// `enter`/`debug_cli_*` endpoint family.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ControllerError {
    #[error("attempting to retrieve debugger output, but not in a debug session")]
    NoCliBound,

    #[error(
        "attempting to use cli_actor_id {actual}, but the currently bound cli is {expected}"
    )]
    CliBindingMismatch { expected: String, actual: String },
}

/// Raised in the worker when a breakpoint is hit inside the entrypoint
/// module and its source is not present on the worker host (§4.6, §7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "remote debugging not supported for breakpoint at {file}:{line} because it is defined \
     inside the entrypoint module, and the file does not exist on this host"
)]
pub struct BreakpointInEntrypointError {
    pub file: String,
    pub line: u32,
}
