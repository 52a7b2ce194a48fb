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

//! Worker-side glue: on a breakpoint, open a session with the controller
//! and redirect an interactive debugger's stdin/stdout through it.
//! Component F (§4.6).

pub mod breakpoint;
pub mod toy_pdb;
pub mod wrapper;

pub use breakpoint::{check_enterable, BreakpointFrame};
pub use toy_pdb::ToyPdb;
pub use wrapper::{enter_breakpoint, enter_post_mortem, new_worker_actor_id, InteractiveDebugger, PdbWrapper, WorkerClient};
