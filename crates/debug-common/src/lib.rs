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

//! Shared data model for the distributed interactive debugger: session
//! identity, rank selectors, wire-agnostic frame types, and the error
//! vocabulary raised by the registry and controller.

pub mod cli_message;
pub mod coords;
pub mod errors;
pub mod frame;
pub mod rank_selector;
pub mod session_info;

pub use cli_message::CliMessage;
pub use coords::{format_coords, Coords};
pub use errors::{BreakpointInEntrypointError, ControllerError, SessionError};
pub use frame::DebugFrame;
pub use rank_selector::{DimSelector, RankSelector};
pub use session_info::SessionInfo;

/// Default listen address for the debug controller, overridable with
/// `MONARCH_DEBUG_SERVER_ADDR`.
pub const DEFAULT_DEBUG_SERVER_ADDR: &str = "tcp![::1]:29700";

/// Environment variable used to select the controller's listen address.
pub const DEBUG_SERVER_ADDR_ENV_VAR: &str = "MONARCH_DEBUG_SERVER_ADDR";

/// Parse a `<transport>![<host>]:<port>` channel address into a
/// `std::net::SocketAddr`, the only transport this crate actually implements.
pub fn parse_channel_addr(addr: &str) -> eyre::Result<std::net::SocketAddr> {
    let rest = addr
        .strip_prefix("tcp!")
        .ok_or_else(|| eyre::eyre!("unsupported channel transport in address: {addr}"))?;
    rest.parse::<std::net::SocketAddr>()
        .map_err(|e| eyre::eyre!("invalid channel address {addr}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_addr() {
        let sock = parse_channel_addr(DEFAULT_DEBUG_SERVER_ADDR).unwrap();
        assert_eq!(sock.port(), 29700);
    }

    #[test]
    fn rejects_unknown_transport() {
        assert!(parse_channel_addr("udp![::1]:1234").is_err());
    }
}
