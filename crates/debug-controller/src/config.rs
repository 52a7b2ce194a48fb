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

//! Command-line arguments, layered over an optional YAML config file.

use std::path::PathBuf;

use clap_derive::Parser;
use figment::providers::{Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "monarch-debug-controller")]
#[command(about = "Multiplexes remote debug sessions onto a single interactive console")]
pub struct ControllerConfig {
    /// Listen address for both worker and CLI connections, of the form
    /// `tcp![<host>]:<port>`. Overridable with `MONARCH_DEBUG_SERVER_ADDR`.
    #[arg(long, env = "MONARCH_DEBUG_SERVER_ADDR", default_value = "tcp![::1]:29700")]
    pub listen_addr: String,

    /// YAML config file overlaying the defaults above; values here win
    /// over the built-in defaults but lose to explicit CLI flags.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Verbose logging (passes through to `tracing_subscriber`'s env
    /// filter as a floor, not a replacement for `RUST_LOG`).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ControllerConfig {
    /// Parses CLI args, then layers an optional YAML config file on top of
    /// them with `figment` before extracting the merged result.
    pub fn load() -> eyre::Result<Self> {
        use clap::Parser;
        let cli = Self::parse();
        let config_file = cli.config_file.clone();
        let mut layered = Figment::new().merge(Serialized::defaults(&cli));
        if let Some(path) = &config_file {
            layered = layered.merge(Yaml::file(path));
        }
        Ok(layered.extract()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_addr_matches_common_constant() {
        assert_eq!("tcp![::1]:29700", monarch_debug_common::DEFAULT_DEBUG_SERVER_ADDR);
    }
}
