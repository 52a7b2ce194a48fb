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

use crate::coords::Coords;

/// A snapshot of one session's state, as returned by the `list` endpoint.
/// Totally ordered by `(actor_name, rank)` so callers that need a stable
/// order can just sort.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionInfo {
    pub actor_name: String,
    pub rank: i64,
    pub coords: Coords,
    pub hostname: String,
    pub function_lineno: Option<(String, i64)>,
}

impl PartialOrd for SessionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SessionInfo {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (&self.actor_name, self.rank).cmp(&(&other.actor_name, other.rank))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(actor: &str, rank: i64) -> SessionInfo {
        SessionInfo {
            actor_name: actor.to_string(),
            rank,
            coords: Coords::new(),
            hostname: "host".to_string(),
            function_lineno: None,
        }
    }

    #[test]
    fn ordered_by_actor_then_rank() {
        let mut infos = vec![info("b", 0), info("a", 1), info("a", 0)];
        infos.sort();
        assert_eq!(
            infos.iter().map(|i| (i.actor_name.as_str(), i.rank)).collect::<Vec<_>>(),
            vec![("a", 0), ("a", 1), ("b", 0)]
        );
    }
}
