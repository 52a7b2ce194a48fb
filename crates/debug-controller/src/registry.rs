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

//! Ownership of all live debug sessions, indexed by `(actor_name, rank)`.
//! Component B (§4.2). The registry is owned exclusively by the
//! controller; nothing else may mutate it.

use std::collections::BTreeMap;
use std::sync::Arc;

use monarch_debug_common::{RankSelector, SessionError, SessionInfo};

use crate::session::DebugSession;

/// What `iter`/`cast` select over: every session, every rank of one actor,
/// or a filtered subset of one actor's ranks (§4.2).
#[derive(Debug, Clone)]
pub enum Selection {
    All,
    Actor { actor_name: String, ranks: Option<RankSelector> },
}

impl Selection {
    pub fn actor(actor_name: impl Into<String>) -> Self {
        Self::Actor { actor_name: actor_name.into(), ranks: None }
    }

    pub fn actor_ranks(actor_name: impl Into<String>, ranks: RankSelector) -> Self {
        Self::Actor { actor_name: actor_name.into(), ranks: Some(ranks) }
    }
}

/// Owns every live `DebugSession`, bucketed first by actor name and then
/// by rank so that removing the last rank of an actor can drop the
/// now-empty bucket.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, BTreeMap<i64, Arc<DebugSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, session: DebugSession) -> Result<(), SessionError> {
        let actor_name = session.actor_name.clone();
        let rank = session.rank;
        let bucket = self.sessions.entry(actor_name.clone()).or_default();
        if bucket.contains_key(&rank) {
            return Err(SessionError::AlreadyExists { actor: actor_name, rank });
        }
        bucket.insert(rank, Arc::new(session));
        Ok(())
    }

    pub fn remove(&mut self, actor_name: &str, rank: i64) -> Result<Arc<DebugSession>, SessionError> {
        let bucket = self
            .sessions
            .get_mut(actor_name)
            .ok_or_else(|| SessionError::NoSuchActor { actor: actor_name.to_string() })?;
        let session = bucket
            .remove(&rank)
            .ok_or_else(|| SessionError::NoSuchRank { actor: actor_name.to_string(), rank })?;
        if bucket.is_empty() {
            self.sessions.remove(actor_name);
        }
        Ok(session)
    }

    pub fn get(&self, actor_name: &str, rank: i64) -> Result<Arc<DebugSession>, SessionError> {
        self.sessions
            .get(actor_name)
            .ok_or_else(|| SessionError::NoSuchActor { actor: actor_name.to_string() })?
            .get(&rank)
            .cloned()
            .ok_or_else(|| SessionError::NoSuchRank { actor: actor_name.to_string(), rank })
    }

    pub fn contains(&self, actor_name: &str, rank: i64) -> bool {
        self.sessions.get(actor_name).map(|b| b.contains_key(&rank)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iteration order is unspecified per session bucket ordering here
    /// (actor name, then rank) happens to already be deterministic because
    /// of the `BTreeMap`s, which is convenient but not a documented
    /// guarantee callers should depend on (§4.2 says sort if you need it).
    pub fn iter(&self, selection: &Selection) -> Vec<Arc<DebugSession>> {
        match selection {
            Selection::All => self.sessions.values().flat_map(|b| b.values().cloned()).collect(),
            Selection::Actor { actor_name, ranks } => {
                let Some(bucket) = self.sessions.get(actor_name) else {
                    return Vec::new();
                };
                match ranks {
                    None => bucket.values().cloned().collect(),
                    Some(sel) if sel.is_dims() => bucket
                        .values()
                        .filter(|s| sel.matches_coords(&s.coords))
                        .cloned()
                        .collect(),
                    Some(sel) => bucket
                        .iter()
                        .filter(|(rank, _)| sel.matches_rank(**rank))
                        .map(|(_, s)| s.clone())
                        .collect(),
                }
            }
        }
    }

    pub fn info(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<_> = self
            .sessions
            .values()
            .flat_map(|b| b.values())
            .map(|s| s.info())
            .collect();
        infos.sort();
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monarch_debug_common::Coords;

    fn mk(actor: &str, rank: i64) -> DebugSession {
        DebugSession::new(rank, Coords::new(), "host".to_string(), actor.to_string())
    }

    #[test]
    fn s3_registry_basics() {
        let mut reg = SessionRegistry::new();
        reg.insert(mk("actor_a", 0)).unwrap();
        reg.insert(mk("actor_a", 1)).unwrap();
        reg.insert(mk("actor_b", 0)).unwrap();
        reg.insert(mk("actor_b", 1)).unwrap();
        assert_eq!(reg.len(), 4);

        reg.remove("actor_a", 0).unwrap();
        assert_eq!(reg.len(), 3);

        let err = reg.get("actor_a", 0).unwrap_err();
        assert_eq!(err.to_string(), "No debug session for rank 0 for actor actor_a");

        let err = reg.insert(mk("actor_a", 1)).unwrap_err();
        assert_eq!(err.to_string(), "Debug session for rank 1 already exists for actor actor_a");
    }

    #[test]
    fn s4_iter_by_dims() {
        let mut reg = SessionRegistry::new();
        for actor in ["actor_a", "actor_b"] {
            for host in 0..3 {
                for gpu in 0..8 {
                    let mut coords = Coords::new();
                    coords.insert("hosts".to_string(), host);
                    coords.insert("gpus".to_string(), gpu);
                    let rank = host * 8 + gpu;
                    reg.insert(DebugSession::new(rank, coords, "host".to_string(), actor.to_string())).unwrap();
                }
            }
        }
        assert_eq!(reg.len(), 48);

        let mut dims = std::collections::BTreeMap::new();
        dims.insert("hosts".to_string(), monarch_debug_common::DimSelector::List(vec![0, 2]));
        let sel = Selection::actor_ranks("actor_a", RankSelector::Dims(dims));
        let matched = reg.iter(&sel);
        assert_eq!(matched.len(), 16);
        assert!(matched.iter().all(|s| s.actor_name == "actor_a" && [0, 2].contains(&s.coords["hosts"])));

        let mut missing = std::collections::BTreeMap::new();
        missing.insert("foo".to_string(), monarch_debug_common::DimSelector::Single(0));
        let sel = Selection::actor_ranks("actor_a", RankSelector::Dims(missing));
        assert_eq!(reg.iter(&sel).len(), 0);
    }

    #[test]
    fn iter_none_returns_every_session() {
        let mut reg = SessionRegistry::new();
        reg.insert(mk("actor_a", 0)).unwrap();
        reg.insert(mk("actor_b", 7)).unwrap();
        assert_eq!(reg.iter(&Selection::All).len(), reg.len());
    }
}
