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

use std::collections::BTreeMap;

use crate::coords::Coords;

/// A rank selector as it appears inside `ranks(...)`. `Dims` is recursive
/// only one level deep: a dimension's own selector can never itself be a
/// `Dims`, which is enforced here at the type level rather than at parse
/// time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RankSelector {
    Single(i64),
    List(Vec<i64>),
    Range { start: i64, stop: i64, step: i64 },
    Dims(BTreeMap<String, DimSelector>),
}

/// The selector allowed inside a single `dim=...` clause.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DimSelector {
    Single(i64),
    List(Vec<i64>),
    Range { start: i64, stop: i64, step: i64 },
}

impl DimSelector {
    fn matches(&self, value: i64) -> bool {
        match self {
            DimSelector::Single(r) => value == *r,
            DimSelector::List(rs) => rs.contains(&value),
            DimSelector::Range { start, stop, step } => range_contains(*start, *stop, *step, value),
        }
    }
}

fn range_contains(start: i64, stop: i64, step: i64, value: i64) -> bool {
    if step == 0 || value < start || value >= stop {
        return false;
    }
    (value - start) % step == 0
}

impl RankSelector {
    /// Does `rank` (with no dimension context) satisfy this selector? Only
    /// meaningful for the non-`Dims` variants; `cast`/`iter` never apply a
    /// `Dims` selector against a bare rank.
    pub fn matches_rank(&self, rank: i64) -> bool {
        match self {
            RankSelector::Single(r) => rank == *r,
            RankSelector::List(rs) => rs.contains(&rank),
            RankSelector::Range { start, stop, step } => range_contains(*start, *stop, *step, rank),
            RankSelector::Dims(_) => false,
        }
    }

    /// Does `coords` satisfy every named dimension? An absent dimension
    /// excludes the session (see Session registry invariants, §4.2).
    pub fn matches_coords(&self, coords: &Coords) -> bool {
        match self {
            RankSelector::Dims(dims) => dims.iter().all(|(dim, sel)| {
                coords
                    .get(dim)
                    .map(|v| sel.matches(*v))
                    .unwrap_or(false)
            }),
            _ => false,
        }
    }

    pub fn is_dims(&self) -> bool {
        matches!(self, RankSelector::Dims(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_half_open_with_step() {
        let sel = RankSelector::Range { start: 15, stop: i64::MAX, step: 2 };
        assert!(sel.matches_rank(15));
        assert!(sel.matches_rank(17));
        assert!(!sel.matches_rank(16));
    }

    #[test]
    fn dims_requires_every_named_dimension_present() {
        let mut dims = BTreeMap::new();
        dims.insert("hosts".to_string(), DimSelector::List(vec![0, 2]));
        let sel = RankSelector::Dims(dims);

        let mut coords = Coords::new();
        coords.insert("hosts".to_string(), 2);
        assert!(sel.matches_coords(&coords));

        let empty = Coords::new();
        assert!(!sel.matches_coords(&empty));
    }

    #[test]
    fn list_selector() {
        let sel = RankSelector::List(vec![12, 34, 56]);
        assert!(sel.matches_rank(34));
        assert!(!sel.matches_rank(35));
    }
}
