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

/// The logical coordinates of a rank inside a multi-dimensional mesh, e.g.
/// `{"hosts": 1, "gpus": 3}`. A `BTreeMap` keeps iteration (and therefore
/// the `list` table) deterministic.
pub type Coords = BTreeMap<String, i64>;

/// Render coords the way the console table does: `hosts=1,gpus=3`.
pub fn format_coords(coords: &Coords) -> String {
    coords
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}
