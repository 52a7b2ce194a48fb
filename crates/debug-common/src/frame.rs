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

/// One chunk of output emitted by a remote interactive debugger on a
/// `debugger_write` call, optionally tagged with the source location the
/// debugger is currently stopped at.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DebugFrame {
    pub payload: Vec<u8>,
    pub function: Option<String>,
    pub lineno: Option<i64>,
}

impl DebugFrame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self { payload: payload.into(), function: None, lineno: None }
    }

    pub fn with_location(payload: impl Into<Vec<u8>>, function: impl Into<String>, lineno: i64) -> Self {
        Self {
            payload: payload.into(),
            function: Some(function.into()),
            lineno: Some(lineno),
        }
    }

    /// The payload decoded as UTF-8, lossily. Remote debuggers only ever
    /// emit text, but we don't trust that absolutely.
    pub fn payload_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
